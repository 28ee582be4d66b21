// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Vault error taxonomy.

use crate::auth::SessionError;
use crate::blockchain::NetworkMismatch;
use crate::blockchain::network_name;
use crate::encryption::EncryptionError;
use crate::storage::TableServiceError;

/// Every failure the upload and list flows report.
///
/// Callers branch on the variant, never on the message.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("connect a wallet first")]
    NotAuthenticated,

    #[error("wrong network: switch to {} (connected to {})", network_name(.0.expected), network_name(.0.actual))]
    WrongNetwork(NetworkMismatch),

    #[error("could not read the wallet network: {0}")]
    NetworkUnavailable(String),

    #[error("signature request was rejected")]
    SignatureRejected,

    #[error("encryption failed: {0}")]
    EncryptionFailed(#[source] EncryptionError),

    /// Non-fatal: the upload pauses for a manual table name.
    #[error("no vault table found")]
    TableNotFound,

    #[error("failed to write entry: {0}")]
    StorageWriteFailed(#[source] TableServiceError),

    #[error("failed to read entries: {0}")]
    StorageReadFailed(#[source] TableServiceError),

    #[error("failed to delete entry: {0}")]
    StorageDeleteFailed(#[source] TableServiceError),

    /// Non-fatal: the row is treated as uncategorized.
    #[error("entry metadata could not be parsed")]
    MetadataParseFailed,

    #[error("unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("an upload is already in progress")]
    UploadInProgress,

    #[error("no upload is waiting for a table name")]
    NothingToResume,

    #[error("deletion requires confirmation")]
    ConfirmationRequired,

    #[error("local cache error: {0}")]
    Cache(String),
}

impl VaultError {
    /// Stable machine-readable code.
    pub fn error_code(&self) -> &'static str {
        match self {
            VaultError::NotAuthenticated => "not_authenticated",
            VaultError::WrongNetwork(_) => "wrong_network",
            VaultError::NetworkUnavailable(_) => "network_unavailable",
            VaultError::SignatureRejected => "signature_rejected",
            VaultError::EncryptionFailed(_) => "encryption_failed",
            VaultError::TableNotFound => "table_not_found",
            VaultError::StorageWriteFailed(_) => "storage_write_failed",
            VaultError::StorageReadFailed(_) => "storage_read_failed",
            VaultError::StorageDeleteFailed(_) => "storage_delete_failed",
            VaultError::MetadataParseFailed => "metadata_parse_failed",
            VaultError::UnsupportedFile(_) => "unsupported_file",
            VaultError::UploadInProgress => "upload_in_progress",
            VaultError::NothingToResume => "nothing_to_resume",
            VaultError::ConfirmationRequired => "confirmation_required",
            VaultError::Cache(_) => "cache_error",
        }
    }

    /// Whether the flow can continue after this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            VaultError::TableNotFound | VaultError::MetadataParseFailed
        )
    }

    /// Map a wallet error raised while requesting a signature.
    pub(crate) fn from_signing(error: SessionError) -> Self {
        match error {
            SessionError::NotConnected(_) => VaultError::NotAuthenticated,
            SessionError::Rejected | SessionError::Provider(_) => VaultError::SignatureRejected,
        }
    }
}

impl From<NetworkMismatch> for VaultError {
    fn from(mismatch: NetworkMismatch) -> Self {
        VaultError::WrongNetwork(mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_network_names_both_chains() {
        let err = VaultError::from(NetworkMismatch {
            expected: 11155111,
            actual: 1,
        });
        assert_eq!(err.error_code(), "wrong_network");
        assert_eq!(
            err.to_string(),
            "wrong network: switch to Ethereum Sepolia Testnet (connected to Ethereum Mainnet)"
        );
    }

    #[test]
    fn only_table_and_metadata_errors_are_non_fatal() {
        assert!(!VaultError::TableNotFound.is_fatal());
        assert!(!VaultError::MetadataParseFailed.is_fatal());
        assert!(VaultError::SignatureRejected.is_fatal());
        assert!(VaultError::StorageWriteFailed(TableServiceError::Backend("x".into())).is_fatal());
    }

    #[test]
    fn signing_errors_map_to_taxonomy() {
        assert!(matches!(
            VaultError::from_signing(SessionError::Rejected),
            VaultError::SignatureRejected
        ));
        assert!(matches!(
            VaultError::from_signing(SessionError::NotConnected("gone".into())),
            VaultError::NotAuthenticated
        ));
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Vault
//!
//! The two flows of the document vault:
//!
//! - [`UploadOrchestrator`]: encrypt a file for its owner, sign a typed
//!   record of it and store the record in the owner's vault table.
//! - [`VaultList`]: query the owner's rows, group them by category and
//!   delete on request.
//!
//! Both talk to the outside world only through the capability handles in
//! [`VaultContext`], and to each other only through the [`RefreshBus`].

pub mod category;
pub mod entry;
pub mod error;
pub mod events;
pub mod list;
pub mod metadata;
pub mod table_resolver;
pub mod upload;

use std::sync::Arc;

use crate::auth::{IdentityProvider, WalletSession};
use crate::blockchain::ensure_network;
use crate::encryption::EncryptionNetwork;
use crate::storage::{AuditTrail, TableService};

pub use category::{Category, CategoryFilter, UnknownCategory};
pub use entry::{sort_newest_first, VaultEntry};
pub use error::VaultError;
pub use events::{RefreshBus, VaultRefresh};
pub use list::{filter_entries, DeleteOutcome, ListView, ListedEntry, VaultList, LOAD_FAILED_MESSAGE};
pub use metadata::{Metadata, MetadataFields, UploadMetadata};
pub use table_resolver::{ManualReason, Resolution, TableResolver};
pub use upload::{
    StagedFile, UploadOrchestrator, UploadOutcome, UploadReceipt, UploadSnapshot, UploadState,
};

/// Static settings shared by both flows.
#[derive(Debug, Clone)]
pub struct VaultSettings {
    /// Chain every write must happen on.
    pub target_chain_id: u64,
    /// Origin the login statement is scoped to.
    pub origin: url::Url,
}

/// Capability handles injected into the vault flows.
#[derive(Clone)]
pub struct VaultContext {
    pub identity: Arc<dyn IdentityProvider>,
    pub encryption: Arc<dyn EncryptionNetwork>,
    pub tables: Arc<dyn TableService>,
    pub resolver: Arc<TableResolver>,
    pub bus: RefreshBus,
    pub audit: AuditTrail,
    pub settings: VaultSettings,
}

impl VaultContext {
    /// The connected session, or `NotAuthenticated`.
    pub(crate) fn session(&self) -> Result<Arc<dyn WalletSession>, VaultError> {
        self.identity.session().ok_or(VaultError::NotAuthenticated)
    }

    /// Fail with `WrongNetwork` unless the session is on the target chain.
    pub(crate) async fn ensure_target_network(
        &self,
        session: &dyn WalletSession,
    ) -> Result<(), VaultError> {
        let actual = session
            .chain_id()
            .await
            .map_err(|e| VaultError::NetworkUnavailable(e.to_string()))?;
        ensure_network(self.settings.target_chain_id, actual)?;
        Ok(())
    }
}

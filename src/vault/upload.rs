// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Upload orchestrator
//!
//! One upload runs as a fixed sequence:
//!
//! ```text
//! Idle -> Preparing -> Authorizing -> Encrypting -> Signing -> ResolvingTable -> Writing -> Done
//!                                                                       |                ^
//!                                                                       v                |
//!                                                   AwaitingManualTable -> Preparing ----+
//! ```
//!
//! `Preparing` covers the wallet and network checks that precede each run.
//!
//! Any error moves to `Failed`. The only pause is `AwaitingManualTable`:
//! the encrypted and signed record is kept in memory until
//! [`UploadOrchestrator::provide_table`] supplies a table name, then only the
//! write step runs. Nothing is retried automatically.
//!
//! At most one upload runs at a time; a second call while one is in flight
//! (or paused) fails with `UploadInProgress`.

use std::sync::{Mutex, MutexGuard};

use alloy::primitives::Address;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use super::metadata::UploadMetadata;
use super::table_resolver::{ManualReason, Resolution};
use super::{Category, VaultContext, VaultError};
use crate::auth::WalletSession;
use crate::blockchain::{vault_domain, LoginMessage, VaultEntryData};
use crate::encryption::{AccessCondition, AuthSig, EncryptionError};
use crate::storage::{AuditEvent, AuditEventType, Statement, TableRef, TableServiceError};

/// MIME types accepted for upload, with their file extensions.
pub const ACCEPTED_TYPES: &[(&str, &[&str])] = &[
    ("application/pdf", &["pdf"]),
    ("image/png", &["png"]),
    ("image/jpeg", &["jpg", "jpeg"]),
];

/// A validated file waiting to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl StagedFile {
    /// Validate a file by MIME type or extension.
    ///
    /// Only PDF, PNG and JPEG are accepted, and empty files are rejected.
    pub fn new(
        name: impl Into<String>,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<Self, VaultError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(VaultError::UnsupportedFile("missing file name".to_string()));
        }
        if bytes.is_empty() {
            return Err(VaultError::UnsupportedFile(format!("{name} is empty")));
        }

        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase());
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());

        let by_mime = mime
            .as_deref()
            .and_then(|m| ACCEPTED_TYPES.iter().find(|(t, _)| *t == m));
        let by_extension = extension.as_deref().and_then(|ext| {
            ACCEPTED_TYPES
                .iter()
                .find(|(_, exts)| exts.contains(&ext))
        });

        let (content_type, _) = by_mime.or(by_extension).ok_or_else(|| {
            VaultError::UnsupportedFile(format!(
                "{name}: only PDF, PNG and JPG files are accepted"
            ))
        })?;

        Ok(Self {
            name,
            content_type: content_type.to_string(),
            bytes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Where the current upload is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UploadState {
    Idle,
    /// Checking the wallet and the active network.
    Preparing,
    /// Signing the login statement for the encryption network.
    Authorizing,
    Encrypting,
    Signing,
    ResolvingTable,
    /// Paused until a table name is supplied.
    AwaitingManualTable,
    Writing,
    Done,
    Failed,
}

impl UploadState {
    /// Status line shown to the user.
    pub fn status_message(self) -> &'static str {
        match self {
            UploadState::Idle => "",
            UploadState::Preparing => "Checking Wallet and Network...",
            UploadState::Authorizing => "Requesting Signature for Encryption...",
            UploadState::Encrypting => "Encrypting File...",
            UploadState::Signing => "Signing Data (EIP-712)...",
            UploadState::ResolvingTable => "Searching for existing Vault Table...",
            UploadState::AwaitingManualTable => {
                "Could not find a Vault Table. Please enter it manually below."
            }
            UploadState::Writing => "Writing to Tableland Database...",
            UploadState::Done => "Success! Document Encrypted, Signed & Stored.",
            UploadState::Failed => "Upload failed.",
        }
    }

    /// Whether a step is currently executing.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            UploadState::Preparing
                | UploadState::Authorizing
                | UploadState::Encrypting
                | UploadState::Signing
                | UploadState::ResolvingTable
                | UploadState::Writing
        )
    }

    fn accepts_new_upload(self) -> bool {
        matches!(
            self,
            UploadState::Idle | UploadState::Done | UploadState::Failed
        )
    }
}

/// What a finished upload reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadReceipt {
    pub table: String,
    pub content_hash: String,
    pub entry_id: Option<u64>,
    pub transaction_hash: String,
    pub file_name: String,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Stored(UploadReceipt),
    /// Paused; call `provide_table` to finish.
    AwaitingTable(ManualReason),
}

/// Point-in-time view of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UploadSnapshot {
    pub state: UploadState,
    pub status: String,
    /// File of the upload in progress or paused.
    pub file_name: Option<String>,
    pub error_code: Option<String>,
    pub receipt: Option<UploadReceipt>,
}

/// Encrypted and signed, waiting for a table.
#[derive(Debug, Clone)]
struct StagedUpload {
    owner: Address,
    file_name: String,
    category: Category,
    content_hash: String,
    encrypted_metadata: String,
}

#[derive(Debug)]
struct UploadSlot {
    state: UploadState,
    status: String,
    file_name: Option<String>,
    staged: Option<StagedUpload>,
    error_code: Option<&'static str>,
    receipt: Option<UploadReceipt>,
}

impl Default for UploadSlot {
    fn default() -> Self {
        Self {
            state: UploadState::Idle,
            status: String::new(),
            file_name: None,
            staged: None,
            error_code: None,
            receipt: None,
        }
    }
}

pub struct UploadOrchestrator {
    ctx: VaultContext,
    slot: Mutex<UploadSlot>,
}

impl UploadOrchestrator {
    pub fn new(ctx: VaultContext) -> Self {
        Self {
            ctx,
            slot: Mutex::new(UploadSlot::default()),
        }
    }

    pub fn state(&self) -> UploadState {
        self.slot().state
    }

    pub fn snapshot(&self) -> UploadSnapshot {
        let slot = self.slot();
        UploadSnapshot {
            state: slot.state,
            status: slot.status.clone(),
            file_name: slot.file_name.clone(),
            error_code: slot.error_code.map(str::to_string),
            receipt: slot.receipt.clone(),
        }
    }

    /// Discard any staged upload and return to `Idle`.
    ///
    /// A running step cannot be interrupted; that case is `UploadInProgress`.
    pub fn reset(&self) -> Result<(), VaultError> {
        let mut slot = self.slot();
        if slot.state.is_busy() {
            return Err(VaultError::UploadInProgress);
        }
        if slot.staged.is_some() {
            info!(file = ?slot.file_name, "Discarding staged upload");
        }
        *slot = UploadSlot::default();
        Ok(())
    }

    /// Encrypt, sign and store `file` under `category`.
    pub async fn upload(
        &self,
        file: StagedFile,
        category: Category,
    ) -> Result<UploadOutcome, VaultError> {
        {
            let mut slot = self.slot();
            if !slot.state.accepts_new_upload() {
                return Err(VaultError::UploadInProgress);
            }
            info!(from = ?slot.state, to = ?UploadState::Preparing, "Upload state transition");
            *slot = UploadSlot {
                state: UploadState::Preparing,
                status: UploadState::Preparing.status_message().to_string(),
                file_name: Some(file.name().to_string()),
                ..UploadSlot::default()
            };
        }
        info!(
            file = %file.name(),
            content_type = %file.content_type(),
            size = file.size(),
            category = %category,
            "Starting upload"
        );

        let result = self.run(&file, category).await;
        self.finish(file.name(), result)
    }

    /// Resume a paused upload with a user-supplied table name.
    ///
    /// An unusable name is `TableNotFound` and the upload stays paused.
    pub async fn provide_table(&self, raw: &str) -> Result<UploadOutcome, VaultError> {
        let staged = {
            let slot = self.slot();
            match (&slot.state, &slot.staged) {
                (UploadState::AwaitingManualTable, Some(staged)) => staged.clone(),
                _ => return Err(VaultError::NothingToResume),
            }
        };

        let table = self.ctx.resolver.remember(raw, Some(staged.owner))?;
        info!(table = %table, file = %staged.file_name, "Resuming upload with manual table");

        // Pause is over: from here on the staged record is consumed.
        {
            let mut slot = self.slot();
            if slot.state != UploadState::AwaitingManualTable || slot.staged.is_none() {
                return Err(VaultError::NothingToResume);
            }
            info!(from = ?slot.state, to = ?UploadState::Preparing, "Upload state transition");
            slot.state = UploadState::Preparing;
            slot.status = UploadState::Preparing.status_message().to_string();
            slot.staged = None;
        }

        let result = self.resume(&staged, table).await;
        self.finish(&staged.file_name, result)
    }

    async fn run(&self, file: &StagedFile, category: Category) -> Result<UploadOutcome, VaultError> {
        let session = self.ctx.session()?;
        let owner = session.address();
        self.ctx.ensure_target_network(session.as_ref()).await?;

        self.transition(UploadState::Authorizing);
        let auth_sig = self.authorize(session.as_ref()).await?;

        self.transition(UploadState::Encrypting);
        let conditions = [AccessCondition::owner_only(
            self.ctx.settings.target_chain_id,
            owner,
        )];
        let payload = self
            .ctx
            .encryption
            .encrypt(file.bytes(), owner, &auth_sig, &conditions)
            .await
            .map_err(VaultError::EncryptionFailed)?;

        self.transition(UploadState::Signing);
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let record = VaultEntryData {
            name: file.name().to_string(),
            category: category.label().to_string(),
            hash: payload.content_hash.clone(),
            size: file.size().to_string(),
            timestamp: timestamp.clone(),
        };
        let signature = session
            .sign_typed_data(&vault_domain(self.ctx.settings.target_chain_id), &record)
            .await
            .map_err(VaultError::from_signing)?;

        let metadata = UploadMetadata {
            name: file.name().to_string(),
            hash: payload.content_hash.clone(),
            file_type: file.content_type().to_string(),
            size: file.size(),
            category,
            timestamp,
            signature,
            eip712_data: record,
        };
        let staged = StagedUpload {
            owner,
            file_name: file.name().to_string(),
            category,
            content_hash: payload.content_hash,
            encrypted_metadata: metadata.to_json().map_err(|e| {
                VaultError::StorageWriteFailed(TableServiceError::Backend(e.to_string()))
            })?,
        };

        self.transition(UploadState::ResolvingTable);
        let table = match self.ctx.resolver.resolve(owner).await? {
            Resolution::Cached(table) | Resolution::Discovered(table) => table,
            Resolution::NeedsManualEntry(reason) => {
                let mut slot = self.slot();
                info!(from = ?slot.state, to = ?UploadState::AwaitingManualTable, "Upload state transition");
                slot.state = UploadState::AwaitingManualTable;
                slot.status = match &reason {
                    ManualReason::NoneFound => UploadState::AwaitingManualTable.status_message(),
                    ManualReason::DiscoveryFailed(_) => {
                        "Connection Error. Please enter Table Name manually."
                    }
                }
                .to_string();
                slot.staged = Some(staged);
                return Ok(UploadOutcome::AwaitingTable(reason));
            }
        };

        self.write(session.as_ref(), &staged, table).await
    }

    async fn resume(
        &self,
        staged: &StagedUpload,
        table: TableRef,
    ) -> Result<UploadOutcome, VaultError> {
        let session = self.ctx.session()?;
        if session.address() != staged.owner {
            warn!(
                staged_owner = %staged.owner,
                session = %session.address(),
                "Wallet changed while the upload was paused"
            );
            return Err(VaultError::NotAuthenticated);
        }
        self.ctx.ensure_target_network(session.as_ref()).await?;
        self.write(session.as_ref(), staged, table).await
    }

    /// Sign a login statement bound to a fresh encryption-network nonce.
    async fn authorize(&self, session: &dyn WalletSession) -> Result<AuthSig, VaultError> {
        let nonce = self
            .ctx
            .encryption
            .nonce()
            .await
            .map_err(VaultError::EncryptionFailed)?;
        let login = LoginMessage::new(
            &self.ctx.settings.origin,
            session.address(),
            self.ctx.settings.target_chain_id,
            &nonce,
            Utc::now(),
        )
        .map_err(|e| VaultError::EncryptionFailed(EncryptionError::InvalidAuthSig(e.to_string())))?;

        let message = login.prepare_message();
        let sig = session
            .sign_message(&message)
            .await
            .map_err(VaultError::from_signing)?;
        Ok(AuthSig::personal_sign(sig, message, session.address()))
    }

    async fn write(
        &self,
        session: &dyn WalletSession,
        staged: &StagedUpload,
        table: TableRef,
    ) -> Result<UploadOutcome, VaultError> {
        self.transition(UploadState::Writing);
        let receipt = self
            .ctx
            .tables
            .execute(
                session.address(),
                Statement::InsertEntry {
                    table: table.clone(),
                    owner: staged.owner.to_string(),
                    encrypted_metadata: staged.encrypted_metadata.clone(),
                    created_at: Utc::now().timestamp_millis(),
                },
            )
            .await
            .and_then(|outcome| outcome.into_receipt())
            .map_err(VaultError::StorageWriteFailed)?;

        let receipt = UploadReceipt {
            table: table.to_string(),
            content_hash: staged.content_hash.clone(),
            entry_id: receipt.row_id,
            transaction_hash: receipt.transaction_hash,
            file_name: staged.file_name.clone(),
            category: staged.category,
        };
        {
            let mut slot = self.slot();
            info!(from = ?slot.state, to = ?UploadState::Done, "Upload state transition");
            slot.state = UploadState::Done;
            slot.status = UploadState::Done.status_message().to_string();
            slot.receipt = Some(receipt.clone());
        }

        info!(
            owner = %staged.owner,
            table = %receipt.table,
            entry_id = ?receipt.entry_id,
            hash = %receipt.content_hash,
            "Document encrypted, signed and stored"
        );
        self.ctx.audit.record(
            AuditEvent::new(AuditEventType::UploadStored)
                .with_owner(staged.owner.to_string())
                .with_resource("table", receipt.table.as_str())
                .with_details(serde_json::json!({
                    "entry_id": receipt.entry_id,
                    "hash": receipt.content_hash,
                    "category": staged.category.label(),
                    "transaction_hash": receipt.transaction_hash,
                })),
        );
        self.ctx.bus.publish();

        Ok(UploadOutcome::Stored(receipt))
    }

    fn finish(
        &self,
        file_name: &str,
        result: Result<UploadOutcome, VaultError>,
    ) -> Result<UploadOutcome, VaultError> {
        let error = match result {
            Ok(outcome) => return Ok(outcome),
            Err(e) => e,
        };

        let owner = self.ctx.identity.session().map(|s| s.address());
        match &error {
            VaultError::SignatureRejected | VaultError::WrongNetwork(_) | VaultError::NotAuthenticated => {
                warn!(file = %file_name, error = %error, code = error.error_code(), "Upload aborted");
            }
            e if !e.is_fatal() => {
                info!(file = %file_name, error = %error, code = error.error_code(), "Upload stopped");
            }
            _ => {
                tracing::error!(file = %file_name, error = %error, code = error.error_code(), "Upload failed");
            }
        }

        {
            let mut slot = self.slot();
            info!(from = ?slot.state, to = ?UploadState::Failed, "Upload state transition");
            slot.state = UploadState::Failed;
            slot.status = format!("Error: {error}");
            slot.staged = None;
            slot.error_code = Some(error.error_code());
        }

        let mut event = AuditEvent::new(AuditEventType::UploadFailed)
            .with_details(serde_json::json!({ "file": file_name, "error_code": error.error_code() }))
            .failed(error.to_string());
        if let Some(owner) = owner {
            event = event.with_owner(owner.to_string());
        }
        self.ctx.audit.record(event);

        Err(error)
    }

    fn transition(&self, to: UploadState) {
        let mut slot = self.slot();
        info!(from = ?slot.state, to = ?to, "Upload state transition");
        slot.state = to;
        slot.status = to.status_message().to_string();
    }

    fn slot(&self) -> MutexGuard<'_, UploadSlot> {
        // The slot holds plain data, so a poisoned lock is still consistent.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

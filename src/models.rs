// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. Domain types (`ListView`, `UploadReceipt`, `Identity`) are
//! returned as-is; the types here only cover query strings and envelopes.
//!
//! ## Model Categories
//!
//! - **Upload**: file query, manual table request, upload response
//! - **Vault**: list query, delete query, audit query, table reference responses

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::vault::{ManualReason, UploadOutcome, UploadReceipt, UploadSnapshot, UploadState};

// =============================================================================
// Upload
// =============================================================================

/// Query string of `POST /v1/vault/files`. The body is the raw file.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct UploadQuery {
    /// Original file name, including the extension.
    pub name: String,
    /// Category label; `Uncategorized` when omitted.
    pub category: Option<String>,
}

/// Table name supplied to resume a paused upload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ManualTableRequest {
    /// Pasted table name. `Vault Table Created:` / `Vault Table Found:`
    /// prefixes are accepted.
    #[schema(example = "advice_accord_vault_11155111_1")]
    pub table_name: String,
}

/// Result of an upload or resume call.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub state: UploadState,
    pub status: String,
    /// Present once the entry is stored.
    pub receipt: Option<UploadReceipt>,
    /// Why a table name is needed, when paused.
    pub awaiting_reason: Option<String>,
}

impl UploadResponse {
    pub fn new(outcome: UploadOutcome, snapshot: UploadSnapshot) -> Self {
        match outcome {
            UploadOutcome::Stored(receipt) => Self {
                state: snapshot.state,
                status: snapshot.status,
                receipt: Some(receipt),
                awaiting_reason: None,
            },
            UploadOutcome::AwaitingTable(reason) => Self {
                state: snapshot.state,
                status: snapshot.status,
                receipt: None,
                awaiting_reason: Some(match reason {
                    ManualReason::NoneFound => "no_table_found".to_string(),
                    ManualReason::DiscoveryFailed(e) => format!("discovery_failed: {e}"),
                }),
            },
        }
    }
}

// =============================================================================
// Vault
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct EntriesQuery {
    /// Category label or `All` (default).
    pub category: Option<String>,
    /// Re-query the table service before answering.
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct DeleteQuery {
    /// Must be `true`; deletion cannot be undone.
    #[serde(default)]
    pub confirm: bool,
}

/// The cached vault table reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TableResponse {
    pub table: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct AuditQuery {
    /// UTC day as `YYYY-MM-DD`; today when omitted.
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    /// Listeners that received the refresh event.
    pub listeners: usize,
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Local persistence and the table service capability.
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/
//!   cache/
//!     vault_table.json      # Cached table reference
//!   tables.redb             # Embedded table service (vault tables + rows)
//!   audit/
//!     {date}/events.jsonl   # Daily audit logs
//! ```
//!
//! Vault rows themselves hold only encrypted metadata; document bytes never
//! touch this directory in the clear.

pub mod audit;
pub mod local_cache;
pub mod ownership;
pub mod paths;
pub mod statement;
pub mod table_database;
pub mod table_service;

pub use audit::{AuditEvent, AuditEventType, AuditRepository, AuditTrail};
pub use local_cache::{
    LocalCache, LocalStorage, MemoryCache, StorageError, StorageResult, TABLE_REFERENCE_KEY,
};
pub use ownership::{OwnedResource, OwnershipEnforcer};
pub use paths::StoragePaths;
pub use statement::{Statement, TableRef, VAULT_TABLE_PREFIX};
pub use table_database::RedbTableService;
pub use table_service::{ExecOutcome, TableService, TableServiceError, WriteReceipt};

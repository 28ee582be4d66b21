// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the local data directory.

use std::path::{Path, PathBuf};

/// Default base directory for persistent local state.
pub const DATA_ROOT: &str = "./data";

/// Storage path utilities for the data directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all local data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Local Cache Paths ==========

    /// Directory holding cached key/value entries.
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    /// Path to a single cached entry.
    pub fn cache_entry(&self, key: &str) -> PathBuf {
        self.cache_dir().join(format!("{key}.json"))
    }

    // ========== Table Database ==========

    /// Path to the embedded table database.
    pub fn tables_db(&self) -> PathBuf {
        self.root.join("tables.redb")
    }

    // ========== Audit Log Paths ==========

    /// Directory containing audit logs.
    pub fn audit_dir(&self) -> PathBuf {
        self.root.join("audit")
    }

    /// Directory for a specific date's audit logs.
    pub fn audit_date_dir(&self, date: &str) -> PathBuf {
        self.audit_dir().join(date)
    }

    /// Path to a daily audit events file (JSONL format).
    pub fn audit_events_file(&self, date: &str) -> PathBuf {
        self.audit_date_dir(date).join("events.jsonl")
    }
}

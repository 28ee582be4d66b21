// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stored vault rows.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::ownership::OwnedResource;

/// One row of a vault table. Never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VaultEntry {
    /// Assigned by storage, unique within the table.
    pub id: u64,
    /// Uploader address as written at insert time.
    pub owner: String,
    /// Serialized upload metadata (see `vault::metadata`).
    pub encrypted_metadata: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl VaultEntry {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.created_at).single()
    }
}

impl OwnedResource for VaultEntry {
    fn owner_address(&self) -> &str {
        &self.owner
    }

    fn resource_label(&self) -> String {
        format!("entry {}", self.id)
    }
}

/// Newest first. The sort is stable, so rows created in the same
/// millisecond keep their storage order.
pub fn sort_newest_first(entries: &mut [VaultEntry]) {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, created_at: i64) -> VaultEntry {
        VaultEntry {
            id,
            owner: "0xabc".to_string(),
            encrypted_metadata: String::new(),
            created_at,
        }
    }

    #[test]
    fn sorts_descending_with_stable_ties() {
        let mut rows = vec![entry(1, 10), entry(2, 30), entry(3, 20), entry(4, 30)];
        sort_newest_first(&mut rows);
        let ids: Vec<u64> = rows.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 4, 3, 1]);
    }

    #[test]
    fn created_at_converts_from_millis() {
        let row = entry(1, 1_767_607_200_000);
        assert_eq!(
            row.created_at_utc().unwrap().to_rfc3339(),
            "2026-01-05T10:00:00+00:00"
        );
    }
}

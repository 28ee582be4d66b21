// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Vault listing
//!
//! Keeps the latest query result for the connected owner and serves
//! category-filtered views of it. The snapshot is reloaded:
//!
//! 1. once at startup if a wallet is connected,
//! 2. whenever a [`VaultRefresh`](super::VaultRefresh) is broadcast,
//! 3. on explicit request.
//!
//! There is no polling. Deletion goes straight to the table service and the
//! snapshot is only changed by the re-query that follows a successful delete.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use super::entry::sort_newest_first;
use super::table_resolver::Resolution;
use super::{Category, CategoryFilter, Metadata, VaultContext, VaultEntry, VaultError};
use crate::storage::{AuditEvent, AuditEventType, Statement, TableRef};

/// Status line shown when a reload fails.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load documents.";

/// An entry prepared for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ListedEntry {
    pub id: u64,
    pub owner: String,
    /// File name, or `Doc #{id}` for rows without one.
    pub name: String,
    /// Content hash, or the raw metadata for legacy rows.
    pub hash: String,
    /// e.g. `"2.00 MB"`.
    pub size: Option<String>,
    pub file_type: Option<String>,
    /// `None` when the stored label is not a known category.
    pub category: Option<Category>,
    /// Stored label as shown to the user.
    pub category_label: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    pub created_at_iso: Option<String>,
    /// Whether the metadata is a structured record.
    pub signed: bool,
}

impl ListedEntry {
    pub fn from_entry(entry: &VaultEntry) -> Self {
        let metadata = Metadata::parse(&entry.encrypted_metadata);
        let fields = metadata.fields();
        Self {
            id: entry.id,
            owner: entry.owner.clone(),
            name: metadata.display_name(entry.id),
            hash: metadata.display_hash(&entry.encrypted_metadata),
            size: metadata.display_size(),
            file_type: fields.and_then(|f| f.file_type.clone()),
            category: metadata.categorize(),
            category_label: metadata.category_label(),
            created_at: entry.created_at,
            created_at_iso: entry.created_at_utc().map(|t| t.to_rfc3339()),
            signed: fields.is_some_and(|f| f.signature.is_some()),
        }
    }
}

/// Entries matching `filter`, in the order given.
pub fn filter_entries(entries: &[VaultEntry], filter: CategoryFilter) -> Vec<ListedEntry> {
    entries
        .iter()
        .map(ListedEntry::from_entry)
        .filter(|listed| filter.matches(listed.category))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// Not confirmed; nothing was sent.
    Cancelled,
    Deleted { id: u64, transaction_hash: String },
}

#[derive(Debug, Default)]
struct ListSnapshot {
    table: Option<TableRef>,
    entries: Vec<VaultEntry>,
    error: Option<String>,
    loaded: bool,
}

/// A filtered view of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ListView {
    pub table: Option<String>,
    pub entries: Vec<ListedEntry>,
    /// Set when the last reload failed.
    pub error: Option<String>,
    pub loaded: bool,
}

pub struct VaultList {
    ctx: VaultContext,
    snapshot: RwLock<ListSnapshot>,
    /// One reload at a time, so an older query never lands last.
    reload: tokio::sync::Mutex<()>,
}

impl VaultList {
    pub fn new(ctx: VaultContext) -> Self {
        Self {
            ctx,
            snapshot: RwLock::new(ListSnapshot::default()),
            reload: tokio::sync::Mutex::new(()),
        }
    }

    /// Reload the owner's rows. Returns how many were loaded.
    ///
    /// Having no vault table yet is not an error: the list is simply empty.
    pub async fn refresh(&self) -> Result<usize, VaultError> {
        let _reload = self.reload.lock().await;
        let result = self.load().await;
        let mut snapshot = self.write_snapshot();
        snapshot.loaded = true;
        match result {
            Ok((table, entries)) => {
                let count = entries.len();
                snapshot.table = table;
                snapshot.entries = entries;
                snapshot.error = None;
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "Failed to load vault entries");
                snapshot.error = Some(LOAD_FAILED_MESSAGE.to_string());
                Err(e)
            }
        }
    }

    async fn load(&self) -> Result<(Option<TableRef>, Vec<VaultEntry>), VaultError> {
        let session = self.ctx.session()?;
        let owner = session.address();

        let table = match self.ctx.resolver.resolve(owner).await? {
            Resolution::Cached(table) | Resolution::Discovered(table) => table,
            Resolution::NeedsManualEntry(reason) => {
                debug!(owner = %owner, reason = ?reason, "No vault table yet");
                return Ok((None, Vec::new()));
            }
        };

        let mut entries = self
            .ctx
            .tables
            .execute(
                owner,
                Statement::SelectByOwner {
                    table: table.clone(),
                    owner: owner.to_string(),
                },
            )
            .await
            .and_then(|outcome| outcome.into_rows())
            .map_err(VaultError::StorageReadFailed)?;
        sort_newest_first(&mut entries);

        debug!(owner = %owner, table = %table, count = entries.len(), "Loaded vault entries");
        Ok((Some(table), entries))
    }

    /// Current snapshot filtered by category.
    pub fn entries(&self, filter: CategoryFilter) -> ListView {
        let snapshot = self.read_snapshot();
        ListView {
            table: snapshot.table.as_ref().map(TableRef::to_string),
            entries: filter_entries(&snapshot.entries, filter),
            error: snapshot.error.clone(),
            loaded: snapshot.loaded,
        }
    }

    /// Delete one entry by id. Requires `confirmed` and the target network.
    ///
    /// On failure the row stays in the snapshot; on success the snapshot is
    /// re-queried.
    pub async fn delete(&self, id: u64, confirmed: bool) -> Result<DeleteOutcome, VaultError> {
        if !confirmed {
            debug!(entry_id = id, "Deletion not confirmed");
            return Ok(DeleteOutcome::Cancelled);
        }

        let session = self.ctx.session()?;
        let owner = session.address();
        let table = self.ctx.resolver.cached()?.ok_or(VaultError::TableNotFound)?;
        self.ctx.ensure_target_network(session.as_ref()).await?;

        info!(entry_id = id, table = %table, "Deleting vault entry");
        let result = self
            .ctx
            .tables
            .execute(
                owner,
                Statement::DeleteById {
                    table: table.clone(),
                    id,
                },
            )
            .await
            .and_then(|outcome| outcome.into_receipt());

        let receipt = match result {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(entry_id = id, table = %table, error = %e, "Failed to delete vault entry");
                self.ctx.audit.record(
                    AuditEvent::new(AuditEventType::DeleteFailed)
                        .with_owner(owner.to_string())
                        .with_resource("entry", id.to_string())
                        .failed(e.to_string()),
                );
                return Err(VaultError::StorageDeleteFailed(e));
            }
        };

        self.ctx.audit.record(
            AuditEvent::new(AuditEventType::EntryDeleted)
                .with_owner(owner.to_string())
                .with_resource("entry", id.to_string())
                .with_details(serde_json::json!({
                    "table": table.as_str(),
                    "transaction_hash": receipt.transaction_hash,
                })),
        );

        if let Err(e) = self.refresh().await {
            warn!(entry_id = id, error = %e, "Entry deleted but the reload failed");
        }
        Ok(DeleteOutcome::Deleted {
            id,
            transaction_hash: receipt.transaction_hash,
        })
    }

    /// Load once, then reload on every refresh broadcast until shutdown.
    pub async fn run(self: std::sync::Arc<Self>, shutdown: CancellationToken) {
        let mut events = self.ctx.bus.subscribe();
        info!("Vault list listener started");

        if self.ctx.identity.session().is_some() {
            let _ = self.refresh().await;
        }

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(_) => {
                        debug!("vault-refresh received");
                        let _ = self.refresh().await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Coalescing missed vault-refresh events");
                        let _ = self.refresh().await;
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = shutdown.cancelled() => break,
            }
        }
        info!("Vault list listener shutting down");
    }

    fn read_snapshot(&self) -> RwLockReadGuard<'_, ListSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_snapshot(&self) -> RwLockWriteGuard<'_, ListSnapshot> {
        self.snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::storage::TableService;
    use crate::testing::{Harness, OTHER, OWNER};

    fn row(id: u64, metadata: &str, created_at: i64) -> VaultEntry {
        VaultEntry {
            id,
            owner: OWNER.to_string(),
            encrypted_metadata: metadata.to_string(),
            created_at,
        }
    }

    async fn insert(harness: &Harness, table: &TableRef, metadata: &str) -> u64 {
        harness
            .tables
            .execute(
                OWNER,
                Statement::InsertEntry {
                    table: table.clone(),
                    owner: OWNER.to_string(),
                    encrypted_metadata: metadata.to_string(),
                    created_at: chrono::Utc::now().timestamp_millis(),
                },
            )
            .await
            .unwrap()
            .into_receipt()
            .unwrap()
            .row_id
            .unwrap()
    }

    #[test]
    fn uncategorized_filter_covers_missing_broken_and_explicit_only() {
        let rows = vec![
            row(1, "{\"category\":\"Lawyers\",\"name\":\"nda.pdf\"}", 5),
            row(2, "{\"name\":\"no-category.pdf\"}", 4),
            row(3, "{not json", 3),
            row(4, "{\"category\":\"Uncategorized\"}", 2),
            row(5, "9f86d081884c7d65", 1),
            row(6, "{\"category\":\"Plumbers\",\"name\":\"pipes.pdf\"}", 0),
        ];

        let ids = |filter| -> Vec<u64> {
            filter_entries(&rows, filter).iter().map(|e| e.id).collect()
        };
        assert_eq!(ids(CategoryFilter::Only(Category::Uncategorized)), vec![2, 3, 4, 5]);
        assert_eq!(ids(CategoryFilter::Only(Category::Lawyers)), vec![1]);
        assert_eq!(ids(CategoryFilter::All), vec![1, 2, 3, 4, 5, 6]);
        assert!(ids(CategoryFilter::Only(Category::Realtors)).is_empty());
    }

    #[test]
    fn listed_entry_display_fields() {
        let listed = ListedEntry::from_entry(&row(
            9,
            "{\"name\":\"deed.png\",\"hash\":\"ab\",\"size\":1048576,\"type\":\"image/png\",\"signature\":\"0x1\"}",
            1_767_607_200_000,
        ));
        assert_eq!(listed.name, "deed.png");
        assert_eq!(listed.size.as_deref(), Some("1.00 MB"));
        assert_eq!(listed.file_type.as_deref(), Some("image/png"));
        assert!(listed.signed);
        assert_eq!(listed.created_at_iso.as_deref(), Some("2026-01-05T10:00:00+00:00"));

        let legacy = ListedEntry::from_entry(&row(3, "cafebabe", 0));
        assert_eq!(legacy.name, "Doc #3");
        assert_eq!(legacy.hash, "cafebabe");
        assert!(!legacy.signed);
        assert_eq!(legacy.category, Some(Category::Uncategorized));

        let unknown = ListedEntry::from_entry(&row(4, "{\"category\":\"Plumbers\"}", 0));
        assert_eq!(unknown.category, None);
        assert_eq!(unknown.category_label, "Plumbers");
    }

    #[tokio::test]
    async fn refresh_loads_newest_first() {
        let harness = Harness::new().await;
        let table = harness.tables.create_for(OWNER).await;
        insert(&harness, &table, "{\"name\":\"a.pdf\"}").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        insert(&harness, &table, "{\"name\":\"b.pdf\"}").await;

        let list = VaultList::new(harness.ctx.clone());
        assert_eq!(list.refresh().await.unwrap(), 2);

        let view = list.entries(CategoryFilter::All);
        let names: Vec<&str> = view.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b.pdf", "a.pdf"]);
        assert_eq!(view.table.as_deref(), Some(table.as_str()));
        assert!(view.loaded);
    }

    #[tokio::test]
    async fn overlapping_refreshes_keep_the_newest_rows() {
        let harness = Harness::new().await;
        let table = harness.tables.create_for(OWNER).await;
        insert(&harness, &table, "{\"name\":\"a.pdf\"}").await;
        let list = Arc::new(VaultList::new(harness.ctx.clone()));

        let release = harness.tables.hold_next_read();
        let first = tokio::spawn({
            let list = list.clone();
            async move { list.refresh().await }
        });
        while harness.tables.stalled_reads() == 0 {
            tokio::task::yield_now().await;
        }

        insert(&harness, &table, "{\"name\":\"b.pdf\"}").await;
        let second = tokio::spawn({
            let list = list.clone();
            async move { list.refresh().await }
        });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        release.send(()).unwrap();
        assert_eq!(first.await.unwrap().unwrap(), 1);
        assert_eq!(second.await.unwrap().unwrap(), 2);
        assert_eq!(list.entries(CategoryFilter::All).entries.len(), 2);
    }

    #[tokio::test]
    async fn no_table_yet_is_an_empty_list() {
        let harness = Harness::new().await;
        let list = VaultList::new(harness.ctx.clone());
        assert_eq!(list.refresh().await.unwrap(), 0);
        assert!(list.entries(CategoryFilter::All).table.is_none());
    }

    #[tokio::test]
    async fn read_failures_surface_the_load_message() {
        let harness = Harness::new().await;
        harness.tables.create_for(OWNER).await;
        harness.tables.fail_reads(true);
        let list = VaultList::new(harness.ctx.clone());

        assert!(matches!(
            list.refresh().await,
            Err(VaultError::StorageReadFailed(_))
        ));
        assert_eq!(
            list.entries(CategoryFilter::All).error.as_deref(),
            Some(LOAD_FAILED_MESSAGE)
        );
    }

    #[tokio::test]
    async fn delete_needs_confirmation_and_requeries() {
        let harness = Harness::new().await;
        let table = harness.tables.create_for(OWNER).await;
        let keep = insert(&harness, &table, "{\"name\":\"keep.pdf\"}").await;
        let doomed = insert(&harness, &table, "{\"name\":\"doomed.pdf\"}").await;

        let list = VaultList::new(harness.ctx.clone());
        list.refresh().await.unwrap();

        assert_eq!(list.delete(doomed, false).await.unwrap(), DeleteOutcome::Cancelled);
        assert_eq!(list.entries(CategoryFilter::All).entries.len(), 2);

        let outcome = list.delete(doomed, true).await.unwrap();
        assert!(matches!(outcome, DeleteOutcome::Deleted { id, .. } if id == doomed));
        let ids: Vec<u64> = list
            .entries(CategoryFilter::All)
            .entries
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![keep]);
    }

    #[tokio::test]
    async fn failed_delete_leaves_the_row() {
        let harness = Harness::new().await;
        let table = harness.tables.create_for(OWNER).await;
        let id = insert(&harness, &table, "{\"name\":\"x.pdf\"}").await;
        let list = VaultList::new(harness.ctx.clone());
        list.refresh().await.unwrap();

        harness.tables.fail_writes(true);
        assert!(matches!(
            list.delete(id, true).await,
            Err(VaultError::StorageDeleteFailed(_))
        ));
        assert_eq!(list.entries(CategoryFilter::All).entries.len(), 1);
    }

    #[tokio::test]
    async fn delete_checks_the_network_on_its_own() {
        let harness = Harness::new().await;
        let table = harness.tables.create_for(OWNER).await;
        let id = insert(&harness, &table, "{}").await;
        let list = VaultList::new(harness.ctx.clone());
        list.refresh().await.unwrap();

        harness.session.set_chain_id(1);
        assert!(matches!(
            list.delete(id, true).await,
            Err(VaultError::WrongNetwork(_))
        ));
        assert_eq!(list.entries(CategoryFilter::All).entries.len(), 1);
    }

    #[tokio::test]
    async fn other_owners_rows_stay_hidden() {
        let harness = Harness::new().await;
        let table = harness.tables.create_for(OWNER).await;
        insert(&harness, &table, "{\"name\":\"mine.pdf\"}").await;
        harness
            .tables
            .execute(
                OWNER,
                Statement::InsertEntry {
                    table: table.clone(),
                    owner: OTHER.to_string(),
                    encrypted_metadata: "{\"name\":\"theirs.pdf\"}".to_string(),
                    created_at: 0,
                },
            )
            .await
            .unwrap();

        let list = VaultList::new(harness.ctx.clone());
        assert_eq!(list.refresh().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn listener_reloads_on_broadcast() {
        let harness = Harness::new().await;
        let table = harness.tables.create_for(OWNER).await;
        let list = Arc::new(VaultList::new(harness.ctx.clone()));
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(list.clone().run(shutdown.clone()));

        // Wait for the listener to subscribe before publishing.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while !list.entries(CategoryFilter::All).loaded {
            assert!(tokio::time::Instant::now() < deadline, "initial load never ran");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        insert(&harness, &table, "{\"name\":\"late.pdf\"}").await;
        assert_eq!(harness.ctx.bus.publish(), 1);

        while list.entries(CategoryFilter::All).entries.is_empty() {
            assert!(tokio::time::Instant::now() < deadline, "refresh never ran");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        shutdown.cancel();
        task.await.unwrap();
    }
}

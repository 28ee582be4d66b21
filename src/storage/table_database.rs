// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded table service backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `vault_tables`: table name → serialized TableRecord (owner, chain, sequence)
//! - `vault_rows`: composite key (table|id_be) → serialized VaultEntry
//! - `counters`: key → u64 (`tables` for table sequence, `rows:{table}` per table)

use std::path::Path;

use alloy::primitives::{keccak256, Address};
use async_trait::async_trait;
use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use serde::{Deserialize, Serialize};

use super::ownership::{OwnedResource, OwnershipEnforcer};
use super::statement::{Statement, TableRef};
use super::table_service::{ExecOutcome, TableService, TableServiceError, WriteReceipt};
use crate::vault::VaultEntry;

// =============================================================================
// Table Definitions
// =============================================================================

/// Registry: table name → serialized TableRecord (JSON bytes).
const VAULT_TABLES: TableDefinition<&str, &[u8]> = TableDefinition::new("vault_tables");

/// Rows: `table|id_be` → serialized VaultEntry (JSON bytes).
const VAULT_ROWS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("vault_rows");

/// Monotonic counters.
const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

const TABLE_SEQ: &str = "tables";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TableDbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type TableDbResult<T> = Result<T, TableDbError>;

impl From<TableDbError> for TableServiceError {
    fn from(e: TableDbError) -> Self {
        TableServiceError::Backend(e.to_string())
    }
}

/// Registry record for one vault table.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TableRecord {
    name: String,
    owner: String,
    chain_id: u64,
    seq: u64,
    created_at: i64,
}

impl OwnedResource for TableRecord {
    fn owner_address(&self) -> &str {
        &self.owner
    }

    fn resource_label(&self) -> String {
        self.name.clone()
    }
}

// =============================================================================
// Key Helpers
// =============================================================================

/// Row key: `table | id_be_bytes`. Big-endian ids keep rows in insert order.
fn make_row_key(table: &str, id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(table.len() + 1 + 8);
    key.extend_from_slice(table.as_bytes());
    key.push(b'|');
    key.extend_from_slice(&id.to_be_bytes());
    key
}

fn make_prefix(table: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(table.len() + 1);
    prefix.extend_from_slice(table.as_bytes());
    prefix.push(b'|');
    prefix
}

fn make_prefix_end(table: &str) -> Vec<u8> {
    let mut end = make_prefix(table);
    end.extend_from_slice(&[0xFF; 9]);
    end
}

fn row_counter(table: &str) -> String {
    format!("rows:{table}")
}

/// Bump a counter inside an open write transaction and return the new value.
fn next_value(txn: &WriteTransaction, key: &str) -> TableDbResult<u64> {
    let mut counters = txn.open_table(COUNTERS)?;
    let current = counters.get(key)?.map(|v| v.value()).unwrap_or(0);
    let next = current + 1;
    counters.insert(key, next)?;
    Ok(next)
}

fn write_hash(table: &str, op: &str, row: u64) -> String {
    let nonce = uuid::Uuid::new_v4();
    alloy::hex::encode_prefixed(keccak256(format!("{table}:{op}:{row}:{nonce}")))
}

// =============================================================================
// RedbTableService
// =============================================================================

/// Table service that keeps every vault table in one redb file.
pub struct RedbTableService {
    db: Database,
    chain_id: u64,
}

impl RedbTableService {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path, chain_id: u64) -> TableDbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(VAULT_TABLES)?;
            let _ = write_txn.open_table(VAULT_ROWS)?;
            let _ = write_txn.open_table(COUNTERS)?;
        }
        write_txn.commit()?;

        Ok(Self { db, chain_id })
    }

    fn record(&self, table: &TableRef) -> TableDbResult<Option<TableRecord>> {
        let read_txn = self.db.begin_read()?;
        let registry = read_txn.open_table(VAULT_TABLES)?;
        match registry.get(table.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn create_table(&self, caller: Address) -> TableDbResult<WriteReceipt> {
        let write_txn = self.db.begin_write()?;
        let record = {
            let seq = next_value(&write_txn, TABLE_SEQ)?;
            let name = TableRef::vault_table(self.chain_id, seq);
            let record = TableRecord {
                name: name.to_string(),
                owner: caller.to_string().to_lowercase(),
                chain_id: self.chain_id,
                seq,
                created_at: Utc::now().timestamp_millis(),
            };
            let mut registry = write_txn.open_table(VAULT_TABLES)?;
            let json = serde_json::to_vec(&record)?;
            registry.insert(record.name.as_str(), json.as_slice())?;
            record
        };
        write_txn.commit()?;

        tracing::info!(table = %record.name, owner = %record.owner, "Created vault table");
        Ok(WriteReceipt {
            transaction_hash: write_hash(&record.name, "create", 0),
            table: record.name,
            row_id: None,
        })
    }

    fn insert_entry(
        &self,
        table: &TableRef,
        owner: String,
        encrypted_metadata: String,
        created_at: i64,
    ) -> TableDbResult<WriteReceipt> {
        let write_txn = self.db.begin_write()?;
        let id = {
            let id = next_value(&write_txn, &row_counter(table.as_str()))?;
            let entry = VaultEntry {
                id,
                owner,
                encrypted_metadata,
                created_at,
            };
            let json = serde_json::to_vec(&entry)?;
            let mut rows = write_txn.open_table(VAULT_ROWS)?;
            rows.insert(make_row_key(table.as_str(), id).as_slice(), json.as_slice())?;
            id
        };
        write_txn.commit()?;

        Ok(WriteReceipt {
            transaction_hash: write_hash(table.as_str(), "insert", id),
            table: table.to_string(),
            row_id: Some(id),
        })
    }

    fn select_by_owner(&self, table: &TableRef, owner: &str) -> TableDbResult<Vec<VaultEntry>> {
        let read_txn = self.db.begin_read()?;
        let rows = read_txn.open_table(VAULT_ROWS)?;

        let start = make_prefix(table.as_str());
        let end = make_prefix_end(table.as_str());

        let mut out = Vec::new();
        for item in rows.range(start.as_slice()..end.as_slice())? {
            let (_, value) = item?;
            let entry: VaultEntry = serde_json::from_slice(value.value())?;
            if entry.owner.eq_ignore_ascii_case(owner) {
                out.push(entry);
            }
        }
        Ok(out)
    }

    fn delete_by_id(&self, table: &TableRef, id: u64) -> TableDbResult<WriteReceipt> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut rows = write_txn.open_table(VAULT_ROWS)?;
            let removed = rows.remove(make_row_key(table.as_str(), id).as_slice())?;
            removed.is_some()
        };
        write_txn.commit()?;

        if !removed {
            tracing::debug!(table = %table, entry_id = id, "Delete matched no rows");
        }
        Ok(WriteReceipt {
            transaction_hash: write_hash(table.as_str(), "delete", id),
            table: table.to_string(),
            row_id: Some(id),
        })
    }

    fn owned_tables(&self, owner: Address) -> TableDbResult<Vec<TableRef>> {
        let read_txn = self.db.begin_read()?;
        let registry = read_txn.open_table(VAULT_TABLES)?;

        let mut records = Vec::new();
        for item in registry.iter()? {
            let (_, value) = item?;
            let record: TableRecord = serde_json::from_slice(value.value())?;
            if record.verify_ownership(&owner).is_ok() {
                records.push(record);
            }
        }
        records.sort_by_key(|r| r.seq);

        Ok(records
            .into_iter()
            .filter_map(|r| TableRef::parse(&r.name).ok())
            .filter(TableRef::is_vault_table)
            .collect())
    }
}

#[async_trait]
impl TableService for RedbTableService {
    async fn execute(
        &self,
        caller: Address,
        statement: Statement,
    ) -> Result<ExecOutcome, TableServiceError> {
        tracing::debug!(
            sql = %statement.sql(),
            params = ?statement.params(),
            caller = %caller,
            "Executing statement"
        );

        if let Some(table) = statement.table() {
            let record = self
                .record(table)?
                .ok_or_else(|| TableServiceError::TableNotFound(table.to_string()))?;
            if statement.is_write() && record.verify_ownership(&caller).is_err() {
                return Err(TableServiceError::PermissionDenied {
                    caller: caller.to_checksum(None),
                    table: table.to_string(),
                });
            }
        }

        let outcome = match statement {
            Statement::CreateVaultTable => ExecOutcome::Receipt(self.create_table(caller)?),
            Statement::InsertEntry {
                table,
                owner,
                encrypted_metadata,
                created_at,
            } => ExecOutcome::Receipt(self.insert_entry(
                &table,
                owner,
                encrypted_metadata,
                created_at,
            )?),
            Statement::SelectByOwner { table, owner } => {
                ExecOutcome::Rows(self.select_by_owner(&table, &owner)?)
            }
            Statement::DeleteById { table, id } => {
                ExecOutcome::Receipt(self.delete_by_id(&table, id)?)
            }
        };
        Ok(outcome)
    }

    async fn list_tables_owned_by(
        &self,
        owner: Address,
    ) -> Result<Vec<TableRef>, TableServiceError> {
        Ok(self.owned_tables(owner)?)
    }

    async fn ping(&self) -> Result<(), TableServiceError> {
        let read_txn = self.db.begin_read().map_err(TableDbError::from)?;
        read_txn
            .open_table(VAULT_TABLES)
            .map_err(TableDbError::from)?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const ALICE: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const BOB: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

    fn temp_db() -> (RedbTableService, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = RedbTableService::open(&dir.path().join("tables.redb"), 11155111).unwrap();
        (db, dir)
    }

    async fn create(db: &RedbTableService, owner: Address) -> TableRef {
        let receipt = db
            .execute(owner, Statement::CreateVaultTable)
            .await
            .unwrap()
            .into_receipt()
            .unwrap();
        TableRef::parse(&receipt.table).unwrap()
    }

    async fn insert(db: &RedbTableService, table: &TableRef, owner: &str, at: i64) -> u64 {
        db.execute(
            ALICE,
            Statement::InsertEntry {
                table: table.clone(),
                owner: owner.to_string(),
                encrypted_metadata: format!("{{\"at\":{at}}}"),
                created_at: at,
            },
        )
        .await
        .unwrap()
        .into_receipt()
        .unwrap()
        .row_id
        .unwrap()
    }

    async fn select(db: &RedbTableService, table: &TableRef, owner: &str) -> Vec<VaultEntry> {
        db.execute(
            BOB,
            Statement::SelectByOwner {
                table: table.clone(),
                owner: owner.to_string(),
            },
        )
        .await
        .unwrap()
        .into_rows()
        .unwrap()
    }

    #[tokio::test]
    async fn create_names_tables_by_chain_and_sequence() {
        let (db, _dir) = temp_db();
        let first = create(&db, ALICE).await;
        let second = create(&db, BOB).await;
        let third = create(&db, ALICE).await;
        assert_eq!(first.as_str(), "advice_accord_vault_11155111_1");
        assert_eq!(second.as_str(), "advice_accord_vault_11155111_2");

        let owned = db.list_tables_owned_by(ALICE).await.unwrap();
        assert_eq!(owned, vec![first, third]);
        assert!(db.list_tables_owned_by(Address::ZERO).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids_and_select_filters_by_owner() {
        let (db, _dir) = temp_db();
        let table = create(&db, ALICE).await;

        let alice_lower = ALICE.to_string().to_lowercase();
        let a = insert(&db, &table, &ALICE.to_checksum(None), 10).await;
        let b = insert(&db, &table, &BOB.to_checksum(None), 20).await;
        let c = insert(&db, &table, &alice_lower, 30).await;
        assert_eq!((a, b, c), (1, 2, 3));

        let rows = select(&db, &table, &alice_lower.to_uppercase()).await;
        let ids: Vec<u64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn delete_removes_only_that_row() {
        let (db, _dir) = temp_db();
        let table = create(&db, ALICE).await;
        let owner = ALICE.to_checksum(None);
        let first = insert(&db, &table, &owner, 10).await;
        insert(&db, &table, &owner, 20).await;

        db.execute(
            ALICE,
            Statement::DeleteById {
                table: table.clone(),
                id: first,
            },
        )
        .await
        .unwrap();

        let rows = select(&db, &table, &owner).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 2);
    }

    #[tokio::test]
    async fn writes_require_table_ownership() {
        let (db, _dir) = temp_db();
        let table = create(&db, ALICE).await;

        let result = db
            .execute(
                BOB,
                Statement::InsertEntry {
                    table: table.clone(),
                    owner: BOB.to_string(),
                    encrypted_metadata: "{}".to_string(),
                    created_at: 1,
                },
            )
            .await;
        assert!(matches!(result, Err(TableServiceError::PermissionDenied { .. })));

        let result = db.execute(BOB, Statement::DeleteById { table, id: 1 }).await;
        assert!(matches!(result, Err(TableServiceError::PermissionDenied { .. })));
    }

    #[tokio::test]
    async fn unknown_tables_are_reported() {
        let (db, _dir) = temp_db();
        let missing = TableRef::parse("advice_accord_vault_11155111_99").unwrap();
        let result = db
            .execute(
                ALICE,
                Statement::SelectByOwner {
                    table: missing,
                    owner: ALICE.to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(TableServiceError::TableNotFound(_))));
        db.ping().await.unwrap();
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.redb");
        let table = {
            let db = RedbTableService::open(&path, 11155111).unwrap();
            let table = create(&db, ALICE).await;
            insert(&db, &table, &ALICE.to_string(), 5).await;
            table
        };

        let db = RedbTableService::open(&path, 11155111).unwrap();
        assert_eq!(select(&db, &table, &ALICE.to_string()).await.len(), 1);
        // Sequence continues after reopen.
        assert_eq!(create(&db, ALICE).await.as_str(), "advice_accord_vault_11155111_2");
    }

    #[test]
    fn row_keys_sort_by_id_within_a_table() {
        assert!(make_row_key("t_1", 2) < make_row_key("t_1", 10));
        // `t_10` rows fall outside the `t_1` scan range.
        assert!(make_row_key("t_10", 1) < make_prefix("t_1"));
        assert!(make_row_key("t_1", u64::MAX) < make_prefix_end("t_1"));
    }
}

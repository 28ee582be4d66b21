// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Finding the user's vault table.
//!
//! Order: local cache, then the table registry (first table owned by the
//! wallet), then manual entry. Once a table is known it is cached, so later
//! resolutions never touch the registry.

use std::sync::Arc;

use alloy::primitives::Address;

use super::VaultError;
use crate::storage::{
    AuditEvent, AuditEventType, AuditTrail, LocalCache, Statement, TableRef, TableService,
    TABLE_REFERENCE_KEY,
};

/// Why the resolver needs a human.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManualReason {
    /// The registry has no table for this owner.
    NoneFound,
    /// The registry could not be queried.
    DiscoveryFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Cached(TableRef),
    Discovered(TableRef),
    NeedsManualEntry(ManualReason),
}

pub struct TableResolver {
    cache: Arc<dyn LocalCache>,
    tables: Arc<dyn TableService>,
    audit: AuditTrail,
}

impl TableResolver {
    pub fn new(cache: Arc<dyn LocalCache>, tables: Arc<dyn TableService>, audit: AuditTrail) -> Self {
        Self {
            cache,
            tables,
            audit,
        }
    }

    /// The cached table, if any. A corrupt cache value reads as empty.
    pub fn cached(&self) -> Result<Option<TableRef>, VaultError> {
        let raw = self
            .cache
            .get(TABLE_REFERENCE_KEY)
            .map_err(|e| VaultError::Cache(e.to_string()))?;
        Ok(raw.and_then(|raw| match TableRef::parse(&raw) {
            Ok(table) => Some(table),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring invalid cached table reference");
                None
            }
        }))
    }

    pub async fn resolve(&self, owner: Address) -> Result<Resolution, VaultError> {
        if let Some(table) = self.cached()? {
            return Ok(Resolution::Cached(table));
        }

        match self.tables.list_tables_owned_by(owner).await {
            Ok(tables) => match tables.into_iter().next() {
                Some(table) => {
                    self.store(&table)?;
                    tracing::info!(owner = %owner, table = %table, "Found existing vault table");
                    self.audit.record(
                        AuditEvent::new(AuditEventType::TableResolved)
                            .with_owner(owner.to_string())
                            .with_resource("table", table.as_str()),
                    );
                    Ok(Resolution::Discovered(table))
                }
                None => Ok(Resolution::NeedsManualEntry(ManualReason::NoneFound)),
            },
            Err(e) => {
                tracing::warn!(owner = %owner, error = %e, "Vault table discovery failed");
                Ok(Resolution::NeedsManualEntry(ManualReason::DiscoveryFailed(
                    e.to_string(),
                )))
            }
        }
    }

    /// Accept a user-supplied table name and cache it.
    ///
    /// Invalid input is `TableNotFound`; nothing is cached.
    pub fn remember(&self, raw: &str, owner: Option<Address>) -> Result<TableRef, VaultError> {
        let table = TableRef::parse(raw).map_err(|e| {
            tracing::warn!(error = %e, "Rejected manual table name");
            VaultError::TableNotFound
        })?;
        self.store(&table)?;

        let mut event = AuditEvent::new(AuditEventType::TableSetManually)
            .with_resource("table", table.as_str());
        if let Some(owner) = owner {
            event = event.with_owner(owner.to_string());
        }
        self.audit.record(event);
        Ok(table)
    }

    /// Create a fresh vault table owned by `owner` and cache it.
    pub async fn create(&self, owner: Address) -> Result<TableRef, VaultError> {
        let receipt = self
            .tables
            .execute(owner, Statement::CreateVaultTable)
            .await
            .and_then(|outcome| outcome.into_receipt())
            .map_err(VaultError::StorageWriteFailed)?;
        let table = TableRef::parse(&receipt.table).map_err(VaultError::StorageWriteFailed)?;
        self.store(&table)?;

        tracing::info!(owner = %owner, table = %table, "Vault Table Created");
        self.audit.record(
            AuditEvent::new(AuditEventType::TableCreated)
                .with_owner(owner.to_string())
                .with_resource("table", table.as_str())
                .with_details(serde_json::json!({ "transaction_hash": receipt.transaction_hash })),
        );
        Ok(table)
    }

    pub fn forget(&self) -> Result<(), VaultError> {
        self.cache
            .remove(TABLE_REFERENCE_KEY)
            .map_err(|e| VaultError::Cache(e.to_string()))
    }

    fn store(&self, table: &TableRef) -> Result<(), VaultError> {
        self.cache
            .set(TABLE_REFERENCE_KEY, table.as_str())
            .map_err(|e| VaultError::Cache(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryCache;
    use crate::testing::{CountingTables, OWNER};

    fn resolver(tables: Arc<CountingTables>) -> (TableResolver, Arc<MemoryCache>) {
        let cache = Arc::new(MemoryCache::new());
        (
            TableResolver::new(cache.clone(), tables, AuditTrail::disabled()),
            cache,
        )
    }

    #[tokio::test]
    async fn discovery_caches_first_match_and_is_idempotent() {
        let tables = Arc::new(CountingTables::new());
        let first = tables.create_for(OWNER).await;
        tables.create_for(OWNER).await;
        let (resolver, cache) = resolver(tables.clone());

        let resolution = resolver.resolve(OWNER).await.unwrap();
        assert_eq!(resolution, Resolution::Discovered(first.clone()));
        assert_eq!(
            cache.get(TABLE_REFERENCE_KEY).unwrap().as_deref(),
            Some(first.as_str())
        );

        for _ in 0..3 {
            assert_eq!(
                resolver.resolve(OWNER).await.unwrap(),
                Resolution::Cached(first.clone())
            );
        }
        assert_eq!(tables.registry_queries(), 1);
    }

    #[tokio::test]
    async fn empty_registry_needs_manual_entry() {
        let tables = Arc::new(CountingTables::new());
        let (resolver, cache) = resolver(tables);

        assert_eq!(
            resolver.resolve(OWNER).await.unwrap(),
            Resolution::NeedsManualEntry(ManualReason::NoneFound)
        );
        assert_eq!(cache.get(TABLE_REFERENCE_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn registry_errors_need_manual_entry() {
        let tables = Arc::new(CountingTables::new());
        tables.fail_registry(true);
        let (resolver, _) = resolver(tables);

        assert!(matches!(
            resolver.resolve(OWNER).await.unwrap(),
            Resolution::NeedsManualEntry(ManualReason::DiscoveryFailed(_))
        ));
    }

    #[tokio::test]
    async fn manual_names_are_sanitized_and_cached() {
        let tables = Arc::new(CountingTables::new());
        let (resolver, _) = resolver(tables.clone());

        let table = resolver
            .remember(" Vault Table Created: advice_accord_vault_11155111_4 ", Some(OWNER))
            .unwrap();
        assert_eq!(table.as_str(), "advice_accord_vault_11155111_4");
        assert_eq!(resolver.resolve(OWNER).await.unwrap(), Resolution::Cached(table));
        assert_eq!(tables.registry_queries(), 0);

        assert!(matches!(
            resolver.remember("Vault Table Found:", None),
            Err(VaultError::TableNotFound)
        ));
    }

    #[tokio::test]
    async fn create_caches_new_table_and_forget_clears() {
        let tables = Arc::new(CountingTables::new());
        let (resolver, _) = resolver(tables);

        let table = resolver.create(OWNER).await.unwrap();
        assert!(table.is_vault_table());
        assert_eq!(resolver.cached().unwrap(), Some(table));

        resolver.forget().unwrap();
        assert_eq!(resolver.cached().unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_cache_value_is_ignored() {
        let tables = Arc::new(CountingTables::new());
        let (resolver, cache) = resolver(tables);
        cache.set(TABLE_REFERENCE_KEY, "not a table!").unwrap();
        assert_eq!(resolver.cached().unwrap(), None);
    }
}

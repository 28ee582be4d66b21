// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The table/database capability.
//!
//! Vault rows live in a table service that speaks a tiny SQL dialect and
//! signs every write with the caller's address. The trait keeps the vault
//! independent of whether that is a hosted network or the embedded
//! [`RedbTableService`](super::table_database::RedbTableService).

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use super::statement::{Statement, TableRef};
use crate::vault::VaultEntry;

/// Result of a write statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct WriteReceipt {
    /// 0x-prefixed hash identifying the write.
    pub transaction_hash: String,
    /// Table that was written (or created).
    pub table: String,
    /// Row affected by an insert or delete.
    pub row_id: Option<u64>,
}

/// What `execute` returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    Rows(Vec<VaultEntry>),
    Receipt(WriteReceipt),
}

impl ExecOutcome {
    pub fn into_rows(self) -> Result<Vec<VaultEntry>, TableServiceError> {
        match self {
            ExecOutcome::Rows(rows) => Ok(rows),
            ExecOutcome::Receipt(_) => Err(TableServiceError::UnexpectedOutcome("receipt")),
        }
    }

    pub fn into_receipt(self) -> Result<WriteReceipt, TableServiceError> {
        match self {
            ExecOutcome::Receipt(receipt) => Ok(receipt),
            ExecOutcome::Rows(_) => Err(TableServiceError::UnexpectedOutcome("rows")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TableServiceError {
    #[error("invalid table name: {0:?}")]
    InvalidTableName(String),

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("{caller} may not write to {table}")]
    PermissionDenied { caller: String, table: String },

    #[error("unexpected {0} from table service")]
    UnexpectedOutcome(&'static str),

    #[error("table service error: {0}")]
    Backend(String),
}

/// Storage capability for vault tables.
#[async_trait]
pub trait TableService: Send + Sync {
    /// Run one statement on behalf of `caller`.
    async fn execute(
        &self,
        caller: Address,
        statement: Statement,
    ) -> Result<ExecOutcome, TableServiceError>;

    /// Vault tables owned by `owner`, oldest first.
    async fn list_tables_owned_by(&self, owner: Address)
        -> Result<Vec<TableRef>, TableServiceError>;

    /// Readiness check.
    async fn ping(&self) -> Result<(), TableServiceError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_accessors_reject_the_other_shape() {
        let rows = ExecOutcome::Rows(Vec::new());
        assert!(matches!(
            rows.clone().into_receipt(),
            Err(TableServiceError::UnexpectedOutcome("rows"))
        ));
        assert!(rows.into_rows().unwrap().is_empty());

        let receipt = ExecOutcome::Receipt(WriteReceipt {
            transaction_hash: "0x01".to_string(),
            table: "t".to_string(),
            row_id: Some(1),
        });
        assert!(receipt.clone().into_rows().is_err());
        assert_eq!(receipt.into_receipt().unwrap().row_id, Some(1));
    }
}

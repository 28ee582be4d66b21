// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Typed SQL statements understood by the table service.
//!
//! The vault only ever issues four statements. Keeping them as an enum
//! means every backend can match on intent while the SQL text and bound
//! parameters stay available for logging and for SQL-speaking backends.

use serde::{Deserialize, Serialize};

use super::table_service::TableServiceError;

/// Prefix shared by every vault table name.
pub const VAULT_TABLE_PREFIX: &str = "advice_accord_vault";

/// Column list used when creating a vault table.
pub const VAULT_TABLE_SCHEMA: &str =
    "id integer primary key, owner text, encrypted_metadata text, created_at integer";

/// Log prefixes users tend to paste along with the table name.
const PASTE_PREFIXES: &[&str] = &["Vault Table Created:", "Vault Table Found:"];

/// Name of a vault table (`advice_accord_vault_{chain}_{n}` when created here).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableRef(String);

impl TableRef {
    /// Parse a table name, tolerating pasted log prefixes and whitespace.
    pub fn parse(raw: &str) -> Result<Self, TableServiceError> {
        let name = sanitize(raw);
        if is_identifier(&name) {
            Ok(Self(name))
        } else {
            Err(TableServiceError::InvalidTableName(raw.trim().to_string()))
        }
    }

    /// Name for the `seq`-th table created on `chain_id`.
    pub fn vault_table(chain_id: u64, seq: u64) -> Self {
        Self(format!("{VAULT_TABLE_PREFIX}_{chain_id}_{seq}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for names produced by [`TableRef::vault_table`].
    pub fn is_vault_table(&self) -> bool {
        self.0
            .strip_prefix(VAULT_TABLE_PREFIX)
            .is_some_and(|rest| rest.starts_with('_'))
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip pasted prefixes and surrounding whitespace.
pub fn sanitize(raw: &str) -> String {
    let mut name = raw.trim();
    for prefix in PASTE_PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix) {
            name = rest.trim();
        }
    }
    name.to_string()
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A bound SQL parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Integer(i64),
    Text(String),
}

/// The statements a vault issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Create a new vault table owned by the caller.
    CreateVaultTable,
    /// Insert one entry; the storage assigns the id.
    InsertEntry {
        table: TableRef,
        owner: String,
        encrypted_metadata: String,
        created_at: i64,
    },
    /// Rows whose owner equals `owner`, case-insensitively.
    SelectByOwner { table: TableRef, owner: String },
    /// Remove one row by id.
    DeleteById { table: TableRef, id: u64 },
}

impl Statement {
    /// Target table, if the statement addresses an existing one.
    pub fn table(&self) -> Option<&TableRef> {
        match self {
            Statement::CreateVaultTable => None,
            Statement::InsertEntry { table, .. }
            | Statement::SelectByOwner { table, .. }
            | Statement::DeleteById { table, .. } => Some(table),
        }
    }

    /// Whether the statement mutates state (and so needs write permission).
    pub fn is_write(&self) -> bool {
        !matches!(self, Statement::SelectByOwner { .. })
    }

    /// SQL text with `?` placeholders.
    pub fn sql(&self) -> String {
        match self {
            Statement::CreateVaultTable => {
                format!("CREATE TABLE {VAULT_TABLE_PREFIX} ({VAULT_TABLE_SCHEMA})")
            }
            Statement::InsertEntry { table, .. } => format!(
                "INSERT INTO {table} (owner, encrypted_metadata, created_at) VALUES (?, ?, ?)"
            ),
            Statement::SelectByOwner { table, .. } => {
                format!("SELECT * FROM {table} WHERE lower(owner) = lower(?)")
            }
            Statement::DeleteById { table, .. } => format!("DELETE FROM {table} WHERE id = ?"),
        }
    }

    /// Parameters bound to the placeholders of [`Statement::sql`], in order.
    pub fn params(&self) -> Vec<SqlValue> {
        match self {
            Statement::CreateVaultTable => Vec::new(),
            Statement::InsertEntry {
                owner,
                encrypted_metadata,
                created_at,
                ..
            } => vec![
                SqlValue::Text(owner.clone()),
                SqlValue::Text(encrypted_metadata.clone()),
                SqlValue::Integer(*created_at),
            ],
            Statement::SelectByOwner { owner, .. } => vec![SqlValue::Text(owner.clone())],
            Statement::DeleteById { id, .. } => {
                vec![SqlValue::Integer(i64::try_from(*id).unwrap_or(i64::MAX))]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_strips_pasted_prefixes() {
        let table = TableRef::parse("  Vault Table Created: advice_accord_vault_11155111_42 ").unwrap();
        assert_eq!(table.as_str(), "advice_accord_vault_11155111_42");

        let table = TableRef::parse("Vault Table Found:advice_accord_vault_11155111_3").unwrap();
        assert_eq!(table.as_str(), "advice_accord_vault_11155111_3");
        assert!(table.is_vault_table());
    }

    #[test]
    fn parse_rejects_non_identifiers() {
        for bad in ["", "   ", "Vault Table Found:", "1table", "t; DROP TABLE x", "my-table"] {
            assert!(
                matches!(TableRef::parse(bad), Err(TableServiceError::InvalidTableName(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn vault_table_names_follow_chain_and_sequence() {
        let table = TableRef::vault_table(11155111, 9);
        assert_eq!(table.to_string(), "advice_accord_vault_11155111_9");
        assert!(!TableRef::parse("other_table").unwrap().is_vault_table());
    }

    #[test]
    fn sql_text_and_params_line_up() {
        let table = TableRef::vault_table(11155111, 1);
        let insert = Statement::InsertEntry {
            table: table.clone(),
            owner: "0xabc".to_string(),
            encrypted_metadata: "{}".to_string(),
            created_at: 1_700_000_000_000,
        };
        assert_eq!(
            insert.sql(),
            "INSERT INTO advice_accord_vault_11155111_1 (owner, encrypted_metadata, created_at) VALUES (?, ?, ?)"
        );
        assert_eq!(insert.sql().matches('?').count(), insert.params().len());
        assert!(insert.is_write());

        let select = Statement::SelectByOwner {
            table: table.clone(),
            owner: "0xABC".to_string(),
        };
        assert!(select.sql().contains("lower(owner) = lower(?)"));
        assert!(!select.is_write());

        let delete = Statement::DeleteById { table, id: 5 };
        assert_eq!(delete.params(), vec![SqlValue::Integer(5)]);

        assert_eq!(
            Statement::CreateVaultTable.sql(),
            "CREATE TABLE advice_accord_vault (id integer primary key, owner text, encrypted_metadata text, created_at integer)"
        );
        assert!(Statement::CreateVaultTable.table().is_none());
    }
}

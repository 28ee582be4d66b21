// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Entry metadata: what uploads write and how listing reads it back.
//!
//! Uploads always write [`UploadMetadata`] as a JSON object. Rows written by
//! older clients may hold a bare content hash or broken JSON, so reading goes
//! through [`Metadata::parse`], which never fails.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::category::Category;
use crate::blockchain::VaultEntryData;

/// Metadata written for every upload. Immutable once serialized.
///
/// Field order is part of the stored format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadMetadata {
    pub name: String,
    /// Content hash reported by the encryption network.
    pub hash: String,
    /// MIME type of the original file.
    #[serde(rename = "type")]
    pub file_type: String,
    /// Size in bytes.
    pub size: u64,
    pub category: Category,
    /// ISO-8601 upload time (also part of the signed record).
    pub timestamp: String,
    /// EIP-712 signature over `eip712_data`.
    pub signature: String,
    pub eip712_data: VaultEntryData,
}

impl UploadMetadata {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Fields recovered from a structured metadata object. Everything is
/// optional because old rows carry arbitrary subsets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFields {
    pub name: Option<String>,
    pub hash: Option<String>,
    pub file_type: Option<String>,
    pub size: Option<u64>,
    pub category: Option<String>,
    pub timestamp: Option<String>,
    pub signature: Option<String>,
    pub eip712_data: Option<VaultEntryData>,
}

impl MetadataFields {
    fn from_map(map: &Map<String, Value>) -> Self {
        let text = |key: &str| match map.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        let size = match map.get("size") {
            Some(Value::Number(n)) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };

        Self {
            name: text("name"),
            hash: text("hash"),
            file_type: text("type"),
            size: size.filter(|s| *s > 0),
            category: text("category"),
            timestamp: text("timestamp"),
            signature: text("signature"),
            eip712_data: map
                .get("eip712_data")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
        }
    }
}

/// Parsed form of `VaultEntry::encrypted_metadata`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metadata {
    /// A JSON object.
    Structured(MetadataFields),
    /// Not JSON at all (typically a bare content hash).
    Legacy(String),
    /// Looked like a JSON object but did not parse as one.
    Malformed(String),
}

impl Metadata {
    pub fn parse(raw: &str) -> Metadata {
        if !raw.trim_start().starts_with('{') {
            return Metadata::Legacy(raw.to_string());
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Metadata::Structured(MetadataFields::from_map(&map)),
            Ok(_) => Metadata::Malformed(raw.to_string()),
            Err(e) => {
                tracing::debug!(error = %e, "Entry metadata is not valid JSON");
                Metadata::Malformed(raw.to_string())
            }
        }
    }

    /// Category for grouping.
    ///
    /// Missing, empty or explicit `Uncategorized` labels and rows that are
    /// not structured records are uncategorized. A label outside the known
    /// set is `None` and belongs to no category.
    pub fn categorize(&self) -> Option<Category> {
        match self {
            Metadata::Structured(fields) => match fields.category.as_deref().map(str::trim) {
                None | Some("") => Some(Category::Uncategorized),
                Some(label) => label.parse().ok(),
            },
            Metadata::Legacy(_) | Metadata::Malformed(_) => Some(Category::Uncategorized),
        }
    }

    /// Category label for display: the stored label, or `Uncategorized`.
    pub fn category_label(&self) -> String {
        match (self.categorize(), self.fields().and_then(|f| f.category.as_deref())) {
            (Some(category), _) => category.label().to_string(),
            (None, Some(raw)) => raw.trim().to_string(),
            (None, None) => Category::Uncategorized.label().to_string(),
        }
    }

    pub fn fields(&self) -> Option<&MetadataFields> {
        match self {
            Metadata::Structured(fields) => Some(fields),
            _ => None,
        }
    }

    /// Display name, falling back to `Doc #{id}`.
    pub fn display_name(&self, id: u64) -> String {
        self.fields()
            .and_then(|f| f.name.clone())
            .unwrap_or_else(|| format!("Doc #{id}"))
    }

    /// Content hash, falling back to the raw metadata string.
    pub fn display_hash(&self, raw: &str) -> String {
        self.fields()
            .and_then(|f| f.hash.clone())
            .unwrap_or_else(|| raw.to_string())
    }

    /// Size in megabytes with two decimals (`"2.00 MB"`), if known.
    pub fn display_size(&self) -> Option<String> {
        self.fields()
            .and_then(|f| f.size)
            .map(|bytes| format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0))
    }
}

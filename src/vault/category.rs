// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Document categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Who a document is shared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Category {
    Uncategorized,
    Lawyers,
    Accountants,
    Realtors,
    #[serde(rename = "Financial Advisors")]
    FinancialAdvisors,
    #[serde(rename = "Business Consultants")]
    BusinessConsultants,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Uncategorized,
        Category::Lawyers,
        Category::Accountants,
        Category::Realtors,
        Category::FinancialAdvisors,
        Category::BusinessConsultants,
    ];

    /// Label as stored in metadata and shown to users.
    pub fn label(self) -> &'static str {
        match self {
            Category::Uncategorized => "Uncategorized",
            Category::Lawyers => "Lawyers",
            Category::Accountants => "Accountants",
            Category::Realtors => "Realtors",
            Category::FinancialAdvisors => "Financial Advisors",
            Category::BusinessConsultants => "Business Consultants",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownCategory(trimmed.to_string()))
    }
}

/// List filter: everything, or one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// `None` is a label outside the known set; only `All` shows it.
    pub fn matches(self, category: Option<Category>) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => category == Some(wanted),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            s.parse().map(CategoryFilter::Only)
        }
    }
}

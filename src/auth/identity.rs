// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The identity the vault acts for.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Wallet identity as reported by the login capability. Read-only for the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Checksummed wallet address, empty when not connected.
    #[schema(example = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")]
    pub address: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_authenticated: bool,
}

impl Identity {
    pub fn authenticated(
        address: Address,
        display_name: Option<String>,
        avatar_url: Option<String>,
    ) -> Self {
        Self {
            address: address.to_checksum(None),
            display_name,
            avatar_url,
            is_authenticated: true,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            address: String::new(),
            display_name: None,
            avatar_url: None,
            is_authenticated: false,
        }
    }
}

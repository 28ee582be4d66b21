// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM primitives used by the vault.
//!
//! This module provides functionality for:
//! - Reading the wallet's active chain id and guarding the target network
//! - EIP-712 typed signatures over vault entries
//! - EIP-4361 login statements for the encryption network
//! - Loading signing keys from PEM

pub mod client;
pub mod eip712;
pub mod signing;
pub mod siwe;
pub mod types;

pub use client::{ActiveNetwork, ChainClient, ChainError};
pub use eip712::{vault_domain, verify_vault_entry, VaultEntryData};
pub use siwe::LoginMessage;
pub use types::*;

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity/signing capability.
//!
//! `IdentityProvider::connect` yields a `WalletSession`, the signing handle
//! the vault uses for the login statement and the EIP-712 entry signature.

use std::sync::Arc;

use alloy::{primitives::Address, sol_types::Eip712Domain};
use async_trait::async_trait;

use super::{Identity, SessionError};
use crate::blockchain::VaultEntryData;

/// A connected wallet.
#[async_trait]
pub trait WalletSession: Send + Sync {
    fn identity(&self) -> Identity;

    fn address(&self) -> Address;

    /// Personal-sign `message`; returns 0x-prefixed signature hex.
    async fn sign_message(&self, message: &str) -> Result<String, SessionError>;

    /// EIP-712 sign `data` under `domain`; returns 0x-prefixed signature hex.
    async fn sign_typed_data(
        &self,
        domain: &Eip712Domain,
        data: &VaultEntryData,
    ) -> Result<String, SessionError>;

    /// Chain the wallet is currently connected to.
    async fn chain_id(&self) -> Result<u64, SessionError>;
}

/// Login capability.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Connect (or reconnect) and return the active session.
    async fn connect(&self) -> Result<Arc<dyn WalletSession>, SessionError>;

    /// Current session, if connected.
    fn session(&self) -> Option<Arc<dyn WalletSession>>;

    fn disconnect(&self);

    /// Identity of the current session, anonymous when disconnected.
    fn identity(&self) -> Identity {
        self.session()
            .map(|s| s.identity())
            .unwrap_or_else(Identity::anonymous)
    }
}

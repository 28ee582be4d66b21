// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet backed by a local secp256k1 key.

use std::sync::{Arc, RwLock};

use alloy::{
    primitives::Address,
    signers::{local::PrivateKeySigner, Signer},
    sol_types::Eip712Domain,
};
use async_trait::async_trait;

use super::{Identity, IdentityProvider, SessionError, WalletSession};
use crate::blockchain::{eip712::encode_signature, ActiveNetwork, VaultEntryData};

/// Display profile attached to the local identity.
#[derive(Debug, Clone, Default)]
pub struct WalletProfile {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Session over a local signer.
pub struct LocalWalletSession {
    signer: PrivateKeySigner,
    network: Arc<ActiveNetwork>,
    profile: WalletProfile,
}

impl LocalWalletSession {
    pub fn new(signer: PrivateKeySigner, network: Arc<ActiveNetwork>, profile: WalletProfile) -> Self {
        Self {
            signer,
            network,
            profile,
        }
    }
}

#[async_trait]
impl WalletSession for LocalWalletSession {
    fn identity(&self) -> Identity {
        Identity::authenticated(
            self.signer.address(),
            self.profile.display_name.clone(),
            self.profile.avatar_url.clone(),
        )
    }

    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn sign_message(&self, message: &str) -> Result<String, SessionError> {
        let signature = self
            .signer
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| SessionError::Provider(e.to_string()))?;
        Ok(encode_signature(&signature))
    }

    async fn sign_typed_data(
        &self,
        domain: &Eip712Domain,
        data: &VaultEntryData,
    ) -> Result<String, SessionError> {
        let signature = self
            .signer
            .sign_hash(&data.signing_hash(domain))
            .await
            .map_err(|e| SessionError::Provider(e.to_string()))?;
        Ok(encode_signature(&signature))
    }

    async fn chain_id(&self) -> Result<u64, SessionError> {
        self.network
            .chain_id()
            .await
            .map_err(|e| SessionError::Provider(e.to_string()))
    }
}

/// Identity provider holding at most one local key.
pub struct LocalWalletProvider {
    signer: Option<PrivateKeySigner>,
    network: Arc<ActiveNetwork>,
    profile: WalletProfile,
    current: RwLock<Option<Arc<LocalWalletSession>>>,
}

impl LocalWalletProvider {
    /// `signer = None` yields a provider that can never connect.
    pub fn new(
        signer: Option<PrivateKeySigner>,
        network: ActiveNetwork,
        profile: WalletProfile,
    ) -> Self {
        Self {
            signer,
            network: Arc::new(network),
            profile,
            current: RwLock::new(None),
        }
    }
}

#[async_trait]
impl IdentityProvider for LocalWalletProvider {
    async fn connect(&self) -> Result<Arc<dyn WalletSession>, SessionError> {
        let signer = self
            .signer
            .clone()
            .ok_or_else(|| SessionError::NotConnected("no signing key configured".to_string()))?;

        let session = Arc::new(LocalWalletSession::new(
            signer,
            self.network.clone(),
            self.profile.clone(),
        ));
        tracing::info!(
            address = %session.address(),
            network = %self.network.describe(),
            "Wallet connected"
        );

        let mut current = self
            .current
            .write()
            .map_err(|_| SessionError::Provider("session lock poisoned".to_string()))?;
        *current = Some(session.clone());
        Ok(session)
    }

    fn session(&self) -> Option<Arc<dyn WalletSession>> {
        let current = self.current.read().ok()?;
        current
            .as_ref()
            .map(|s| s.clone() as Arc<dyn WalletSession>)
    }

    fn disconnect(&self) {
        if let Ok(mut current) = self.current.write() {
            if current.take().is_some() {
                tracing::info!("Wallet disconnected");
            }
        }
    }
}

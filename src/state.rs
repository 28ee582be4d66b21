// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::{IdentityProvider, LocalWalletProvider, WalletProfile};
use crate::blockchain::{signing::signer_from_pem_file, ActiveNetwork, ChainClient, ChainError};
use crate::config::{SignerSource, VaultConfig};
use crate::encryption::{EncryptionError, LocalEncryptionNode};
use crate::storage::{
    table_database::TableDbError, AuditTrail, LocalStorage, RedbTableService, StorageError,
    StoragePaths,
};
use crate::vault::{
    RefreshBus, TableResolver, UploadOrchestrator, VaultContext, VaultList, VaultSettings,
};

/// Failures while wiring the services at startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("data directory: {0}")]
    Storage(#[from] StorageError),

    #[error("table database: {0}")]
    Tables(#[from] TableDbError),

    #[error("wallet: {0}")]
    Chain(#[from] ChainError),

    #[error("encryption node: {0}")]
    Encryption(#[from] EncryptionError),
}

#[derive(Clone)]
pub struct AppState {
    pub vault: VaultContext,
    pub upload: Arc<UploadOrchestrator>,
    pub list: Arc<VaultList>,
    pub storage: Arc<LocalStorage>,
}

impl AppState {
    pub fn new(vault: VaultContext, storage: Arc<LocalStorage>) -> Self {
        Self {
            upload: Arc::new(UploadOrchestrator::new(vault.clone())),
            list: Arc::new(VaultList::new(vault.clone())),
            vault,
            storage,
        }
    }

    /// Build every capability from configuration and connect the wallet if
    /// a key is configured.
    pub async fn from_config(config: &VaultConfig) -> Result<Self, StartupError> {
        let mut storage = LocalStorage::new(StoragePaths::new(&config.data_dir));
        storage.initialize()?;
        let storage = Arc::new(storage);

        let tables = Arc::new(RedbTableService::open(
            &storage.paths().tables_db(),
            config.target_chain_id,
        )?);

        let network = match &config.rpc_url {
            Some(url) => ActiveNetwork::Rpc(ChainClient::new(url)?),
            None => ActiveNetwork::Fixed(config.wallet_chain_id),
        };
        let signer = match &config.signer {
            Some(SignerSource::PemFile(path)) => Some(signer_from_pem_file(path)?),
            Some(SignerSource::Hex(key)) => Some(ChainClient::create_signer(key)?),
            None => None,
        };
        let identity = Arc::new(LocalWalletProvider::new(
            signer,
            network,
            WalletProfile {
                display_name: config.display_name.clone(),
                avatar_url: config.avatar_url.clone(),
            },
        ));
        if let Err(e) = identity.connect().await {
            warn!(error = %e, "Starting without a connected wallet");
        }

        let encryption = match &config.encryption_secret {
            Some(secret) => LocalEncryptionNode::from_hex(secret)?,
            None => {
                warn!("ENCRYPTION_NODE_SECRET not set; ciphertexts will not survive a restart");
                LocalEncryptionNode::ephemeral()
            }
        };

        let audit = AuditTrail::new(storage.clone());
        let resolver = Arc::new(TableResolver::new(
            storage.clone(),
            tables.clone(),
            audit.clone(),
        ));

        info!(
            data_dir = %config.data_dir.display(),
            target_chain_id = config.target_chain_id,
            origin = %config.origin,
            "Vault services initialized"
        );

        let vault = VaultContext {
            identity,
            encryption: Arc::new(encryption),
            tables,
            resolver,
            bus: RefreshBus::new(),
            audit,
            settings: VaultSettings {
                target_chain_id: config.target_chain_id,
                origin: config.origin.clone(),
            },
        };
        Ok(Self::new(vault, storage))
    }
}

#[cfg(test)]
impl AppState {
    /// State over the test doubles, with on-disk storage in `dir`.
    pub(crate) fn for_tests(harness: &crate::testing::Harness, dir: &std::path::Path) -> Self {
        let mut storage = LocalStorage::new(StoragePaths::new(dir));
        storage.initialize().unwrap();
        Self::new(harness.ctx.clone(), Arc::new(storage))
    }
}

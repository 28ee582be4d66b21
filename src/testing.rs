// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Test doubles for the vault capabilities.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use alloy::{
    primitives::{address, Address},
    signers::{local::PrivateKeySigner, Signer},
    sol_types::Eip712Domain,
};
use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::oneshot;

use crate::auth::{Identity, IdentityProvider, SessionError, WalletSession};
use crate::blockchain::{eip712::encode_signature, VaultEntryData, DEFAULT_TARGET_CHAIN_ID};
use crate::encryption::LocalEncryptionNode;
use crate::storage::{
    AuditTrail, ExecOutcome, MemoryCache, RedbTableService, Statement, TableRef, TableService,
    TableServiceError,
};
use crate::vault::{RefreshBus, TableResolver, VaultContext, VaultSettings};

/// Anvil account #0.
pub const OWNER_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const OWNER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

/// Anvil account #1.
pub const OTHER_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
pub const OTHER: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

/// Session over a real key with switches for declining and for the
/// reported chain.
pub struct FakeSession {
    signer: PrivateKeySigner,
    chain_id: AtomicU64,
    decline_login: AtomicBool,
    decline_typed_data: AtomicBool,
    signature_requests: AtomicUsize,
    network_gate: tokio::sync::RwLock<()>,
}

impl FakeSession {
    pub fn new(key: &str) -> Self {
        Self {
            signer: key.parse().expect("valid test key"),
            chain_id: AtomicU64::new(DEFAULT_TARGET_CHAIN_ID),
            decline_login: AtomicBool::new(false),
            decline_typed_data: AtomicBool::new(false),
            signature_requests: AtomicUsize::new(0),
            network_gate: tokio::sync::RwLock::new(()),
        }
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.chain_id.store(chain_id, Ordering::SeqCst);
    }

    pub fn decline_login(&self, decline: bool) {
        self.decline_login.store(decline, Ordering::SeqCst);
    }

    pub fn decline_typed_data(&self, decline: bool) {
        self.decline_typed_data.store(decline, Ordering::SeqCst);
    }

    /// Block every `chain_id` call until the guard is dropped.
    pub async fn hold_network(&self) -> tokio::sync::RwLockWriteGuard<'_, ()> {
        self.network_gate.write().await
    }

    /// Signature prompts shown so far, declined ones included.
    pub fn signature_requests(&self) -> usize {
        self.signature_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletSession for FakeSession {
    fn identity(&self) -> Identity {
        Identity::authenticated(self.signer.address(), Some("Test Advisor".to_string()), None)
    }

    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn sign_message(&self, message: &str) -> Result<String, SessionError> {
        self.signature_requests.fetch_add(1, Ordering::SeqCst);
        if self.decline_login.load(Ordering::SeqCst) {
            return Err(SessionError::Rejected);
        }
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
        self.signature_requests.fetch_add(1, Ordering::SeqCst);
        if self.decline_typed_data.load(Ordering::SeqCst) {
            return Err(SessionError::Rejected);
        }
        let signature = self
            .signer
            .sign_hash(&data.signing_hash(domain))
            .await
            .map_err(|e| SessionError::Provider(e.to_string()))?;
        Ok(encode_signature(&signature))
    }

    async fn chain_id(&self) -> Result<u64, SessionError> {
        let _open = self.network_gate.read().await;
        Ok(self.chain_id.load(Ordering::SeqCst))
    }
}

/// Identity provider whose session the test controls.
pub struct FakeIdentity {
    current: RwLock<Option<Arc<FakeSession>>>,
}

impl FakeIdentity {
    pub fn signed_in(session: Arc<FakeSession>) -> Self {
        Self {
            current: RwLock::new(Some(session)),
        }
    }

    pub fn sign_out(&self) {
        *self.current.write().unwrap() = None;
    }

    /// Replace the session with one for a different account.
    pub fn switch_to(&self, address: Address) {
        let key = if address == OTHER { OTHER_KEY } else { OWNER_KEY };
        *self.current.write().unwrap() = Some(Arc::new(FakeSession::new(key)));
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn connect(&self) -> Result<Arc<dyn WalletSession>, SessionError> {
        self.session()
            .ok_or_else(|| SessionError::NotConnected("signed out".to_string()))
    }

    fn session(&self) -> Option<Arc<dyn WalletSession>> {
        self.current
            .read()
            .unwrap()
            .as_ref()
            .map(|s| s.clone() as Arc<dyn WalletSession>)
    }

    fn disconnect(&self) {
        self.sign_out();
    }
}

/// Redb-backed table service that counts registry lookups and can be told
/// to fail.
pub struct CountingTables {
    inner: RedbTableService,
    _dir: TempDir,
    registry_queries: AtomicUsize,
    fail_registry: AtomicBool,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    read_gate: Mutex<Option<oneshot::Receiver<()>>>,
    stalled_reads: AtomicUsize,
}

impl CountingTables {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let inner =
            RedbTableService::open(&dir.path().join("tables.redb"), DEFAULT_TARGET_CHAIN_ID)
                .unwrap();
        Self {
            inner,
            _dir: dir,
            registry_queries: AtomicUsize::new(0),
            fail_registry: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            read_gate: Mutex::new(None),
            stalled_reads: AtomicUsize::new(0),
        }
    }

    /// Create a vault table for `owner`, bypassing the failure switches.
    pub async fn create_for(&self, owner: Address) -> TableRef {
        let receipt = self
            .inner
            .execute(owner, Statement::CreateVaultTable)
            .await
            .unwrap()
            .into_receipt()
            .unwrap();
        TableRef::parse(&receipt.table).unwrap()
    }

    pub fn registry_queries(&self) -> usize {
        self.registry_queries.load(Ordering::SeqCst)
    }

    pub fn fail_registry(&self, fail: bool) {
        self.fail_registry.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// The next read computes its rows, then waits for the returned sender
    /// before handing them back.
    pub fn hold_next_read(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.read_gate.lock().unwrap() = Some(rx);
        tx
    }

    /// Reads that have stopped at a held gate so far.
    pub fn stalled_reads(&self) -> usize {
        self.stalled_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TableService for CountingTables {
    async fn execute(
        &self,
        caller: Address,
        statement: Statement,
    ) -> Result<ExecOutcome, TableServiceError> {
        let failing = if statement.is_write() {
            &self.fail_writes
        } else {
            &self.fail_reads
        };
        if failing.load(Ordering::SeqCst) {
            return Err(TableServiceError::Backend("gateway timeout".to_string()));
        }
        let is_read = !statement.is_write();
        let outcome = self.inner.execute(caller, statement).await;
        if is_read {
            let gate = self.read_gate.lock().unwrap().take();
            if let Some(gate) = gate {
                self.stalled_reads.fetch_add(1, Ordering::SeqCst);
                let _ = gate.await;
            }
        }
        outcome
    }

    async fn list_tables_owned_by(
        &self,
        owner: Address,
    ) -> Result<Vec<TableRef>, TableServiceError> {
        self.registry_queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_registry.load(Ordering::SeqCst) {
            return Err(TableServiceError::Backend("connection refused".to_string()));
        }
        self.inner.list_tables_owned_by(owner).await
    }
}

/// Fully wired vault context over test doubles, signed in as [`OWNER`].
pub struct Harness {
    pub ctx: VaultContext,
    pub session: Arc<FakeSession>,
    pub identity: Arc<FakeIdentity>,
    pub tables: Arc<CountingTables>,
    pub cache: Arc<MemoryCache>,
}

impl Harness {
    pub async fn new() -> Self {
        let session = Arc::new(FakeSession::new(OWNER_KEY));
        let identity = Arc::new(FakeIdentity::signed_in(session.clone()));
        let tables = Arc::new(CountingTables::new());
        let cache = Arc::new(MemoryCache::new());
        let resolver = Arc::new(TableResolver::new(
            cache.clone(),
            tables.clone(),
            AuditTrail::disabled(),
        ));

        let ctx = VaultContext {
            identity: identity.clone(),
            encryption: Arc::new(LocalEncryptionNode::ephemeral()),
            tables: tables.clone(),
            resolver,
            bus: RefreshBus::new(),
            audit: AuditTrail::disabled(),
            settings: VaultSettings {
                target_chain_id: DEFAULT_TARGET_CHAIN_ID,
                origin: url::Url::parse("http://localhost:3000").unwrap(),
            },
        };

        Self {
            ctx,
            session,
            identity,
            tables,
            cache,
        }
    }
}

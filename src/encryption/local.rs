// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process encryption node.
//!
//! Mirrors what a threshold encryption network does for the vault, with a
//! single node secret instead of key shares:
//!
//! - nonces are issued by the node and remembered in a bounded LRU
//! - auth signatures must recover to the claimed address, carry an issued
//!   nonce and be unexpired
//! - the symmetric key is `HMAC-SHA256(secret, conditions || content_hash)`,
//!   so the same conditions and plaintext hash always derive the same key
//! - ciphertext is `nonce(24) || XChaCha20-Poly1305(data)` with the content
//!   hash as associated data

use std::num::NonZeroUsize;
use std::sync::Mutex;

use alloy::primitives::Address;
use async_trait::async_trait;
use chacha20poly1305::aead::{Aead, Payload};
use chacha20poly1305::{KeyInit, XChaCha20Poly1305, XNonce};
use chrono::Utc;
use hmac::{Hmac, Mac};
use lru::LruCache;
use rand::RngCore;
use sha2::{Digest, Sha256};

use super::{AccessCondition, AuthSig, EncryptedPayload, EncryptionError, EncryptionNetwork};
use crate::blockchain::LoginMessage;

type HmacSha256 = Hmac<Sha256>;

const NONCE_CAPACITY: usize = 1024;
const XNONCE_LEN: usize = 24;

/// Hex SHA-256 of `data`.
pub fn content_hash(data: &[u8]) -> String {
    alloy::hex::encode(Sha256::digest(data))
}

/// Single-secret encryption node.
pub struct LocalEncryptionNode {
    secret: [u8; 32],
    issued: Mutex<LruCache<String, ()>>,
}

impl LocalEncryptionNode {
    pub fn new(secret: [u8; 32]) -> Self {
        Self {
            secret,
            issued: Mutex::new(LruCache::new(
                NonZeroUsize::new(NONCE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    /// Node with a random secret; ciphertexts do not survive a restart.
    pub fn ephemeral() -> Self {
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self::new(secret)
    }

    /// Parse a 32-byte hex secret (optional 0x prefix).
    pub fn from_hex(secret: &str) -> Result<Self, EncryptionError> {
        let bytes = alloy::hex::decode(secret.trim())
            .map_err(|e| EncryptionError::Cipher(format!("invalid node secret: {e}")))?;
        let secret: [u8; 32] = bytes
            .try_into()
            .map_err(|_| EncryptionError::Cipher("node secret must be 32 bytes".to_string()))?;
        Ok(Self::new(secret))
    }

    fn was_issued(&self, nonce: &str) -> bool {
        self.issued
            .lock()
            .map(|mut issued| issued.get(nonce).is_some())
            .unwrap_or(false)
    }

    /// Validate an auth signature and return the address it proves.
    fn verify_auth_sig(&self, auth_sig: &AuthSig) -> Result<Address, EncryptionError> {
        let claimed: Address = auth_sig
            .address
            .parse()
            .map_err(|_| EncryptionError::InvalidAuthSig("malformed address".to_string()))?;

        let message = LoginMessage::parse(&auth_sig.signed_message)
            .map_err(|e| EncryptionError::InvalidAuthSig(e.to_string()))?;
        let recovered = message
            .recover(&auth_sig.sig)
            .map_err(|e| EncryptionError::InvalidAuthSig(e.to_string()))?;

        if recovered != claimed || message.address != claimed {
            return Err(EncryptionError::InvalidAuthSig(
                "signature does not match address".to_string(),
            ));
        }
        if !self.was_issued(&message.nonce) {
            return Err(EncryptionError::UnknownNonce);
        }
        if message.is_expired(Utc::now()) {
            return Err(EncryptionError::Expired);
        }
        Ok(recovered)
    }

    fn derive_key(
        &self,
        conditions: &[AccessCondition],
        content_hash: &str,
    ) -> Result<XChaCha20Poly1305, EncryptionError> {
        let conditions_json =
            serde_json::to_vec(conditions).map_err(|e| EncryptionError::Cipher(e.to_string()))?;
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.secret)
            .map_err(|e| EncryptionError::Cipher(e.to_string()))?;
        mac.update(&conditions_json);
        mac.update(content_hash.as_bytes());
        let key = mac.finalize().into_bytes();

        XChaCha20Poly1305::new_from_slice(&key).map_err(|e| EncryptionError::Cipher(e.to_string()))
    }
}

#[async_trait]
impl EncryptionNetwork for LocalEncryptionNode {
    async fn nonce(&self) -> Result<String, EncryptionError> {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        let nonce = alloy::hex::encode(bytes);

        let mut issued = self
            .issued
            .lock()
            .map_err(|_| EncryptionError::Unavailable("nonce store poisoned".to_string()))?;
        issued.put(nonce.clone(), ());
        Ok(nonce)
    }

    async fn encrypt(
        &self,
        data: &[u8],
        owner: Address,
        auth_sig: &AuthSig,
        conditions: &[AccessCondition],
    ) -> Result<EncryptedPayload, EncryptionError> {
        let requester = self.verify_auth_sig(auth_sig)?;
        if requester != owner {
            return Err(EncryptionError::InvalidAuthSig(
                "auth signature is not from the owner".to_string(),
            ));
        }
        if conditions.is_empty() || !conditions.iter().all(|c| c.permits(owner)) {
            return Err(EncryptionError::AccessDenied);
        }

        let hash = content_hash(data);
        let cipher = self.derive_key(conditions, &hash)?;

        let mut nonce = [0u8; XNONCE_LEN];
        rand::rng().fill_bytes(&mut nonce);
        let sealed = cipher
            .encrypt(
                XNonce::from_slice(&nonce),
                Payload {
                    msg: data,
                    aad: hash.as_bytes(),
                },
            )
            .map_err(|e| EncryptionError::Cipher(e.to_string()))?;

        let mut blob = Vec::with_capacity(XNONCE_LEN + sealed.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&sealed);

        tracing::debug!(owner = %owner, bytes = data.len(), "Encrypted document");
        Ok(EncryptedPayload {
            ciphertext: alloy::hex::encode(blob),
            content_hash: hash,
            access_conditions: conditions.to_vec(),
        })
    }

    async fn decrypt(
        &self,
        payload: &EncryptedPayload,
        auth_sig: &AuthSig,
    ) -> Result<Vec<u8>, EncryptionError> {
        let requester = self.verify_auth_sig(auth_sig)?;
        if payload.access_conditions.is_empty()
            || !payload.access_conditions.iter().all(|c| c.permits(requester))
        {
            return Err(EncryptionError::AccessDenied);
        }

        let blob = alloy::hex::decode(&payload.ciphertext)
            .map_err(|e| EncryptionError::Cipher(e.to_string()))?;
        if blob.len() < XNONCE_LEN {
            return Err(EncryptionError::Cipher("ciphertext too short".to_string()));
        }
        let (nonce, sealed) = blob.split_at(XNONCE_LEN);

        let cipher = self.derive_key(&payload.access_conditions, &payload.content_hash)?;
        let plaintext = cipher
            .decrypt(
                XNonce::from_slice(nonce),
                Payload {
                    msg: sealed,
                    aad: payload.content_hash.as_bytes(),
                },
            )
            .map_err(|e| EncryptionError::Cipher(e.to_string()))?;

        if content_hash(&plaintext) != payload.content_hash {
            return Err(EncryptionError::Cipher("content hash mismatch".to_string()));
        }
        Ok(plaintext)
    }
}

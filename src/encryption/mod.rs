// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Encryption Network
//!
//! Documents are encrypted by an external network that enforces access
//! conditions: a key is only released to a caller whose signed login
//! statement satisfies the condition attached at encryption time.
//!
//! The vault always attaches the same condition, "only the uploader's
//! address may decrypt", built by [`AccessCondition::owner_only`].

pub mod local;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::chain_slug;

pub use local::LocalEncryptionNode;

/// Placeholder the network substitutes with the requesting address.
pub const USER_ADDRESS_PARAM: &str = ":userAddress";

/// How an auth signature was produced.
pub const PERSONAL_SIGN: &str = "web3.eth.personal.sign";

/// Comparison applied to the resolved parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReturnValueTest {
    pub comparator: String,
    pub value: String,
}

/// An access control condition evaluated by the encryption network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessCondition {
    pub contract_address: String,
    pub standard_contract_type: String,
    pub chain: String,
    pub method: String,
    pub parameters: Vec<String>,
    pub return_value_test: ReturnValueTest,
}

impl AccessCondition {
    /// Only `owner` may decrypt, on `chain_id`.
    pub fn owner_only(chain_id: u64, owner: Address) -> Self {
        Self {
            contract_address: String::new(),
            standard_contract_type: String::new(),
            chain: chain_slug(chain_id),
            method: String::new(),
            parameters: vec![USER_ADDRESS_PARAM.to_string()],
            return_value_test: ReturnValueTest {
                comparator: "=".to_string(),
                value: owner.to_checksum(None),
            },
        }
    }

    /// Evaluate the condition for a requesting address.
    ///
    /// Only the `:userAddress` equality form is understood; anything else
    /// denies.
    pub fn permits(&self, requester: Address) -> bool {
        let is_user_address = self.parameters.len() == 1 && self.parameters[0] == USER_ADDRESS_PARAM;
        is_user_address
            && self.return_value_test.comparator == "="
            && self
                .return_value_test
                .value
                .eq_ignore_ascii_case(&requester.to_string())
    }
}

/// Signed login statement presented to the encryption network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthSig {
    pub sig: String,
    pub derived_via: String,
    pub signed_message: String,
    pub address: String,
}

impl AuthSig {
    pub fn personal_sign(sig: String, signed_message: String, address: Address) -> Self {
        Self {
            sig,
            derived_via: PERSONAL_SIGN.to_string(),
            signed_message,
            address: address.to_checksum(None),
        }
    }
}

/// What the network hands back after encrypting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EncryptedPayload {
    /// Hex-encoded ciphertext handle.
    pub ciphertext: String,
    /// Hex SHA-256 of the plaintext.
    pub content_hash: String,
    pub access_conditions: Vec<AccessCondition>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncryptionError {
    #[error("invalid auth signature: {0}")]
    InvalidAuthSig(String),

    #[error("nonce was not issued by this node")]
    UnknownNonce,

    #[error("login statement expired")]
    Expired,

    #[error("access conditions not satisfied")]
    AccessDenied,

    #[error("cipher error: {0}")]
    Cipher(String),

    #[error("encryption network unavailable: {0}")]
    Unavailable(String),
}

/// Encryption capability.
#[async_trait]
pub trait EncryptionNetwork: Send + Sync {
    /// Fresh nonce to embed in the next login statement.
    async fn nonce(&self) -> Result<String, EncryptionError>;

    /// Encrypt `data` for `owner` under `conditions`.
    async fn encrypt(
        &self,
        data: &[u8],
        owner: Address,
        auth_sig: &AuthSig,
        conditions: &[AccessCondition],
    ) -> Result<EncryptedPayload, EncryptionError>;

    /// Decrypt a payload; `auth_sig` must satisfy its access conditions.
    async fn decrypt(
        &self,
        payload: &EncryptedPayload,
        auth_sig: &AuthSig,
    ) -> Result<Vec<u8>, EncryptionError>;
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EIP-712 schema for signed vault entries.
//!
//! Every uploaded document carries a structured signature over
//! `VaultEntry(string name,string category,string hash,string size,string timestamp)`
//! under the `AdviceAccordVault` v1 domain. The signature and the signed
//! tuple are stored next to each other in the entry metadata, so anyone can
//! recover the signer later without talking to the vault.

use std::borrow::Cow;

use alloy::{
    primitives::{Address, Signature, B256, U256},
    sol,
    sol_types::{Eip712Domain, SolStruct},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::client::ChainError;

/// Domain name for vault entry signatures.
pub const DOMAIN_NAME: &str = "AdviceAccordVault";

/// Schema version. Bump when the `VaultEntry` type changes.
pub const DOMAIN_VERSION: &str = "1";

sol! {
    /// Typed payload signed for every vault upload.
    struct VaultEntry {
        string name;
        string category;
        string hash;
        string size;
        string timestamp;
    }
}

/// The signed tuple, as stored in metadata under `eip712_data`.
///
/// All members are strings because that is how the typed schema declares
/// them; `size` is the decimal byte count.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct VaultEntryData {
    pub name: String,
    pub category: String,
    pub hash: String,
    pub size: String,
    pub timestamp: String,
}

impl VaultEntryData {
    /// Typed struct for hashing.
    pub fn to_typed(&self) -> VaultEntry {
        VaultEntry {
            name: self.name.clone(),
            category: self.category.clone(),
            hash: self.hash.clone(),
            size: self.size.clone(),
            timestamp: self.timestamp.clone(),
        }
    }

    /// EIP-712 digest of this tuple under `domain`.
    pub fn signing_hash(&self, domain: &Eip712Domain) -> B256 {
        self.to_typed().eip712_signing_hash(domain)
    }
}

/// Vault signing domain for the given chain.
///
/// There is no verifying contract; the zero address is used.
pub fn vault_domain(chain_id: u64) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Borrowed(DOMAIN_NAME)),
        Some(Cow::Borrowed(DOMAIN_VERSION)),
        Some(U256::from(chain_id)),
        Some(Address::ZERO),
        None,
    )
}

/// Encode a signature as 0x-prefixed 65-byte hex (r || s || v).
pub fn encode_signature(signature: &Signature) -> String {
    format!("0x{}", alloy::hex::encode(signature.as_bytes()))
}

/// Decode a 0x-prefixed hex signature.
pub fn decode_signature(encoded: &str) -> Result<Signature, ChainError> {
    let bytes = alloy::hex::decode(encoded.trim())
        .map_err(|e| ChainError::InvalidSignature(e.to_string()))?;
    Signature::from_raw(&bytes).map_err(|e| ChainError::InvalidSignature(e.to_string()))
}

/// Recover the address that produced `signature` over `data`.
pub fn recover_signer(
    data: &VaultEntryData,
    domain: &Eip712Domain,
    signature: &str,
) -> Result<Address, ChainError> {
    let signature = decode_signature(signature)?;
    let hash = data.signing_hash(domain);
    signature
        .recover_address_from_prehash(&hash)
        .map_err(|e| ChainError::InvalidSignature(e.to_string()))
}

/// Check that `signature` over `data` was produced by `expected`.
pub fn verify_vault_entry(
    data: &VaultEntryData,
    domain: &Eip712Domain,
    signature: &str,
    expected: Address,
) -> Result<bool, ChainError> {
    Ok(recover_signer(data, domain, signature)? == expected)
}

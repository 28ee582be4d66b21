// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing key loading.
//!
//! The local wallet keeps its secp256k1 key in PEM form (PKCS#8 or SEC1).
//! This module turns that file into an alloy signer.

use alloy::signers::local::PrivateKeySigner;
use k256::SecretKey;

use super::client::{ChainClient, ChainError};

/// Parse a private key from PEM format to hex string.
///
/// # Returns
/// * `Ok(String)` - Hex-encoded private key (64 characters, no 0x prefix)
/// * `Err(ChainError)` - If PEM parsing fails
pub fn pem_to_hex(pem_bytes: &[u8]) -> Result<String, ChainError> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| ChainError::InvalidPrivateKey(format!("Invalid UTF-8: {}", e)))?;

    let pem = pem::parse(pem_str)
        .map_err(|e| ChainError::InvalidPrivateKey(format!("Invalid PEM: {}", e)))?;

    let secret_key = SecretKey::from_sec1_der(pem.contents())
        .or_else(|_| parse_pkcs8_to_secret_key(pem.contents()))
        .map_err(|e| ChainError::InvalidPrivateKey(format!("Invalid key format: {}", e)))?;

    Ok(alloy::hex::encode(secret_key.to_bytes()))
}

fn parse_pkcs8_to_secret_key(der: &[u8]) -> Result<SecretKey, String> {
    use k256::pkcs8::DecodePrivateKey;
    SecretKey::from_pkcs8_der(der).map_err(|e| e.to_string())
}

/// Create a signer from a PEM-encoded private key.
pub fn signer_from_pem(pem_bytes: &[u8]) -> Result<PrivateKeySigner, ChainError> {
    let hex_key = pem_to_hex(pem_bytes)?;
    ChainClient::create_signer(&hex_key)
}

/// Load a signer from a PEM file on disk.
pub fn signer_from_pem_file(path: impl AsRef<std::path::Path>) -> Result<PrivateKeySigner, ChainError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        ChainError::InvalidPrivateKey(format!("Cannot read {}: {}", path.display(), e))
    })?;
    signer_from_pem(&bytes)
}

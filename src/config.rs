// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup by [`VaultConfig::from_env`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for the cache, table database and audit log | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TARGET_CHAIN_ID` | Chain every vault write must happen on | `11155111` (Sepolia) |
//! | `RPC_URL` | Endpoint the wallet's active chain id is read from | Optional |
//! | `WALLET_CHAIN_ID` | Active chain id when `RPC_URL` is unset | `TARGET_CHAIN_ID` |
//! | `SIGNER_KEY_PATH` | PEM file holding the wallet key | Optional |
//! | `SIGNER_PRIVATE_KEY` | Hex wallet key (used when no PEM path is set) | Optional |
//! | `SIGNER_DISPLAY_NAME` | Display name of the identity | Optional |
//! | `SIGNER_AVATAR_URL` | Avatar of the identity | Optional |
//! | `VAULT_ORIGIN` | Origin the login statement is scoped to | `http://localhost:3000` |
//! | `ENCRYPTION_NODE_SECRET` | 32-byte hex secret of the encryption node | Random per process |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;

use crate::blockchain::DEFAULT_TARGET_CHAIN_ID;
use crate::storage::paths::DATA_ROOT;

/// Environment variable name for the data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TARGET_CHAIN_ID_ENV: &str = "TARGET_CHAIN_ID";
pub const RPC_URL_ENV: &str = "RPC_URL";
pub const WALLET_CHAIN_ID_ENV: &str = "WALLET_CHAIN_ID";
pub const SIGNER_KEY_PATH_ENV: &str = "SIGNER_KEY_PATH";
pub const SIGNER_PRIVATE_KEY_ENV: &str = "SIGNER_PRIVATE_KEY";
pub const SIGNER_DISPLAY_NAME_ENV: &str = "SIGNER_DISPLAY_NAME";
pub const SIGNER_AVATAR_URL_ENV: &str = "SIGNER_AVATAR_URL";
pub const VAULT_ORIGIN_ENV: &str = "VAULT_ORIGIN";
pub const ENCRYPTION_NODE_SECRET_ENV: &str = "ENCRYPTION_NODE_SECRET";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not a valid {expected}: {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// How logs are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Where the wallet key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerSource {
    PemFile(PathBuf),
    Hex(String),
}

#[derive(Debug, Clone)]
pub struct VaultConfig {
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub target_chain_id: u64,
    pub rpc_url: Option<String>,
    pub wallet_chain_id: u64,
    pub signer: Option<SignerSource>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub origin: url::Url,
    pub encryption_secret: Option<String>,
    pub log_format: LogFormat,
}

impl VaultConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let target_chain_id = parse_or(
            var(TARGET_CHAIN_ID_ENV),
            TARGET_CHAIN_ID_ENV,
            "chain id",
            DEFAULT_TARGET_CHAIN_ID,
        )?;
        let wallet_chain_id = parse_or(
            var(WALLET_CHAIN_ID_ENV),
            WALLET_CHAIN_ID_ENV,
            "chain id",
            target_chain_id,
        )?;

        let origin_raw = var(VAULT_ORIGIN_ENV).unwrap_or_else(|| DEFAULT_ORIGIN.to_string());
        let origin = url::Url::parse(&origin_raw).map_err(|_| ConfigError::Invalid {
            name: VAULT_ORIGIN_ENV,
            expected: "URL",
            value: origin_raw.clone(),
        })?;

        let signer = match (var(SIGNER_KEY_PATH_ENV), var(SIGNER_PRIVATE_KEY_ENV)) {
            (Some(path), _) => Some(SignerSource::PemFile(PathBuf::from(path))),
            (None, Some(hex)) => Some(SignerSource::Hex(hex)),
            (None, None) => None,
        };

        let log_format = match var(LOG_FORMAT_ENV).as_deref() {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            data_dir: PathBuf::from(var(DATA_DIR_ENV).unwrap_or_else(|| DATA_ROOT.to_string())),
            host: var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(var(PORT_ENV), PORT_ENV, "port", DEFAULT_PORT)?,
            target_chain_id,
            rpc_url: var(RPC_URL_ENV),
            wallet_chain_id,
            signer,
            display_name: var(SIGNER_DISPLAY_NAME_ENV),
            avatar_url: var(SIGNER_AVATAR_URL_ENV),
            origin,
            encryption_secret: var(ENCRYPTION_NODE_SECRET_ENV),
            log_format,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    name: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value: raw,
        }),
    }
}

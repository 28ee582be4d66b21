// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet session errors.

/// Errors raised by the identity/signing capability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No wallet is connected.
    #[error("no wallet connected: {0}")]
    NotConnected(String),

    /// The holder declined to sign.
    #[error("signature request rejected")]
    Rejected,

    /// The wallet or its RPC endpoint failed.
    #[error("wallet provider error: {0}")]
    Provider(String),
}

impl SessionError {
    pub fn error_code(&self) -> &'static str {
        match self {
            SessionError::NotConnected(_) => "not_connected",
            SessionError::Rejected => "signature_rejected",
            SessionError::Provider(_) => "wallet_provider_error",
        }
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Identity Module
//!
//! The vault never handles credentials itself. It asks an
//! [`IdentityProvider`] for a [`WalletSession`] and uses that handle to:
//!
//! 1. read the wallet address (the owner of every entry it writes)
//! 2. read the wallet's active chain (uploads and deletes are chain-gated)
//! 3. personal-sign the login statement presented to the encryption network
//! 4. EIP-712 sign the entry record stored alongside each upload
//!
//! The bundled [`LocalWalletProvider`] wraps a single secp256k1 key.

pub mod error;
pub mod identity;
pub mod local;
pub mod session;

pub use error::SessionError;
pub use identity::Identity;
pub use local::{LocalWalletProvider, LocalWalletSession, WalletProfile};
pub use session::{IdentityProvider, WalletSession};

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Accord Vault - Encrypted Document Vault Service
//!
//! Files are encrypted for their owner, described by an EIP-712 signed
//! metadata record and stored as rows in an owner-scoped vault table.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Wallet identity and signing sessions
//! - `blockchain` - Chain id checks, EIP-712 and sign-in messages
//! - `encryption` - Access-controlled encryption network
//! - `storage` - Table service, local cache and audit log
//! - `vault` - Upload orchestration and the owner's document list

pub mod api;
pub mod auth;
pub mod blockchain;
pub mod config;
pub mod encryption;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
pub mod vault;

#[cfg(test)]
mod testing;

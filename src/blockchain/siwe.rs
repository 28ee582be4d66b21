// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EIP-4361 (Sign-In with Ethereum) login statements.
//!
//! The encryption network only hands out keys to callers that present a
//! signed login statement. The statement binds the wallet address, the
//! vault origin, a nonce issued by the node and an expiry window:
//!
//! ```text
//! localhost:3000 wants you to sign in with your Ethereum account:
//! 0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266
//!
//! Authorize the vault to encrypt documents for this address.
//!
//! URI: http://localhost:3000
//! Version: 1
//! Chain ID: 11155111
//! Nonce: 5d1b1c0e
//! Issued At: 2026-01-05T10:00:00.000Z
//! Expiration Time: 2026-01-05T11:00:00.000Z
//! ```

use alloy::primitives::{Address, Signature};
use chrono::{DateTime, Duration, SecondsFormat, Utc};

use super::client::ChainError;
use super::eip712::decode_signature;

/// How long a login statement stays valid.
pub const LOGIN_TTL_SECS: i64 = 60 * 60;

/// Statement text shown to the wallet holder.
pub const DEFAULT_STATEMENT: &str = "Authorize the vault to encrypt documents for this address.";

const HEADER_SUFFIX: &str = " wants you to sign in with your Ethereum account:";

/// A parsed or freshly built login statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginMessage {
    /// `host[:port]` of the origin.
    pub domain: String,
    pub address: Address,
    pub statement: String,
    pub uri: String,
    pub version: String,
    pub chain_id: u64,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
    pub expiration_time: DateTime<Utc>,
}

impl LoginMessage {
    /// Build a statement for `origin` that expires after [`LOGIN_TTL_SECS`].
    pub fn new(
        origin: &url::Url,
        address: Address,
        chain_id: u64,
        nonce: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ChainError> {
        let host = origin
            .host_str()
            .ok_or_else(|| ChainError::InvalidLoginMessage(format!("origin has no host: {origin}")))?;
        let domain = match origin.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Self {
            domain,
            address,
            statement: DEFAULT_STATEMENT.to_string(),
            uri: origin.as_str().trim_end_matches('/').to_string(),
            version: "1".to_string(),
            chain_id,
            nonce: nonce.into(),
            issued_at: now,
            expiration_time: now + Duration::seconds(LOGIN_TTL_SECS),
        })
    }

    /// The exact text the wallet signs.
    pub fn prepare_message(&self) -> String {
        format!(
            "{domain}{HEADER_SUFFIX}\n{address}\n\n{statement}\n\nURI: {uri}\nVersion: {version}\nChain ID: {chain}\nNonce: {nonce}\nIssued At: {issued}\nExpiration Time: {expires}",
            domain = self.domain,
            address = self.address.to_checksum(None),
            statement = self.statement,
            uri = self.uri,
            version = self.version,
            chain = self.chain_id,
            nonce = self.nonce,
            issued = self.issued_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            expires = self.expiration_time.to_rfc3339_opts(SecondsFormat::Millis, true),
        )
    }

    /// Parse a statement produced by [`LoginMessage::prepare_message`].
    pub fn parse(text: &str) -> Result<Self, ChainError> {
        let mut lines = text.lines();

        let header = lines.next().unwrap_or_default();
        let domain = header
            .strip_suffix(HEADER_SUFFIX)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| invalid("missing header line"))?
            .to_string();

        let address: Address = lines
            .next()
            .ok_or_else(|| invalid("missing address"))?
            .trim()
            .parse()
            .map_err(|_| invalid("malformed address"))?;

        if lines.next() != Some("") {
            return Err(invalid("expected blank line after address"));
        }
        let statement = lines
            .next()
            .ok_or_else(|| invalid("missing statement"))?
            .to_string();
        if lines.next() != Some("") {
            return Err(invalid("expected blank line after statement"));
        }

        let uri = field(lines.next(), "URI")?.to_string();
        let version = field(lines.next(), "Version")?.to_string();
        let chain_id = field(lines.next(), "Chain ID")?
            .parse()
            .map_err(|_| invalid("malformed chain id"))?;
        let nonce = field(lines.next(), "Nonce")?.to_string();
        let issued_at = timestamp(field(lines.next(), "Issued At")?)?;
        let expiration_time = timestamp(field(lines.next(), "Expiration Time")?)?;

        if lines.next().is_some() {
            return Err(invalid("unexpected trailing content"));
        }

        Ok(Self {
            domain,
            address,
            statement,
            uri,
            version,
            chain_id,
            nonce,
            issued_at,
            expiration_time,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiration_time
    }

    /// Recover the personal-sign signer of this statement.
    pub fn recover(&self, signature: &str) -> Result<Address, ChainError> {
        let signature: Signature = decode_signature(signature)?;
        signature
            .recover_address_from_msg(self.prepare_message().as_bytes())
            .map_err(|e| ChainError::InvalidSignature(e.to_string()))
    }
}

fn invalid(reason: &str) -> ChainError {
    ChainError::InvalidLoginMessage(reason.to_string())
}

fn field<'a>(line: Option<&'a str>, name: &str) -> Result<&'a str, ChainError> {
    line.and_then(|l| l.strip_prefix(name))
        .and_then(|rest| rest.strip_prefix(": "))
        .ok_or_else(|| ChainError::InvalidLoginMessage(format!("missing {name}")))
}

fn timestamp(value: &str) -> Result<DateTime<Utc>, ChainError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ChainError::InvalidLoginMessage(format!("bad timestamp {value}: {e}")))
}

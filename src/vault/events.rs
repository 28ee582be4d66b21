// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The refresh signal between the upload and list flows.

use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 16;

/// The single, payload-free event: "vault contents changed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultRefresh;

/// Broadcast bus carrying [`VaultRefresh`].
///
/// Sending with no subscribers is not an error; the signal is simply lost,
/// as nobody is rendering a list.
#[derive(Debug, Clone)]
pub struct RefreshBus {
    sender: broadcast::Sender<VaultRefresh>,
}

impl Default for RefreshBus {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Announce a change. Returns how many listeners received it.
    pub fn publish(&self) -> usize {
        let delivered = self.sender.send(VaultRefresh).unwrap_or(0);
        tracing::debug!(listeners = delivered, "vault-refresh broadcast");
        delivered
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VaultRefresh> {
        self.sender.subscribe()
    }
}

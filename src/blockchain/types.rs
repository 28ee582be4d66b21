// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Network table and the target-network guard.

/// EVM network configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Short chain name used in access conditions
    pub slug: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// Public RPC endpoint URL
    pub rpc_url: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

/// Ethereum Sepolia testnet, the network vault tables live on.
pub const ETH_SEPOLIA: NetworkConfig = NetworkConfig {
    name: "Ethereum Sepolia Testnet",
    slug: "sepolia",
    chain_id: 11155111,
    rpc_url: "https://ethereum-sepolia.publicnode.com",
    explorer_url: "https://sepolia.etherscan.io",
};

/// Ethereum mainnet.
pub const ETH_MAINNET: NetworkConfig = NetworkConfig {
    name: "Ethereum Mainnet",
    slug: "ethereum",
    chain_id: 1,
    rpc_url: "https://ethereum-rpc.publicnode.com",
    explorer_url: "https://etherscan.io",
};

/// Networks with a known display name.
pub const KNOWN_NETWORKS: &[NetworkConfig] = &[ETH_SEPOLIA, ETH_MAINNET];

/// Default target chain for uploads and deletions.
pub const DEFAULT_TARGET_CHAIN_ID: u64 = ETH_SEPOLIA.chain_id;

/// Look up a known network by chain id.
pub fn network_by_chain_id(chain_id: u64) -> Option<&'static NetworkConfig> {
    KNOWN_NETWORKS.iter().find(|n| n.chain_id == chain_id)
}

/// Human-readable network name, falling back to `chain {id}`.
pub fn network_name(chain_id: u64) -> String {
    network_by_chain_id(chain_id)
        .map(|n| n.name.to_string())
        .unwrap_or_else(|| format!("chain {chain_id}"))
}

/// Chain slug used inside access conditions (`sepolia`, `ethereum`, ...).
pub fn chain_slug(chain_id: u64) -> String {
    network_by_chain_id(chain_id)
        .map(|n| n.slug.to_string())
        .unwrap_or_else(|| chain_id.to_string())
}

/// Returned when the active network differs from the target network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkMismatch {
    pub expected: u64,
    pub actual: u64,
}

/// Compare the active chain against the target chain.
pub fn ensure_network(expected: u64, actual: u64) -> Result<(), NetworkMismatch> {
    if expected == actual {
        Ok(())
    } else {
        Err(NetworkMismatch { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sepolia_is_the_default_target() {
        assert_eq!(DEFAULT_TARGET_CHAIN_ID, 11155111);
        assert_eq!(network_name(11155111), "Ethereum Sepolia Testnet");
        assert_eq!(chain_slug(11155111), "sepolia");
    }

    #[test]
    fn unknown_chains_fall_back_to_id() {
        assert_eq!(network_name(43113), "chain 43113");
        assert_eq!(chain_slug(43113), "43113");
    }

    #[test]
    fn ensure_network_reports_both_sides() {
        assert!(ensure_network(11155111, 11155111).is_ok());
        let mismatch = ensure_network(11155111, 1).unwrap_err();
        assert_eq!(mismatch.expected, 11155111);
        assert_eq!(mismatch.actual, 1);
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for storage writes.
//!
//! Owners are EVM addresses. Comparison is case-insensitive so that a
//! checksummed address and its lowercase form refer to the same owner.

use alloy::primitives::Address;

use super::{StorageError, StorageResult};

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// Owner address as stored (any casing).
    fn owner_address(&self) -> &str;

    /// Short label used in permission errors.
    fn resource_label(&self) -> String {
        "resource".to_string()
    }
}

/// True when `owner` and `caller` name the same address.
pub fn same_owner(owner: &str, caller: &str) -> bool {
    owner.trim().eq_ignore_ascii_case(caller.trim())
}

/// Trait for enforcing ownership on storage operations.
pub trait OwnershipEnforcer {
    /// Verify that `caller` owns this resource.
    ///
    /// # Errors
    /// Returns `StorageError::PermissionDenied` if the caller doesn't own the resource.
    fn verify_ownership(&self, caller: &Address) -> StorageResult<()>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn verify_ownership(&self, caller: &Address) -> StorageResult<()> {
        if same_owner(self.owner_address(), &caller.to_string()) {
            Ok(())
        } else {
            Err(StorageError::PermissionDenied {
                caller: caller.to_checksum(None),
                resource: self.resource_label(),
            })
        }
    }
}

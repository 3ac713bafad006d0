// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use crs_types::CiphertextHandle;
use std::collections::HashSet;

/// The (handle, contract, caller) triples that are currently decryptable.
///
/// Grants are created only as a side effect of the aggregator's authorizing
/// call, never directly by a client. A grant refers to one concrete handle:
/// when the aggregate is recomputed the aggregator hands out a fresh handle,
/// so grants on the previous handle are effectively stale and the authorizing
/// call must be repeated before the next decryption attempt.
#[derive(Debug, Default)]
pub struct HandleAcl {
    grants: HashSet<(CiphertextHandle, Address, Address)>,
}

impl HandleAcl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(&mut self, handle: CiphertextHandle, contract: Address, caller: Address) {
        self.grants.insert((handle, contract, caller));
    }

    pub fn is_allowed(&self, handle: CiphertextHandle, contract: Address, caller: Address) -> bool {
        self.grants.contains(&(handle, contract, caller))
    }
}

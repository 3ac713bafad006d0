// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Error, Result};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// The (target contract, submitter) pair a batch of ciphertexts is bound to.
///
/// All values encrypted through one builder share one context, and the
/// resulting validity proof verifies only against this exact pair. The pair
/// is immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncryptionContext {
    contract: Address,
    submitter: Address,
}

impl EncryptionContext {
    pub fn new(contract: Address, submitter: Address) -> Result<Self> {
        if contract == Address::ZERO || submitter == Address::ZERO {
            return Err(Error::InvalidContext);
        }
        Ok(Self {
            contract,
            submitter,
        })
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn submitter(&self) -> Address {
        self.submitter
    }
}

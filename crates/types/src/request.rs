// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::CiphertextHandle;
use alloy_primitives::Address;

/// One (handle, contract) pair to decrypt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptionItem {
    pub handle: CiphertextHandle,
    pub contract: Address,
}

/// A batch of handles to decrypt on behalf of one caller.
///
/// Constructed fresh for every decrypt attempt and never reused across
/// intents: handles rotate whenever the aggregate is recomputed, so a cached
/// request would reference a handle the caller can no longer decrypt.
#[derive(Debug, Clone, Default)]
pub struct DecryptionRequest {
    items: Vec<DecryptionItem>,
}

impl DecryptionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(handle: CiphertextHandle, contract: Address) -> Self {
        Self {
            items: vec![DecryptionItem { handle, contract }],
        }
    }

    pub fn push(&mut self, handle: CiphertextHandle, contract: Address) {
        self.items.push(DecryptionItem { handle, contract });
    }

    pub fn items(&self) -> &[DecryptionItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

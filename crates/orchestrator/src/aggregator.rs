// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use async_trait::async_trait;
use crs_types::{CiphertextHandle, Result};

/// Boundary to the external aggregator that stores encrypted scores and
/// maintains the encrypted average per paper.
///
/// Both methods run under one caller identity; `fetch_average_handle` must
/// use the same identity as `authorize_average`, otherwise the returned
/// handle belongs to someone else's grant and cannot be decrypted.
#[async_trait]
pub trait Aggregator: Send + Sync {
    /// Address of the aggregator contract; decryption requests pair every
    /// handle with this address.
    fn contract_address(&self) -> Address;

    /// The caller identity the aggregator acts for.
    fn caller(&self) -> Address;

    /// The authorizing call: recompute the aggregate and grant the caller
    /// permission to decrypt the fresh handle. Must not return before the
    /// side effect is durably finalized.
    async fn authorize_average(&self, paper_id: u64) -> Result<()>;

    /// Re-read the aggregate's current handle, as the same caller.
    async fn fetch_average_handle(&self, paper_id: u64) -> Result<CiphertextHandle>;
}

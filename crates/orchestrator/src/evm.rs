// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::Aggregator;
use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use crs_evm_helpers::{ReviewRead, ReviewWrite, ReviewWriteContract};
use crs_types::{CiphertextHandle, Error, Result};

#[async_trait]
impl Aggregator for ReviewWriteContract {
    fn contract_address(&self) -> Address {
        *self.address()
    }

    fn caller(&self) -> Address {
        self.signer_address()
    }

    async fn authorize_average(&self, paper_id: u64) -> Result<()> {
        ReviewWrite::authorize_average(self, U256::from(paper_id))
            .await
            .map_err(|e| Error::AuthorizationFailed(e.to_string()))?;
        Ok(())
    }

    async fn fetch_average_handle(&self, paper_id: u64) -> Result<CiphertextHandle> {
        let handle = self
            .get_average_handle(U256::from(paper_id))
            .await
            .map_err(|e| Error::HandleUnavailable(e.to_string()))?;
        // An all-zero bytes32 is the contract's "no average yet" marker;
        // reading it means the authorizing call has not landed.
        if handle == B256::ZERO {
            return Err(Error::HandleUnavailable(format!(
                "paper {paper_id} has no authorized average handle"
            )));
        }
        Ok(CiphertextHandle::new(handle))
    }
}

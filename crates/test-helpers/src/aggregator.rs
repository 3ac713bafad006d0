// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use async_trait::async_trait;
use crs_client::MockFheInstance;
use crs_orchestrator::Aggregator;
use crs_types::{CiphertextHandle, EncryptedInput, Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Default)]
struct Paper {
    score_handles: Vec<CiphertextHandle>,
    avg_handle: Option<CiphertextHandle>,
}

/// In-memory stand-in for the ReviewManager contract.
///
/// Mirrors the contract's observable behavior: submissions are accepted
/// only with a proof that verifies against the exact (contract, submitter)
/// context and handle order; every accepted submission recomputes the
/// encrypted average under a fresh handle (handle rotation); the
/// authorizing call recomputes once more and grants the calling identity a
/// decryption grant on the resulting handle.
///
/// Rounding rule, pinned here the way the contract pins it on-chain:
/// integer floor division of the score sum by the score count.
pub struct InMemoryAggregator {
    address: Address,
    caller: Address,
    instance: Arc<MockFheInstance>,
    papers: Arc<Mutex<HashMap<u64, Paper>>>,
}

impl InMemoryAggregator {
    pub fn new(address: Address, caller: Address, instance: Arc<MockFheInstance>) -> Self {
        Self {
            address,
            caller,
            instance,
            papers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Same aggregator state, acting for a different caller identity.
    pub fn connect_as(&self, caller: Address) -> Self {
        Self {
            address: self.address,
            caller,
            instance: self.instance.clone(),
            papers: self.papers.clone(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Accept an encrypted score submission, consuming its validity proof.
    pub fn submit_review(
        &self,
        paper_id: u64,
        submitter: Address,
        input: &EncryptedInput,
    ) -> Result<()> {
        if !self
            .instance
            .verify_input(&input.proof, self.address, submitter, &input.handles)
        {
            return Err(Error::AuthorizationFailed(
                "validity proof rejected".to_string(),
            ));
        }

        let mut papers = self.papers.lock().unwrap();
        let paper = papers.entry(paper_id).or_default();
        paper.score_handles.extend(input.handles.iter().copied());
        // every accepted submission rotates the aggregate's handle
        let fresh = self.instance.evaluate_mean(&paper.score_handles)?;
        debug!(paper_id, handle = %fresh, "aggregate recomputed");
        paper.avg_handle = Some(fresh);
        Ok(())
    }

    pub fn review_count(&self, paper_id: u64) -> usize {
        self.papers
            .lock()
            .unwrap()
            .get(&paper_id)
            .map(|p| p.score_handles.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl Aggregator for InMemoryAggregator {
    fn contract_address(&self) -> Address {
        self.address
    }

    fn caller(&self) -> Address {
        self.caller
    }

    async fn authorize_average(&self, paper_id: u64) -> Result<()> {
        let mut papers = self.papers.lock().unwrap();
        let paper = papers.get_mut(&paper_id).ok_or_else(|| {
            Error::AuthorizationFailed(format!("paper {paper_id} has no reviews"))
        })?;
        if paper.score_handles.is_empty() {
            return Err(Error::AuthorizationFailed(format!(
                "paper {paper_id} has no reviews"
            )));
        }
        // recompute, rotate and grant; only the handle minted here carries
        // a grant for this caller
        let fresh = self.instance.evaluate_mean(&paper.score_handles)?;
        self.instance.allow(fresh, self.address, self.caller);
        paper.avg_handle = Some(fresh);
        debug!(paper_id, handle = %fresh, caller = %self.caller, "average authorized");
        Ok(())
    }

    async fn fetch_average_handle(&self, paper_id: u64) -> Result<CiphertextHandle> {
        self.papers
            .lock()
            .unwrap()
            .get(&paper_id)
            .and_then(|p| p.avg_handle)
            .ok_or_else(|| {
                Error::HandleUnavailable(format!("paper {paper_id} has no average handle"))
            })
    }
}

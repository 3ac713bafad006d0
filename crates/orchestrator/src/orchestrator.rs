// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::Aggregator;
use crs_client::FheAdapter;
use crs_types::{CiphertextHandle, DecryptionRequest, Error, Result};
use std::sync::Arc;
use tracing::{debug, warn};

/// States of one decrypt intent. `Decrypted` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentState {
    Start,
    Authorized,
    HandleFetched(CiphertextHandle),
    Decrypted(u64),
    Failed,
}

/// Drives the mandatory three-step decrypt protocol and hides its ordering
/// requirement from callers:
///
/// 1. issue the authorizing call against the aggregator (fee-bearing,
///    state-mutating; finalized before the step completes),
/// 2. re-read the aggregate's current handle under the same identity,
/// 3. hand the fresh handle to the adapter for decryption.
///
/// There is no shortcut path that skips step 1, and nothing is cached
/// across intents: the aggregate (and therefore its valid handle) may have
/// changed between intents, so each one re-executes all three steps.
pub struct PermissionOrchestrator {
    adapter: Arc<dyn FheAdapter>,
    aggregator: Arc<dyn Aggregator>,
}

impl PermissionOrchestrator {
    pub fn new(adapter: Arc<dyn FheAdapter>, aggregator: Arc<dyn Aggregator>) -> Self {
        Self {
            adapter,
            aggregator,
        }
    }

    /// Run one full decrypt intent for a paper's average score.
    pub async fn decrypt_average(&self, paper_id: u64) -> Result<u64> {
        let mut state = IntentState::Start;
        debug!(paper_id, ?state, "decrypt intent started");

        // Step 1: authorizing call, durably finalized by the aggregator
        // before we move on. A premature step 2 would read a stale or empty
        // handle that deterministically fails step 3.
        if let Err(e) = self.aggregator.authorize_average(paper_id).await {
            warn!(paper_id, error = %e, "authorizing call failed");
            state = IntentState::Failed;
            debug!(paper_id, ?state, "decrypt intent failed");
            return Err(match e {
                Error::AuthorizationFailed(_) => e,
                other => Error::AuthorizationFailed(other.to_string()),
            });
        }
        state = IntentState::Authorized;
        debug!(paper_id, ?state, "authorizing call finalized");

        // Step 2: re-read the handle under the same caller identity.
        let handle = match self.aggregator.fetch_average_handle(paper_id).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(paper_id, error = %e, "handle re-read failed");
                state = IntentState::Failed;
                debug!(paper_id, ?state, "decrypt intent failed");
                return Err(match e {
                    Error::HandleUnavailable(_) => e,
                    other => Error::HandleUnavailable(other.to_string()),
                });
            }
        };
        state = IntentState::HandleFetched(handle);
        debug!(paper_id, ?state, "fresh handle fetched");

        // Step 3: decrypt the freshly authorized handle.
        let request = DecryptionRequest::single(handle, self.aggregator.contract_address());
        let decrypted = match self
            .adapter
            .request_decryption(&request, self.aggregator.caller())
            .await
        {
            Ok(map) => map,
            Err(e) => {
                warn!(paper_id, %handle, error = %e, "decryption denied");
                state = IntentState::Failed;
                debug!(paper_id, ?state, "decrypt intent failed");
                return Err(Error::DecryptionDenied(handle));
            }
        };

        // A missing key means "not decryptable", which must stay
        // distinguishable from a decrypted zero.
        let value = decrypted
            .get(&handle)
            .copied()
            .ok_or(Error::DecryptionDenied(handle))?;

        state = IntentState::Decrypted(value);
        debug!(paper_id, ?state, "decrypt intent complete");
        Ok(value)
    }
}

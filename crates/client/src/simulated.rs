// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{BackendMetadata, CiphertextBuilder, FheAdapter, MockFheInstance, SharedRng};
use alloy_primitives::Address;
use async_trait::async_trait;
use crs_types::{CiphertextHandle, DecryptionRequest, EncryptionContext, Error, Result};
use once_cell::sync::OnceCell;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Local development backend.
///
/// `init` discovers the backend configuration from the local node's
/// `fhevm_relayer_metadata` endpoint and constructs the single shared
/// [`MockFheInstance`]; every builder created afterwards shares it. The
/// instance is constructed at most once per adapter, no matter how often
/// `init` is called.
pub struct SimulatedAdapter {
    rpc_url: String,
    http: reqwest::Client,
    rng: SharedRng,
    instance: OnceCell<Arc<MockFheInstance>>,
}

impl SimulatedAdapter {
    pub fn new(rpc_url: &str, rng: SharedRng) -> Self {
        Self {
            rpc_url: rpc_url.to_string(),
            http: reqwest::Client::new(),
            rng,
            instance: OnceCell::new(),
        }
    }

    /// Construct an already-initialized adapter from known metadata,
    /// skipping discovery. Used by tests and local harnesses that own the
    /// backend configuration.
    pub fn from_metadata(metadata: BackendMetadata, rng: SharedRng) -> Self {
        let adapter = Self::new("http://localhost:8545", rng.clone());
        let _ = adapter
            .instance
            .set(Arc::new(MockFheInstance::new(metadata, rng)));
        adapter
    }

    /// The shared backend instance. The aggregator collaborator also goes
    /// through this to verify input proofs and evaluate aggregates.
    pub fn instance(&self) -> Result<Arc<MockFheInstance>> {
        self.instance
            .get()
            .cloned()
            .ok_or_else(|| Error::BackendUnavailable("init() has not completed".to_string()))
    }

    async fn fetch_metadata(&self) -> Result<BackendMetadata> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "fhevm_relayer_metadata",
            "params": [],
        });

        let response = self
            .http
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::BackendUnavailable(format!("metadata fetch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::BackendUnavailable(format!(
                "metadata fetch failed: status {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::BackendUnavailable(format!("metadata response not JSON: {e}")))?;

        let result = body
            .get("result")
            .ok_or_else(|| Error::BackendUnavailable("metadata missing in response".to_string()))?;

        BackendMetadata::from_rpc_result(result)
    }
}

#[async_trait]
impl FheAdapter for SimulatedAdapter {
    async fn init(&self) -> Result<()> {
        if self.instance.get().is_some() {
            return Ok(());
        }
        let metadata = self.fetch_metadata().await?;
        info!(chain_id = metadata.chain_id, "simulated backend discovered");
        let _ = self
            .instance
            .set(Arc::new(MockFheInstance::new(metadata, self.rng.clone())));
        Ok(())
    }

    fn create_encrypted_input(&self, context: EncryptionContext) -> Result<CiphertextBuilder> {
        let instance = self.instance()?;
        Ok(CiphertextBuilder::new(context, instance))
    }

    async fn request_decryption(
        &self,
        request: &DecryptionRequest,
        caller: Address,
    ) -> Result<BTreeMap<CiphertextHandle, u64>> {
        self.instance()?.user_decrypt(request.items(), caller)
    }
}

// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{CiphertextBuilder, RelayedAdapter, SharedRng, SimulatedAdapter};
use alloy_primitives::Address;
use async_trait::async_trait;
use crs_config::{AdapterConfig, FheMode};
use crs_types::{CiphertextHandle, DecryptionRequest, EncryptionContext, Error, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Common capability set over both execution modes.
///
/// `init` must complete successfully exactly once before the other methods
/// are used. `request_decryption` is referentially transparent for
/// authorized handles; an unauthorized handle may start succeeding after a
/// later authorizing call, which is state external to the adapter.
#[async_trait]
pub trait FheAdapter: Send + Sync {
    async fn init(&self) -> Result<()>;

    fn create_encrypted_input(&self, context: EncryptionContext) -> Result<CiphertextBuilder>;

    async fn request_decryption(
        &self,
        request: &DecryptionRequest,
        caller: Address,
    ) -> Result<BTreeMap<CiphertextHandle, u64>>;
}

/// Build and initialize the adapter selected by configuration.
///
/// The variant is fixed here, once, at process start; nothing downstream
/// branches on the backend again.
pub async fn connect(config: &AdapterConfig) -> Result<Arc<dyn FheAdapter>> {
    let adapter: Arc<dyn FheAdapter> = match config.mode {
        FheMode::Simulated => {
            info!(rpc_url = %config.rpc_url, "connecting simulated fhe backend");
            let rng: SharedRng = Arc::new(Mutex::new(ChaCha20Rng::from_entropy()));
            Arc::new(SimulatedAdapter::new(&config.rpc_url, rng))
        }
        FheMode::Relayed => {
            let relayer = config
                .relayer()
                .map_err(|e| Error::InitializationFailed(e.to_string()))?;
            info!(relayer_url = %relayer.url, "connecting relayed fhe backend");
            Arc::new(RelayedAdapter::new(relayer.clone(), config.partial_results))
        }
    };
    adapter.init().await?;
    Ok(adapter)
}

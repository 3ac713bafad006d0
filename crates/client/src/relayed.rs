// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{CiphertextBuilder, FheAdapter, InputEncryptor};
use alloy_primitives::Address;
use async_trait::async_trait;
use crs_config::{PartialResultPolicy, RelayerConfig};
use crs_types::{
    CiphertextHandle, DecryptionRequest, EncryptedInput, EncryptionContext, Error, PlaintextValue,
    Result, ValidityProof,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InputProofRequest {
    contract_address: String,
    caller_address: String,
    values: Vec<WireValue>,
}

#[derive(Serialize)]
struct WireValue {
    bits: u8,
    value: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputProofResponse {
    handles: Vec<String>,
    input_proof: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserDecryptRequest {
    caller_address: String,
    items: Vec<WireDecryptItem>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireDecryptItem {
    handle: String,
    contract_address: String,
}

#[derive(Deserialize)]
struct UserDecryptResponse {
    results: BTreeMap<String, u64>,
}

/// Session bound to one target network's published relayer configuration.
/// Created exactly once by `RelayedAdapter::init`.
struct RelayerSession {
    http: reqwest::Client,
    config: RelayerConfig,
}

impl RelayerSession {
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }

    async fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R> {
        let response = self
            .http
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::RelayUnavailable(format!("{path}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::RelayUnavailable(format!(
                "{path}: status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::RelayUnavailable(format!("{path}: malformed response: {e}")))
    }
}

#[async_trait]
impl InputEncryptor for RelayerSession {
    async fn encrypt_batch(
        &self,
        context: EncryptionContext,
        values: &[PlaintextValue],
    ) -> Result<EncryptedInput> {
        let body = InputProofRequest {
            contract_address: context.contract().to_string(),
            caller_address: context.submitter().to_string(),
            values: values
                .iter()
                .map(|v| WireValue {
                    bits: v.width().bits(),
                    value: v.value(),
                })
                .collect(),
        };

        let response: InputProofResponse = self.post_json("v1/input-proof", &body).await?;

        if response.handles.len() != values.len() {
            return Err(Error::RelayUnavailable(format!(
                "v1/input-proof: expected {} handles, got {}",
                values.len(),
                response.handles.len()
            )));
        }

        let handles = response
            .handles
            .iter()
            .map(|h| {
                CiphertextHandle::from_hex(h)
                    .map_err(|e| Error::RelayUnavailable(format!("malformed handle: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        let proof = ValidityProof::from_hex(&response.input_proof)
            .map_err(|e| Error::RelayUnavailable(format!("malformed proof: {e}")))?;

        Ok(EncryptedInput { handles, proof })
    }
}

/// Production backend: encryption and decryption are delegated to the
/// remote relaying service. No retry happens here; a failed call surfaces
/// as `RelayUnavailable` and retry policy belongs to the caller.
pub struct RelayedAdapter {
    config: RelayerConfig,
    partial_results: PartialResultPolicy,
    session: OnceCell<Arc<RelayerSession>>,
}

impl RelayedAdapter {
    pub fn new(config: RelayerConfig, partial_results: PartialResultPolicy) -> Self {
        Self {
            config,
            partial_results,
            session: OnceCell::new(),
        }
    }

    fn session(&self) -> Result<Arc<RelayerSession>> {
        self.session
            .get()
            .cloned()
            .ok_or_else(|| Error::InitializationFailed("init() has not completed".to_string()))
    }
}

#[async_trait]
impl FheAdapter for RelayedAdapter {
    /// One-time bootstrap: verify the relayer publishes its key
    /// configuration, then bind the session to the target network.
    async fn init(&self) -> Result<()> {
        if self.session.get().is_some() {
            return Ok(());
        }

        let session = RelayerSession {
            http: reqwest::Client::new(),
            config: self.config.clone(),
        };

        let response = session
            .http
            .get(session.endpoint("v1/keyurl"))
            .send()
            .await
            .map_err(|e| Error::InitializationFailed(format!("relayer bootstrap: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::InitializationFailed(format!(
                "relayer bootstrap: status {}",
                response.status()
            )));
        }

        info!(chain_id = self.config.chain_id, "relayer session established");
        let _ = self.session.set(Arc::new(session));
        Ok(())
    }

    fn create_encrypted_input(&self, context: EncryptionContext) -> Result<CiphertextBuilder> {
        let session = self.session()?;
        Ok(CiphertextBuilder::new(context, session))
    }

    async fn request_decryption(
        &self,
        request: &DecryptionRequest,
        caller: Address,
    ) -> Result<BTreeMap<CiphertextHandle, u64>> {
        let session = self.session()?;
        let body = UserDecryptRequest {
            caller_address: caller.to_string(),
            items: request
                .items()
                .iter()
                .map(|item| WireDecryptItem {
                    handle: item.handle.to_hex(),
                    contract_address: item.contract.to_string(),
                })
                .collect(),
        };

        let response: UserDecryptResponse = session.post_json("v1/user-decrypt", &body).await?;

        let mut out = BTreeMap::new();
        for (key, value) in response.results {
            let handle = CiphertextHandle::from_hex(&key)
                .map_err(|e| Error::RelayUnavailable(format!("malformed handle: {e}")))?;
            out.insert(handle, value);
        }

        // The relay may authorize only part of the batch. A missing key
        // means "not yet decryptable", never zero; what to do about it is
        // the configured policy's call. Checked per requested item: the
        // request may list a handle more than once, and the relay may
        // return keys nobody asked for.
        let missing = request
            .items()
            .iter()
            .find(|item| !out.contains_key(&item.handle));
        if let Some(item) = missing {
            match self.partial_results {
                PartialResultPolicy::Pending => {
                    warn!(
                        requested = request.items().len(),
                        decrypted = out.len(),
                        handle = %item.handle,
                        "relayer returned a partial decryption set"
                    );
                }
                PartialResultPolicy::Fail => {
                    return Err(Error::DecryptionDenied(item.handle));
                }
            }
        }

        Ok(out)
    }
}

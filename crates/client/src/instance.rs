// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{HandleAcl, InputEncryptor, SharedRng};
use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use crs_types::{
    CiphertextHandle, DecryptionItem, EncryptedInput, EncryptionContext, Error, PlaintextValue,
    Result, ValidityProof,
};
use rand::Rng;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use tracing::debug;

/// Backend configuration discovered from the local node before any
/// encryption can happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendMetadata {
    pub acl_address: Address,
    pub input_verifier_address: Address,
    pub kms_verifier_address: Address,
    pub chain_id: u64,
    pub gateway_chain_id: u64,
}

impl BackendMetadata {
    /// Parse the `result` object of the node's metadata response. Every
    /// field is required; a response missing any of them is a hard failure.
    pub fn from_rpc_result(result: &Value) -> Result<Self> {
        let addr = |field: &str| -> Result<Address> {
            result
                .get(field)
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    Error::BackendUnavailable(format!("metadata response missing `{field}`"))
                })?
                .parse()
                .map_err(|e| Error::BackendUnavailable(format!("bad address in `{field}`: {e}")))
        };
        let num = |field: &str| -> Result<u64> {
            result.get(field).and_then(Value::as_u64).ok_or_else(|| {
                Error::BackendUnavailable(format!("metadata response missing `{field}`"))
            })
        };

        Ok(Self {
            acl_address: addr("ACLAddress")?,
            input_verifier_address: addr("InputVerifierAddress")?,
            kms_verifier_address: addr("KMSVerifierAddress")?,
            chain_id: num("chainId")?,
            gateway_chain_id: num("gatewayChainId")?,
        })
    }
}

struct PendingBatch {
    contract: Address,
    submitter: Address,
    handles: Vec<CiphertextHandle>,
}

#[derive(Default)]
struct InstanceState {
    plaintexts: HashMap<CiphertextHandle, u64>,
    // keyed by proof bytes; removed once the aggregator consumes the proof
    batches: HashMap<Vec<u8>, PendingBatch>,
    acl: HandleAcl,
}

/// Local stand-in for the cryptographic backend.
///
/// One instance is shared by every builder and decrypt call in the process.
/// Handles are random 32-byte identifiers; the plaintexts they reference
/// live only inside this instance, which is what makes handles safe to log.
/// Access control mirrors production: a decryption with no recorded grant is
/// rejected even though no relayer is involved.
pub struct MockFheInstance {
    metadata: BackendMetadata,
    rng: SharedRng,
    state: Mutex<InstanceState>,
}

impl MockFheInstance {
    pub fn new(metadata: BackendMetadata, rng: SharedRng) -> Self {
        Self {
            metadata,
            rng,
            state: Mutex::new(InstanceState::default()),
        }
    }

    pub fn metadata(&self) -> &BackendMetadata {
        &self.metadata
    }

    fn fresh_handle(&self) -> CiphertextHandle {
        let bytes: [u8; 32] = self.rng.lock().unwrap().gen();
        CiphertextHandle::new(B256::from(bytes))
    }

    /// Verify a batch proof against the exact context and handle sequence
    /// the aggregator observed. The proof is consumed on success; swapping
    /// either address or reordering the handles fails verification.
    pub fn verify_input(
        &self,
        proof: &ValidityProof,
        contract: Address,
        submitter: Address,
        handles: &[CiphertextHandle],
    ) -> bool {
        let mut state = self.state.lock().unwrap();
        let matches = match state.batches.get(proof.as_slice()) {
            Some(batch) => {
                batch.contract == contract
                    && batch.submitter == submitter
                    && batch.handles == handles
            }
            None => false,
        };
        if matches {
            state.batches.remove(proof.as_slice());
        }
        matches
    }

    /// ACL grant: the side effect of the aggregator's authorizing call.
    pub fn allow(&self, handle: CiphertextHandle, contract: Address, caller: Address) {
        debug!(%handle, %contract, %caller, "recording decryption grant");
        self.state.lock().unwrap().acl.allow(handle, contract, caller);
    }

    /// Mock homomorphic evaluation: floor average over the referenced
    /// plaintexts, stored under a fresh handle. A fresh handle per call is
    /// what rotates the aggregate's handle after each recomputation.
    pub fn evaluate_mean(&self, handles: &[CiphertextHandle]) -> Result<CiphertextHandle> {
        if handles.is_empty() {
            return Err(Error::HandleUnavailable(
                "aggregate has no submissions".to_string(),
            ));
        }
        let out = self.fresh_handle();
        let mut state = self.state.lock().unwrap();
        let mut sum: u128 = 0;
        for handle in handles {
            let value = state.plaintexts.get(handle).ok_or_else(|| {
                Error::HandleUnavailable(format!("unknown ciphertext handle {handle}"))
            })?;
            sum += *value as u128;
        }
        let mean = (sum / handles.len() as u128) as u64;
        state.plaintexts.insert(out, mean);
        Ok(out)
    }

    /// Decrypt on behalf of `caller`, enforcing the grant relation.
    ///
    /// Authorized triples are referentially transparent: repeating the same
    /// request yields the same plaintext. An unauthorized triple fails now
    /// but may succeed after a later authorizing call.
    pub fn user_decrypt(
        &self,
        items: &[DecryptionItem],
        caller: Address,
    ) -> Result<BTreeMap<CiphertextHandle, u64>> {
        let state = self.state.lock().unwrap();
        let mut out = BTreeMap::new();
        for item in items {
            if !state.acl.is_allowed(item.handle, item.contract, caller) {
                return Err(Error::UnauthorizedDecryption {
                    handle: item.handle,
                    contract: item.contract,
                });
            }
            let value = state.plaintexts.get(&item.handle).ok_or_else(|| {
                Error::HandleUnavailable(format!("unknown ciphertext handle {}", item.handle))
            })?;
            out.insert(item.handle, *value);
        }
        Ok(out)
    }
}

#[async_trait]
impl InputEncryptor for MockFheInstance {
    async fn encrypt_batch(
        &self,
        context: EncryptionContext,
        values: &[PlaintextValue],
    ) -> Result<EncryptedInput> {
        let handles: Vec<CiphertextHandle> = values.iter().map(|_| self.fresh_handle()).collect();

        // Proof bytes: digest over the context, the ordered batch and a
        // per-batch nonce. The binding itself is enforced by verify_input
        // replaying the recorded batch, so the bytes stay opaque to callers.
        let nonce: [u8; 16] = self.rng.lock().unwrap().gen();
        let mut hasher = Sha256::new();
        hasher.update(context.contract());
        hasher.update(context.submitter());
        for value in values {
            hasher.update([value.width().bits()]);
            hasher.update(value.value().to_le_bytes());
        }
        hasher.update(nonce);
        let proof = ValidityProof::new(hasher.finalize().to_vec());

        let mut state = self.state.lock().unwrap();
        for (handle, value) in handles.iter().zip(values) {
            state.plaintexts.insert(*handle, value.value());
        }
        state.batches.insert(
            proof.as_slice().to_vec(),
            PendingBatch {
                contract: context.contract(),
                submitter: context.submitter(),
                handles: handles.clone(),
            },
        );
        debug!(batch = handles.len(), "encrypted input batch");

        Ok(EncryptedInput { handles, proof })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crs_types::ScoreWidth;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::sync::Arc;

    fn test_metadata() -> BackendMetadata {
        BackendMetadata {
            acl_address: Address::repeat_byte(0x01),
            input_verifier_address: Address::repeat_byte(0x02),
            kms_verifier_address: Address::repeat_byte(0x03),
            chain_id: 31337,
            gateway_chain_id: 55815,
        }
    }

    fn test_instance() -> MockFheInstance {
        let rng = Arc::new(std::sync::Mutex::new(ChaCha20Rng::seed_from_u64(7)));
        MockFheInstance::new(test_metadata(), rng)
    }

    fn context() -> EncryptionContext {
        EncryptionContext::new(Address::repeat_byte(0xaa), Address::repeat_byte(0xbb)).unwrap()
    }

    #[tokio::test]
    async fn proof_is_consumed_exactly_once() {
        let instance = test_instance();
        let ctx = context();
        let input = instance
            .encrypt_batch(ctx, &[PlaintextValue::new(ScoreWidth::U8, 7).unwrap()])
            .await
            .unwrap();

        assert!(instance.verify_input(&input.proof, ctx.contract(), ctx.submitter(), &input.handles));
        assert!(!instance.verify_input(
            &input.proof,
            ctx.contract(),
            ctx.submitter(),
            &input.handles
        ));
    }

    #[tokio::test]
    async fn proof_binds_context_and_order() {
        let instance = test_instance();
        let ctx = context();
        let mut input = instance
            .encrypt_batch(
                ctx,
                &[
                    PlaintextValue::new(ScoreWidth::U8, 7).unwrap(),
                    PlaintextValue::new(ScoreWidth::U32, 900).unwrap(),
                ],
            )
            .await
            .unwrap();

        let other = Address::repeat_byte(0xcc);
        assert!(!instance.verify_input(&input.proof, other, ctx.submitter(), &input.handles));
        assert!(!instance.verify_input(&input.proof, ctx.contract(), other, &input.handles));

        input.handles.swap(0, 1);
        assert!(!instance.verify_input(
            &input.proof,
            ctx.contract(),
            ctx.submitter(),
            &input.handles
        ));
    }

    #[tokio::test]
    async fn decrypt_requires_grant() {
        let instance = test_instance();
        let ctx = context();
        let input = instance
            .encrypt_batch(ctx, &[PlaintextValue::new(ScoreWidth::U8, 9).unwrap()])
            .await
            .unwrap();
        let handle = input.handles[0];
        let caller = Address::repeat_byte(0xdd);
        let items = [DecryptionItem {
            handle,
            contract: ctx.contract(),
        }];

        assert!(matches!(
            instance.user_decrypt(&items, caller),
            Err(Error::UnauthorizedDecryption { .. })
        ));

        instance.allow(handle, ctx.contract(), caller);
        let decrypted = instance.user_decrypt(&items, caller).unwrap();
        assert_eq!(decrypted[&handle], 9);
        // repeatable for an authorized triple
        assert_eq!(instance.user_decrypt(&items, caller).unwrap()[&handle], 9);
    }

    #[tokio::test]
    async fn mean_rotates_handles() {
        let instance = test_instance();
        let ctx = context();
        let input = instance
            .encrypt_batch(
                ctx,
                &[
                    PlaintextValue::new(ScoreWidth::U8, 7).unwrap(),
                    PlaintextValue::new(ScoreWidth::U8, 9).unwrap(),
                ],
            )
            .await
            .unwrap();

        let first = instance.evaluate_mean(&input.handles).unwrap();
        let second = instance.evaluate_mean(&input.handles).unwrap();
        assert_ne!(first, second);

        let caller = Address::repeat_byte(0xdd);
        instance.allow(second, ctx.contract(), caller);
        let decrypted = instance
            .user_decrypt(
                &[DecryptionItem {
                    handle: second,
                    contract: ctx.contract(),
                }],
                caller,
            )
            .unwrap();
        assert_eq!(decrypted[&second], 8);
    }

    #[test]
    fn metadata_requires_every_field() {
        let full = serde_json::json!({
            "ACLAddress": "0x0000000000000000000000000000000000000101",
            "InputVerifierAddress": "0x0000000000000000000000000000000000000202",
            "KMSVerifierAddress": "0x0000000000000000000000000000000000000303",
            "chainId": 31337,
            "gatewayChainId": 55815,
        });
        let metadata = BackendMetadata::from_rpc_result(&full).unwrap();
        assert_eq!(metadata.chain_id, 31337);

        for field in [
            "ACLAddress",
            "InputVerifierAddress",
            "KMSVerifierAddress",
            "chainId",
            "gatewayChainId",
        ] {
            let mut partial = full.clone();
            partial.as_object_mut().unwrap().remove(field);
            assert!(matches!(
                BackendMetadata::from_rpc_result(&partial),
                Err(Error::BackendUnavailable(_))
            ));
        }
    }
}

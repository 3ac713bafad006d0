// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use async_trait::async_trait;
use crs_types::{EncryptedInput, EncryptionContext, PlaintextValue, Result, ScoreWidth};
use std::sync::Arc;

/// Backend-side half of the builder: turns an ordered batch of plaintext
/// values into handle-shaped blobs plus one validity proof, bound to the
/// batch's context.
#[async_trait]
pub trait InputEncryptor: Send + Sync {
    async fn encrypt_batch(
        &self,
        context: EncryptionContext,
        values: &[PlaintextValue],
    ) -> Result<EncryptedInput>;
}

/// Accumulates plaintext values for one submission intent.
///
/// Created through `FheAdapter::create_encrypted_input`; the context is
/// validated there. Value order is significant, since downstream consumers
/// index the resulting handles positionally, so the builder appends and never
/// reorders.
pub struct CiphertextBuilder {
    context: EncryptionContext,
    values: Vec<PlaintextValue>,
    encryptor: Arc<dyn InputEncryptor>,
}

impl CiphertextBuilder {
    pub(crate) fn new(context: EncryptionContext, encryptor: Arc<dyn InputEncryptor>) -> Self {
        Self {
            context,
            values: Vec::new(),
            encryptor,
        }
    }

    pub fn context(&self) -> EncryptionContext {
        self.context
    }

    /// Append a value of the given width. Fails with `ValueOutOfRange` if
    /// `value >= 2^width`; range errors are local and never retried.
    pub fn add_value(&mut self, width: ScoreWidth, value: u64) -> Result<()> {
        self.values.push(PlaintextValue::new(width, value)?);
        Ok(())
    }

    pub fn add_u8(&mut self, value: u64) -> Result<()> {
        self.add_value(ScoreWidth::U8, value)
    }

    pub fn add_u32(&mut self, value: u64) -> Result<()> {
        self.add_value(ScoreWidth::U32, value)
    }

    pub fn add_u64(&mut self, value: u64) -> Result<()> {
        self.add_value(ScoreWidth::U64, value)
    }

    /// Produce the encrypted payload and its validity proof.
    ///
    /// Consumes the builder: the relayed backend derives randomness per
    /// call, so encrypting the same values twice yields different ciphertext
    /// bytes. One builder, one submission intent.
    pub async fn encrypt(self) -> Result<EncryptedInput> {
        self.encryptor
            .encrypt_batch(self.context, &self.values)
            .await
    }
}

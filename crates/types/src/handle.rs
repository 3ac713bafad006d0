// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Error, Result};
use alloy_primitives::{Bytes, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque 32-byte reference to one encrypted value held by the aggregator.
///
/// Carries no plaintext and is safe to log. The internal structure belongs
/// to the aggregator and the cryptographic backend; this client only ever
/// holds handles and passes them by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CiphertextHandle(B256);

impl CiphertextHandle {
    pub fn new(bytes: B256) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0 .0
    }

    pub fn inner(&self) -> B256 {
        self.0
    }

    /// Hex-encode with the host ledger's `0x` prefix.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|e| Error::BadHandleEncoding(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(Error::BadHandleEncoding(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(B256::from_slice(&bytes)))
    }
}

impl fmt::Display for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<B256> for CiphertextHandle {
    fn from(value: B256) -> Self {
        Self(value)
    }
}

/// Opaque proof that every ciphertext in a batch is well-formed and within
/// its declared bit-width, bound to one [`crate::EncryptionContext`].
/// Produced once per encryption batch, consumed exactly once at submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityProof(Bytes);

impl ValidityProof {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|e| Error::BadHandleEncoding(e.to_string()))?;
        Ok(Self(bytes.into()))
    }
}

/// Output of `CiphertextBuilder::encrypt`: one handle-shaped blob per added
/// value, in `add_value` order, plus the batch proof. Downstream consumers
/// index the handles positionally.
#[derive(Debug, Clone)]
pub struct EncryptedInput {
    pub handles: Vec<CiphertextHandle>,
    pub proof: ValidityProof,
}

// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{CiphertextHandle, ScoreWidth};
use alloy_primitives::Address;
use thiserror::Error as ThisError;

/// Error taxonomy for the scoring client.
///
/// `InvalidContext` and `ValueOutOfRange` are local validation failures and
/// never reach the network. The bootstrap/network errors are surfaced as-is;
/// no retry happens at this layer. Permission errors are terminal for the
/// current handle snapshot only; re-running the full authorize/re-read/
/// decrypt sequence may legitimately succeed with a newer handle.
#[derive(ThisError, Debug)]
pub enum Error {
    #[error("encryption context must not contain a zero address")]
    InvalidContext,

    #[error("value {value} does not fit in {width} bits")]
    ValueOutOfRange { width: ScoreWidth, value: u64 },

    #[error("fhe backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("relayer session not initialized: {0}")]
    InitializationFailed(String),

    #[error("relayer unavailable: {0}")]
    RelayUnavailable(String),

    #[error("authorizing call failed: {0}")]
    AuthorizationFailed(String),

    #[error("aggregate handle unavailable: {0}")]
    HandleUnavailable(String),

    #[error("decryption denied for handle {0}")]
    DecryptionDenied(CiphertextHandle),

    #[error("no decryption grant for handle {handle} at contract {contract}")]
    UnauthorizedDecryption {
        handle: CiphertextHandle,
        contract: Address,
    },

    #[error("bad handle encoding: {0}")]
    BadHandleEncoding(String),
}

/// Result that returns a type T or a scoring client Error
pub type Result<T> = std::result::Result<T, Error>;

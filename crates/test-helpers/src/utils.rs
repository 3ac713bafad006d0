// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use crs_client::{BackendMetadata, SharedRng};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::sync::{Arc, Mutex};

pub fn create_shared_rng_from_u64(seed: u64) -> SharedRng {
    Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed)))
}

pub fn rand_eth_addr(rng: &SharedRng) -> Address {
    let rnum = rng.lock().unwrap().gen::<[u8; 20]>();
    Address::from_slice(&rnum)
}

/// Backend metadata matching the local hardhat node's defaults, for tests
/// that skip the discovery round trip.
pub fn local_backend_metadata() -> BackendMetadata {
    BackendMetadata {
        acl_address: Address::repeat_byte(0x50),
        input_verifier_address: Address::repeat_byte(0x51),
        kms_verifier_address: Address::repeat_byte(0x52),
        chain_id: 31337,
        gateway_chain_id: 55815,
    }
}

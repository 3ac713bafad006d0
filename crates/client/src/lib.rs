// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod acl;
mod adapter;
mod builder;
mod instance;
mod relayed;
mod simulated;

pub use acl::*;
pub use adapter::*;
pub use builder::*;
pub use instance::*;
pub use relayed::*;
pub use simulated::*;

use rand_chacha::ChaCha20Rng;
use std::sync::{Arc, Mutex};

pub type SharedRng = Arc<Mutex<ChaCha20Rng>>;

// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod adapter_config;
mod contract;
mod rpc;

pub use adapter_config::*;
pub use contract::*;
pub use rpc::*;

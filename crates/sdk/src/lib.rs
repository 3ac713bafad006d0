// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

pub use crs_types as types;

#[cfg(feature = "client")]
pub use crs_client as client;

#[cfg(feature = "client")]
pub use crs_orchestrator as orchestrator;

#[cfg(feature = "config")]
pub use crs_config as config;

#[cfg(feature = "evm")]
pub use crs_evm_helpers as evm_helpers;

#[cfg(feature = "logger")]
pub use crs_logger as logger;

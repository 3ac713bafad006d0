// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod context;
mod error;
mod handle;
mod request;
mod value;

pub use context::*;
pub use error::*;
pub use handle::*;
pub use request::*;
pub use value::*;

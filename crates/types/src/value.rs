// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared bit-width of an encrypted score value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreWidth {
    U8,
    U32,
    U64,
}

impl ScoreWidth {
    pub fn bits(&self) -> u8 {
        match self {
            ScoreWidth::U8 => 8,
            ScoreWidth::U32 => 32,
            ScoreWidth::U64 => 64,
        }
    }

    /// Whether `value` is representable in this width (value < 2^width).
    pub fn fits(&self, value: u64) -> bool {
        match self {
            ScoreWidth::U8 => value <= u8::MAX as u64,
            ScoreWidth::U32 => value <= u32::MAX as u64,
            ScoreWidth::U64 => true,
        }
    }
}

impl fmt::Display for ScoreWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// An unsigned integer together with its declared bit-width.
///
/// Construction is the only place the range invariant is checked, so a
/// `PlaintextValue` in hand is always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaintextValue {
    width: ScoreWidth,
    value: u64,
}

impl PlaintextValue {
    pub fn new(width: ScoreWidth, value: u64) -> Result<Self> {
        if !width.fits(value) {
            return Err(Error::ValueOutOfRange { width, value });
        }
        Ok(Self { width, value })
    }

    pub fn width(&self) -> ScoreWidth {
        self.width
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_value_above_width() {
        let err = PlaintextValue::new(ScoreWidth::U8, 256).unwrap_err();
        assert!(matches!(err, Error::ValueOutOfRange { value: 256, .. }));
    }

    #[test]
    fn accepts_width_boundary() {
        assert_eq!(
            PlaintextValue::new(ScoreWidth::U8, 255).unwrap().value(),
            255
        );
        assert_eq!(
            PlaintextValue::new(ScoreWidth::U32, u32::MAX as u64)
                .unwrap()
                .value(),
            u32::MAX as u64
        );
        assert!(PlaintextValue::new(ScoreWidth::U64, u64::MAX).is_ok());
    }
}

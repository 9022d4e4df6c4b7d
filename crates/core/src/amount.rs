//! Atomic-unit amounts.
//!
//! Prices and balances are carried as integers in the asset's smallest
//! denomination. Decimal rendering uses integer arithmetic with an explicit
//! decimal-place count; there is no floating-point conversion anywhere.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An amount in atomic units.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AtomicAmount(u128);

impl AtomicAmount {
    pub const ZERO: Self = Self(0);

    pub const fn new(units: u128) -> Self {
        Self(units)
    }

    pub const fn units(&self) -> u128 {
        self.0
    }

    /// Amount by which `self` falls short of `required`, if any.
    pub fn deficit_for(&self, required: AtomicAmount) -> Option<AtomicAmount> {
        match required.0.checked_sub(self.0) {
            Some(0) | None => None,
            Some(short) => Some(Self(short)),
        }
    }

    /// Render as a decimal string with `decimals` fractional digits,
    /// trimming trailing zeros.
    pub fn display_with_decimals(&self, decimals: u32) -> String {
        let Some(scale) = 10u128.checked_pow(decimals) else {
            return self.0.to_string();
        };
        let whole = self.0 / scale;
        let frac = self.0 % scale;
        if frac == 0 {
            return whole.to_string();
        }
        let frac = format!("{:0width$}", frac, width = decimals as usize);
        format!("{}.{}", whole, frac.trim_end_matches('0'))
    }
}

impl fmt::Debug for AtomicAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AtomicAmount({})", self.0)
    }
}

impl fmt::Display for AtomicAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AtomicAmount {
    type Err = crate::Error;

    /// Parse a non-negative integer string. Fractional or signed values
    /// are rejected rather than rounded.
    fn from_str(s: &str) -> crate::Result<Self> {
        let s = s.trim().trim_matches('"');
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(crate::Error::InvalidAmount(s.to_string()));
        }
        s.parse::<u128>()
            .map(Self)
            .map_err(|e| crate::Error::InvalidAmount(format!("{s}: {e}")))
    }
}

impl From<u128> for AtomicAmount {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

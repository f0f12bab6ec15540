//! Fixed-point monetary amounts and the minimum-bid computation.
//!
//! All amounts are wei-denominated `u128` values (18 decimals). User input
//! arrives as decimal ether strings and is converted here; the rounding
//! policy is integer truncation, both when parsing beyond 18 fractional
//! digits and in the increment multiplication.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Wei per ether.
pub const ETH: u128 = 1_000_000_000_000_000_000;

/// A wei-denominated amount.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize,
    BorshDeserialize,
)]
pub struct Wei(pub u128);

impl Wei {
    pub const ZERO: Wei = Wei(0);

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn saturating_mul(self, factor: u128) -> Wei {
        Wei(self.0.saturating_mul(factor))
    }

    pub fn checked_add(self, other: Wei) -> Option<Wei> {
        self.0.checked_add(other.0).map(Wei)
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// Wei travels over RPC as a decimal string; JSON numbers cannot carry u128.
impl Serialize for Wei {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Wei {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        s.parse::<u128>().map(Wei).map_err(serde::de::Error::custom)
    }
}

/// Errors from parsing a decimal ether amount.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountParseError {
    #[error("empty amount")]
    Empty,

    #[error("invalid character in amount")]
    InvalidDigit,

    #[error("more than one decimal point")]
    MultiplePoints,

    #[error("amount out of range")]
    Overflow,
}

/// Parse a decimal ether string into wei.
///
/// Fractional digits beyond the 18th are truncated.
pub fn parse_ether(s: &str) -> Result<Wei, AmountParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(AmountParseError::Empty);
    }

    let (int_part, frac_part) = match s.split_once('.') {
        Some((int, frac)) => {
            if frac.contains('.') {
                return Err(AmountParseError::MultiplePoints);
            }
            (int, frac)
        }
        None => (s, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(AmountParseError::Empty);
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(AmountParseError::InvalidDigit);
    }

    let int: u128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| AmountParseError::Overflow)?
    };

    let mut frac_digits: String = frac_part.chars().take(18).collect();
    while frac_digits.len() < 18 {
        frac_digits.push('0');
    }
    // cannot overflow: at most 18 digits
    let frac: u128 = frac_digits.parse().expect("frac digits are ascii digits");

    int.checked_mul(ETH)
        .and_then(|wei| wei.checked_add(frac))
        .map(Wei)
        .ok_or(AmountParseError::Overflow)
}

/// Format a wei amount as a decimal ether string, trimming trailing zeros.
pub fn format_ether(amount: Wei) -> String {
    let int = amount.0 / ETH;
    let frac = amount.0 % ETH;
    if frac == 0 {
        return int.to_string();
    }
    let frac = format!("{frac:018}");
    format!("{int}.{}", frac.trim_end_matches('0'))
}

/// Minimum acceptable bid: `max(reserve, highest × (1 + increment/100))`.
///
/// Shared by the client-side validator, the risk-gate fallback, and the
/// house-side re-check. The multiplication truncates.
pub fn minimum_bid(reserve: Wei, increment_pct: u8, highest: Option<Wei>) -> Wei {
    let raised = match highest {
        Some(h) => h.0.saturating_mul(100 + increment_pct as u128) / 100,
        None => 0,
    };
    Wei(raised.max(reserve.0))
}

//! Shared type definitions for the Mines engine
//!
//! Canonical value types used by every component: player identity,
//! integer token amounts and fixed-point payout multipliers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque account identifier supplied by the wallet/session layer
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token amount in base units (8 decimals per whole token)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Base units per whole token
    pub const UNIT: u64 = 100_000_000;
    pub const DECIMALS: u32 = 8;
    pub const ZERO: Amount = Amount(0);

    pub const fn from_base_units(units: u64) -> Self {
        Self(units)
    }

    /// Whole tokens, saturating at `u64::MAX` base units
    pub const fn tokens(whole: u64) -> Self {
        Self(whole.saturating_mul(Self::UNIT))
    }

    pub const fn base_units(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// Parse a decimal token string such as `"12"`, `"0.1"` or `"2.50"`.
    ///
    /// Returns `None` for malformed input, more than 8 fractional digits,
    /// or values that do not fit in `u64` base units.
    pub fn parse_tokens(input: &str) -> Option<Amount> {
        let input = input.trim();
        let (whole, frac) = match input.split_once('.') {
            Some((w, f)) => (w, f),
            None => (input, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        if frac.len() > Self::DECIMALS as usize {
            return None;
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let frac_units: u64 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac, width = Self::DECIMALS as usize);
            padded.parse().ok()?
        };

        whole
            .checked_mul(Self::UNIT)?
            .checked_add(frac_units)
            .map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::UNIT;
        let frac = format!("{:08}", self.0 % Self::UNIT);
        let trimmed = frac.trim_end_matches('0');
        let frac = if trimmed.len() < 2 { &frac[..2] } else { trimmed };
        write!(f, "{}.{}", whole, frac)
    }
}

/// Fixed-point payout multiplier with 8 fractional digits.
///
/// Stored as `u128` so the full-board multiplier of the largest supported
/// grid (C(100, 50) for a 10x10 board) still fits after scaling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Multiplier(u128);

impl Multiplier {
    pub const SCALE: u128 = 100_000_000;
    pub const DECIMALS: u8 = 8;
    pub const ONE: Multiplier = Multiplier(Self::SCALE);

    pub const fn from_scaled(scaled: u128) -> Self {
        Self(scaled)
    }

    pub const fn scaled(self) -> u128 {
        self.0
    }

    /// Lossy view for reporting and statistics only; settlement never uses it
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    /// Truncate toward zero to `digits` fractional digits (capped at 8)
    pub fn truncate_to(self, digits: u8) -> Self {
        let digits = digits.min(Self::DECIMALS);
        let step = 10u128.pow(u32::from(Self::DECIMALS - digits));
        Self(self.0 / step * step)
    }
}

impl Default for Multiplier {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::SCALE;
        let frac = format!("{:08}", self.0 % Self::SCALE);
        let trimmed = frac.trim_end_matches('0');
        let frac = if trimmed.len() < 2 { &frac[..2] } else { trimmed };
        write!(f, "{}.{}x", whole, frac)
    }
}

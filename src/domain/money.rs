use crate::error::LedgerError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-negative monetary amount attached to ledger records.
///
/// Wraps `rust_decimal::Decimal` so record amounts never go negative and
/// aggregation keeps full precision until the final rounding step.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, LedgerError> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::Validation(
                "Amount must not be negative".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// True when the amount fits in whole cents (at most two fractional digits).
    pub fn is_cents(&self) -> bool {
        self.0.normalize().scale() <= 2
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Whole-number percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Percentage(u8);

impl Percentage {
    pub const HALF: Self = Self(50);

    pub fn new(value: u8) -> Result<Self, LedgerError> {
        if value <= 100 {
            Ok(Self(value))
        } else {
            Err(LedgerError::Validation(format!(
                "Percentage must be between 0 and 100, got {value}"
            )))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// The share left for the other person.
    pub fn complement(&self) -> Self {
        Self(100 - self.0)
    }

    /// `amount * self / 100`, at full precision.
    pub fn of(&self, amount: Decimal) -> Decimal {
        amount * Decimal::from(self.0) / Decimal::ONE_HUNDRED
    }
}

impl TryFrom<u8> for Percentage {
    type Error = LedgerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for u8 {
    fn from(percentage: Percentage) -> Self {
        percentage.0
    }
}

/// Rounds to cents, midpoint away from zero. Only applied to reported figures.
pub fn round_cents(value: Decimal) -> Decimal {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        Decimal::ZERO
    } else {
        rounded.normalize()
    }
}

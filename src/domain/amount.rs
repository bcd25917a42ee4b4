use crate::error::PaymentError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decimals of the settlement stable token (USDC).
pub const TOKEN_DECIMALS: u32 = 6;

const UNITS_PER_TOKEN: u64 = 10u64.pow(TOKEN_DECIMALS);

/// A strictly positive token amount in base units (6 decimals).
///
/// `Amount::new(5_000_000)` is 5 USDC. Zero is not representable, so any
/// request carrying an `Amount` already satisfies `amount > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Amount(u64);

impl Amount {
    pub fn new(units: u64) -> Result<Self, PaymentError> {
        if units > 0 {
            Ok(Self(units))
        } else {
            Err(PaymentError::ValidationError(
                "Amount must be greater than 0".to_string(),
            ))
        }
    }

    /// Converts a human-readable token value (e.g. `5.02`) into base units.
    pub fn from_decimal(value: Decimal) -> Result<Self, PaymentError> {
        let units = value
            .checked_mul(Decimal::from(UNITS_PER_TOKEN))
            .ok_or_else(|| PaymentError::ValidationError(format!("Amount {value} is too large")))?;
        if !units.fract().is_zero() {
            return Err(PaymentError::ValidationError(format!(
                "Amount {value} has more than {TOKEN_DECIMALS} decimal places"
            )));
        }
        let units = units.to_u64().ok_or_else(|| {
            PaymentError::ValidationError(format!("Amount {value} is out of range"))
        })?;
        Self::new(units)
    }

    pub fn units(&self) -> u64 {
        self.0
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(self.0), TOKEN_DECIMALS).normalize()
    }

    /// Adds a non-negative fee, failing instead of wrapping.
    pub fn checked_add(&self, fee: u64) -> Option<Self> {
        self.0.checked_add(fee).map(Self)
    }
}

impl TryFrom<u64> for Amount {
    type Error = PaymentError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for u64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl FromStr for Amount {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|e| {
            PaymentError::ValidationError(format!("Invalid amount '{s}': {e}"))
        })?;
        Self::from_decimal(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} USDC", self.to_decimal())
    }
}

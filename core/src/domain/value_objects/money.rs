//! Money value object backed by fixed-point decimals.
//!
//! Every amount that moves through the ledger or is stored on a
//! verification is a `Money`: non-negative, exactly two fractional digits,
//! never a float.

use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of fractional digits carried by every amount
pub const MONEY_SCALE: u32 = 2;

/// Errors raised when constructing a `Money` value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Amount cannot be negative: {0}")]
    Negative(String),

    #[error("Amount has more than {MONEY_SCALE} decimal places: {0}")]
    TooPrecise(String),

    #[error("Invalid amount: {0}")]
    Invalid(String),
}

/// Non-negative monetary amount with two fractional digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Money(Decimal);

impl Money {
    /// The zero amount ("0.00")
    pub fn zero() -> Self {
        Money(Decimal::new(0, MONEY_SCALE))
    }

    /// Build from a decimal, rejecting negatives and sub-cent precision
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        if value.is_zero() {
            return Ok(Self::zero());
        }
        if value.is_sign_negative() {
            return Err(MoneyError::Negative(value.to_string()));
        }
        if value.normalize().scale() > MONEY_SCALE {
            return Err(MoneyError::TooPrecise(value.to_string()));
        }

        let mut scaled = value;
        scaled.rescale(MONEY_SCALE);
        Ok(Money(scaled))
    }

    /// Build from an integer number of cents
    pub fn from_cents(cents: i64) -> Result<Self, MoneyError> {
        Self::new(Decimal::new(cents, MONEY_SCALE))
    }

    /// Parse a decimal string such as "8.90"
    pub fn parse(input: &str) -> Result<Self, MoneyError> {
        let value = Decimal::from_str(input.trim())
            .map_err(|_| MoneyError::Invalid(input.to_string()))?;
        Self::new(value)
    }

    /// The underlying decimal, always at scale 2
    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Subtraction that refuses to go below zero
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        if other.0 > self.0 {
            return None;
        }
        self.0.checked_sub(other.0).map(Money)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a non-negative decimal amount with at most two fractional digits")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Money, E> {
        Money::parse(value).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Money, E> {
        Money::new(Decimal::from(value)).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Money, E> {
        Money::new(Decimal::from(value)).map_err(E::custom)
    }
}

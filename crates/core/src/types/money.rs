//! Monetary amounts using decimal arithmetic.
//!
//! Balances and catalog prices are both `NUMERIC(20,2)` in the store. A
//! `Money` always holds a value that column can store exactly: two decimal
//! places, rounded half away from zero as `PostgreSQL` does, and fewer than
//! 18 integer digits.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Decimal places kept by the store.
const SCALE: u32 = 2;

/// Exclusive bound on the magnitude of a stored amount (`10^18`).
const MAGNITUDE_LIMIT: i64 = 1_000_000_000_000_000_000;

/// Errors that can occur when parsing a [`Money`] amount.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The input string is empty.
    #[error("amount cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("invalid amount: {0:?}")]
    Invalid(String),
    /// The amount has 18 or more integer digits.
    #[error("amount out of range: {0:?}")]
    OutOfRange(String),
}

/// A signed monetary amount.
///
/// Used both for absolute values (a balance, a price) and for signed deltas.
/// Serializes as a JSON number.
///
/// ## Examples
///
/// ```
/// use tally_core::Money;
///
/// let balance = Money::parse("100").unwrap();
/// let delta = Money::parse("-3.5").unwrap();
/// assert_eq!(balance.checked_add(delta).unwrap().to_string(), "96.50");
/// assert_eq!(Money::parse("0.125").unwrap().to_string(), "0.13");
/// assert!(Money::parse("ten").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Money {
    /// Parse an amount from user input.
    ///
    /// Accepts plain decimals (`"19.99"`, `"-3"`, `"+10"`) and scientific
    /// notation as produced by JSON encoders (`"1e3"`). Surrounding whitespace
    /// is ignored. Extra fractional digits are rounded to cents.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Empty` for blank input, `MoneyError::Invalid`
    /// for anything that is not a finite decimal and `MoneyError::OutOfRange`
    /// when the rounded value does not fit the store.
    pub fn parse(s: &str) -> Result<Self, MoneyError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(MoneyError::Empty);
        }

        let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);

        let amount = Decimal::from_str(unsigned)
            .or_else(|_| Decimal::from_scientific(unsigned))
            .map_err(|_| MoneyError::Invalid(trimmed.to_owned()))?;

        Self::fit(amount).ok_or_else(|| MoneyError::OutOfRange(trimmed.to_owned()))
    }

    /// Add a signed delta, returning `None` when the sum does not fit the store.
    #[must_use]
    pub fn checked_add(self, delta: Self) -> Option<Self> {
        self.0.checked_add(delta.0).and_then(Self::fit)
    }

    /// Round to cents and check the magnitude.
    fn fit(amount: Decimal) -> Option<Self> {
        let mut rounded =
            amount.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
        if rounded.is_zero() {
            rounded = Decimal::ZERO;
        }
        (rounded.abs() < Decimal::from(MAGNITUDE_LIMIT)).then_some(Self(rounded))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Type<::sqlx::Postgres> for Money {
    fn type_info() -> ::sqlx::postgres::PgTypeInfo {
        <Decimal as ::sqlx::Type<::sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for Money {
    fn decode(
        value: ::sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, ::sqlx::error::BoxDynError> {
        let amount = <Decimal as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Encode<'_, ::sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut ::sqlx::postgres::PgArgumentBuffer,
    ) -> Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
        <Decimal as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_signed() {
        assert_eq!(Money::parse("19.99").unwrap().to_string(), "19.99");
        assert_eq!(Money::parse("+10").unwrap().to_string(), "10.00");
        assert_eq!(Money::parse(" -3 ").unwrap().to_string(), "-3.00");
    }

    #[test]
    fn test_parse_scientific() {
        assert_eq!(Money::parse("1e3").unwrap().to_string(), "1000.00");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Money::parse(""), Err(MoneyError::Empty));
        assert!(matches!(Money::parse("12abc"), Err(MoneyError::Invalid(_))));
        assert!(matches!(Money::parse("NaN"), Err(MoneyError::Invalid(_))));
    }

    #[test]
    fn test_parse_rounds_half_away_from_zero() {
        assert_eq!(Money::parse("101").unwrap().to_string(), "101.00");
        assert_eq!(Money::parse("0.125").unwrap().to_string(), "0.13");
        assert_eq!(Money::parse("-0.125").unwrap().to_string(), "-0.13");
        assert_eq!(Money::parse("2.675").unwrap().to_string(), "2.68");
        assert_eq!(Money::parse("-0.001").unwrap().to_string(), "0.00");
    }

    #[test]
    fn test_rounded_value_is_what_serializes() {
        let money = Money::parse("0.125").unwrap();
        assert_eq!(serde_json::to_string(&money).unwrap(), "0.13");
        assert_eq!(money, Money::parse("0.13").unwrap());
    }

    #[test]
    fn test_parse_rejects_values_the_store_cannot_hold() {
        assert!(Money::parse("999999999999999999.99").is_ok());
        assert!(Money::parse("-999999999999999999.99").is_ok());
        assert!(matches!(
            Money::parse("1e18"),
            Err(MoneyError::OutOfRange(_))
        ));
        assert!(matches!(
            Money::parse("1e19"),
            Err(MoneyError::OutOfRange(_))
        ));
        // Rounds up past the limit.
        assert!(matches!(
            Money::parse("999999999999999999.995"),
            Err(MoneyError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_checked_add_stays_in_range() {
        let max = Money::parse("999999999999999999.99").unwrap();
        assert_eq!(max.checked_add(Money::parse("0.01").unwrap()), None);
        assert_eq!(
            max.checked_add(Money::parse("-0.99").unwrap()).unwrap().to_string(),
            "999999999999999999.00"
        );
    }

    #[test]
    fn test_checked_add_allows_negative_result() {
        let b = Money::parse("5").unwrap();
        let d = Money::parse("-7.25").unwrap();
        assert_eq!(b.checked_add(d).unwrap().to_string(), "-2.25");
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&Money::parse("19.99").unwrap()).unwrap();
        assert_eq!(json, "19.99");
    }
}

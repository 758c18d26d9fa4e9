//! Monetary amounts.
//!
//! Every `Money` is held at 2 decimal places, rounded midpoint-away-from-zero.
//! Intermediate results (per-unit values) stay as raw `Decimal` until they are
//! turned back into a stored amount.

use core::ops::{Add, Sub};
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_object::ValueObject;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Round `amount` to cents.
    pub fn new(amount: Decimal) -> Self {
        Self(amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Floor at zero.
    pub fn non_negative(self) -> Self {
        if self.is_negative() { Self::ZERO } else { self }
    }

    /// `self × quantity`.
    pub fn times(self, quantity: u64) -> Self {
        Self::new(self.0.saturating_mul(Decimal::from(quantity)))
    }

    /// Unrounded value of one unit when `self` is spread over `quantity` units.
    ///
    /// `None` when `quantity` is zero.
    pub fn per_unit(self, quantity: u64) -> Option<Decimal> {
        if quantity == 0 {
            return None;
        }
        self.0.checked_div(Decimal::from(quantity))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money::new(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money::new(self.0.saturating_sub(rhs.0))
    }
}

impl core::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money::new(value)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim())
            .map_err(|e| DomainError::validation(format!("invalid amount '{s}': {e}")))?;
        Ok(Money::new(amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(Money::new(Decimal::new(12345, 3)), Money::from_cents(1235));
        assert_eq!(Money::new(Decimal::new(-12345, 3)), Money::from_cents(-1235));
    }

    #[test]
    fn displays_two_places() {
        assert_eq!(Money::from_cents(5000).to_string(), "50.00");
        assert_eq!("7.5".parse::<Money>().unwrap().to_string(), "7.50");
    }

    #[test]
    fn per_unit_of_zero_quantity_is_none() {
        assert_eq!(Money::from_cents(100).per_unit(0), None);
        assert_eq!(Money::from_cents(1000).per_unit(4), Some(Decimal::new(25, 1)));
    }

    #[test]
    fn non_negative_floors_at_zero() {
        assert_eq!(Money::from_cents(-1).non_negative(), Money::ZERO);
        assert_eq!(Money::from_cents(1).non_negative(), Money::from_cents(1));
    }

    proptest! {
        #[test]
        fn sum_of_cents_is_exact(cents in prop::collection::vec(-1_000_000i64..1_000_000i64, 0..20)) {
            let total: Money = cents.iter().map(|c| Money::from_cents(*c)).sum();
            prop_assert_eq!(total, Money::from_cents(cents.iter().sum()));
        }
    }
}

//! Money amounts and commission rates.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Decimal places of the currency minor unit (cents).
pub const MINOR_UNITS: u32 = 2;

/// Most decimal places a commission rate fraction may carry (0.000001).
pub const MAX_RATE_SCALE: u32 = 6;

/// A non-negative money amount in the smallest currency unit (e.g., cents).
///
/// Addition saturates at `Money::MAX`: aggregates over arbitrarily many
/// valid amounts never panic or wrap.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);
    pub const MAX: Money = Money(u64::MAX);

    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// Whole currency units, e.g. `from_major(250_000)` is 250000.00.
    /// Saturates at `Money::MAX`.
    pub const fn from_major(major: u64) -> Self {
        Self(major.saturating_mul(100))
    }

    /// Convert a decimal amount in major units, rounding half-even to the
    /// minor unit. Negative amounts are rejected.
    pub fn try_from_decimal(amount: Decimal) -> DomainResult<Self> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(DomainError::validation(format!(
                "amount must not be negative (got {amount})"
            )));
        }
        let minor = amount
            .round_dp_with_strategy(MINOR_UNITS, RoundingStrategy::MidpointNearestEven)
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|d| d.to_u64())
            .ok_or_else(|| DomainError::validation(format!("amount out of range ({amount})")))?;
        Ok(Self(minor))
    }

    pub const fn minor(&self) -> u64 {
        self.0
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(self.0), MINOR_UNITS)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }
}

impl core::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl core::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl core::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl ValueObject for Money {}

/// Commission rate expressed as a fraction in `[0, 1]` (0.03 is 3%).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct CommissionRate(Decimal);

impl CommissionRate {
    pub fn new(fraction: Decimal) -> DomainResult<Self> {
        if fraction < Decimal::ZERO || fraction > Decimal::ONE {
            return Err(DomainError::invalid_commission(format!(
                "commission rate must be within [0, 1] (got {fraction})"
            )));
        }
        let fraction = fraction.normalize();
        if fraction.scale() > MAX_RATE_SCALE {
            return Err(DomainError::invalid_commission(format!(
                "commission rate may have at most {MAX_RATE_SCALE} decimal places (got {fraction})"
            )));
        }
        Ok(Self(fraction))
    }

    /// Build a rate from a percentage, as entered in staff forms (`3.0` is 3%).
    pub fn from_percent(percent: Decimal) -> DomainResult<Self> {
        Self::new(percent / Decimal::ONE_HUNDRED)
    }

    pub fn as_fraction(&self) -> Decimal {
        self.0
    }

    pub fn as_percent(&self) -> Decimal {
        (self.0 * Decimal::ONE_HUNDRED).normalize()
    }
}

impl Default for CommissionRate {
    /// 3%, the rate the agency applies when nothing else is configured.
    fn default() -> Self {
        Self(Decimal::new(3, 2))
    }
}

impl TryFrom<Decimal> for CommissionRate {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CommissionRate> for Decimal {
    fn from(value: CommissionRate) -> Self {
        value.0
    }
}

impl core::fmt::Display for CommissionRate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}%", self.as_percent())
    }
}

impl ValueObject for CommissionRate {}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn money_displays_with_two_decimals() {
        assert_eq!(Money::from_major(7_500).to_string(), "7500.00");
        assert_eq!(Money::from_minor(5).to_string(), "0.05");
        assert_eq!(Money::from_minor(123_456).to_string(), "1234.56");
    }

    #[test]
    fn decimal_conversion_rounds_half_even() {
        assert_eq!(Money::try_from_decimal(dec("10.125")).unwrap(), Money::from_minor(1012));
        assert_eq!(Money::try_from_decimal(dec("10.135")).unwrap(), Money::from_minor(1014));
        assert_eq!(Money::try_from_decimal(dec("0")).unwrap(), Money::ZERO);
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let err = Money::try_from_decimal(dec("-0.01")).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn money_sums() {
        let total: Money = [Money::from_minor(150), Money::from_minor(250)].into_iter().sum();
        assert_eq!(total, Money::from_minor(400));
        assert_eq!(Money::from_minor(1050).to_decimal(), dec("10.50"));
    }

    #[test]
    fn sums_saturate_instead_of_overflowing() {
        let half = Money::from_minor(u64::MAX / 2 + 1);
        assert_eq!(half + half, Money::MAX);
        let mut total = Money::MAX;
        total += Money::from_minor(1);
        assert_eq!(total, Money::MAX);
        assert_eq!([half, half, half].into_iter().sum::<Money>(), Money::MAX);
        assert_eq!(Money::from_major(u64::MAX / 10), Money::MAX);
        assert_eq!(half.checked_add(half), None);
    }

    #[test]
    fn rate_bounds_are_enforced() {
        assert!(CommissionRate::new(dec("0")).is_ok());
        assert!(CommissionRate::new(dec("1")).is_ok());
        assert!(matches!(
            CommissionRate::new(dec("1.01")),
            Err(DomainError::InvalidCommissionInput(_))
        ));
        assert!(matches!(
            CommissionRate::new(dec("-0.01")),
            Err(DomainError::InvalidCommissionInput(_))
        ));
        assert!(matches!(
            CommissionRate::new(dec("0.0000001")),
            Err(DomainError::InvalidCommissionInput(_))
        ));
        assert_eq!(CommissionRate::new(dec("0.030000")).unwrap().as_fraction().scale(), 2);
    }

    #[test]
    fn percent_form_matches_fraction_form() {
        let rate = CommissionRate::from_percent(dec("3.0")).unwrap();
        assert_eq!(rate, CommissionRate::new(dec("0.03")).unwrap());
        assert_eq!(rate, CommissionRate::default());
        assert_eq!(rate.to_string(), "3%");
    }

    #[test]
    fn rate_deserialization_validates() {
        let rate: CommissionRate = serde_json::from_str("\"0.025\"").unwrap();
        assert_eq!(rate.as_fraction(), dec("0.025"));
        assert!(serde_json::from_str::<CommissionRate>("\"2\"").is_err());
    }
}

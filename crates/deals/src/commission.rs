//! Commission calculator.
//!
//! `amount = final_price × rate`, rounded half-even to the currency minor
//! unit. Rates carry at most six decimal places, so the product is computed
//! exactly in integer minor units before rounding.

use core::cmp::Ordering;

use rust_decimal::Decimal;

use estatecrm_core::{CommissionRate, DomainError, DomainResult, Money};

/// Commission on a final price given in major units at a fractional rate
/// (`0.03` is 3%).
///
/// Fails with [`DomainError::InvalidCommissionInput`] for a negative price or
/// a rate outside `[0, 1]`.
pub fn compute_commission(final_price: Decimal, commission_rate: Decimal) -> DomainResult<Money> {
    if final_price.is_sign_negative() && !final_price.is_zero() {
        return Err(DomainError::invalid_commission(format!(
            "final price must not be negative (got {final_price})"
        )));
    }
    let price = Money::try_from_decimal(final_price).map_err(|_| {
        DomainError::invalid_commission(format!("final price out of range ({final_price})"))
    })?;
    let rate = CommissionRate::new(commission_rate)?;
    Ok(commission_on(price, rate))
}

/// Commission on an already validated price and rate.
pub fn commission_on(final_price: Money, rate: CommissionRate) -> Money {
    let fraction = rate.as_fraction();
    let numerator = fraction.mantissa().unsigned_abs();
    let denominator = 10u128.pow(fraction.scale());

    let product = u128::from(final_price.minor()) * numerator;
    let (quotient, remainder) = (product / denominator, product % denominator);
    let rounded = match (remainder * 2).cmp(&denominator) {
        Ordering::Greater => quotient + 1,
        Ordering::Equal if quotient % 2 == 1 => quotient + 1,
        _ => quotient,
    };

    // rate <= 1 keeps the result within the price
    Money::from_minor(rounded as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;
    use proptest::prelude::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn rate(s: &str) -> CommissionRate {
        CommissionRate::new(dec(s)).unwrap()
    }

    #[test]
    fn three_percent_of_a_quarter_million() {
        let amount = compute_commission(dec("250000"), dec("0.03")).unwrap();
        assert_eq!(amount, Money::from_major(7_500));
        assert_eq!(amount.to_string(), "7500.00");
    }

    #[test]
    fn rounds_half_to_even_cent() {
        // 0.50 * 5% = 2.5 cents, 0.70 * 5% = 3.5 cents
        assert_eq!(commission_on(Money::from_minor(50), rate("0.05")), Money::from_minor(2));
        assert_eq!(commission_on(Money::from_minor(70), rate("0.05")), Money::from_minor(4));
        // 0.13 * 2.5% = 0.325 cents
        assert_eq!(commission_on(Money::from_minor(13), rate("0.025")), Money::ZERO);
        assert_eq!(commission_on(Money::from_minor(99), rate("0.0101")), Money::from_minor(1));
    }

    #[test]
    fn bounds_of_the_rate() {
        let price = Money::from_major(123_456);
        assert_eq!(commission_on(price, rate("0")), Money::ZERO);
        assert_eq!(commission_on(price, rate("1")), price);
        assert_eq!(commission_on(Money::from_minor(u64::MAX), rate("1")).minor(), u64::MAX);
    }

    #[test]
    fn rejects_out_of_range_inputs() {
        assert!(matches!(
            compute_commission(dec("-1"), dec("0.03")),
            Err(DomainError::InvalidCommissionInput(_))
        ));
        assert!(matches!(
            compute_commission(dec("1000"), dec("1.5")),
            Err(DomainError::InvalidCommissionInput(_))
        ));
        assert!(matches!(
            compute_commission(dec("1000"), dec("-0.01")),
            Err(DomainError::InvalidCommissionInput(_))
        ));
        assert_eq!(compute_commission(dec("0"), dec("0.03")).unwrap(), Money::ZERO);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        #[test]
        fn commission_is_monotonic_in_price(
            a in 0u64..=10_000_000_000_000,
            b in 0u64..=10_000_000_000_000,
            micro in 0i64..=1_000_000,
        ) {
            let rate = CommissionRate::new(Decimal::new(micro, 6)).unwrap();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let lo_amount = commission_on(Money::from_minor(lo), rate);
            let hi_amount = commission_on(Money::from_minor(hi), rate);
            prop_assert!(lo_amount <= hi_amount);
            prop_assert!(hi_amount <= Money::from_minor(hi));
        }
    }
}

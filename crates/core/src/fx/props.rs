//! Property-based tests for cross-unit conversions.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::convert::{bdt_from_dhs, bdt_from_rmb, dhs_from_bdt, usd_from_rmb};

/// Strategy to generate positive decimal amounts (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate positive conversion rates (0.0001 to 10000.0000).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

/// Strategy to generate non-positive rates (the degrade-to-zero inputs).
fn non_positive_rate() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|v| Decimal::new(-v, 4))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Division conversions degrade to zero on any non-positive rate and
    /// never panic.
    #[test]
    fn prop_non_positive_rate_degrades_to_zero(
        amount in positive_amount(),
        rate in non_positive_rate(),
    ) {
        prop_assert_eq!(dhs_from_bdt(amount, rate), Decimal::ZERO);
        prop_assert_eq!(usd_from_rmb(amount, rate), Decimal::ZERO);
    }

    /// Multiplication conversions are exact: no rounding is applied.
    #[test]
    fn prop_multiplication_is_exact(
        amount in positive_amount(),
        rate in positive_rate(),
    ) {
        prop_assert_eq!(bdt_from_dhs(amount, rate), amount * rate);
        prop_assert_eq!(bdt_from_rmb(amount, rate), amount * rate);
    }

    /// Conversions are deterministic.
    #[test]
    fn prop_conversions_deterministic(
        amount in positive_amount(),
        rate in positive_rate(),
    ) {
        prop_assert_eq!(dhs_from_bdt(amount, rate), dhs_from_bdt(amount, rate));
        prop_assert_eq!(usd_from_rmb(amount, rate), usd_from_rmb(amount, rate));
    }

    /// A rate of one is the identity for every conversion.
    #[test]
    fn prop_unit_rate_is_identity(amount in positive_amount()) {
        prop_assert_eq!(dhs_from_bdt(amount, Decimal::ONE), amount);
        prop_assert_eq!(bdt_from_dhs(amount, Decimal::ONE), amount);
        prop_assert_eq!(usd_from_rmb(amount, Decimal::ONE), amount);
        prop_assert_eq!(bdt_from_rmb(amount, Decimal::ONE), amount);
    }

    /// Multiplying a division result back by the rate recovers the input to
    /// within Decimal's 28-digit precision.
    #[test]
    fn prop_division_inverts_multiplication(
        amount in positive_amount(),
        rate in positive_rate(),
    ) {
        let there = bdt_from_dhs(amount, rate);
        let back = dhs_from_bdt(there, rate);
        let diff = (back - amount).abs();
        prop_assert!(
            diff < Decimal::new(1, 12),
            "round-trip drifted by {diff} for amount {amount} rate {rate}"
        );
    }
}

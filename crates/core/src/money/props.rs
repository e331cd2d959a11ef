//! Property-based tests for money rounding.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::rounding::{round_money, truncate_chars};

/// Strategy to generate amounts with up to 6 decimal places (-10,000 to 10,000).
fn raw_amount() -> impl Strategy<Value = Decimal> {
    (-10_000_000_000i64..10_000_000_000i64).prop_map(|v| Decimal::new(v, 6))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Rounded amounts always carry exactly two decimal places.
    #[test]
    fn prop_round_money_scale_is_two(value in raw_amount()) {
        prop_assert_eq!(round_money(value).scale(), 2);
    }

    /// Rounding never moves a value by more than half a cent.
    #[test]
    fn prop_round_money_error_is_bounded(value in raw_amount()) {
        let diff = (round_money(value) - value).abs();
        prop_assert!(diff <= Decimal::new(5, 3), "diff {} too large for {}", diff, value);
    }

    /// Rounding is idempotent.
    #[test]
    fn prop_round_money_idempotent(value in raw_amount()) {
        let once = round_money(value);
        prop_assert_eq!(round_money(once), once);
    }

    /// Rounding is symmetric around zero.
    #[test]
    fn prop_round_money_symmetric(value in raw_amount()) {
        prop_assert_eq!(round_money(-value), -round_money(value));
    }

    /// Truncation never exceeds the limit and keeps a prefix.
    #[test]
    fn prop_truncate_chars_bounded(message in ".{0,400}", max in 0usize..250) {
        let truncated = truncate_chars(&message, max);
        prop_assert!(truncated.chars().count() <= max);
        prop_assert!(message.starts_with(&truncated));
    }
}

//! Property-based tests for interval arithmetic.

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;

use super::interval::IntervalCalculator;
use super::types::BillingInterval;

/// Strategy to generate dates between 1990 and 2100.
fn any_date() -> impl Strategy<Value = NaiveDate> {
    (1990i32..2100, 1u32..=12, 1u32..=31).prop_filter_map("valid date", |(y, m, d)| {
        NaiveDate::from_ymd_opt(y, m, d)
    })
}

fn any_interval() -> impl Strategy<Value = BillingInterval> {
    prop_oneof![
        Just(BillingInterval::Monthly),
        Just(BillingInterval::Quarterly),
        Just(BillingInterval::SemiAnnual),
        Just(BillingInterval::Annual),
    ]
}

fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// The result always lands exactly `months()` calendar months later.
    #[test]
    fn prop_add_moves_whole_months(date in any_date(), interval in any_interval()) {
        let next = IntervalCalculator::add(date, interval).unwrap();
        prop_assert_eq!(month_index(next) - month_index(date), interval.months() as i32);
    }

    /// The day is kept when it exists, otherwise clamped to the month end.
    #[test]
    fn prop_add_keeps_or_clamps_day(date in any_date(), interval in any_interval()) {
        let next = IntervalCalculator::add(date, interval).unwrap();
        if next.day() != date.day() {
            prop_assert!(next.day() < date.day());
            prop_assert!(IntervalCalculator::is_month_end(next));
        }
    }

    /// Advancing is strictly increasing.
    #[test]
    fn prop_add_is_monotonic(date in any_date(), interval in any_interval()) {
        let next = IntervalCalculator::add(date, interval).unwrap();
        prop_assert!(next > date);
    }

    /// A period ends the day before the next period starts.
    #[test]
    fn prop_period_end_precedes_next_start(date in any_date(), interval in any_interval()) {
        let end = IntervalCalculator::period_end(date, interval).unwrap();
        let next = IntervalCalculator::add(date, interval).unwrap();
        prop_assert_eq!(end.succ_opt(), Some(next));
        prop_assert!(end >= date);
    }
}

//! Property-based tests for line calculation and aggregation.
//!
//! - Document totals equal the sum of line totals with no residual drift
//! - Per-rate buckets partition the document totals
//! - Line gross is always net plus tax

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::calculator::LineCalculator;
use super::types::{NewDocumentLine, SalesDocumentLine};
use crate::tax::TaxRate;

/// Quantities from 0.000 to 1,000.000.
fn quantity() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|v| Decimal::new(v, 3))
}

/// Unit prices from 0.0000 to 10,000.0000.
fn unit_price() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

/// Discounts from 0.00 % to 100.00 %.
fn discount() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|v| Decimal::new(v, 2))
}

fn tax_rate() -> impl Strategy<Value = TaxRate> {
    prop_oneof![
        Just(TaxRate::ZERO),
        Just(TaxRate::from_percent(Decimal::from(7)).unwrap()),
        Just(TaxRate::from_percent(Decimal::from(19)).unwrap()),
    ]
}

fn line_input() -> impl Strategy<Value = NewDocumentLine> {
    (quantity(), unit_price(), discount(), tax_rate()).prop_map(
        |(quantity, unit_price_net, discount_percent, tax_rate)| NewDocumentLine {
            item_id: None,
            description: "Line".to_string(),
            quantity,
            unit_price_net,
            is_discountable: true,
            discount_percent,
            tax_rate,
        },
    )
}

fn build_lines(inputs: Vec<NewDocumentLine>) -> Vec<SalesDocumentLine> {
    (1u32..)
        .zip(inputs)
        .map(|(position, input)| SalesDocumentLine::build(position, input).unwrap())
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Line amounts carry two decimals and gross = net + tax.
    #[test]
    fn prop_line_gross_is_net_plus_tax(
        q in quantity(),
        p in unit_price(),
        d in discount(),
        r in tax_rate(),
    ) {
        let totals = LineCalculator::compute_line(q, p, d, r).unwrap();
        prop_assert_eq!(totals.gross, totals.net + totals.tax);
        prop_assert_eq!(totals.net.scale(), 2);
        prop_assert_eq!(totals.tax.scale(), 2);
        prop_assert!(totals.net >= Decimal::ZERO);
    }

    /// Document totals are exact sums of line totals.
    #[test]
    fn prop_document_totals_equal_line_sums(inputs in prop::collection::vec(line_input(), 0..25)) {
        let lines = build_lines(inputs);
        let totals = LineCalculator::aggregate(&lines).unwrap();

        let net: Decimal = lines.iter().map(|l| l.totals.net).sum();
        let tax: Decimal = lines.iter().map(|l| l.totals.tax).sum();
        let gross: Decimal = lines.iter().map(|l| l.totals.gross).sum();

        prop_assert_eq!(totals.net, net);
        prop_assert_eq!(totals.tax, tax);
        prop_assert_eq!(totals.gross, gross);
        prop_assert_eq!(totals.gross, totals.net + totals.tax);
    }

    /// Tax buckets partition the document totals.
    #[test]
    fn prop_buckets_partition_totals(inputs in prop::collection::vec(line_input(), 1..25)) {
        let lines = build_lines(inputs);
        let totals = LineCalculator::aggregate(&lines).unwrap();

        let bucket_net: Decimal = totals.tax_buckets.values().map(|b| b.net).sum();
        let bucket_tax: Decimal = totals.tax_buckets.values().map(|b| b.tax).sum();
        let bucket_gross: Decimal = totals.tax_buckets.values().map(|b| b.gross).sum();

        prop_assert_eq!(bucket_net, totals.net);
        prop_assert_eq!(bucket_tax, totals.tax);
        prop_assert_eq!(bucket_gross, totals.gross);

        for (rate, bucket) in &totals.tax_buckets {
            let expected: Decimal = lines
                .iter()
                .filter(|l| l.tax_rate == *rate)
                .map(|l| l.totals.net)
                .sum();
            prop_assert_eq!(bucket.net, expected);
        }
    }

    /// Aggregation does not depend on line order.
    #[test]
    fn prop_aggregation_is_order_independent(inputs in prop::collection::vec(line_input(), 0..15)) {
        let lines = build_lines(inputs);
        let mut reversed = lines.clone();
        reversed.reverse();

        prop_assert_eq!(
            LineCalculator::aggregate(&lines).unwrap(),
            LineCalculator::aggregate(&reversed).unwrap()
        );
    }
}

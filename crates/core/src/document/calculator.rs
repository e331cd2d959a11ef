//! Line and document total calculation.
//!
//! Rounding happens per line; document totals are plain sums of the rounded
//! line amounts, so `document.net == Σ line.net` holds exactly.

use rust_decimal::Decimal;

use super::error::DocumentError;
use super::types::{DocumentTotals, LineTotals, SalesDocumentLine, TaxBucket};
use crate::money::{discount_factor, round_money};
use crate::tax::TaxRate;

/// Stateless calculator for line and document totals.
pub struct LineCalculator;

impl LineCalculator {
    /// Compute net, tax and gross for one line.
    ///
    /// - `net = round(quantity × unit_price_net × (1 − discount_percent/100), 2)`
    /// - `tax = round(net × tax_rate, 2)`
    /// - `gross = net + tax`
    ///
    /// # Errors
    ///
    /// Returns a calculation error for a negative quantity or price, a
    /// discount outside `0..=100`, or decimal overflow.
    pub fn compute_line(
        quantity: Decimal,
        unit_price_net: Decimal,
        discount_percent: Decimal,
        tax_rate: TaxRate,
    ) -> Result<LineTotals, DocumentError> {
        if quantity < Decimal::ZERO {
            return Err(DocumentError::NegativeQuantity(quantity));
        }
        if unit_price_net < Decimal::ZERO {
            return Err(DocumentError::NegativeUnitPrice(unit_price_net));
        }
        if discount_percent < Decimal::ZERO || discount_percent > Decimal::ONE_HUNDRED {
            return Err(DocumentError::DiscountOutOfRange(discount_percent));
        }

        let raw_net = quantity
            .checked_mul(unit_price_net)
            .and_then(|v| v.checked_mul(discount_factor(discount_percent)))
            .ok_or(DocumentError::Overflow("line net"))?;
        let net = round_money(raw_net);

        let raw_tax = net
            .checked_mul(tax_rate.fraction())
            .ok_or(DocumentError::Overflow("line tax"))?;
        let tax = round_money(raw_tax);

        let gross = net
            .checked_add(tax)
            .ok_or(DocumentError::Overflow("line gross"))?;

        Ok(LineTotals { net, tax, gross })
    }

    /// Sum line totals into document totals and per-rate buckets.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Overflow` if a sum exceeds the decimal range.
    pub fn aggregate(lines: &[SalesDocumentLine]) -> Result<DocumentTotals, DocumentError> {
        let mut totals = DocumentTotals {
            net: round_money(Decimal::ZERO),
            tax: round_money(Decimal::ZERO),
            gross: round_money(Decimal::ZERO),
            ..DocumentTotals::default()
        };

        for line in lines {
            add_into(&mut totals.net, &mut totals.tax, &mut totals.gross, &line.totals)?;

            let bucket = totals.tax_buckets.entry(line.tax_rate).or_insert(TaxBucket {
                net: round_money(Decimal::ZERO),
                tax: round_money(Decimal::ZERO),
                gross: round_money(Decimal::ZERO),
            });
            add_into(&mut bucket.net, &mut bucket.tax, &mut bucket.gross, &line.totals)?;
        }

        Ok(totals)
    }
}

fn add_into(
    net: &mut Decimal,
    tax: &mut Decimal,
    gross: &mut Decimal,
    line: &LineTotals,
) -> Result<(), DocumentError> {
    *net = net
        .checked_add(line.net)
        .ok_or(DocumentError::Overflow("document net"))?;
    *tax = tax
        .checked_add(line.tax)
        .ok_or(DocumentError::Overflow("document tax"))?;
    *gross = gross
        .checked_add(line.gross)
        .ok_or(DocumentError::Overflow("document gross"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rate(percent: Decimal) -> TaxRate {
        TaxRate::from_percent(percent).unwrap()
    }

    #[test]
    fn test_simple_line() {
        let totals =
            LineCalculator::compute_line(dec!(1), dec!(100.00), dec!(0), rate(dec!(19))).unwrap();
        assert_eq!(totals.net, dec!(100.00));
        assert_eq!(totals.tax, dec!(19.00));
        assert_eq!(totals.gross, dec!(119.00));
    }

    #[test]
    fn test_discount_and_rounding() {
        // 3 × 9.99 × 0.85 = 25.4745 → 25.47; 25.47 × 0.19 = 4.8393 → 4.84
        let totals =
            LineCalculator::compute_line(dec!(3), dec!(9.99), dec!(15), rate(dec!(19))).unwrap();
        assert_eq!(totals.net, dec!(25.47));
        assert_eq!(totals.tax, dec!(4.84));
        assert_eq!(totals.gross, dec!(30.31));
    }

    #[test]
    fn test_half_cent_rounds_up() {
        // 0.5 × 0.05 = 0.025 → 0.03
        let totals =
            LineCalculator::compute_line(dec!(0.5), dec!(0.05), dec!(0), TaxRate::ZERO).unwrap();
        assert_eq!(totals.net, dec!(0.03));
        assert_eq!(totals.tax, dec!(0.00));
    }

    #[test]
    fn test_tax_rounded_from_rounded_net() {
        // net 0.07 × 0.07 = 0.0049 → 0.00
        let totals =
            LineCalculator::compute_line(dec!(1), dec!(0.07), dec!(0), rate(dec!(7))).unwrap();
        assert_eq!(totals.net, dec!(0.07));
        assert_eq!(totals.tax, dec!(0.00));
        assert_eq!(totals.gross, dec!(0.07));
    }

    #[test]
    fn test_full_discount_is_zero() {
        let totals =
            LineCalculator::compute_line(dec!(4), dec!(25), dec!(100), rate(dec!(19))).unwrap();
        assert_eq!(totals, LineTotals::default());
    }

    #[test]
    fn test_invalid_inputs() {
        let r = rate(dec!(19));
        assert_eq!(
            LineCalculator::compute_line(dec!(-1), dec!(10), dec!(0), r),
            Err(DocumentError::NegativeQuantity(dec!(-1)))
        );
        assert_eq!(
            LineCalculator::compute_line(dec!(1), dec!(-10), dec!(0), r),
            Err(DocumentError::NegativeUnitPrice(dec!(-10)))
        );
        assert_eq!(
            LineCalculator::compute_line(dec!(1), dec!(10), dec!(100.01), r),
            Err(DocumentError::DiscountOutOfRange(dec!(100.01)))
        );
        assert_eq!(
            LineCalculator::compute_line(dec!(1), dec!(10), dec!(-5), r),
            Err(DocumentError::DiscountOutOfRange(dec!(-5)))
        );
    }

    #[test]
    fn test_overflow_is_an_error() {
        let result =
            LineCalculator::compute_line(Decimal::MAX, Decimal::MAX, dec!(0), rate(dec!(19)));
        assert_eq!(result, Err(DocumentError::Overflow("line net")));
    }

    #[test]
    fn test_aggregate_empty() {
        let totals = LineCalculator::aggregate(&[]).unwrap();
        assert_eq!(totals.net, Decimal::ZERO);
        assert_eq!(totals.net.to_string(), "0.00");
        assert!(totals.tax_buckets.is_empty());
    }
}

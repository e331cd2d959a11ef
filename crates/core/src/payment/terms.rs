//! Payment term definitions and due-date calculation.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use billrun_shared::types::PaymentTermId;

/// Date format of the home locale used in printed payment sentences.
pub const HOME_DATE_FORMAT: &str = "%d.%m.%Y";

/// Errors for payment term definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentTermError {
    /// Only one of discount days / discount rate is set.
    #[error("Discount days and discount rate must be set together")]
    IncompleteDiscount,

    /// The discount period does not end before the net period.
    #[error("Discount period ({discount_days} days) must be shorter than net period ({net_days} days)")]
    DiscountPeriodTooLong {
        /// Discount days.
        discount_days: u32,
        /// Net days.
        net_days: u32,
    },

    /// Discount rate outside `(0, 1)`.
    #[error("Discount rate {0} must be between 0 and 1")]
    InvalidDiscountRate(Decimal),

    /// The computed date does not fit the calendar.
    #[error("Date {date} plus {days} days is out of range")]
    DateOutOfRange {
        /// Start date.
        date: NaiveDate,
        /// Days added.
        days: u32,
    },
}

/// A payment term: net days plus an optional early-payment discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTerm {
    /// Identifier.
    pub id: PaymentTermId,
    /// Display name (e.g. "14 days 2% / 30 days net").
    pub name: String,
    /// Days until the net amount is due.
    pub net_days: u32,
    /// Days within which the discount applies.
    pub discount_days: Option<u32>,
    /// Discount as a fraction (`0.02` for 2 %).
    pub discount_rate: Option<Decimal>,
}

impl PaymentTerm {
    /// Creates a net-only payment term.
    #[must_use]
    pub fn net(net_days: u32) -> Self {
        Self {
            id: PaymentTermId::new(),
            name: format!("{net_days} days net"),
            net_days,
            discount_days: None,
            discount_rate: None,
        }
    }

    /// Creates a payment term with an early-payment discount.
    #[must_use]
    pub fn with_discount(net_days: u32, discount_days: u32, discount_rate: Decimal) -> Self {
        Self {
            id: PaymentTermId::new(),
            name: format!(
                "{discount_days} days {}% / {net_days} days net",
                percent(discount_rate)
            ),
            net_days,
            discount_days: Some(discount_days),
            discount_rate: Some(discount_rate),
        }
    }

    /// Returns `(discount_days, discount_rate)` when both are set.
    #[must_use]
    pub fn discount(&self) -> Option<(u32, Decimal)> {
        self.discount_days.zip(self.discount_rate)
    }

    /// Validates the discount fields.
    ///
    /// # Errors
    ///
    /// Returns an error for a half-configured discount, a discount period
    /// not shorter than the net period, or a rate outside `(0, 1)`.
    pub fn validate(&self) -> Result<(), PaymentTermError> {
        match (self.discount_days, self.discount_rate) {
            (None, None) => Ok(()),
            (Some(_), None) | (None, Some(_)) => Err(PaymentTermError::IncompleteDiscount),
            (Some(discount_days), Some(rate)) => {
                if discount_days >= self.net_days {
                    return Err(PaymentTermError::DiscountPeriodTooLong {
                        discount_days,
                        net_days: self.net_days,
                    });
                }
                if rate <= Decimal::ZERO || rate >= Decimal::ONE {
                    return Err(PaymentTermError::InvalidDiscountRate(rate));
                }
                Ok(())
            }
        }
    }
}

/// Stateless payment term calculator.
pub struct PaymentTermCalculator;

impl PaymentTermCalculator {
    /// Net due date: `issue_date + net_days`.
    ///
    /// # Errors
    ///
    /// Returns `PaymentTermError::DateOutOfRange` if the date overflows.
    pub fn due_date(
        term: &PaymentTerm,
        issue_date: NaiveDate,
    ) -> Result<NaiveDate, PaymentTermError> {
        add_days(issue_date, term.net_days)
    }

    /// Discount deadline: `issue_date + discount_days`, if a discount is set.
    ///
    /// # Errors
    ///
    /// Returns `PaymentTermError::DateOutOfRange` if the date overflows.
    pub fn discount_deadline(
        term: &PaymentTerm,
        issue_date: NaiveDate,
    ) -> Result<Option<NaiveDate>, PaymentTermError> {
        term.discount()
            .map(|(days, _)| add_days(issue_date, days))
            .transpose()
    }

    /// The payment sentence printed on the document.
    ///
    /// Without a discount: one deadline. With a discount: the discount
    /// deadline and rate, then the final net deadline.
    ///
    /// # Errors
    ///
    /// Returns `PaymentTermError::DateOutOfRange` if a date overflows.
    pub fn descriptive_text(
        term: &PaymentTerm,
        issue_date: NaiveDate,
    ) -> Result<String, PaymentTermError> {
        let due = Self::due_date(term, issue_date)?;

        let text = match term.discount() {
            None => format!(
                "Payable within {} days, by {}, net.",
                term.net_days,
                due.format(HOME_DATE_FORMAT)
            ),
            Some((discount_days, rate)) => {
                let discount_due = add_days(issue_date, discount_days)?;
                format!(
                    "Payable within {} days, by {}, with {}% discount, or within {} days, by {}, net.",
                    discount_days,
                    discount_due.format(HOME_DATE_FORMAT),
                    percent(rate),
                    term.net_days,
                    due.format(HOME_DATE_FORMAT)
                )
            }
        };

        Ok(text)
    }
}

fn add_days(date: NaiveDate, days: u32) -> Result<NaiveDate, PaymentTermError> {
    date.checked_add_days(Days::new(u64::from(days)))
        .ok_or(PaymentTermError::DateOutOfRange { date, days })
}

fn percent(rate: Decimal) -> Decimal {
    (rate * Decimal::ONE_HUNDRED).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_due_date_adds_net_days() {
        let term = PaymentTerm::net(30);
        assert_eq!(
            PaymentTermCalculator::due_date(&term, date(2026, 1, 15)).unwrap(),
            date(2026, 2, 14)
        );
    }

    #[test]
    fn test_net_only_text() {
        let term = PaymentTerm::net(14);
        let text = PaymentTermCalculator::descriptive_text(&term, date(2026, 9, 1)).unwrap();
        assert_eq!(text, "Payable within 14 days, by 15.09.2026, net.");
    }

    #[test]
    fn test_discount_term_dates_and_text() {
        let term = PaymentTerm::with_discount(14, 10, dec!(0.02));
        let issue = date(2026, 9, 1);

        assert_eq!(
            PaymentTermCalculator::due_date(&term, issue).unwrap(),
            date(2026, 9, 15)
        );
        assert_eq!(
            PaymentTermCalculator::discount_deadline(&term, issue).unwrap(),
            Some(date(2026, 9, 11))
        );

        let text = PaymentTermCalculator::descriptive_text(&term, issue).unwrap();
        assert_eq!(
            text,
            "Payable within 10 days, by 11.09.2026, with 2% discount, or within 14 days, by 15.09.2026, net."
        );
    }

    #[test]
    fn test_zero_net_days_is_due_on_issue() {
        let term = PaymentTerm::net(0);
        let issue = date(2026, 3, 31);
        assert_eq!(PaymentTermCalculator::due_date(&term, issue).unwrap(), issue);
        assert_eq!(
            PaymentTermCalculator::discount_deadline(&term, issue).unwrap(),
            None
        );
    }

    #[test]
    fn test_half_configured_discount_is_treated_as_net() {
        let term = PaymentTerm {
            discount_days: Some(10),
            ..PaymentTerm::net(30)
        };
        assert_eq!(term.discount(), None);
        assert_eq!(term.validate(), Err(PaymentTermError::IncompleteDiscount));
        let text = PaymentTermCalculator::descriptive_text(&term, date(2026, 1, 1)).unwrap();
        assert_eq!(text, "Payable within 30 days, by 31.01.2026, net.");
    }

    #[test]
    fn test_validate() {
        assert!(PaymentTerm::net(30).validate().is_ok());
        assert!(PaymentTerm::with_discount(30, 10, dec!(0.03)).validate().is_ok());
        assert_eq!(
            PaymentTerm::with_discount(10, 10, dec!(0.02)).validate(),
            Err(PaymentTermError::DiscountPeriodTooLong {
                discount_days: 10,
                net_days: 10
            })
        );
        assert_eq!(
            PaymentTerm::with_discount(30, 10, dec!(1.5)).validate(),
            Err(PaymentTermError::InvalidDiscountRate(dec!(1.5)))
        );
    }

    #[test]
    fn test_name() {
        assert_eq!(PaymentTerm::net(30).name, "30 days net");
        assert_eq!(
            PaymentTerm::with_discount(30, 10, dec!(0.025)).name,
            "10 days 2.5% / 30 days net"
        );
    }

    #[test]
    fn test_date_overflow() {
        let term = PaymentTerm::net(30);
        let result = PaymentTermCalculator::due_date(&term, NaiveDate::MAX);
        assert!(matches!(result, Err(PaymentTermError::DateOutOfRange { .. })));
    }
}

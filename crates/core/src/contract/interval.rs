//! Calendar arithmetic for billing intervals.

use chrono::{Datelike, Months, NaiveDate};
use thiserror::Error;

use super::types::BillingInterval;

/// Errors from interval arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntervalError {
    /// The resulting date is outside the supported calendar range.
    #[error("Adding {interval} to {date} leaves the supported date range")]
    OutOfRange {
        /// Start date.
        date: NaiveDate,
        /// Interval added.
        interval: BillingInterval,
    },
}

/// Stateless interval calculator.
pub struct IntervalCalculator;

impl IntervalCalculator {
    /// Advance `date` by one `interval`.
    ///
    /// When the day of month does not exist in the target month, the result
    /// is clamped to that month's last day: 2026-01-31 + 1 month is
    /// 2026-02-28, and 2024-01-31 + 1 month is 2024-02-29.
    ///
    /// # Errors
    ///
    /// Returns `IntervalError::OutOfRange` past the end of the calendar.
    pub fn add(date: NaiveDate, interval: BillingInterval) -> Result<NaiveDate, IntervalError> {
        date.checked_add_months(Months::new(interval.months()))
            .ok_or(IntervalError::OutOfRange { date, interval })
    }

    /// Last day covered by the period starting at `period_start`.
    ///
    /// # Errors
    ///
    /// Returns `IntervalError::OutOfRange` past the end of the calendar.
    pub fn period_end(
        period_start: NaiveDate,
        interval: BillingInterval,
    ) -> Result<NaiveDate, IntervalError> {
        Self::add(period_start, interval)?
            .pred_opt()
            .ok_or(IntervalError::OutOfRange {
                date: period_start,
                interval,
            })
    }

    /// Returns true when `date` is the last day of its month.
    #[cfg(test)]
    pub(crate) fn is_month_end(date: NaiveDate) -> bool {
        date.succ_opt().is_none_or(|next| next.month() != date.month())
    }
}

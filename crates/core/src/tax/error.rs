//! Tax error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised when constructing tax rates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxError {
    /// Rate outside the closed interval `[0, 1]`.
    #[error("Tax rate {0} is outside the range 0..=1")]
    RateOutOfRange(Decimal),
}

impl TaxError {
    /// Returns the error code for logs and the run ledger.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::RateOutOfRange(_) => "TAX_RATE_OUT_OF_RANGE",
        }
    }
}

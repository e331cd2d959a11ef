//! Billing error types.

use chrono::NaiveDate;
use thiserror::Error;

use billrun_shared::types::ContractId;

use super::interval::IntervalError;
use super::ledger::RunOutcome;
use super::store::StoreError;
use super::types::ContractStatus;
use crate::document::{DocumentError, DocumentErrorKind};
use crate::payment::PaymentTermError;
use crate::tax::TaxError;

/// Category of a failed billing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// Required input missing or malformed.
    Validation,
    /// Invariant violated while computing totals or dates.
    Calculation,
    /// The transactional write failed.
    Persistence,
    /// Another run already advanced the schedule.
    Conflict,
}

/// Errors that abort one contract's billing attempt.
#[derive(Debug, Error)]
pub enum BillingError {
    /// Document could not be built or calculated.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Contract is not in a state that allows the operation.
    #[error("Contract {contract_id} is {status}")]
    InvalidContractState {
        /// Contract.
        contract_id: ContractId,
        /// Current status.
        status: ContractStatus,
    },

    /// Active contract without a scheduled run.
    #[error("Contract {0} has no next run date")]
    MissingNextRunDate(ContractId),

    /// Contract payment term is inconsistent.
    #[error("Invalid payment term: {0}")]
    PaymentTerm(#[from] PaymentTermError),

    /// Tax rate outside its valid range.
    #[error("Invalid tax rate: {0}")]
    Tax(#[from] TaxError),

    /// Schedule date arithmetic failed.
    #[error(transparent)]
    Interval(#[from] IntervalError),

    /// Storage failed; the transaction was rolled back.
    #[error("Persistence error: {0}")]
    Persistence(#[source] StoreError),

    /// The stored schedule no longer matches the selected one.
    #[error("Schedule of contract {contract_id} already moved past {period_date}")]
    ScheduleConflict {
        /// Contract.
        contract_id: ContractId,
        /// Period the attempt was billing.
        period_date: NaiveDate,
    },

    /// A document for this contract period already exists.
    #[error("Contract {contract_id} already billed the period starting {period_start}")]
    DuplicatePeriod {
        /// Contract.
        contract_id: ContractId,
        /// Start of the billed period.
        period_start: NaiveDate,
    },
}

impl From<StoreError> for BillingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ScheduleConflict {
                contract_id,
                expected,
            } => Self::ScheduleConflict {
                contract_id,
                period_date: expected,
            },
            StoreError::DuplicatePeriod {
                contract_id,
                period_start,
            } => Self::DuplicatePeriod {
                contract_id,
                period_start,
            },
            other => Self::Persistence(other),
        }
    }
}

impl BillingError {
    /// Returns the failure category.
    #[must_use]
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::Document(e) => match e.kind() {
                DocumentErrorKind::Validation => FailureCategory::Validation,
                DocumentErrorKind::Calculation => FailureCategory::Calculation,
            },
            Self::InvalidContractState { .. }
            | Self::MissingNextRunDate(_)
            | Self::PaymentTerm(_) => FailureCategory::Validation,
            Self::Tax(_) | Self::Interval(_) => FailureCategory::Calculation,
            Self::Persistence(_) => FailureCategory::Persistence,
            Self::ScheduleConflict { .. } | Self::DuplicatePeriod { .. } => {
                FailureCategory::Conflict
            }
        }
    }

    /// Ledger outcome recorded for this error.
    #[must_use]
    pub fn outcome(&self) -> RunOutcome {
        match self.category() {
            FailureCategory::Conflict => RunOutcome::Skipped,
            _ => RunOutcome::Failed,
        }
    }

    /// Returns the error code stored in the run ledger.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Document(e) => e.error_code(),
            Self::InvalidContractState { .. } => "INVALID_CONTRACT_STATE",
            Self::MissingNextRunDate(_) => "MISSING_NEXT_RUN_DATE",
            Self::PaymentTerm(_) => "INVALID_PAYMENT_TERM",
            Self::Tax(e) => e.error_code(),
            Self::Interval(_) => "DATE_OUT_OF_RANGE",
            Self::Persistence(e) => e.error_code(),
            Self::ScheduleConflict { .. } => "SCHEDULE_CONFLICT",
            Self::DuplicatePeriod { .. } => "DUPLICATE_PERIOD",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_categories_and_outcomes() {
        let validation = BillingError::from(DocumentError::UnpricedLine { position: 1 });
        assert_eq!(validation.category(), FailureCategory::Validation);
        assert_eq!(validation.outcome(), RunOutcome::Failed);
        assert_eq!(validation.error_code(), "UNPRICED_LINE");

        let calculation = BillingError::from(DocumentError::NegativeQuantity(dec!(-2)));
        assert_eq!(calculation.category(), FailureCategory::Calculation);

        let persistence = BillingError::from(StoreError::Database("connection reset".into()));
        assert_eq!(persistence.category(), FailureCategory::Persistence);
        assert_eq!(persistence.outcome(), RunOutcome::Failed);
        assert_eq!(persistence.error_code(), "DATABASE_ERROR");
    }

    #[test]
    fn test_store_conflicts_become_skips() {
        let contract_id = ContractId::new();
        let expected = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();

        let cas = BillingError::from(StoreError::ScheduleConflict {
            contract_id,
            expected,
        });
        assert_eq!(cas.outcome(), RunOutcome::Skipped);
        assert_eq!(cas.error_code(), "SCHEDULE_CONFLICT");

        let duplicate = BillingError::from(StoreError::DuplicatePeriod {
            contract_id,
            period_start: expected,
        });
        assert_eq!(duplicate.outcome(), RunOutcome::Skipped);
        assert_eq!(duplicate.category(), FailureCategory::Conflict);
        assert_eq!(duplicate.error_code(), "DUPLICATE_PERIOD");
    }
}

//! Run ledger: the append-only audit trail of billing attempts.
//!
//! Exactly one entry is written per attempt. Entries are never updated;
//! the dashboard reads them through [`RunFilter`].

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use billrun_shared::types::{ContractId, ContractRunId, SalesDocumentId};

use super::error::BillingError;
use crate::money::truncate_chars;

/// Outcome of one billing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunOutcome {
    /// Document created and schedule advanced.
    Success,
    /// Attempt rolled back.
    Failed,
    /// Another run already billed the period.
    Skipped,
}

impl RunOutcome {
    /// Returns the string representation of the outcome.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
        }
    }

    /// Parses an outcome from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SUCCESS" => Some(Self::Success),
            "FAILED" => Some(Self::Failed),
            "SKIPPED" => Some(Self::Skipped),
            _ => None,
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRun {
    /// Identifier.
    pub id: ContractRunId,
    /// Contract the attempt billed.
    pub contract_id: ContractId,
    /// When the attempt finished.
    pub run_at: DateTime<Utc>,
    /// Scheduled date the attempt billed (`next_run_date` at selection).
    pub period_date: NaiveDate,
    /// Outcome.
    pub outcome: RunOutcome,
    /// Generated document, on success only.
    pub document_id: Option<SalesDocumentId>,
    /// Stable error code, unless successful.
    pub error_code: Option<String>,
    /// Truncated error message, unless successful.
    pub error_message: Option<String>,
}

/// A ledger entry before it is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContractRun {
    /// Contract the attempt billed.
    pub contract_id: ContractId,
    /// When the attempt finished.
    pub run_at: DateTime<Utc>,
    /// Scheduled date the attempt billed.
    pub period_date: NaiveDate,
    /// Outcome.
    pub outcome: RunOutcome,
    /// Generated document.
    pub document_id: Option<SalesDocumentId>,
    /// Error code.
    pub error_code: Option<String>,
    /// Error message, already truncated.
    pub error_message: Option<String>,
}

impl NewContractRun {
    /// Entry for a committed attempt.
    #[must_use]
    pub fn success(
        contract_id: ContractId,
        period_date: NaiveDate,
        document_id: SalesDocumentId,
    ) -> Self {
        Self {
            contract_id,
            run_at: Utc::now(),
            period_date,
            outcome: RunOutcome::Success,
            document_id: Some(document_id),
            error_code: None,
            error_message: None,
        }
    }

    /// Entry for a rolled-back attempt.
    ///
    /// The outcome follows [`BillingError::outcome`]; the message is cut to
    /// `max_chars` characters.
    #[must_use]
    pub fn from_error(
        contract_id: ContractId,
        period_date: NaiveDate,
        error: &BillingError,
        max_chars: usize,
    ) -> Self {
        Self {
            contract_id,
            run_at: Utc::now(),
            period_date,
            outcome: error.outcome(),
            document_id: None,
            error_code: Some(error.error_code().to_string()),
            error_message: Some(truncate_chars(&error.to_string(), max_chars)),
        }
    }

    /// Assigns an identifier.
    #[must_use]
    pub fn into_run(self, id: ContractRunId) -> ContractRun {
        ContractRun {
            id,
            contract_id: self.contract_id,
            run_at: self.run_at,
            period_date: self.period_date,
            outcome: self.outcome,
            document_id: self.document_id,
            error_code: self.error_code,
            error_message: self.error_message,
        }
    }
}

/// Filter for ledger queries. Date bounds are inclusive and apply to the
/// UTC date of `run_at`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFilter {
    /// Only this contract.
    pub contract_id: Option<ContractId>,
    /// Runs on or after this date.
    pub from: Option<NaiveDate>,
    /// Runs on or before this date.
    pub to: Option<NaiveDate>,
    /// Only this outcome.
    pub outcome: Option<RunOutcome>,
}

impl RunFilter {
    /// Filter for one contract.
    #[must_use]
    pub fn for_contract(contract_id: ContractId) -> Self {
        Self {
            contract_id: Some(contract_id),
            ..Self::default()
        }
    }

    /// Returns true when `run` passes every set criterion.
    #[must_use]
    pub fn matches(&self, run: &ContractRun) -> bool {
        let day = run.run_at.date_naive();
        self.contract_id.is_none_or(|id| run.contract_id == id)
            && self.from.is_none_or(|from| day >= from)
            && self.to.is_none_or(|to| day <= to)
            && self.outcome.is_none_or(|outcome| run.outcome == outcome)
    }
}

/// Counts returned by one billing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Contracts attempted.
    pub processed: usize,
    /// Attempts that produced a document.
    pub succeeded: usize,
    /// Attempts rolled back with an error.
    pub failed: usize,
    /// Attempts skipped because the period was already billed.
    pub skipped: usize,
    /// Attempts whose ledger entry could not be appended.
    pub unrecorded: usize,
    /// Documents created by this pass.
    pub document_ids: Vec<SalesDocumentId>,
}

impl RunSummary {
    /// Counts one attempt.
    pub fn record(&mut self, outcome: RunOutcome, document_id: Option<SalesDocumentId>) {
        self.processed += 1;
        match outcome {
            RunOutcome::Success => self.succeeded += 1,
            RunOutcome::Failed => self.failed += 1,
            RunOutcome::Skipped => self.skipped += 1,
        }
        if let Some(id) = document_id {
            self.document_ids.push(id);
        }
    }

    /// True when no attempt failed and every attempt reached the ledger.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.unrecorded == 0
    }
}

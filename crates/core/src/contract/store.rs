//! Collaborator traits of the billing runner.
//!
//! The runner never touches storage directly. Persistence, the customer
//! directory and the item master are injected through these traits.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use billrun_shared::AppError;
use billrun_shared::types::{
    ContractId, CustomerId, ItemId, PageRequest, PageResponse, SalesDocumentId,
};

use super::ledger::{ContractRun, NewContractRun, RunFilter};
use super::types::Contract;
use crate::document::{ItemMaster, SalesDocument};
use crate::tax::CustomerTaxProfile;

/// Errors reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend failed.
    #[error("Database error: {0}")]
    Database(String),

    /// `next_run_date` changed since the contract was selected.
    #[error("Contract {contract_id} is no longer scheduled for {expected}")]
    ScheduleConflict {
        /// Contract.
        contract_id: ContractId,
        /// Selected `next_run_date`.
        expected: NaiveDate,
    },

    /// A document for this contract period already exists.
    #[error("Contract {contract_id} already has a document for the period starting {period_start}")]
    DuplicatePeriod {
        /// Contract.
        contract_id: ContractId,
        /// Period start.
        period_start: NaiveDate,
    },

    /// Contract does not exist.
    #[error("Contract {0} not found")]
    ContractNotFound(ContractId),

    /// Stored row cannot be mapped to a domain value.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

impl StoreError {
    /// Returns the error code for logs and the run ledger.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Database(_) => "DATABASE_ERROR",
            Self::ScheduleConflict { .. } => "SCHEDULE_CONFLICT",
            Self::DuplicatePeriod { .. } => "DUPLICATE_PERIOD",
            Self::ContractNotFound(_) => "CONTRACT_NOT_FOUND",
            Self::InvalidData(_) => "INVALID_DATA",
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(message) => Self::Database(message),
            StoreError::ScheduleConflict { .. } | StoreError::DuplicatePeriod { .. } => {
                Self::Conflict(err.to_string())
            }
            StoreError::ContractNotFound(_) => Self::NotFound(err.to_string()),
            StoreError::InvalidData(message) => Self::Internal(message),
        }
    }
}

/// Everything one successful attempt writes, committed atomically.
#[derive(Debug, Clone)]
pub struct BillingCommit {
    /// Contract being billed.
    pub contract_id: ContractId,
    /// `next_run_date` as selected; the compare-and-set guard.
    pub expected_next_run: NaiveDate,
    /// New `next_run_date` after the advance.
    pub advanced_next_run: NaiveDate,
    /// Number prefix for the document type.
    pub number_prefix: String,
    /// Generated document without a number.
    pub document: SalesDocument,
}

/// Formats a document number: `{prefix}-{year}-{seq:05}`.
#[must_use]
pub fn format_document_number(prefix: &str, year: i32, sequence: u32) -> String {
    format!("{prefix}-{year}-{sequence:05}")
}

/// Durable storage for contracts, documents and the run ledger.
#[async_trait]
pub trait BillingStore: Send + Sync {
    /// Active contracts with `next_run_date <= as_of` whose end date has
    /// not passed the next run.
    async fn due_contracts(&self, as_of: NaiveDate) -> Result<Vec<Contract>, StoreError>;

    /// In one transaction: allocate the document number, insert the
    /// document and its lines, and move the schedule from
    /// `expected_next_run` to `advanced_next_run`. Nothing is written when
    /// any step fails.
    async fn commit_billing(&self, commit: BillingCommit) -> Result<SalesDocument, StoreError>;

    /// Appends one ledger entry.
    async fn append_run(&self, run: NewContractRun) -> Result<ContractRun, StoreError>;

    /// Ledger entries matching `filter`, newest first.
    async fn list_runs(
        &self,
        filter: &RunFilter,
        page: PageRequest,
    ) -> Result<PageResponse<ContractRun>, StoreError>;

    /// Loads a document with its lines.
    async fn find_document(&self, id: SalesDocumentId)
    -> Result<Option<SalesDocument>, StoreError>;
}

/// Read-only customer directory.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Tax profile of a customer; `None` when no profile is maintained.
    async fn tax_profile(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<CustomerTaxProfile>, StoreError>;
}

/// Read-only item master.
#[async_trait]
pub trait ItemCatalog: Send + Sync {
    /// Looks up an item.
    async fn item(&self, item_id: ItemId) -> Result<Option<ItemMaster>, StoreError>;
}

//! Recurring contracts and the billing run.
//!
//! This module implements:
//! - Contract and contract line types with their lifecycle
//! - Calendar-aware interval arithmetic for schedules
//! - Invoice generation from contract lines
//! - The run ledger and the billing run summary
//! - Collaborator traits for storage and master data, with an in-memory store
//! - The billing runner that ties them together

pub mod error;
pub mod generator;
pub mod interval;
pub mod ledger;
pub mod memory;
pub mod runner;
pub mod store;
pub mod types;

#[cfg(test)]
mod interval_props;

pub use error::{BillingError, FailureCategory};
pub use generator::{GenerationContext, InvoiceGenerator};
pub use interval::{IntervalCalculator, IntervalError};
pub use ledger::{ContractRun, NewContractRun, RunFilter, RunOutcome, RunSummary};
pub use memory::InMemoryBillingStore;
pub use runner::ContractBillingRunner;
pub use store::{
    BillingCommit, BillingStore, CustomerDirectory, ItemCatalog, StoreError,
    format_document_number,
};
pub use types::{BillingInterval, Contract, ContractLine, ContractStatus};

//! The periodic billing pass.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use billrun_shared::config::MAX_RUN_ERROR_CHARS;
use billrun_shared::types::{CompanyProfile, ItemId, Money};

use super::error::BillingError;
use super::generator::{GenerationContext, InvoiceGenerator};
use super::interval::IntervalCalculator;
use super::ledger::{NewContractRun, RunOutcome, RunSummary};
use super::store::{BillingCommit, BillingStore, CustomerDirectory, ItemCatalog, StoreError};
use super::types::Contract;
use crate::document::{DocumentError, ItemMaster, SalesDocument};

/// Generates invoices for every due contract and advances their schedules.
///
/// Contracts are processed one after another. Each attempt commits in its
/// own transaction and writes exactly one ledger entry; a failing contract
/// never stops the pass.
pub struct ContractBillingRunner {
    store: Arc<dyn BillingStore>,
    customers: Arc<dyn CustomerDirectory>,
    items: Arc<dyn ItemCatalog>,
    company: CompanyProfile,
    error_max_chars: usize,
}

impl ContractBillingRunner {
    /// Creates a runner.
    ///
    /// `error_max_chars` bounds the error message stored on failed runs and
    /// is capped at [`MAX_RUN_ERROR_CHARS`].
    #[must_use]
    pub fn new(
        store: Arc<dyn BillingStore>,
        customers: Arc<dyn CustomerDirectory>,
        items: Arc<dyn ItemCatalog>,
        company: CompanyProfile,
        error_max_chars: usize,
    ) -> Self {
        Self {
            store,
            customers,
            items,
            company,
            error_max_chars: error_max_chars.min(MAX_RUN_ERROR_CHARS),
        }
    }

    /// Runs one billing pass for `as_of`.
    ///
    /// Contract failures are recorded in the run ledger and counted in the
    /// summary; they are not returned.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` only when the due contracts cannot be loaded.
    pub async fn run_due_billing(&self, as_of: NaiveDate) -> Result<RunSummary, StoreError> {
        let contracts = self.store.due_contracts(as_of).await?;
        info!(%as_of, due = contracts.len(), "Starting billing run");

        let mut summary = RunSummary::default();
        for contract in &contracts {
            self.process_contract(contract, as_of, &mut summary).await;
        }

        info!(
            %as_of,
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            unrecorded = summary.unrecorded,
            "Billing run finished"
        );
        Ok(summary)
    }

    async fn process_contract(
        &self,
        contract: &Contract,
        as_of: NaiveDate,
        summary: &mut RunSummary,
    ) {
        let period_date = contract.next_run_date.unwrap_or(as_of);

        match self.bill_contract(contract, as_of).await {
            Ok(document) => {
                info!(
                    contract_id = %contract.id,
                    %period_date,
                    document_number = document.number.as_deref().unwrap_or_default(),
                    gross = %Money::new(document.totals.gross, document.currency),
                    "Contract billed"
                );
                summary.record(RunOutcome::Success, Some(document.id));
                let run = NewContractRun::success(contract.id, period_date, document.id);
                self.record(run, summary).await;
            }
            Err(err) => {
                let outcome = err.outcome();
                if outcome == RunOutcome::Skipped {
                    warn!(
                        contract_id = %contract.id,
                        %period_date,
                        error = %err,
                        "Contract skipped, period already billed"
                    );
                } else {
                    error!(
                        contract_id = %contract.id,
                        %period_date,
                        error_code = err.error_code(),
                        error = %err,
                        "Contract billing failed"
                    );
                }
                summary.record(outcome, None);
                let run =
                    NewContractRun::from_error(contract.id, period_date, &err, self.error_max_chars);
                self.record(run, summary).await;
            }
        }
    }

    /// One attempt: look up master data, generate, commit.
    async fn bill_contract(
        &self,
        contract: &Contract,
        as_of: NaiveDate,
    ) -> Result<SalesDocument, BillingError> {
        let period_date = contract
            .next_run_date
            .ok_or(BillingError::MissingNextRunDate(contract.id))?;
        let tax_profile = self.customers.tax_profile(contract.customer_id).await?;
        let items = self.load_items(contract).await?;

        let document = InvoiceGenerator::generate(
            contract,
            &GenerationContext {
                company: &self.company,
                issue_date: as_of,
                tax_profile: tax_profile.as_ref(),
                items: &items,
            },
        )?;
        let advanced_next_run = IntervalCalculator::add(period_date, contract.interval)?;
        debug!(
            contract_id = %contract.id,
            lines = document.lines.len(),
            %advanced_next_run,
            "Committing generated invoice"
        );

        let committed = self
            .store
            .commit_billing(BillingCommit {
                contract_id: contract.id,
                expected_next_run: period_date,
                advanced_next_run,
                number_prefix: self.company.invoice_number_prefix.clone(),
                document,
            })
            .await?;
        Ok(committed)
    }

    async fn load_items(
        &self,
        contract: &Contract,
    ) -> Result<HashMap<ItemId, ItemMaster>, BillingError> {
        let mut items = HashMap::new();
        for line in &contract.lines {
            let Some(item_id) = line.item_id else {
                continue;
            };
            if items.contains_key(&item_id) {
                continue;
            }
            let item = self
                .items
                .item(item_id)
                .await?
                .ok_or(DocumentError::ItemNotFound {
                    position: line.position,
                    item_id,
                })?;
            items.insert(item_id, item);
        }
        Ok(items)
    }

    /// Appends a ledger entry. A failed append is logged and counted as
    /// unrecorded; the attempt itself has already been decided.
    async fn record(&self, run: NewContractRun, summary: &mut RunSummary) {
        let contract_id = run.contract_id;
        let outcome = run.outcome;
        if let Err(e) = self.store.append_run(run).await {
            summary.unrecorded += 1;
            error!(
                %contract_id,
                %outcome,
                error = %e,
                "Failed to append run ledger entry"
            );
        }
    }
}

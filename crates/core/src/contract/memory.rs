//! In-memory implementation of the collaborator traits.
//!
//! Every commit runs under one lock and validates before it mutates, which
//! gives the same all-or-nothing behavior as a database transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use tokio::sync::Mutex;

use billrun_shared::types::{
    ContractId, ContractRunId, CustomerId, ItemId, PageRequest, PageResponse, SalesDocumentId,
};

use super::ledger::{ContractRun, NewContractRun, RunFilter};
use super::store::{
    BillingCommit, BillingStore, CustomerDirectory, ItemCatalog, StoreError,
    format_document_number,
};
use super::types::Contract;
use crate::document::{ItemMaster, SalesDocument};
use crate::tax::CustomerTaxProfile;

#[derive(Debug, Default)]
struct State {
    contracts: HashMap<ContractId, Contract>,
    documents: Vec<SalesDocument>,
    runs: Vec<ContractRun>,
    sequences: HashMap<(String, i32), u32>,
    customers: HashMap<CustomerId, CustomerTaxProfile>,
    items: HashMap<ItemId, ItemMaster>,
    failing_commits: HashMap<ContractId, String>,
}

/// Billing store kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryBillingStore {
    state: Mutex<State>,
}

impl InMemoryBillingStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a contract.
    pub async fn insert_contract(&self, contract: Contract) {
        self.state.lock().await.contracts.insert(contract.id, contract);
    }

    /// Inserts or replaces a customer tax profile.
    pub async fn insert_customer(&self, customer_id: CustomerId, profile: CustomerTaxProfile) {
        self.state.lock().await.customers.insert(customer_id, profile);
    }

    /// Inserts or replaces an item.
    pub async fn insert_item(&self, item: ItemMaster) {
        self.state.lock().await.items.insert(item.id, item);
    }

    /// Makes every commit for `contract_id` fail with a database error.
    pub async fn fail_commits_for(&self, contract_id: ContractId, message: impl Into<String>) {
        self.state
            .lock()
            .await
            .failing_commits
            .insert(contract_id, message.into());
    }

    /// Removes an injected commit failure.
    pub async fn clear_commit_failure(&self, contract_id: ContractId) {
        self.state.lock().await.failing_commits.remove(&contract_id);
    }

    /// Moves a contract's schedule outside of a billing commit.
    ///
    /// # Errors
    ///
    /// Returns `ContractNotFound` for an unknown contract.
    pub async fn set_next_run_date(
        &self,
        contract_id: ContractId,
        next_run_date: NaiveDate,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let contract = state
            .contracts
            .get_mut(&contract_id)
            .ok_or(StoreError::ContractNotFound(contract_id))?;
        contract.next_run_date = Some(next_run_date);
        Ok(())
    }

    /// Current state of a contract.
    pub async fn contract(&self, contract_id: ContractId) -> Option<Contract> {
        self.state.lock().await.contracts.get(&contract_id).cloned()
    }

    /// All stored documents in insertion order.
    pub async fn documents(&self) -> Vec<SalesDocument> {
        self.state.lock().await.documents.clone()
    }

    /// All ledger entries in append order.
    pub async fn runs(&self) -> Vec<ContractRun> {
        self.state.lock().await.runs.clone()
    }
}

#[async_trait]
impl BillingStore for InMemoryBillingStore {
    async fn due_contracts(&self, as_of: NaiveDate) -> Result<Vec<Contract>, StoreError> {
        let state = self.state.lock().await;
        let mut due: Vec<Contract> = state
            .contracts
            .values()
            .filter(|c| c.is_due(as_of))
            .cloned()
            .collect();
        due.sort_by_key(|c| (c.next_run_date, c.id));
        Ok(due)
    }

    async fn commit_billing(&self, commit: BillingCommit) -> Result<SalesDocument, StoreError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if let Some(message) = state.failing_commits.get(&commit.contract_id) {
            return Err(StoreError::Database(message.clone()));
        }

        let contract = state
            .contracts
            .get_mut(&commit.contract_id)
            .ok_or(StoreError::ContractNotFound(commit.contract_id))?;
        if contract.next_run_date != Some(commit.expected_next_run) {
            return Err(StoreError::ScheduleConflict {
                contract_id: commit.contract_id,
                expected: commit.expected_next_run,
            });
        }

        let period_start = commit.document.period_start;
        let duplicate = state.documents.iter().any(|d| {
            d.contract_id == Some(commit.contract_id) && d.period_start == period_start
        });
        if duplicate {
            return Err(StoreError::DuplicatePeriod {
                contract_id: commit.contract_id,
                period_start: period_start.unwrap_or(commit.expected_next_run),
            });
        }

        let mut document = commit.document;
        let year = document.issue_date.year();
        let sequence = state
            .sequences
            .entry((commit.number_prefix.clone(), year))
            .or_insert(0);
        *sequence += 1;
        document.number = Some(format_document_number(&commit.number_prefix, year, *sequence));

        contract.last_run_date = Some(commit.expected_next_run);
        contract.next_run_date = Some(commit.advanced_next_run);
        state.documents.push(document.clone());

        Ok(document)
    }

    async fn append_run(&self, run: NewContractRun) -> Result<ContractRun, StoreError> {
        let run = run.into_run(ContractRunId::new());
        self.state.lock().await.runs.push(run.clone());
        Ok(run)
    }

    async fn list_runs(
        &self,
        filter: &RunFilter,
        page: PageRequest,
    ) -> Result<PageResponse<ContractRun>, StoreError> {
        let state = self.state.lock().await;
        let mut matching: Vec<&ContractRun> =
            state.runs.iter().filter(|r| filter.matches(r)).collect();
        matching.sort_by(|a, b| (b.run_at, b.id).cmp(&(a.run_at, a.id)));

        let total = matching.len() as u64;
        let data = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    async fn find_document(
        &self,
        id: SalesDocumentId,
    ) -> Result<Option<SalesDocument>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.documents.iter().find(|d| d.id == id).cloned())
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryBillingStore {
    async fn tax_profile(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<CustomerTaxProfile>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .customers
            .get(&customer_id)
            .cloned())
    }
}

#[async_trait]
impl ItemCatalog for InMemoryBillingStore {
    async fn item(&self, item_id: ItemId) -> Result<Option<ItemMaster>, StoreError> {
        Ok(self.state.lock().await.items.get(&item_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::types::{BillingInterval, ContractLine};
    use crate::document::{DocumentType, NewDocumentLine};
    use crate::tax::TaxRate;
    use billrun_shared::types::Currency;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn contract() -> Contract {
        let mut contract = Contract::new(
            CustomerId::new(),
            BillingInterval::Monthly,
            date(2026, 1, 1),
            Currency::Eur,
        );
        contract.add_line(ContractLine::priced(
            1,
            "Rent",
            dec!(1),
            dec!(10),
            TaxRate::from_percent(dec!(19)).unwrap(),
        ));
        contract.activate().unwrap();
        contract
    }

    fn commit_for(contract: &Contract, period: NaiveDate) -> BillingCommit {
        let mut document = SalesDocument::new(
            DocumentType::Invoice,
            contract.customer_id,
            Currency::Eur,
            period,
        );
        document.contract_id = Some(contract.id);
        document.period_start = Some(period);
        document
            .add_line(NewDocumentLine {
                item_id: None,
                description: "Rent".into(),
                quantity: dec!(1),
                unit_price_net: dec!(10),
                is_discountable: true,
                discount_percent: dec!(0),
                tax_rate: TaxRate::ZERO,
            })
            .unwrap();
        BillingCommit {
            contract_id: contract.id,
            expected_next_run: period,
            advanced_next_run: date(2026, 2, 1),
            number_prefix: "RE".into(),
            document,
        }
    }

    #[tokio::test]
    async fn test_commit_numbers_and_advances() {
        let store = InMemoryBillingStore::new();
        let contract = contract();
        store.insert_contract(contract.clone()).await;

        let document = store.commit_billing(commit_for(&contract, date(2026, 1, 1))).await.unwrap();
        assert_eq!(document.number.as_deref(), Some("RE-2026-00001"));

        let stored = store.contract(contract.id).await.unwrap();
        assert_eq!(stored.last_run_date, Some(date(2026, 1, 1)));
        assert_eq!(stored.next_run_date, Some(date(2026, 2, 1)));
        assert_eq!(store.find_document(document.id).await.unwrap(), Some(document));
    }

    #[tokio::test]
    async fn test_stale_schedule_is_rejected_without_writes() {
        let store = InMemoryBillingStore::new();
        let contract = contract();
        store.insert_contract(contract.clone()).await;
        store.set_next_run_date(contract.id, date(2026, 2, 1)).await.unwrap();

        let result = store.commit_billing(commit_for(&contract, date(2026, 1, 1))).await;
        assert!(matches!(result, Err(StoreError::ScheduleConflict { .. })));
        assert!(store.documents().await.is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure_rolls_back() {
        let store = InMemoryBillingStore::new();
        let contract = contract();
        store.insert_contract(contract.clone()).await;
        store.fail_commits_for(contract.id, "disk full").await;

        let result = store.commit_billing(commit_for(&contract, date(2026, 1, 1))).await;
        assert_eq!(result, Err(StoreError::Database("disk full".into())));
        assert!(store.documents().await.is_empty());
        assert_eq!(
            store.contract(contract.id).await.unwrap().next_run_date,
            Some(date(2026, 1, 1))
        );

        store.clear_commit_failure(contract.id).await;
        let document = store.commit_billing(commit_for(&contract, date(2026, 1, 1))).await.unwrap();
        assert_eq!(document.number.as_deref(), Some("RE-2026-00001"));
    }

    #[tokio::test]
    async fn test_list_runs_paginates_newest_first() {
        let store = InMemoryBillingStore::new();
        let contract_id = ContractId::new();
        for _ in 0..3 {
            store
                .append_run(NewContractRun::success(
                    contract_id,
                    date(2026, 1, 1),
                    SalesDocumentId::new(),
                ))
                .await
                .unwrap();
        }

        let page = store
            .list_runs(&RunFilter::for_contract(contract_id), PageRequest::new(1, 2))
            .await
            .unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.meta.total, 3);
        assert_eq!(page.meta.total_pages, 2);
        assert!((page.data[0].run_at, page.data[0].id) > (page.data[1].run_at, page.data[1].id));

        let other = store
            .list_runs(&RunFilter::for_contract(ContractId::new()), PageRequest::default())
            .await
            .unwrap();
        assert!(other.data.is_empty());
    }
}

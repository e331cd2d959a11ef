//! Billing repository backed by PostgreSQL.
//!
//! Implements the collaborator traits of the billing runner. Each
//! `commit_billing` call runs in its own transaction: schedule
//! compare-and-set, number allocation, document and line inserts.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveTime};
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr, Statement, TransactionTrait,
    Value,
};
use tracing::debug;
use uuid::Uuid;

use billrun_core::contract::{
    BillingCommit, BillingStore, Contract, ContractRun, ContractStatus, CustomerDirectory,
    ItemCatalog, NewContractRun, RunFilter, StoreError, format_document_number,
};
use billrun_core::document::{ItemMaster, SalesDocument};
use billrun_core::tax::CustomerTaxProfile;
use billrun_shared::types::{
    ContractRunId, CustomerId, ItemId, PageRequest, PageResponse, SalesDocumentId,
};

use crate::entities::{
    contract_lines, contract_runs, contracts, customers, items, payment_terms,
    sales_document_lines, sales_documents,
};
use crate::mapping;

/// Unique index guarding one generated document per contract period.
const CONTRACT_PERIOD_INDEX: &str = "uq_sales_documents_contract_period";

const NEXT_NUMBER_SQL: &str = r"
INSERT INTO document_sequences (prefix, year, last_value)
VALUES ($1, $2, 1)
ON CONFLICT (prefix, year)
DO UPDATE SET last_value = document_sequences.last_value + 1
RETURNING last_value
";

fn db_error(err: DbErr) -> StoreError {
    StoreError::Database(err.to_string())
}

/// Billing repository.
#[derive(Debug, Clone)]
pub struct BillingRepository {
    db: DatabaseConnection,
}

impl BillingRepository {
    /// Creates a new billing repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Loads lines and payment terms for the selected contract rows.
    async fn hydrate(&self, rows: Vec<contracts::Model>) -> Result<Vec<Contract>, StoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let contract_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut lines_by_contract: HashMap<Uuid, Vec<contract_lines::Model>> = HashMap::new();
        for line in contract_lines::Entity::find()
            .filter(contract_lines::Column::ContractId.is_in(contract_ids))
            .all(&self.db)
            .await
            .map_err(db_error)?
        {
            lines_by_contract
                .entry(line.contract_id)
                .or_default()
                .push(line);
        }

        let term_ids: Vec<Uuid> = rows.iter().filter_map(|r| r.payment_term_id).collect();
        let terms: HashMap<Uuid, payment_terms::Model> = if term_ids.is_empty() {
            HashMap::new()
        } else {
            payment_terms::Entity::find()
                .filter(payment_terms::Column::Id.is_in(term_ids))
                .all(&self.db)
                .await
                .map_err(db_error)?
                .into_iter()
                .map(|t| (t.id, t))
                .collect()
        };

        rows.into_iter()
            .map(|row| {
                let lines = lines_by_contract.remove(&row.id).unwrap_or_default();
                let term = row.payment_term_id.and_then(|id| terms.get(&id).cloned());
                mapping::contract_from_rows(row, lines, term)
            })
            .collect()
    }

    /// Increments the `(prefix, year)` sequence and returns the new value.
    async fn next_sequence(
        txn: &DatabaseTransaction,
        prefix: &str,
        year: i32,
    ) -> Result<u32, StoreError> {
        let row = txn
            .query_one(Statement::from_sql_and_values(
                txn.get_database_backend(),
                NEXT_NUMBER_SQL,
                [Value::from(prefix), Value::from(year)],
            ))
            .await
            .map_err(db_error)?
            .ok_or_else(|| StoreError::Database("document sequence returned no row".into()))?;
        let last_value: i32 = row.try_get("", "last_value").map_err(db_error)?;
        u32::try_from(last_value)
            .map_err(|_| StoreError::InvalidData(format!("negative sequence value {last_value}")))
    }
}

#[async_trait]
impl BillingStore for BillingRepository {
    async fn due_contracts(&self, as_of: NaiveDate) -> Result<Vec<Contract>, StoreError> {
        let rows = contracts::Entity::find()
            .filter(contracts::Column::Status.eq(ContractStatus::Active.as_str()))
            .filter(contracts::Column::NextRunDate.lte(as_of))
            .filter(
                Condition::any()
                    .add(contracts::Column::EndDate.is_null())
                    .add(
                        Expr::col(contracts::Column::EndDate)
                            .gte(Expr::col(contracts::Column::NextRunDate)),
                    ),
            )
            .order_by_asc(contracts::Column::NextRunDate)
            .order_by_asc(contracts::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error)?;

        debug!(%as_of, due = rows.len(), "Selected due contracts");
        self.hydrate(rows).await
    }

    async fn commit_billing(&self, commit: BillingCommit) -> Result<SalesDocument, StoreError> {
        let contract_uuid = commit.contract_id.into_inner();
        let txn = self.db.begin().await.map_err(db_error)?;

        // Compare-and-set: only the run that selected this next_run_date may advance it.
        let advanced = contracts::Entity::update_many()
            .col_expr(
                contracts::Column::LastRunDate,
                Expr::value(commit.expected_next_run),
            )
            .col_expr(
                contracts::Column::NextRunDate,
                Expr::value(commit.advanced_next_run),
            )
            .filter(contracts::Column::Id.eq(contract_uuid))
            .filter(contracts::Column::Status.eq(ContractStatus::Active.as_str()))
            .filter(contracts::Column::NextRunDate.eq(commit.expected_next_run))
            .exec(&txn)
            .await
            .map_err(db_error)?;

        if advanced.rows_affected == 0 {
            let exists = contracts::Entity::find_by_id(contract_uuid)
                .one(&txn)
                .await
                .map_err(db_error)?
                .is_some();
            txn.rollback().await.map_err(db_error)?;
            return Err(if exists {
                StoreError::ScheduleConflict {
                    contract_id: commit.contract_id,
                    expected: commit.expected_next_run,
                }
            } else {
                StoreError::ContractNotFound(commit.contract_id)
            });
        }

        let mut document = commit.document;
        let year = document.issue_date.year();
        let sequence = Self::next_sequence(&txn, &commit.number_prefix, year).await?;
        document.number = Some(format_document_number(&commit.number_prefix, year, sequence));

        if let Err(err) = sales_documents::Entity::insert(mapping::document_active_model(&document))
            .exec(&txn)
            .await
        {
            let duplicate_period = matches!(
                err.sql_err(),
                Some(SqlErr::UniqueConstraintViolation(ref message))
                    if message.contains(CONTRACT_PERIOD_INDEX)
            );
            txn.rollback().await.map_err(db_error)?;
            return Err(if duplicate_period {
                StoreError::DuplicatePeriod {
                    contract_id: commit.contract_id,
                    period_start: document.period_start.unwrap_or(commit.expected_next_run),
                }
            } else {
                db_error(err)
            });
        }

        let line_models = document
            .lines
            .iter()
            .map(|line| mapping::document_line_active_model(document.id, line))
            .collect::<Result<Vec<_>, _>>()?;
        if !line_models.is_empty() {
            sales_document_lines::Entity::insert_many(line_models)
                .exec(&txn)
                .await
                .map_err(db_error)?;
        }

        txn.commit().await.map_err(db_error)?;

        debug!(
            contract_id = %commit.contract_id,
            document_number = document.number.as_deref().unwrap_or_default(),
            next_run_date = %commit.advanced_next_run,
            "Committed billing transaction"
        );
        Ok(document)
    }

    async fn append_run(&self, run: NewContractRun) -> Result<ContractRun, StoreError> {
        let id = ContractRunId::new();
        contract_runs::Entity::insert(mapping::run_active_model(id, &run))
            .exec(&self.db)
            .await
            .map_err(db_error)?;

        debug!(
            run_id = %id,
            contract_id = %run.contract_id,
            outcome = %run.outcome,
            "Appended run ledger entry"
        );
        Ok(run.into_run(id))
    }

    async fn list_runs(
        &self,
        filter: &RunFilter,
        page: PageRequest,
    ) -> Result<PageResponse<ContractRun>, StoreError> {
        let mut query = contract_runs::Entity::find();
        if let Some(contract_id) = filter.contract_id {
            query = query.filter(contract_runs::Column::ContractId.eq(contract_id.into_inner()));
        }
        if let Some(from) = filter.from {
            query = query
                .filter(contract_runs::Column::RunAt.gte(from.and_time(NaiveTime::MIN).and_utc()));
        }
        if let Some(day_after) = filter.to.and_then(|to| to.succ_opt()) {
            query = query.filter(
                contract_runs::Column::RunAt.lt(day_after.and_time(NaiveTime::MIN).and_utc()),
            );
        }
        if let Some(outcome) = filter.outcome {
            query = query.filter(contract_runs::Column::Outcome.eq(outcome.as_str()));
        }

        let total = query.clone().count(&self.db).await.map_err(db_error)?;
        let rows = query
            .order_by_desc(contract_runs::Column::RunAt)
            .order_by_desc(contract_runs::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_error)?;

        let data = rows
            .into_iter()
            .map(mapping::run_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    async fn find_document(
        &self,
        id: SalesDocumentId,
    ) -> Result<Option<SalesDocument>, StoreError> {
        let Some(header) = sales_documents::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_error)?
        else {
            return Ok(None);
        };

        let lines = sales_document_lines::Entity::find()
            .filter(sales_document_lines::Column::DocumentId.eq(id.into_inner()))
            .order_by_asc(sales_document_lines::Column::Position)
            .all(&self.db)
            .await
            .map_err(db_error)?;

        mapping::document_from_rows(header, lines).map(Some)
    }
}

#[async_trait]
impl CustomerDirectory for BillingRepository {
    async fn tax_profile(
        &self,
        customer_id: CustomerId,
    ) -> Result<Option<CustomerTaxProfile>, StoreError> {
        let row = customers::Entity::find_by_id(customer_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_error)?;
        Ok(row.and_then(mapping::tax_profile_from_row))
    }
}

#[async_trait]
impl ItemCatalog for BillingRepository {
    async fn item(&self, item_id: ItemId) -> Result<Option<ItemMaster>, StoreError> {
        items::Entity::find_by_id(item_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(mapping::item_from_row)
            .transpose()
    }
}

//! `SeaORM` Entity for contracts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "contracts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub billing_interval: String,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub last_run_date: Option<Date>,
    pub next_run_date: Option<Date>,
    pub status: String,
    pub currency: String,
    pub payment_term_id: Option<Uuid>,
    pub header_text: Option<String>,
    pub footer_text: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customers::Entity",
        from = "Column::CustomerId",
        to = "super::customers::Column::Id"
    )]
    Customers,
    #[sea_orm(
        belongs_to = "super::payment_terms::Entity",
        from = "Column::PaymentTermId",
        to = "super::payment_terms::Column::Id"
    )]
    PaymentTerms,
    #[sea_orm(has_many = "super::contract_lines::Entity")]
    ContractLines,
    #[sea_orm(has_many = "super::contract_runs::Entity")]
    ContractRuns,
}

impl Related<super::customers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customers.def()
    }
}

impl Related<super::payment_terms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentTerms.def()
    }
}

impl Related<super::contract_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContractLines.def()
    }
}

impl Related<super::contract_runs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContractRuns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

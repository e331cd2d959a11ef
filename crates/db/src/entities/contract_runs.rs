//! `SeaORM` Entity for contract_runs table.
//!
//! Rows are append-only; a trigger rejects updates and deletes.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "contract_runs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub contract_id: Uuid,
    pub run_at: DateTimeWithTimeZone,
    pub period_date: Date,
    pub outcome: String,
    pub document_id: Option<Uuid>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::contracts::Entity",
        from = "Column::ContractId",
        to = "super::contracts::Column::Id"
    )]
    Contracts,
    #[sea_orm(
        belongs_to = "super::sales_documents::Entity",
        from = "Column::DocumentId",
        to = "super::sales_documents::Column::Id"
    )]
    SalesDocuments,
}

impl Related<super::contracts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contracts.def()
    }
}

impl Related<super::sales_documents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesDocuments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

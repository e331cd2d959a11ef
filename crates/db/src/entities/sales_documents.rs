//! `SeaORM` Entity for sales_documents table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sales_documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub number: Option<String>,
    pub document_type: String,
    pub status: String,
    pub issue_date: Date,
    pub due_date: Date,
    pub customer_id: Uuid,
    pub payment_term_id: Option<Uuid>,
    pub currency: String,
    pub header_text: Option<String>,
    pub footer_text: Option<String>,
    pub contract_id: Option<Uuid>,
    pub period_start: Option<Date>,
    pub period_end: Option<Date>,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub net_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub tax_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub gross_total: Decimal,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sales_document_lines::Entity")]
    SalesDocumentLines,
    #[sea_orm(
        belongs_to = "super::contracts::Entity",
        from = "Column::ContractId",
        to = "super::contracts::Column::Id"
    )]
    Contracts,
}

impl Related<super::sales_document_lines::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesDocumentLines.def()
    }
}

impl Related<super::contracts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contracts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! `SeaORM` Entity for sales_document_lines table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sales_document_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub document_id: Uuid,
    pub position: i32,
    pub item_id: Option<Uuid>,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub unit_price_net: Decimal,
    pub is_discountable: bool,
    #[sea_orm(column_type = "Decimal(Some((7, 4)))")]
    pub discount_percent: Decimal,
    #[sea_orm(column_type = "Decimal(Some((7, 4)))")]
    pub tax_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub net: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub tax: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 2)))")]
    pub gross: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sales_documents::Entity",
        from = "Column::DocumentId",
        to = "super::sales_documents::Column::Id",
        on_delete = "Cascade"
    )]
    SalesDocuments,
}

impl Related<super::sales_documents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesDocuments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

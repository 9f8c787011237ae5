//! `SeaORM` Entity for statements_of_accounts table.
//!
//! Lines and outstanding invoices are stored as JSONB snapshots.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "statements_of_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub start_date: i64,
    pub end_date: i64,
    pub generated_date: i64,
    pub currency: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub opening_balance_amount: Decimal,
    pub opening_balance_currency: String,
    #[sea_orm(column_type = "Decimal(Some((19, 8)))", nullable)]
    pub opening_balance_exchange_rate: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_invoiced_amount: Decimal,
    pub total_invoiced_currency: String,
    #[sea_orm(column_type = "Decimal(Some((19, 8)))", nullable)]
    pub total_invoiced_exchange_rate: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_paid_amount: Decimal,
    pub total_paid_currency: String,
    #[sea_orm(column_type = "Decimal(Some((19, 8)))", nullable)]
    pub total_paid_exchange_rate: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub closing_balance_amount: Decimal,
    pub closing_balance_currency: String,
    #[sea_orm(column_type = "Decimal(Some((19, 8)))", nullable)]
    pub closing_balance_exchange_rate: Option<Decimal>,
    #[sea_orm(column_type = "JsonBinary")]
    pub transactions: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub outstanding_invoices: Json,
    pub exported_at: Option<i64>,
    pub export_format: Option<String>,
    pub sent_at: Option<i64>,
    pub sent_to: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customers::Entity",
        from = "Column::CustomerId",
        to = "super::customers::Column::Id"
    )]
    Customers,
}

impl Related<super::customers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! `SeaORM` Entity for invoices table.
//!
//! Owned by the billing module; this crate only reads it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub invoice_number: String,
    pub direction: String,
    pub customer_id: Option<Uuid>,
    pub partner_id: Option<Uuid>,
    pub shipment_id: Option<Uuid>,
    pub issue_date: i64,
    pub due_date: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_amount: Decimal,
    pub total_currency: String,
    #[sea_orm(column_type = "Decimal(Some((19, 8)))", nullable)]
    pub total_exchange_rate: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub paid_amount: Option<Decimal>,
    pub paid_currency: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 8)))", nullable)]
    pub paid_exchange_rate: Option<Decimal>,
    pub paid_date: Option<i64>,
    pub status: String,
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

//! `SeaORM` Entity for shipments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "shipments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub reference: String,
    pub customer_id: Option<Uuid>,
    pub partner_id: Option<Uuid>,
    pub status: String,
    pub delivered_at: Option<i64>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub agreed_cost_amount: Option<Decimal>,
    pub agreed_cost_currency: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 8)))", nullable)]
    pub agreed_cost_exchange_rate: Option<Decimal>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::partners::Entity",
        from = "Column::PartnerId",
        to = "super::partners::Column::Id"
    )]
    Partners,
    #[sea_orm(has_many = "super::incoming_invoice_trackings::Entity")]
    IncomingInvoiceTrackings,
}

impl Related<super::partners::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Partners.def()
    }
}

impl Related<super::incoming_invoice_trackings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IncomingInvoiceTrackings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! `SeaORM` Entity for incoming_invoice_trackings table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "incoming_invoice_trackings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub partner_id: Uuid,
    pub expected_date: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub expected_amount: Option<Decimal>,
    pub expected_currency: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 8)))", nullable)]
    pub expected_exchange_rate: Option<Decimal>,
    pub invoice_id: Option<Uuid>,
    pub received_date: Option<i64>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub actual_amount: Option<Decimal>,
    pub actual_currency: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((19, 8)))", nullable)]
    pub actual_exchange_rate: Option<Decimal>,
    pub status: String,
    pub reminders_sent: i32,
    pub last_reminder_date: Option<i64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub dispute_reason: Option<String>,
    pub dispute_date: Option<i64>,
    pub dispute_resolved_date: Option<i64>,
    pub approved_by: Option<Uuid>,
    pub approved_date: Option<i64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub approval_notes: Option<String>,
    pub payment_reference: Option<String>,
    pub paid_date: Option<i64>,
    #[sea_orm(column_type = "Text")]
    pub internal_notes: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shipments::Entity",
        from = "Column::ShipmentId",
        to = "super::shipments::Column::Id"
    )]
    Shipments,
    #[sea_orm(
        belongs_to = "super::partners::Entity",
        from = "Column::PartnerId",
        to = "super::partners::Column::Id"
    )]
    Partners,
}

impl Related<super::shipments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shipments.def()
    }
}

impl Related<super::partners::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Partners.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! `SeaORM` Entity for dunning_configs table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "dunning_configs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub party_kind: String,
    pub party_id: Uuid,
    pub level1_days: i32,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub level1_fee: Decimal,
    pub level1_auto_send: bool,
    pub level2_days: i32,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub level2_fee: Decimal,
    pub level2_auto_send: bool,
    pub level3_days: i32,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub level3_fee: Decimal,
    pub level3_auto_send: bool,
    pub fee_currency: String,
    pub level3_suspend_service: bool,
    pub auto_reactivate_on_payment: bool,
    pub service_suspended: bool,
    pub service_suspended_date: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

//! `SeaORM` Entity for dunning_states table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "dunning_states")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub debt_kind: String,
    pub debt_id: Uuid,
    pub party_kind: String,
    pub party_id: Uuid,
    pub last_applied_level: i16,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub fees_charged_amount: Decimal,
    pub fees_charged_currency: String,
    #[sea_orm(column_type = "Decimal(Some((19, 8)))", nullable)]
    pub fees_charged_exchange_rate: Option<Decimal>,
    pub last_evaluated_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

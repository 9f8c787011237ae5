//! `SeaORM` Entity for partners table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "partners")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::incoming_invoice_trackings::Entity")]
    IncomingInvoiceTrackings,
}

impl Related<super::incoming_invoice_trackings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IncomingInvoiceTrackings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

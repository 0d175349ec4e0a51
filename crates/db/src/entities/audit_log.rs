//! Audit log entity. Rows are append-only.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Admin who performed the action
    pub actor_id: String,

    /// Action tag, e.g. `LISTING_HIDDEN`
    pub action: String,

    /// Kind of the affected record, e.g. `Listing`
    pub target_type: String,

    pub target_id: String,

    #[sea_orm(column_type = "JsonBinary")]
    pub meta: Json,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

//! Inquiry entity: a message from a prospective adopter to a listing owner.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum InquiryStatus {
    #[sea_orm(string_value = "open")]
    #[default]
    Open,
    #[sea_orm(string_value = "replied")]
    Replied,
    #[sea_orm(string_value = "closed")]
    Closed,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inquiry")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub listing_id: String,

    /// Listing owner at the time of sending (denormalized)
    pub owner_id: String,

    pub sender_id: String,

    #[sea_orm(column_type = "Text")]
    pub message: String,

    pub phone: String,

    pub status: InquiryStatus,

    pub owner_note: String,

    #[sea_orm(default_value = false)]
    pub is_flagged: bool,

    pub flag_reason: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pet_listing::Entity",
        from = "Column::ListingId",
        to = "super::pet_listing::Column::Id",
        on_delete = "Cascade"
    )]
    Listing,
}

impl Related<super::pet_listing::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Listing.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

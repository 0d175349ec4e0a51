//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[sea_orm(string_value = "user")]
    #[default]
    User,
    #[sea_orm(string_value = "admin")]
    Admin,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Display name
    pub name: String,

    /// Login email, stored trimmed and lowercased
    #[sea_orm(unique)]
    pub email: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: UserRole,

    #[sea_orm(default_value = false)]
    pub is_email_verified: bool,

    /// SHA-256 hex digest of the pending verification code, empty when none
    #[serde(skip_serializing)]
    pub email_otp_hash: String,

    #[sea_orm(nullable)]
    #[serde(skip_serializing)]
    pub email_otp_expires_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(default_value = 0)]
    #[serde(skip_serializing)]
    pub email_otp_attempts: i32,

    /// Favorited listing IDs (set semantics)
    #[sea_orm(column_type = "JsonBinary")]
    pub favorites: Json,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Favorited listing IDs.
    #[must_use]
    pub fn favorite_ids(&self) -> Vec<String> {
        serde_json::from_value(self.favorites.clone()).unwrap_or_default()
    }

    /// Whether this user may perform admin-only operations.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::pet_listing::Entity")]
    Listings,
}

impl Related<super::pet_listing::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Listings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

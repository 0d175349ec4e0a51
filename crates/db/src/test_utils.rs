//! Model fixtures for tests against `MockDatabase`.
//!
//! Enabled for downstream crates with the `test-utils` feature.

use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::Value;
use serde_json::json;

use crate::entities::{
    inquiry::{self, InquiryStatus},
    pet_listing::{self, Gender, ListingStatus, ListingType, Species},
    report::{self, ReportReason, ReportStatus},
    user::{self, UserRole},
};

/// A verified user with `{id}@example.com` and no password.
#[must_use]
pub fn user(id: &str, role: UserRole) -> user::Model {
    user::Model {
        id: id.to_string(),
        name: format!("User {id}"),
        email: format!("{id}@example.com"),
        password_hash: String::new(),
        role,
        is_email_verified: true,
        email_otp_hash: String::new(),
        email_otp_expires_at: None,
        email_otp_attempts: 0,
        favorites: json!([]),
        created_at: Utc::now().into(),
        updated_at: Utc::now().into(),
    }
}

/// A visible, active adoption listing for a nine year old cat.
#[must_use]
pub fn listing(id: &str, owner_id: &str) -> pet_listing::Model {
    pet_listing::Model {
        id: id.to_string(),
        owner_id: owner_id.to_string(),
        listing_type: ListingType::Adoption,
        title: "Calm senior cat".to_string(),
        description: "Enjoys sunny windowsills".to_string(),
        species: Species::Cat,
        breed: String::new(),
        age: Some(9),
        gender: Gender::Female,
        location: "Austin, TX".to_string(),
        status: ListingStatus::Active,
        images: json!([]),
        is_hidden: false,
        created_at: Utc::now().into(),
        updated_at: Utc::now().into(),
    }
}

#[must_use]
pub fn inquiry(id: &str, listing_id: &str, owner_id: &str, sender_id: &str) -> inquiry::Model {
    inquiry::Model {
        id: id.to_string(),
        listing_id: listing_id.to_string(),
        owner_id: owner_id.to_string(),
        sender_id: sender_id.to_string(),
        message: "Hello, is she still available?".to_string(),
        phone: String::new(),
        status: InquiryStatus::Open,
        owner_note: String::new(),
        is_flagged: false,
        flag_reason: String::new(),
        created_at: Utc::now().into(),
        updated_at: Utc::now().into(),
    }
}

/// An open spam report.
#[must_use]
pub fn report(id: &str, listing_id: &str, reporter_id: &str) -> report::Model {
    report::Model {
        id: id.to_string(),
        reporter_id: reporter_id.to_string(),
        listing_id: listing_id.to_string(),
        reason: ReportReason::Spam,
        message: String::new(),
        status: ReportStatus::Open,
        admin_note: String::new(),
        resolved_by: None,
        resolved_at: None,
        created_at: Utc::now().into(),
        updated_at: Utc::now().into(),
    }
}

/// Row answering a paginator `COUNT(*)` query.
#[must_use]
pub fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
}

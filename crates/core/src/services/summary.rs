//! Compact views of related records, loaded in batches at the service boundary.

use std::collections::{BTreeSet, HashMap};

use adoptme_common::AppResult;
use adoptme_db::{
    entities::{
        pet_listing::{self, ListingStatus, ListingType, Species},
        user::{self, UserRole},
    },
    repositories::{ListingRepository, UserRepository},
};
use serde::Serialize;

/// `{id, name, email}` of a related user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&user::Model> for UserSummary {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// A user summary that also carries the role, for the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActorSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl From<&user::Model> for ActorSummary {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// `{id, title, species, type, location}` of a related listing, optionally
/// with its status and visibility for moderation views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSummary {
    pub id: String,
    pub title: String,
    pub species: Species,
    #[serde(rename = "type")]
    pub listing_type: ListingType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ListingStatus>,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_hidden: Option<bool>,
}

impl ListingSummary {
    #[must_use]
    pub fn brief(listing: &pet_listing::Model) -> Self {
        Self {
            id: listing.id.clone(),
            title: listing.title.clone(),
            species: listing.species,
            listing_type: listing.listing_type,
            status: None,
            location: listing.location.clone(),
            is_hidden: None,
        }
    }

    #[must_use]
    pub const fn with_status(mut self, status: ListingStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub const fn with_visibility(mut self, is_hidden: bool) -> Self {
        self.is_hidden = Some(is_hidden);
        self
    }
}

/// Fetch every referenced user in one query, keyed by ID.
pub(crate) async fn load_users(
    repo: &UserRepository,
    ids: &[&str],
) -> AppResult<HashMap<String, user::Model>> {
    let ids = unique(ids);
    Ok(repo
        .find_by_ids(&ids)
        .await?
        .into_iter()
        .map(|u| (u.id.clone(), u))
        .collect())
}

/// Fetch every referenced listing in one query, keyed by ID. Hidden listings included.
pub(crate) async fn load_listings(
    repo: &ListingRepository,
    ids: &[&str],
) -> AppResult<HashMap<String, pet_listing::Model>> {
    let ids = unique(ids);
    Ok(repo
        .find_by_ids(&ids)
        .await?
        .into_iter()
        .map(|l| (l.id.clone(), l))
        .collect())
}

fn unique(ids: &[&str]) -> Vec<String> {
    ids.iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

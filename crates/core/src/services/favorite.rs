//! Favorite listings, stored as a set of IDs on the user.

use adoptme_common::AppResult;
use adoptme_db::{
    entities::user,
    repositories::{ListingRepository, UserRepository},
};
use chrono::Utc;
use sea_orm::Set;
use serde::Serialize;

use super::listing::{ListingView, listing_views};

/// Result of a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FavoriteToggle {
    /// Whether the listing is now a favorite.
    pub favorited: bool,
}

impl FavoriteToggle {
    /// Confirmation text for the response.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        if self.favorited {
            "Added to favorites"
        } else {
            "Removed from favorites"
        }
    }
}

/// Favorite toggling and listing.
#[derive(Clone)]
pub struct FavoriteService {
    user_repo: UserRepository,
    listing_repo: ListingRepository,
}

impl FavoriteService {
    /// Create a new favorite service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, listing_repo: ListingRepository) -> Self {
        Self {
            user_repo,
            listing_repo,
        }
    }

    /// Add or remove a listing from the caller's favorites.
    ///
    /// Removing never looks at the listing, so favorites of deleted or hidden
    /// listings can always be dropped. Adding requires a visible listing.
    pub async fn toggle(&self, caller: &user::Model, listing_id: &str) -> AppResult<FavoriteToggle> {
        let mut favorites = caller.favorite_ids();

        let favorited = if let Some(pos) = favorites.iter().position(|id| id == listing_id) {
            favorites.remove(pos);
            false
        } else {
            let listing = self.listing_repo.get_visible(listing_id).await?;
            favorites.push(listing.id);
            true
        };

        let mut active: user::ActiveModel = caller.clone().into();
        active.favorites = Set(serde_json::json!(favorites));
        active.updated_at = Set(Utc::now().into());
        self.user_repo.update(active).await?;

        tracing::debug!(user_id = %caller.id, listing_id = %listing_id, favorited, "Favorite toggled");
        Ok(FavoriteToggle { favorited })
    }

    /// The caller's favorited listings that still exist and are visible, newest first.
    pub async fn list(&self, caller: &user::Model) -> AppResult<Vec<ListingView>> {
        let listings = self
            .listing_repo
            .find_visible_by_ids(&caller.favorite_ids())
            .await?;
        listing_views(&self.user_repo, listings).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::access::fixtures;
    use adoptme_common::AppError;
    use adoptme_db::entities::user::UserRole;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;
    use std::sync::Arc;

    fn service(db: MockDatabase) -> FavoriteService {
        let db = Arc::new(db.into_connection());
        FavoriteService::new(UserRepository::new(db.clone()), ListingRepository::new(db))
    }

    #[tokio::test]
    async fn test_toggle_adds_visible_listing() {
        let caller = fixtures::user("u1", UserRole::User);
        let listing = fixtures::listing("l1", "owner");
        let mut saved = caller.clone();
        saved.favorites = json!(["l1"]);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[listing]])
            .append_query_results([[saved]]);

        let result = service(db).toggle(&caller, "l1").await.unwrap();
        assert!(result.favorited);
        assert_eq!(result.message(), "Added to favorites");
    }

    #[tokio::test]
    async fn test_toggle_removes_without_listing_lookup() {
        let mut caller = fixtures::user("u1", UserRole::User);
        caller.favorites = json!(["l1", "l2"]);
        let mut saved = caller.clone();
        saved.favorites = json!(["l2"]);

        // only the user update is queued; a listing lookup would fail the test
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[saved]]);

        let result = service(db).toggle(&caller, "l1").await.unwrap();
        assert!(!result.favorited);
        assert_eq!(result.message(), "Removed from favorites");
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_original_set() {
        let mut caller = fixtures::user("u1", UserRole::User);
        caller.favorites = json!(["l2"]);
        let mut added = caller.clone();
        added.favorites = json!(["l2", "l1"]);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[fixtures::listing("l1", "owner")]])
                .append_query_results([[added.clone()]])
                .append_query_results([[caller.clone()]])
                .into_connection(),
        );
        let service =
            FavoriteService::new(UserRepository::new(db.clone()), ListingRepository::new(db.clone()));

        assert!(service.toggle(&caller, "l1").await.unwrap().favorited);
        assert!(!service.toggle(&added, "l1").await.unwrap().favorited);

        drop(service);
        let Ok(conn) = Arc::try_unwrap(db) else {
            panic!("connection still shared");
        };
        let updates: Vec<String> = conn
            .into_transaction_log()
            .iter()
            .map(|t| format!("{t:?}"))
            .filter(|t| t.contains("UPDATE"))
            .collect();
        assert_eq!(updates.len(), 2);
        assert!(updates[0].contains(r#""l1""#) && updates[0].contains(r#""l2""#));
        assert!(updates[1].contains(r#""l2""#) && !updates[1].contains(r#""l1""#));
    }

    #[tokio::test]
    async fn test_toggle_hidden_listing_not_found() {
        let caller = fixtures::user("u1", UserRole::User);
        let mut hidden = fixtures::listing("l1", "owner");
        hidden.is_hidden = true;

        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[hidden]]);

        let result = service(db).toggle(&caller, "l1").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_favorites() {
        let mut caller = fixtures::user("u1", UserRole::User);
        caller.favorites = json!(["l1", "gone"]);
        let owner = fixtures::user("owner", UserRole::User);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[fixtures::listing("l1", "owner")]])
            .append_query_results([[owner]]);

        let items = service(db).list(&caller).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "l1");
        assert_eq!(items[0].owner.as_ref().unwrap().id, "owner");
    }

    #[tokio::test]
    async fn test_list_empty_favorites_skips_queries() {
        let caller = fixtures::user("u1", UserRole::User);
        let db = MockDatabase::new(DatabaseBackend::Postgres);

        let items = service(db).list(&caller).await.unwrap();
        assert!(items.is_empty());
    }
}

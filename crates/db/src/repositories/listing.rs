//! Pet listing repository and the listing search query builder.

use std::sync::Arc;

use crate::entities::{
    PetListing,
    pet_listing::{self, Gender, ListingStatus, ListingType, Species},
};
use adoptme_common::{AppError, AppResult, PageParams};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    sea_query::{Expr, NullOrdering, extension::postgres::PgExpr},
};

/// Text searched by `q`: title and description as one document.
const SEARCH_DOCUMENT: &str = "to_tsvector('simple', title || ' ' || description)";

/// Result ordering for listing searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListingSort {
    /// Newest first.
    #[default]
    New,
    /// Oldest first.
    Old,
    /// Youngest first, listings without an age last.
    AgeAsc,
    /// Oldest pets first, listings without an age last.
    AgeDesc,
}

impl ListingSort {
    /// Parse the `sort` query parameter. Unknown values fall back to [`ListingSort::New`].
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("old") => Self::Old,
            Some("ageAsc") => Self::AgeAsc,
            Some("ageDesc") => Self::AgeDesc,
            _ => Self::New,
        }
    }
}

/// Who is reading, which decides whether hidden listings are visible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListingScope {
    /// Anonymous or regular browsing: hidden listings excluded.
    #[default]
    Public,
    /// A user's own listings, hidden included.
    Owner(String),
    /// Moderators see everything.
    Admin,
}

/// Filters, sort and page for a listing search. Every filter is optional.
#[derive(Debug, Clone, Default)]
pub struct ListingQuery {
    pub listing_type: Option<ListingType>,
    pub species: Option<Species>,
    pub status: Option<ListingStatus>,
    pub gender: Option<Gender>,
    /// Case-insensitive substring of the location.
    pub location: Option<String>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    /// Free-text search over title and description.
    pub q: Option<String>,
    pub sort: ListingSort,
    pub page: PageParams,
    pub scope: ListingScope,
}

/// Escape `%`, `_` and `\` so user input matches literally inside a LIKE pattern.
#[must_use]
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl ListingQuery {
    /// The search text, if any.
    #[must_use]
    pub fn search_text(&self) -> Option<&str> {
        non_blank(self.q.as_ref())
    }

    /// Filtered select without ordering or paging. Used for counting.
    #[must_use]
    pub fn filtered(&self) -> Select<pet_listing::Entity> {
        let mut select = PetListing::find();

        match &self.scope {
            ListingScope::Public => {
                select = select.filter(pet_listing::Column::IsHidden.eq(false));
            }
            ListingScope::Owner(owner_id) => {
                select = select.filter(pet_listing::Column::OwnerId.eq(owner_id.as_str()));
            }
            ListingScope::Admin => {}
        }

        if let Some(listing_type) = self.listing_type {
            select = select.filter(pet_listing::Column::ListingType.eq(listing_type));
        }
        if let Some(species) = self.species {
            select = select.filter(pet_listing::Column::Species.eq(species));
        }
        if let Some(status) = self.status {
            select = select.filter(pet_listing::Column::Status.eq(status));
        }
        if let Some(gender) = self.gender {
            select = select.filter(pet_listing::Column::Gender.eq(gender));
        }

        if let Some(location) = non_blank(self.location.as_ref()) {
            let pattern = format!("%{}%", escape_like(location));
            select = select.filter(
                Expr::col((PetListing, pet_listing::Column::Location)).ilike(pattern),
            );
        }

        if let Some(min_age) = self.min_age {
            select = select.filter(pet_listing::Column::Age.gte(min_age));
        }
        if let Some(max_age) = self.max_age {
            select = select.filter(pet_listing::Column::Age.lte(max_age));
        }

        if let Some(q) = self.search_text() {
            select = select.filter(Expr::cust_with_values(
                format!("{SEARCH_DOCUMENT} @@ plainto_tsquery('simple', $1)"),
                [q],
            ));
        }

        select
    }

    /// Full select: filters, relevance and sort ordering, offset and limit.
    #[must_use]
    pub fn select(&self) -> Select<pet_listing::Entity> {
        let mut select = self.filtered();

        if let Some(q) = self.search_text() {
            select = select.order_by(
                Expr::cust_with_values(
                    format!("ts_rank({SEARCH_DOCUMENT}, plainto_tsquery('simple', $1))"),
                    [q],
                ),
                Order::Desc,
            );
        }

        select = match self.sort {
            ListingSort::New => select.order_by_desc(pet_listing::Column::CreatedAt),
            ListingSort::Old => select.order_by_asc(pet_listing::Column::CreatedAt),
            ListingSort::AgeAsc => select
                .order_by_with_nulls(pet_listing::Column::Age, Order::Asc, NullOrdering::Last)
                .order_by_desc(pet_listing::Column::CreatedAt),
            ListingSort::AgeDesc => select
                .order_by_with_nulls(pet_listing::Column::Age, Order::Desc, NullOrdering::Last)
                .order_by_desc(pet_listing::Column::CreatedAt),
        };

        select
            .order_by_desc(pet_listing::Column::Id)
            .offset(self.page.offset())
            .limit(self.page.limit)
    }
}

/// Pet listing repository for database operations.
#[derive(Clone)]
pub struct ListingRepository {
    db: Arc<DatabaseConnection>,
}

impl ListingRepository {
    /// Create a new listing repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a listing by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<pet_listing::Model>> {
        PetListing::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a listing by ID, returning `NotFound` if absent.
    pub async fn get_by_id(&self, id: &str) -> AppResult<pet_listing::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Listing"))
    }

    /// Get a listing that is visible to the public.
    pub async fn get_visible(&self, id: &str) -> AppResult<pet_listing::Model> {
        match self.find_by_id(id).await? {
            Some(listing) if !listing.is_hidden => Ok(listing),
            _ => Err(AppError::not_found("Listing")),
        }
    }

    /// Create a new listing.
    pub async fn create(&self, model: pet_listing::ActiveModel) -> AppResult<pet_listing::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a listing.
    pub async fn update(&self, model: pet_listing::ActiveModel) -> AppResult<pet_listing::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a listing.
    pub async fn delete(&self, listing: pet_listing::Model) -> AppResult<()> {
        listing
            .delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Run a search: one page of listings plus the total matching the filters.
    pub async fn search(&self, query: &ListingQuery) -> AppResult<(Vec<pet_listing::Model>, u64)> {
        let items = query
            .select()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let total = query
            .filtered()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((items, total))
    }

    /// Visible listings among `ids`, newest first.
    pub async fn find_visible_by_ids(&self, ids: &[String]) -> AppResult<Vec<pet_listing::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        PetListing::find()
            .filter(pet_listing::Column::Id.is_in(ids.iter().map(String::as_str)))
            .filter(pet_listing::Column::IsHidden.eq(false))
            .order_by_desc(pet_listing::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Listings among `ids`, hidden included. Used to summarize related records.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<pet_listing::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        PetListing::find()
            .filter(pet_listing::Column::Id.is_in(ids.iter().map(String::as_str)))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

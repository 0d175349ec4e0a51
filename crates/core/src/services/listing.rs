//! Listing service: CRUD, search and images.

use std::sync::Arc;

use adoptme_common::{
    AppError, AppResult, IdGenerator, PageParams, Paginated, StorageBackend, StoredBlob,
    config::StorageConfig, pagination::DEFAULT_LIMIT, storage::image_extension,
};
use adoptme_db::{
    entities::{
        pet_listing::{self, Gender, ListingStatus, ListingType, Species},
        user,
    },
    repositories::{ListingQuery, ListingRepository, ListingScope, ListingSort, UserRepository},
};
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    access::{Capability, Decision, authorize, check},
    params::{parse_enum, parse_int},
    summary::{UserSummary, load_users},
};

/// A listing as returned to clients, with its owner summarized.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingView {
    pub id: String,
    pub owner: Option<UserSummary>,
    #[serde(rename = "type")]
    pub listing_type: ListingType,
    pub title: String,
    pub description: String,
    pub species: Species,
    pub breed: String,
    pub age: Option<i32>,
    pub gender: Gender,
    pub location: String,
    pub status: ListingStatus,
    pub images: Vec<StoredBlob>,
    pub is_hidden: bool,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl ListingView {
    #[must_use]
    pub fn new(listing: pet_listing::Model, owner: Option<&user::Model>) -> Self {
        let images = listing.image_list();
        Self {
            id: listing.id,
            owner: owner.map(UserSummary::from),
            listing_type: listing.listing_type,
            title: listing.title,
            description: listing.description,
            species: listing.species,
            breed: listing.breed,
            age: listing.age,
            gender: listing.gender,
            location: listing.location,
            status: listing.status,
            images,
            is_hidden: listing.is_hidden,
            created_at: listing.created_at,
            updated_at: listing.updated_at,
        }
    }
}

/// Raw search parameters from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingFilters {
    #[serde(rename = "type")]
    pub listing_type: Option<String>,
    pub species: Option<String>,
    pub status: Option<String>,
    pub gender: Option<String>,
    pub location: Option<String>,
    pub min_age: Option<String>,
    pub max_age: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListingFilters {
    /// Parse into a query for `scope`. Unknown enum values and non-integer ages are rejected;
    /// bad paging values fall back to defaults.
    pub fn into_query(self, scope: ListingScope) -> AppResult<ListingQuery> {
        Ok(ListingQuery {
            listing_type: parse_enum("type", self.listing_type.as_deref())?,
            species: parse_enum("species", self.species.as_deref())?,
            status: parse_enum("status", self.status.as_deref())?,
            gender: parse_enum("gender", self.gender.as_deref())?,
            location: self.location,
            min_age: parse_int("minAge", self.min_age.as_deref())?,
            max_age: parse_int("maxAge", self.max_age.as_deref())?,
            q: self.q,
            sort: ListingSort::from_param(self.sort.as_deref()),
            page: PageParams::from_raw(self.page.as_deref(), self.limit.as_deref(), DEFAULT_LIMIT),
            scope,
        })
    }
}

/// Input for creating a listing.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingInput {
    #[serde(rename = "type", default)]
    pub listing_type: ListingType,

    #[validate(length(min = 5, max = 100, message = "Title must be 5-100 characters"))]
    pub title: String,

    #[validate(length(min = 10, max = 2000, message = "Description must be 10-2000 characters"))]
    pub description: String,

    pub species: Species,

    #[serde(default)]
    #[validate(length(max = 50, message = "Breed must be at most 50 characters"))]
    pub breed: String,

    #[validate(range(min = 0, max = 40, message = "Age must be between 0 and 40"))]
    pub age: Option<i32>,

    #[serde(default)]
    pub gender: Gender,

    #[validate(length(min = 2, max = 80, message = "Location must be 2-80 characters"))]
    pub location: String,

    #[serde(default)]
    pub status: ListingStatus,
}

/// Owner-editable fields. Anything not listed here is ignored.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListingInput {
    #[serde(rename = "type")]
    pub listing_type: Option<ListingType>,

    #[validate(length(min = 5, max = 100, message = "Title must be 5-100 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 10, max = 2000, message = "Description must be 10-2000 characters"))]
    pub description: Option<String>,

    pub species: Option<Species>,

    #[validate(length(max = 50, message = "Breed must be at most 50 characters"))]
    pub breed: Option<String>,

    #[validate(range(min = 0, max = 40, message = "Age must be between 0 and 40"))]
    pub age: Option<i32>,

    pub gender: Option<Gender>,

    #[validate(length(min = 2, max = 80, message = "Location must be 2-80 characters"))]
    pub location: Option<String>,

    pub status: Option<ListingStatus>,
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

/// Attach owner summaries to a page of listings with one user lookup.
pub(crate) async fn listing_views(
    user_repo: &UserRepository,
    listings: Vec<pet_listing::Model>,
) -> AppResult<Vec<ListingView>> {
    let owner_ids: Vec<&str> = listings.iter().map(|l| l.owner_id.as_str()).collect();
    let owners = load_users(user_repo, &owner_ids).await?;
    Ok(listings
        .into_iter()
        .map(|listing| {
            let owner = owners.get(&listing.owner_id);
            ListingView::new(listing, owner)
        })
        .collect())
}

/// Listing service for business logic.
#[derive(Clone)]
pub struct ListingService {
    listing_repo: ListingRepository,
    user_repo: UserRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
    max_images: usize,
    max_image_bytes: usize,
}

impl ListingService {
    /// Create a new listing service.
    #[must_use]
    pub fn new(
        listing_repo: ListingRepository,
        user_repo: UserRepository,
        storage: Arc<dyn StorageBackend>,
        config: &StorageConfig,
    ) -> Self {
        Self {
            listing_repo,
            user_repo,
            storage,
            id_gen: IdGenerator::new(),
            max_images: config.max_images_per_listing,
            max_image_bytes: config.max_image_bytes,
        }
    }

    /// Largest accepted image, in bytes.
    #[must_use]
    pub const fn max_image_bytes(&self) -> usize {
        self.max_image_bytes
    }

    /// Create a listing owned by `owner`.
    pub async fn create(
        &self,
        owner: &user::Model,
        mut input: CreateListingInput,
    ) -> AppResult<ListingView> {
        trim_in_place(&mut input.title);
        trim_in_place(&mut input.description);
        trim_in_place(&mut input.breed);
        trim_in_place(&mut input.location);
        input.validate()?;

        let now = Utc::now();
        let model = pet_listing::ActiveModel {
            id: Set(self.id_gen.generate()),
            owner_id: Set(owner.id.clone()),
            listing_type: Set(input.listing_type),
            title: Set(input.title),
            description: Set(input.description),
            species: Set(input.species),
            breed: Set(input.breed),
            age: Set(input.age),
            gender: Set(input.gender),
            location: Set(input.location),
            status: Set(input.status),
            images: Set(serde_json::json!([])),
            is_hidden: Set(false),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let listing = self.listing_repo.create(model).await?;
        tracing::info!(listing_id = %listing.id, owner_id = %owner.id, "Listing created");

        Ok(ListingView::new(listing, Some(owner)))
    }

    /// Listing detail. Hidden listings are only shown to their owner and admins.
    pub async fn get(&self, viewer: Option<&user::Model>, id: &str) -> AppResult<ListingView> {
        let listing = self.listing_repo.get_by_id(id).await?;

        if listing.is_hidden {
            let visible = viewer.is_some_and(|v| {
                check(v, Capability::ViewHiddenListing(&listing)) == Decision::Allow
            });
            if !visible {
                return Err(AppError::not_found("Listing"));
            }
        }

        let owner = self.user_repo.find_by_id(&listing.owner_id).await?;
        Ok(ListingView::new(listing, owner.as_ref()))
    }

    /// Public search. Hidden listings are never included.
    pub async fn search(&self, filters: ListingFilters) -> AppResult<Paginated<ListingView>> {
        let query = filters.into_query(ListingScope::Public)?;
        self.run(&query).await
    }

    /// The caller's own listings, hidden included.
    pub async fn list_mine(
        &self,
        owner: &user::Model,
        filters: ListingFilters,
    ) -> AppResult<Paginated<ListingView>> {
        let query = filters.into_query(ListingScope::Owner(owner.id.clone()))?;
        self.run(&query).await
    }

    async fn run(&self, query: &ListingQuery) -> AppResult<Paginated<ListingView>> {
        let (listings, total) = self.listing_repo.search(query).await?;
        let items = listing_views(&self.user_repo, listings).await?;
        Ok(Paginated::new(items, total, query.page))
    }

    /// Apply owner edits from the allow-list.
    pub async fn update(
        &self,
        caller: &user::Model,
        id: &str,
        mut input: UpdateListingInput,
    ) -> AppResult<ListingView> {
        for value in [
            &mut input.title,
            &mut input.description,
            &mut input.breed,
            &mut input.location,
        ]
        .into_iter()
        .flatten()
        {
            trim_in_place(value);
        }
        input.validate()?;

        let listing = self.listing_repo.get_by_id(id).await?;
        authorize(caller, Capability::EditListing(&listing))?;

        let mut active: pet_listing::ActiveModel = listing.into();
        if let Some(listing_type) = input.listing_type {
            active.listing_type = Set(listing_type);
        }
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(species) = input.species {
            active.species = Set(species);
        }
        if let Some(breed) = input.breed {
            active.breed = Set(breed);
        }
        if let Some(age) = input.age {
            active.age = Set(Some(age));
        }
        if let Some(gender) = input.gender {
            active.gender = Set(gender);
        }
        if let Some(location) = input.location {
            active.location = Set(location);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = self.listing_repo.update(active).await?;
        Ok(ListingView::new(updated, Some(caller)))
    }

    /// Delete a listing and release its images.
    pub async fn delete(&self, caller: &user::Model, id: &str) -> AppResult<()> {
        let listing = self.listing_repo.get_by_id(id).await?;
        authorize(caller, Capability::EditListing(&listing))?;

        let images = listing.image_list();
        let listing_id = listing.id.clone();
        self.listing_repo.delete(listing).await?;
        tracing::info!(listing_id = %listing_id, "Listing deleted");

        for image in images {
            self.release_blob(&image.storage_id).await;
        }

        Ok(())
    }

    /// Store an image and append it to the listing.
    pub async fn add_image(
        &self,
        caller: &user::Model,
        id: &str,
        content_type: &str,
        data: &[u8],
    ) -> AppResult<ListingView> {
        if image_extension(content_type).is_none() {
            return Err(AppError::BadRequest(
                "Only JPEG, PNG or WEBP images are allowed".to_string(),
            ));
        }
        if data.is_empty() {
            return Err(AppError::BadRequest("Image file is empty".to_string()));
        }
        if data.len() > self.max_image_bytes {
            return Err(AppError::BadRequest(format!(
                "Image must be at most {} MB",
                self.max_image_bytes / (1024 * 1024)
            )));
        }

        let listing = self.listing_repo.get_by_id(id).await?;
        authorize(caller, Capability::EditListing(&listing))?;

        let mut images = listing.image_list();
        if images.len() >= self.max_images {
            return Err(AppError::BadRequest(format!(
                "A listing can have at most {} images",
                self.max_images
            )));
        }

        let blob = self
            .storage
            .put(data, content_type, &format!("listings/{}", listing.id))
            .await?;
        let storage_id = blob.storage_id.clone();
        images.push(blob);

        match self.save_images(listing, &images).await {
            Ok(updated) => Ok(ListingView::new(updated, Some(caller))),
            Err(e) => {
                self.release_blob(&storage_id).await;
                Err(e)
            }
        }
    }

    /// Detach an image by storage id and release the blob.
    pub async fn remove_image(
        &self,
        caller: &user::Model,
        id: &str,
        storage_id: &str,
    ) -> AppResult<ListingView> {
        let listing = self.listing_repo.get_by_id(id).await?;
        authorize(caller, Capability::EditListing(&listing))?;

        let mut images = listing.image_list();
        let before = images.len();
        images.retain(|image| image.storage_id != storage_id);
        if images.len() == before {
            return Err(AppError::not_found("Image"));
        }

        let updated = self.save_images(listing, &images).await?;
        self.release_blob(storage_id).await;

        Ok(ListingView::new(updated, Some(caller)))
    }

    async fn save_images(
        &self,
        listing: pet_listing::Model,
        images: &[StoredBlob],
    ) -> AppResult<pet_listing::Model> {
        let images = serde_json::to_value(images)
            .map_err(|e| AppError::Internal(format!("Failed to encode images: {e}")))?;

        let mut active: pet_listing::ActiveModel = listing.into();
        active.images = Set(images);
        active.updated_at = Set(Utc::now().into());
        self.listing_repo.update(active).await
    }

    async fn release_blob(&self, storage_id: &str) {
        if let Err(e) = self.storage.delete(storage_id).await {
            tracing::warn!(storage_id = %storage_id, error = %e, "Failed to delete image blob");
        }
    }
}

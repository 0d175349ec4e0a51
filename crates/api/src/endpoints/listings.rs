//! Listing endpoints.

use adoptme_common::{AppError, AppResult, Paginated, ensure_valid_id};
use adoptme_core::{CreateListingInput, ListingFilters, ListingView, UpdateListingInput};
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Path, Query, State,
        multipart::{Field, MultipartError},
    },
    http::StatusCode,
    routing::{delete, get, post},
};

use crate::{
    extractors::{AuthUser, JsonBody, MaybeAuthUser},
    middleware::AppState,
    response::{self, Message},
};

/// Public search over visible listings.
async fn search(
    State(state): State<AppState>,
    Query(filters): Query<ListingFilters>,
) -> AppResult<Json<Paginated<ListingView>>> {
    Ok(Json(state.listing_service.search(filters).await?))
}

/// The caller's own listings, hidden ones included.
async fn mine(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(filters): Query<ListingFilters>,
) -> AppResult<Json<Paginated<ListingView>>> {
    Ok(Json(state.listing_service.list_mine(&user, filters).await?))
}

async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ListingView>> {
    ensure_valid_id(&id, "listing")?;
    Ok(Json(state.listing_service.get(viewer.as_ref(), &id).await?))
}

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateListingInput>,
) -> AppResult<(StatusCode, Json<ListingView>)> {
    let listing = state.listing_service.create(&user, input).await?;
    Ok(response::created(listing))
}

async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateListingInput>,
) -> AppResult<Json<ListingView>> {
    ensure_valid_id(&id, "listing")?;
    Ok(Json(state.listing_service.update(&user, &id, input).await?))
}

async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Message> {
    ensure_valid_id(&id, "listing")?;
    state.listing_service.delete(&user, &id).await?;
    Ok(Message::ok("Listing deleted"))
}

// ==================== Images ====================

fn multipart_error(e: &MultipartError) -> AppError {
    AppError::BadRequest(format!("Invalid multipart data: {}", e.body_text()))
}

/// Buffer a file field, stopping one byte past `cap` so oversize uploads are
/// rejected without reading them whole.
async fn read_capped(mut field: Field<'_>, cap: usize) -> AppResult<Vec<u8>> {
    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(&e))? {
        data.extend_from_slice(&chunk);
        if data.len() > cap {
            data.truncate(cap + 1);
            break;
        }
    }
    Ok(data)
}

/// Upload one or more images in `image` / `images` fields.
async fn upload_images(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<ListingView>> {
    ensure_valid_id(&id, "listing")?;

    let cap = state.listing_service.max_image_bytes();
    let mut listing = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        if !matches!(field.name(), Some("image" | "images")) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = read_capped(field, cap).await?;
        listing = Some(
            state
                .listing_service
                .add_image(&user, &id, &content_type, &data)
                .await?,
        );
    }

    listing
        .map(Json)
        .ok_or_else(|| AppError::BadRequest("No image uploaded".to_string()))
}

async fn remove_image(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((id, storage_id)): Path<(String, String)>,
) -> AppResult<Json<ListingView>> {
    ensure_valid_id(&id, "listing")?;
    Ok(Json(
        state
            .listing_service
            .remove_image(&user, &id, &storage_id)
            .await?,
    ))
}

/// Listing routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/listings", get(search).post(create))
        .route("/listings/me", get(mine))
        .route("/listings/{id}", get(show).patch(update).delete(remove))
        // size is enforced per file while streaming
        .route(
            "/listings/{id}/images",
            post(upload_images).layer(DefaultBodyLimit::disable()),
        )
        .route("/listings/{id}/images/{*storage_id}", delete(remove_image))
}

//! Favorite listing endpoints.

use adoptme_common::{AppResult, ensure_valid_id};
use adoptme_core::ListingView;
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{Items, Message},
};

/// Add the listing to the caller's favorites, or remove it if present.
async fn toggle(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Message> {
    ensure_valid_id(&id, "listing")?;
    let toggle = state.favorite_service.toggle(&user, &id).await?;

    Ok(Message::ok(toggle.message()).with("favorited", toggle.favorited))
}

async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Items<ListingView>>> {
    let items = state.favorite_service.list(&user).await?;
    Ok(Json(Items { items }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/listings/{id}/favorite", post(toggle))
        .route("/me/favorites", get(list))
}

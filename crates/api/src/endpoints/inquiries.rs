//! Inquiry endpoints.

use adoptme_common::{AppResult, Paginated, ensure_valid_id};
use adoptme_core::{CreateInquiryInput, InquiryFilters, InquiryView, UpdateInquiryStatusInput};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};

use crate::{
    extractors::{AdminUser, AuthUser, JsonBody},
    middleware::AppState,
    response::Message,
};

/// Contact the owner of a visible listing.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<CreateInquiryInput>,
) -> AppResult<Message> {
    ensure_valid_id(&id, "listing")?;
    let inquiry = state.inquiry_service.create(&user, &id, input).await?;

    Ok(Message::created("Inquiry sent").with("inquiryId", inquiry.id))
}

/// Inquiries on the caller's listings.
async fn received(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(filters): Query<InquiryFilters>,
) -> AppResult<Json<Paginated<InquiryView>>> {
    Ok(Json(
        state.inquiry_service.list_received(&user, filters).await?,
    ))
}

async fn update_status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(inquiry_id): Path<String>,
    JsonBody(input): JsonBody<UpdateInquiryStatusInput>,
) -> AppResult<Message> {
    ensure_valid_id(&inquiry_id, "inquiry")?;
    let inquiry = state
        .inquiry_service
        .update_status(&user, &inquiry_id, input)
        .await?;

    Ok(Message::ok("Inquiry updated").with("status", inquiry.status))
}

async fn admin_list(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Query(filters): Query<InquiryFilters>,
) -> AppResult<Json<Paginated<InquiryView>>> {
    Ok(Json(state.inquiry_service.list_all(&admin, filters).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/listings/{id}/inquire", post(create))
        .route("/me/inquiries", get(received))
        .route("/inquiries/{inquiry_id}/status", patch(update_status))
        .route("/admin/inquiries", get(admin_list))
}

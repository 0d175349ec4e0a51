//! Report and listing moderation endpoints.

use adoptme_common::{AppResult, Paginated, ensure_valid_id};
use adoptme_core::{CreateReportInput, ReportFilters, ReportView, UpdateReportInput};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use serde::Deserialize;

use crate::{
    extractors::{AdminUser, AuthUser, JsonBody},
    middleware::AppState,
    response::Message,
};

/// Hide request. A missing flag unhides.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HideListingRequest {
    #[serde(default)]
    pub is_hidden: bool,
}

/// Report a listing.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<CreateReportInput>,
) -> AppResult<Message> {
    ensure_valid_id(&id, "listing")?;
    let report = state
        .moderation_service
        .create_report(&user, &id, input)
        .await?;

    Ok(Message::created("Report submitted").with("reportId", report.id))
}

async fn list(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Query(filters): Query<ReportFilters>,
) -> AppResult<Json<Paginated<ReportView>>> {
    Ok(Json(
        state.moderation_service.list_reports(&admin, filters).await?,
    ))
}

async fn update(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(report_id): Path<String>,
    JsonBody(input): JsonBody<UpdateReportInput>,
) -> AppResult<Message> {
    ensure_valid_id(&report_id, "report")?;
    state
        .moderation_service
        .update_report(&admin, &report_id, input)
        .await?;

    Ok(Message::ok("Report updated"))
}

async fn hide_listing(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<HideListingRequest>,
) -> AppResult<Message> {
    ensure_valid_id(&id, "listing")?;
    let listing = state
        .moderation_service
        .set_listing_hidden(&admin, &id, req.is_hidden)
        .await?;

    Ok(Message::ok("Listing updated").with("isHidden", listing.is_hidden))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/listings/{id}/report", post(create))
        .route("/admin/reports", get(list))
        .route("/admin/reports/{report_id}", patch(update))
        .route("/admin/listings/{id}/hide", patch(hide_listing))
}

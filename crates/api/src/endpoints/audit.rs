//! Audit log endpoint.

use adoptme_common::{AppResult, Paginated};
use adoptme_core::{AuditFilters, AuditLogView};
use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{extractors::AdminUser, middleware::AppState};

/// Moderation actions, newest first.
async fn list(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Query(filters): Query<AuditFilters>,
) -> AppResult<Json<Paginated<AuditLogView>>> {
    Ok(Json(state.audit_service.list(&admin, filters).await?))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/admin/audit-logs", get(list))
}

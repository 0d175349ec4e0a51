//! API endpoints.

mod audit;
mod auth;
mod favorites;
mod inquiries;
mod listings;
pub mod meta;
mod reports;

use adoptme_common::AppError;
use axum::Router;

use crate::{middleware::AppState, rate_limit::ApiRateLimiter};

/// Create the API router. `auth_limiter` throttles the `/auth` routes.
pub fn router(auth_limiter: ApiRateLimiter) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router(auth_limiter))
        .merge(listings::router())
        .merge(favorites::router())
        .merge(inquiries::router())
        .merge(reports::router())
        .merge(audit::router())
}

/// Fallback for unmatched routes.
pub async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

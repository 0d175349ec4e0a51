//! HTTP API layer for `AdoptMe`.
//!
//! - **Endpoints**: auth, listings, favorites, inquiries, reports, audit log
//! - **Extractors**: authenticated callers and JSON bodies
//! - **Middleware**: bearer authentication, error diagnostics, rate limiting
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod rate_limit;
pub mod response;

pub use endpoints::{meta, not_found, router};
pub use middleware::AppState;
pub use rate_limit::{ApiRateLimiter, RateLimitConfig};

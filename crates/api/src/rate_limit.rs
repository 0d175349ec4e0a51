//! Fixed-window rate limiting for the auth endpoints.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use adoptme_common::AppError;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;

/// Rate limit configuration.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Time window duration in seconds.
    pub window_secs: u64,
}

impl RateLimitConfig {
    pub const fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }
}

pub mod limits {
    use super::RateLimitConfig;

    /// Register, login and OTP endpoints: 30 requests per 10 minutes per client.
    pub const AUTH: RateLimitConfig = RateLimitConfig::new(30, 600);
}

#[derive(Debug, Clone)]
struct WindowState {
    count: u32,
    window_start: Instant,
}

/// Rate limit check result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    Allowed {
        remaining: u32,
        limit: u32,
        /// Seconds until the window resets.
        reset: u64,
    },
    Limited {
        /// Seconds until the window resets.
        retry_after: u64,
    },
}

/// In-memory limiter keyed by client address.
#[derive(Clone)]
pub struct ApiRateLimiter {
    config: RateLimitConfig,
    trust_proxy: bool,
    states: Arc<RwLock<HashMap<String, WindowState>>>,
}

impl ApiRateLimiter {
    /// A limiter keyed on the socket peer address.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            trust_proxy: false,
            states: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Key on forwarded headers set by a reverse proxy instead of the peer.
    #[must_use]
    pub fn trust_proxy(mut self, trust: bool) -> Self {
        self.trust_proxy = trust;
        self
    }

    /// Check if a request is allowed and record it.
    pub async fn check(&self, key: &str) -> RateLimitResult {
        let mut states = self.states.write().await;
        let now = Instant::now();
        let window = Duration::from_secs(self.config.window_secs);

        let state = states.entry(key.to_string()).or_insert_with(|| WindowState {
            count: 0,
            window_start: now,
        });

        if now.duration_since(state.window_start) >= window {
            state.count = 0;
            state.window_start = now;
        }

        let reset = window
            .saturating_sub(now.duration_since(state.window_start))
            .as_secs()
            .max(1);

        if state.count >= self.config.max_requests {
            return RateLimitResult::Limited { retry_after: reset };
        }

        state.count += 1;
        RateLimitResult::Allowed {
            remaining: self.config.max_requests.saturating_sub(state.count),
            limit: self.config.max_requests,
            reset,
        }
    }

    /// Drop windows that have expired.
    pub async fn cleanup(&self) {
        let window = Duration::from_secs(self.config.window_secs);
        let now = Instant::now();
        self.states
            .write()
            .await
            .retain(|_, state| now.duration_since(state.window_start) < window);
    }

    /// Number of tracked clients.
    pub async fn key_count(&self) -> usize {
        self.states.read().await.len()
    }
}

/// Client IP. The socket peer, unless `trust_proxy` is set, in which case the
/// first `X-Forwarded-For` hop, then `X-Real-IP`, then the peer.
fn client_ip(req: &Request<Body>, trust_proxy: bool) -> Option<IpAddr> {
    let peer = || {
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    };

    if !trust_proxy {
        return peer();
    }

    let header_ip = |name: &str| -> Option<IpAddr> {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|ip| ip.trim().parse().ok())
    };

    header_ip("x-forwarded-for")
        .or_else(|| header_ip("x-real-ip"))
        .or_else(peer)
}

/// Rate limiting middleware. Rejects with 429 and `Retry-After` once a client
/// exhausts its window.
pub async fn rate_limit_middleware(
    State(limiter): State<ApiRateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let key = client_ip(&req, limiter.trust_proxy)
        .map_or_else(|| "unknown".to_string(), |ip| format!("ip:{ip}"));

    match limiter.check(&key).await {
        RateLimitResult::Allowed {
            remaining,
            limit,
            reset,
        } => {
            let mut response = next.run(req).await;
            let headers = response.headers_mut();
            headers.insert("x-ratelimit-limit", limit.into());
            headers.insert("x-ratelimit-remaining", remaining.into());
            headers.insert("x-ratelimit-reset", reset.into());
            response
        }
        RateLimitResult::Limited { retry_after } => {
            tracing::warn!(client = %key, retry_after, "Rate limit exceeded");
            let mut response = AppError::RateLimited(
                "Too many requests, please try again later.".to_string(),
            )
            .into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    }
}

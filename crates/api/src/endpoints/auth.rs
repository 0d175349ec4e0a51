//! Registration, login and email verification endpoints.

use adoptme_common::AppResult;
use adoptme_core::{
    LoginInput, RegisterInput, ResendOtpInput, UserSummary, VerificationOutcome, VerifyOtpInput,
};
use adoptme_db::entities::user;
use axum::{Json, Router, extract::State, middleware, routing::post};
use serde::Serialize;

use crate::{
    extractors::JsonBody,
    middleware::AppState,
    rate_limit::{ApiRateLimiter, rate_limit_middleware},
    response::Message,
};

/// Account shape returned on registration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_email_verified: bool,
}

impl From<user::Model> for AccountResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            is_email_verified: user.is_email_verified,
        }
    }
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

/// Register a new, unverified account.
async fn register(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RegisterInput>,
) -> AppResult<Message> {
    let user = state.account_service.register(input).await?;

    Ok(Message::created("Registered successfully. OTP sent to email.")
        .with("user", AccountResponse::from(user)))
}

/// Exchange credentials for a bearer token.
async fn login(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<LoginInput>,
) -> AppResult<Json<LoginResponse>> {
    let result = state.account_service.login(input).await?;

    Ok(Json(LoginResponse {
        token: result.token,
        user: UserSummary::from(&result.user),
    }))
}

async fn verify_otp(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<VerifyOtpInput>,
) -> AppResult<Message> {
    let message = match state.account_service.verify_otp(input).await? {
        VerificationOutcome::AlreadyVerified => "Email already verified",
        VerificationOutcome::Verified | VerificationOutcome::CodeSent => {
            "Email verified successfully"
        }
    };
    Ok(Message::ok(message))
}

async fn resend_otp(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ResendOtpInput>,
) -> AppResult<Message> {
    let message = match state.account_service.resend_otp(input).await? {
        VerificationOutcome::AlreadyVerified => "Email already verified",
        VerificationOutcome::Verified | VerificationOutcome::CodeSent => "OTP resent",
    };
    Ok(Message::ok(message))
}

/// Auth routes, throttled per client.
pub fn router(limiter: ApiRateLimiter) -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/verify-otp", post(verify_otp))
        .route("/resend-otp", post(resend_otp))
        .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
}

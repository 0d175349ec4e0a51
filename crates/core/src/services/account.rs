//! Account service: registration, login and email verification.

use std::sync::Arc;

use adoptme_common::{AppError, AppResult, Config, IdGenerator};
use adoptme_db::{
    entities::user::{self, UserRole},
    repositories::UserRepository,
};
use chrono::{Duration, Utc};
use sea_orm::Set;
use serde::{Deserialize, Deserializer};
use serde_json::json;
use validator::Validate;

use super::{
    mailer::{MailMessage, Mailer},
    otp,
    password::{hash_password, verify_password},
    token::SessionTokens,
};

const VERIFY_SUBJECT: &str = "Verify your AdoptMe email";
const RESEND_SUBJECT: &str = "Your new AdoptMe verification code";

/// Account service for business logic.
#[derive(Clone)]
pub struct AccountService {
    user_repo: UserRepository,
    tokens: SessionTokens,
    mailer: Arc<dyn Mailer>,
    id_gen: IdGenerator,
    otp_ttl: Duration,
    otp_max_attempts: i32,
}

/// Input for registering a new account.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 80, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "A valid email is required"))]
    pub email: String,

    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: String,
}

/// Input for logging in.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Input for submitting a verification code.
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpInput {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "OTP is required"))]
    #[serde(deserialize_with = "code_string")]
    pub otp: String,
}

/// Codes arrive as JSON strings or numbers.
fn code_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Text(String),
        Number(u64),
    }

    Ok(match Code::deserialize(deserializer)? {
        Code::Text(code) => code,
        Code::Number(code) => code.to_string(),
    })
}

/// Input for requesting a fresh verification code.
#[derive(Debug, Deserialize, Validate)]
pub struct ResendOtpInput {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
}

/// A successful login.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub token: String,
    pub user: user::Model,
}

/// Outcome of a verify or resend request on an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The account was already verified; nothing changed.
    AlreadyVerified,
    /// The code was accepted.
    Verified,
    /// A new code was mailed.
    CodeSent,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub fn new(user_repo: UserRepository, mailer: Arc<dyn Mailer>, config: &Config) -> Self {
        Self {
            user_repo,
            tokens: SessionTokens::from_config(&config.auth),
            mailer,
            id_gen: IdGenerator::new(),
            otp_ttl: Duration::minutes(config.auth.otp_ttl_minutes),
            otp_max_attempts: config.auth.otp_max_attempts,
        }
    }

    /// The token issuer shared with the auth middleware.
    #[must_use]
    pub const fn tokens(&self) -> &SessionTokens {
        &self.tokens
    }

    /// Register an unverified account and mail its first verification code.
    ///
    /// A mail failure is logged; the account still exists and a code can be resent.
    pub async fn register(&self, mut input: RegisterInput) -> AppResult<user::Model> {
        input.name = input.name.trim().to_string();
        input.email = input.email.trim().to_lowercase();
        input.validate()?;

        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let code = otp::generate_code();
        let now = Utc::now();

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            email: Set(input.email),
            password_hash: Set(password_hash),
            role: Set(UserRole::User),
            is_email_verified: Set(false),
            email_otp_hash: Set(otp::digest_code(&code)),
            email_otp_expires_at: Set(Some((now + self.otp_ttl).into())),
            email_otp_attempts: Set(0),
            favorites: Set(json!([])),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = %user.id, "Account registered");

        if let Err(e) = self.send_code(&user.email, VERIFY_SUBJECT, &code).await {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to send verification mail");
        }

        Ok(user)
    }

    /// Check credentials and issue a session token.
    pub async fn login(&self, input: LoginInput) -> AppResult<LoginResult> {
        input.validate()?;

        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

        let user = self
            .user_repo
            .find_by_email(&input.email)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(invalid());
        }

        if !user.is_email_verified {
            return Err(AppError::Forbidden(
                "Email not verified. Please verify OTP.".to_string(),
            ));
        }

        let token = self.tokens.issue(&user)?;
        Ok(LoginResult { token, user })
    }

    /// Check a verification code.
    ///
    /// Every submitted code counts as an attempt, and the counter is saved even
    /// when the code is wrong.
    pub async fn verify_otp(&self, input: VerifyOtpInput) -> AppResult<VerificationOutcome> {
        input.validate()?;

        let user = self
            .user_repo
            .find_by_email(&input.email)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        if user.is_email_verified {
            return Ok(VerificationOutcome::AlreadyVerified);
        }

        let Some(expires_at) = user.email_otp_expires_at.filter(|_| !user.email_otp_hash.is_empty())
        else {
            return Err(AppError::BadRequest(
                "No OTP found. Please request a new one.".to_string(),
            ));
        };

        if user.email_otp_attempts >= self.otp_max_attempts {
            return Err(AppError::RateLimited(
                "Too many attempts. Please resend OTP.".to_string(),
            ));
        }

        if expires_at < Utc::now() {
            return Err(AppError::BadRequest(
                "OTP expired. Please resend OTP.".to_string(),
            ));
        }

        let matches = otp::code_matches(&input.otp, &user.email_otp_hash);
        let user_id = user.id.clone();
        let attempts = user.email_otp_attempts + 1;
        let mut active: user::ActiveModel = user.into();
        active.updated_at = Set(Utc::now().into());

        if !matches {
            active.email_otp_attempts = Set(attempts);
            self.user_repo.update(active).await?;
            return Err(AppError::BadRequest("Invalid OTP".to_string()));
        }

        active.is_email_verified = Set(true);
        active.email_otp_hash = Set(String::new());
        active.email_otp_expires_at = Set(None);
        active.email_otp_attempts = Set(0);
        self.user_repo.update(active).await?;

        tracing::info!(user_id = %user_id, "Email verified");
        Ok(VerificationOutcome::Verified)
    }

    /// Replace the pending code with a fresh one and mail it.
    ///
    /// The new code is saved before sending; a delivery failure is returned to the caller.
    pub async fn resend_otp(&self, input: ResendOtpInput) -> AppResult<VerificationOutcome> {
        input.validate()?;

        let user = self
            .user_repo
            .find_by_email(&input.email)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        if user.is_email_verified {
            return Ok(VerificationOutcome::AlreadyVerified);
        }

        let code = otp::generate_code();
        let now = Utc::now();
        let email = user.email.clone();

        let mut active: user::ActiveModel = user.into();
        active.email_otp_hash = Set(otp::digest_code(&code));
        active.email_otp_expires_at = Set(Some((now + self.otp_ttl).into()));
        active.email_otp_attempts = Set(0);
        active.updated_at = Set(now.into());
        self.user_repo.update(active).await?;

        self.send_code(&email, RESEND_SUBJECT, &code).await?;
        Ok(VerificationOutcome::CodeSent)
    }

    /// Resolve a bearer token to the current user record.
    pub async fn authenticate(&self, token: &str) -> AppResult<user::Model> {
        let claims = self.tokens.verify(token)?;
        self.user_repo
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))
    }

    async fn send_code(&self, to: &str, subject: &str, code: &str) -> AppResult<()> {
        let text = format!(
            "Your AdoptMe verification code is {code}.\n\nIt expires in {} minutes.",
            self.otp_ttl.num_minutes()
        );

        self.mailer
            .send(MailMessage {
                to: to.to_string(),
                subject: subject.to_string(),
                text,
            })
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use crate::services::{access::fixtures, mailer::MemoryMailer};
    use adoptme_common::config::{
        AuthConfig, DatabaseConfig, LoggingConfig, MailConfig, ServerConfig, StorageConfig,
    };
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    pub fn create_test_config() -> Config {
        Config {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: "postgres://localhost/test".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            auth: AuthConfig {
                jwt_secret: "test-secret".to_string(),
                token_ttl_hours: 168,
                otp_ttl_minutes: 10,
                otp_max_attempts: 5,
            },
            mail: MailConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    struct FailingMailer;

    #[async_trait::async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _message: MailMessage) -> AppResult<()> {
            Err(AppError::ExternalService("smtp down".to_string()))
        }
    }

    fn unverified_user(code: &str, attempts: i32, expires_in: Duration) -> user::Model {
        let mut user = fixtures::user("user1", UserRole::User);
        user.is_email_verified = false;
        user.email_otp_hash = otp::digest_code(code);
        user.email_otp_expires_at = Some((Utc::now() + expires_in).into());
        user.email_otp_attempts = attempts;
        user
    }

    fn service(db: MockDatabase, mailer: Arc<dyn Mailer>) -> AccountService {
        let repo = UserRepository::new(Arc::new(db.into_connection()));
        AccountService::new(repo, mailer, &create_test_config())
    }

    fn verify_input(otp: &str) -> VerifyOtpInput {
        VerifyOtpInput {
            email: "user1@example.com".to_string(),
            otp: otp.to_string(),
        }
    }

    #[test]
    fn test_verify_input_accepts_numeric_code() {
        let input: VerifyOtpInput =
            serde_json::from_value(json!({ "email": "a@x.com", "otp": 123_456 })).unwrap();
        assert_eq!(input.otp, "123456");

        let input: VerifyOtpInput =
            serde_json::from_value(json!({ "email": "a@x.com", "otp": "654321" })).unwrap();
        assert_eq!(input.otp, "654321");

        assert!(serde_json::from_value::<VerifyOtpInput>(json!({ "email": "a@x.com" })).is_err());
        assert!(
            serde_json::from_value::<VerifyOtpInput>(json!({ "email": "a@x.com", "otp": true }))
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_register_creates_unverified_user_and_mails_code() {
        let mut created = fixtures::user("new", UserRole::User);
        created.email = "a@x.com".to_string();
        created.is_email_verified = false;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([[created]]);
        let mailer = Arc::new(MemoryMailer::new());
        let service = service(db, mailer.clone());

        let user = service
            .register(RegisterInput {
                name: "  A ".to_string(),
                email: " A@X.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap();

        assert!(!user.is_email_verified);
        let mail = mailer.last_to("a@x.com").unwrap();
        assert_eq!(mail.subject, "Verify your AdoptMe email");
        assert!(mail.text.contains("expires in 10 minutes"));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let existing = fixtures::user("user1", UserRole::User);
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[existing]]);
        let service = service(db, Arc::new(MemoryMailer::new()));

        let result = service
            .register(RegisterInput {
                name: "A".to_string(),
                email: "user1@example.com".to_string(),
                password: "secret123".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_survives_mail_failure() {
        let created = fixtures::user("new", UserRole::User);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([[created]]);
        let service = service(db, Arc::new(FailingMailer));

        let result = service
            .register(RegisterInput {
                name: "A".to_string(),
                email: "new@example.com".to_string(),
                password: "secret123".to_string(),
            })
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let db = MockDatabase::new(DatabaseBackend::Postgres);
        let service = service(db, Arc::new(MemoryMailer::new()));

        let result = service
            .register(RegisterInput {
                name: "A".to_string(),
                email: "a@x.com".to_string(),
                password: "123".to_string(),
            })
            .await;

        match result {
            Err(AppError::Validation(errors)) => assert_eq!(errors[0].path, "password"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_login_unverified_is_forbidden() {
        let mut user = fixtures::user("user1", UserRole::User);
        user.password_hash = hash_password("secret123").unwrap();
        user.is_email_verified = false;

        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user]]);
        let service = service(db, Arc::new(MemoryMailer::new()));

        let result = service
            .login(LoginInput {
                email: "user1@example.com".to_string(),
                password: "secret123".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(msg)) if msg.contains("not verified")));
    }

    #[tokio::test]
    async fn test_login_wrong_password_and_unknown_email() {
        let mut user = fixtures::user("user1", UserRole::User);
        user.password_hash = hash_password("secret123").unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .append_query_results([Vec::<user::Model>::new()]);
        let service = service(db, Arc::new(MemoryMailer::new()));

        let wrong = service
            .login(LoginInput {
                email: "user1@example.com".to_string(),
                password: "nope".to_string(),
            })
            .await;
        assert!(matches!(wrong, Err(AppError::Unauthorized(msg)) if msg == "Invalid credentials"));

        let unknown = service
            .login(LoginInput {
                email: "ghost@example.com".to_string(),
                password: "secret123".to_string(),
            })
            .await;
        assert!(matches!(unknown, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_login_issues_token() {
        let mut user = fixtures::user("user1", UserRole::User);
        user.password_hash = hash_password("secret123").unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user]]);
        let service = service(db, Arc::new(MemoryMailer::new()));

        let result = service
            .login(LoginInput {
                email: "user1@example.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap();

        let claims = service.tokens().verify(&result.token).unwrap();
        assert_eq!(claims.sub, "user1");
    }

    #[tokio::test]
    async fn test_verify_otp_success_clears_code() {
        let user = unverified_user("123456", 0, Duration::minutes(5));
        let mut verified = user.clone();
        verified.is_email_verified = true;
        verified.email_otp_hash = String::new();
        verified.email_otp_expires_at = None;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .append_query_results([[verified]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }]);
        let service = service(db, Arc::new(MemoryMailer::new()));

        let outcome = service.verify_otp(verify_input("123456")).await.unwrap();
        assert_eq!(outcome, VerificationOutcome::Verified);
    }

    #[tokio::test]
    async fn test_verify_otp_wrong_code_counts_attempt() {
        let user = unverified_user("123456", 2, Duration::minutes(5));
        let mut after = user.clone();
        after.email_otp_attempts = 3;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .append_query_results([[after]]);
        let service = service(db, Arc::new(MemoryMailer::new()));

        let result = service.verify_otp(verify_input("000000")).await;
        assert!(matches!(result, Err(AppError::BadRequest(msg)) if msg == "Invalid OTP"));
    }

    #[tokio::test]
    async fn test_verify_otp_attempt_limit() {
        let user = unverified_user("123456", 5, Duration::minutes(5));
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user]]);
        let service = service(db, Arc::new(MemoryMailer::new()));

        // even the right code is refused once the limit is reached
        let result = service.verify_otp(verify_input("123456")).await;
        assert!(matches!(result, Err(AppError::RateLimited(_))));
    }

    #[tokio::test]
    async fn test_verify_otp_expired() {
        let user = unverified_user("123456", 0, Duration::minutes(-1));
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user]]);
        let service = service(db, Arc::new(MemoryMailer::new()));

        let result = service.verify_otp(verify_input("123456")).await;
        assert!(matches!(result, Err(AppError::BadRequest(msg)) if msg.contains("expired")));
    }

    #[tokio::test]
    async fn test_verify_otp_already_verified_and_unknown() {
        let user = fixtures::user("user1", UserRole::User);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .append_query_results([Vec::<user::Model>::new()]);
        let service = service(db, Arc::new(MemoryMailer::new()));

        let outcome = service.verify_otp(verify_input("123456")).await.unwrap();
        assert_eq!(outcome, VerificationOutcome::AlreadyVerified);

        let missing = service.verify_otp(verify_input("123456")).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_verify_otp_without_pending_code() {
        let mut user = unverified_user("123456", 0, Duration::minutes(5));
        user.email_otp_hash = String::new();
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user]]);
        let service = service(db, Arc::new(MemoryMailer::new()));

        let result = service.verify_otp(verify_input("123456")).await;
        assert!(matches!(result, Err(AppError::BadRequest(msg)) if msg.starts_with("No OTP")));
    }

    #[tokio::test]
    async fn test_resend_otp_sends_new_code() {
        let user = unverified_user("123456", 4, Duration::minutes(-1));
        let mut after = user.clone();
        after.email_otp_attempts = 0;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .append_query_results([[after]]);
        let mailer = Arc::new(MemoryMailer::new());
        let service = service(db, mailer.clone());

        let outcome = service
            .resend_otp(ResendOtpInput {
                email: "user1@example.com".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(outcome, VerificationOutcome::CodeSent);
        let mail = mailer.last_to("user1@example.com").unwrap();
        assert_eq!(mail.subject, "Your new AdoptMe verification code");
    }

    #[tokio::test]
    async fn test_resend_otp_mail_failure_is_an_error() {
        let user = unverified_user("123456", 0, Duration::minutes(5));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user.clone()]])
            .append_query_results([[user]]);
        let service = service(db, Arc::new(FailingMailer));

        let result = service
            .resend_otp(ResendOtpInput {
                email: "user1@example.com".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::ExternalService(_))));
    }
}

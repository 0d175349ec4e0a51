//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Session token and email verification settings.
    pub auth: AuthConfig,
    /// Outgoing mail configuration.
    #[serde(default)]
    pub mail: MailConfig,
    /// Listing image storage.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    #[serde(default = "default_url")]
    pub url: String,
    /// Deployment environment (`development` or `production`).
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Take client addresses from `X-Forwarded-For` / `X-Real-IP`. Only
    /// enable behind a reverse proxy that overwrites those headers.
    #[serde(default)]
    pub trust_proxy: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            url: default_url(),
            environment: default_environment(),
            trust_proxy: false,
        }
    }
}

impl ServerConfig {
    /// Whether internal error details must be withheld from responses.
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for session tokens.
    pub jwt_secret: String,
    /// Session token lifetime in hours.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    /// Verification code lifetime in minutes.
    #[serde(default = "default_otp_ttl_minutes")]
    pub otp_ttl_minutes: i64,
    /// Failed verification attempts allowed before a resend is required.
    #[serde(default = "default_otp_max_attempts")]
    pub otp_max_attempts: i32,
}

/// SMTP configuration. When `host` is unset, mail is written to the log instead.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// SMTP relay host.
    #[serde(default)]
    pub host: Option<String>,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// SMTP username.
    #[serde(default)]
    pub username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub password: Option<String>,
    /// Sender address.
    #[serde(default = "default_mail_from")]
    pub from: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: default_smtp_port(),
            username: None,
            password: None,
            from: default_mail_from(),
        }
    }
}

/// Local blob storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory uploaded images are written to.
    #[serde(default = "default_upload_dir")]
    pub base_path: PathBuf,
    /// URL prefix the directory is served under.
    #[serde(default = "default_upload_url")]
    pub base_url: String,
    /// Largest accepted image in bytes.
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
    /// Images allowed per listing.
    #[serde(default = "default_max_images")]
    pub max_images_per_listing: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: default_upload_dir(),
            base_url: default_upload_url(),
            max_image_bytes: default_max_image_bytes(),
            max_images_per_listing: default_max_images(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    5000
}

fn default_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_token_ttl_hours() -> i64 {
    24 * 7
}

const fn default_otp_ttl_minutes() -> i64 {
    10
}

const fn default_otp_max_attempts() -> i32 {
    5
}

const fn default_smtp_port() -> u16 {
    587
}

fn default_mail_from() -> String {
    "AdoptMe <no-reply@adoptme.local>".to_string()
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_upload_url() -> String {
    "/uploads".to_string()
}

const fn default_max_image_bytes() -> usize {
    3 * 1024 * 1024
}

const fn default_max_images() -> usize {
    5
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `ADOPTME_ENV`)
    /// 3. Environment variables with `ADOPTME__` prefix, e.g. `ADOPTME__AUTH__JWT_SECRET`
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("ADOPTME_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .set_default("server.environment", env.clone())?
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("ADOPTME")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize::<Config>())
            .unwrap()
    }

    #[test]
    fn test_defaults_fill_optional_sections() {
        let config = parse(
            r#"
            [database]
            url = "postgres://localhost/adoptme"
            [auth]
            jwt_secret = "secret"
            "#,
        );

        assert_eq!(config.server.port, 5000);
        assert!(!config.server.is_production());
        assert_eq!(config.auth.token_ttl_hours, 168);
        assert_eq!(config.auth.otp_ttl_minutes, 10);
        assert_eq!(config.auth.otp_max_attempts, 5);
        assert!(config.mail.host.is_none());
        assert_eq!(config.mail.port, 587);
        assert_eq!(config.storage.max_image_bytes, 3 * 1024 * 1024);
        assert_eq!(config.storage.max_images_per_listing, 5);
        assert!(!config.logging.json);
    }

    #[test]
    fn test_production_flag() {
        let config = parse(
            r#"
            [server]
            environment = "Production"
            [database]
            url = "postgres://localhost/adoptme"
            [auth]
            jwt_secret = "secret"
            "#,
        );

        assert!(config.server.is_production());
    }
}

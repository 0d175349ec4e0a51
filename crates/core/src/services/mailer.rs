//! Outgoing mail.

use std::sync::{Arc, RwLock};

use adoptme_common::{AppError, AppResult, config::MailConfig};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

/// A plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Mail delivery capability.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a message. Errors are `ExternalService`.
    async fn send(&self, message: MailMessage) -> AppResult<()>;
}

/// SMTP delivery via lettre.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build a transport for `host`. Port 465 uses implicit TLS, anything else STARTTLS.
    pub fn new(config: &MailConfig, host: &str) -> AppResult<Self> {
        let builder = if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        }
        .map_err(|e| AppError::Config(format!("Invalid SMTP host: {e}")))?
        .port(config.port);

        let builder = match (&config.username, &config.password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        let from = config
            .from
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid mail sender address: {e}")))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: MailMessage) -> AppResult<()> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| AppError::ExternalService(format!("Invalid recipient: {e}")))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.text)
            .map_err(|e| AppError::ExternalService(format!("Failed to build message: {e}")))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| AppError::ExternalService(format!("SMTP delivery failed: {e}")))?;

        Ok(())
    }
}

/// Writes messages to the log instead of sending them. Used when SMTP is not configured.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait::async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> AppResult<()> {
        tracing::info!(to = %message.to, subject = %message.subject, "SMTP not configured, mail not sent");
        tracing::debug!(body = %message.text, "Unsent mail body");
        Ok(())
    }
}

/// Keeps sent messages in memory.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: RwLock<Vec<MailMessage>>,
}

impl MemoryMailer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.read().map(|s| s.clone()).unwrap_or_default()
    }

    /// The most recent message to `to`.
    #[must_use]
    pub fn last_to(&self, to: &str) -> Option<MailMessage> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

#[async_trait::async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, message: MailMessage) -> AppResult<()> {
        self.sent
            .write()
            .map_err(|_| AppError::Internal("mailer lock poisoned".to_string()))?
            .push(message);
        Ok(())
    }
}

/// SMTP when a host is configured, otherwise the logging mailer.
pub fn mailer_from_config(config: &MailConfig) -> AppResult<Arc<dyn Mailer>> {
    match config.host.as_deref().filter(|h| !h.is_empty()) {
        Some(host) => Ok(Arc::new(SmtpMailer::new(config, host)?)),
        None => Ok(Arc::new(LogMailer)),
    }
}

//! Verification code delivery.
//!
//! Uses SMTP via lettre for email with Askama HTML templates. The
//! [`CodeChannel`] trait keeps the OTP gate indifferent to how a code
//! reaches the user, which is also what makes signup testable without a
//! mail server.

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::SmtpConfig;

/// HTML template for the verification code email.
#[derive(Template)]
#[template(path = "email/verification_code.html")]
struct VerificationCodeHtml<'a> {
    code: &'a str,
    valid_minutes: u64,
}

/// Plain text template for the verification code email.
#[derive(Template)]
#[template(path = "email/verification_code.txt")]
struct VerificationCodeText<'a> {
    code: &'a str,
    valid_minutes: u64,
}

/// Errors that can occur when delivering a code.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

/// Something that can put a verification code in front of a user.
#[async_trait]
pub trait CodeChannel: Send + Sync {
    /// Deliver `code` to `destination` (an email address or phone number).
    async fn deliver(&self, destination: &str, code: &str) -> Result<(), DeliveryError>;
}

/// SMTP-backed email channel.
pub struct SmtpCodeChannel {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    valid_minutes: u64,
}

impl SmtpCodeChannel {
    /// Create a channel from SMTP configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the relay host is invalid.
    pub fn new(config: &SmtpConfig, valid_minutes: u64) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_owned(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            valid_minutes,
        })
    }
}

#[async_trait]
impl CodeChannel for SmtpCodeChannel {
    async fn deliver(&self, destination: &str, code: &str) -> Result<(), DeliveryError> {
        let html = VerificationCodeHtml {
            code,
            valid_minutes: self.valid_minutes,
        }
        .render()?;
        let text = VerificationCodeText {
            code,
            valid_minutes: self.valid_minutes,
        }
        .render()?;

        let message = Message::builder()
            .from(self
                .from_address
                .parse()
                .map_err(|_| DeliveryError::InvalidAddress(self.from_address.clone()))?)
            .to(destination
                .parse()
                .map_err(|_| DeliveryError::InvalidAddress(destination.to_owned()))?)
            .subject("Your Camellia verification code")
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )?;

        self.mailer.send(message).await?;
        tracing::info!(to = destination, "verification code email sent");
        Ok(())
    }
}

/// Channel that logs codes instead of sending them. Stands in for email
/// when SMTP is not configured, and for SMS until a provider is wired up.
pub struct LogCodeChannel {
    label: &'static str,
}

impl LogCodeChannel {
    /// Create a channel tagged with a label ("email" or "sms").
    #[must_use]
    pub const fn new(label: &'static str) -> Self {
        Self { label }
    }
}

#[async_trait]
impl CodeChannel for LogCodeChannel {
    async fn deliver(&self, destination: &str, code: &str) -> Result<(), DeliveryError> {
        tracing::warn!(
            channel = self.label,
            destination,
            code,
            "no delivery transport configured, code logged instead"
        );
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_render_code_and_window() {
        let html = VerificationCodeHtml {
            code: "042137",
            valid_minutes: 10,
        }
        .render()
        .unwrap();
        assert!(html.contains("042137"));
        assert!(html.contains("10 minutes"));

        let text = VerificationCodeText {
            code: "042137",
            valid_minutes: 10,
        }
        .render()
        .unwrap();
        assert!(text.contains("042137"));
        assert!(text.contains("10 minutes"));
    }

    #[tokio::test]
    async fn test_log_channel_always_succeeds() {
        let channel = LogCodeChannel::new("sms");
        channel.deliver("+15550001111", "123456").await.unwrap();
    }
}

//! Application state shared across all request handlers.

use std::sync::Arc;

use sqlx::SqlitePool;
use thiserror::Error;

use crate::config::AppConfig;
use crate::services::{CodeChannel, LogCodeChannel, MokaOtpStore, OtpStore, SmtpCodeChannel};

/// Errors that can occur while assembling state.
#[derive(Debug, Error)]
pub enum StateInitError {
    /// SMTP transport could not be built.
    #[error("SMTP transport error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Shared application state, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    pool: SqlitePool,
    otp_store: Arc<dyn OtpStore>,
    email_channel: Arc<dyn CodeChannel>,
    sms_channel: Arc<dyn CodeChannel>,
}

impl AppState {
    /// Assemble production state: moka-backed OTP store, SMTP email
    /// delivery when configured (logging otherwise).
    ///
    /// # Errors
    ///
    /// Returns an error if the configured SMTP relay is invalid.
    pub fn new(config: AppConfig, pool: SqlitePool) -> Result<Self, StateInitError> {
        let otp_store: Arc<dyn OtpStore> = Arc::new(MokaOtpStore::new(config.otp_ttl()));

        let email_channel: Arc<dyn CodeChannel> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpCodeChannel::new(smtp, config.otp_ttl_minutes)?),
            None => Arc::new(LogCodeChannel::new("email")),
        };

        // TODO: integrate a real SMS provider; codes go to the log until then.
        let sms_channel: Arc<dyn CodeChannel> = Arc::new(LogCodeChannel::new("sms"));

        Ok(Self::with_parts(
            config,
            pool,
            otp_store,
            email_channel,
            sms_channel,
        ))
    }

    /// Assemble state from explicit parts. Tests use this to swap in
    /// recording channels and short-TTL stores.
    #[must_use]
    pub fn with_parts(
        config: AppConfig,
        pool: SqlitePool,
        otp_store: Arc<dyn OtpStore>,
        email_channel: Arc<dyn CodeChannel>,
        sms_channel: Arc<dyn CodeChannel>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                otp_store,
                email_channel,
                sms_channel,
            }),
        }
    }

    /// Get the application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Get the OTP store.
    #[must_use]
    pub fn otp_store(&self) -> &dyn OtpStore {
        self.inner.otp_store.as_ref()
    }

    /// Get the email delivery channel.
    #[must_use]
    pub fn email_channel(&self) -> &dyn CodeChannel {
        self.inner.email_channel.as_ref()
    }

    /// Get the SMS delivery channel.
    #[must_use]
    pub fn sms_channel(&self) -> &dyn CodeChannel {
        self.inner.sms_channel.as_ref()
    }
}

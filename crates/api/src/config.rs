//! Configuration management for the Camellia API.
//!
//! Loads configuration from environment variables (optionally via a
//! `.env` file). `CAMELLIA_DATABASE_URL` falls back to `DATABASE_URL`
//! so local sqlx tooling and the server can share one setting. SMTP is
//! all-or-nothing: with no `SMTP_HOST` the server still runs and logs
//! verification codes instead of sending them.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// SMTP settings for sending verification emails.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl SmtpConfig {
    /// Load SMTP settings, returning `None` when `SMTP_HOST` is unset.
    ///
    /// # Errors
    ///
    /// Returns an error if `SMTP_HOST` is set but the rest of the block
    /// is incomplete.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(host) = get_optional_env("SMTP_HOST") else {
            return Ok(None);
        };

        let port = get_env_or_default("SMTP_PORT", "587");
        let port = port
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar("SMTP_PORT".to_owned(), port))?;

        Ok(Some(Self {
            host,
            port,
            username: get_required_env("SMTP_USERNAME")?,
            password: SecretString::from(get_required_env("SMTP_PASSWORD")?),
            from_address: get_required_env("SMTP_FROM")?,
        }))
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite database URL.
    pub database_url: SecretString,
    /// Address to bind.
    pub host: IpAddr,
    /// Port to bind.
    pub port: u16,
    /// Public base URL used to build upload links.
    pub base_url: String,
    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
    /// Directory where uploaded images land.
    pub upload_dir: PathBuf,
    /// How long a verification code stays valid.
    pub otp_ttl_minutes: u64,
    /// How long a bearer token stays valid.
    pub token_ttl_hours: i64,
    /// SMTP settings; `None` switches email delivery to logging.
    pub smtp: Option<SmtpConfig>,
    /// Sentry DSN; `None` disables error reporting.
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag.
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 - 1.0).
    pub sentry_sample_rate: f32,
    /// Sentry performance tracing sample rate (0.0 - 1.0).
    pub sentry_traces_sample_rate: f32,
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env if present; ignore if missing.
        dotenvy::dotenv().ok();

        let database_url = get_optional_env("CAMELLIA_DATABASE_URL")
            .or_else(|| get_optional_env("DATABASE_URL"))
            .ok_or_else(|| ConfigError::MissingEnvVar("CAMELLIA_DATABASE_URL".to_owned()))?;

        let host = get_env_or_default("CAMELLIA_HOST", "127.0.0.1");
        let host = host
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar("CAMELLIA_HOST".to_owned(), host))?;

        let port = get_env_or_default("CAMELLIA_PORT", "8000");
        let port = port
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar("CAMELLIA_PORT".to_owned(), port))?;

        let base_url = get_env_or_default("CAMELLIA_BASE_URL", "http://127.0.0.1:8000");
        Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("CAMELLIA_BASE_URL".to_owned(), e.to_string()))?;
        let base_url = base_url.trim_end_matches('/').to_owned();

        let cors_origins = parse_origins(&get_env_or_default(
            "CAMELLIA_CORS_ORIGINS",
            "http://localhost:5173,http://localhost:3000",
        ));

        let otp_ttl_minutes = get_env_or_default("CAMELLIA_OTP_TTL_MINUTES", "10");
        let otp_ttl_minutes = otp_ttl_minutes.parse().map_err(|_| {
            ConfigError::InvalidEnvVar("CAMELLIA_OTP_TTL_MINUTES".to_owned(), otp_ttl_minutes)
        })?;

        let token_ttl_hours = get_env_or_default("CAMELLIA_TOKEN_TTL_HOURS", "24");
        let token_ttl_hours = token_ttl_hours.parse().map_err(|_| {
            ConfigError::InvalidEnvVar("CAMELLIA_TOKEN_TTL_HOURS".to_owned(), token_ttl_hours)
        })?;

        Ok(Self {
            database_url: SecretString::from(database_url),
            host,
            port,
            base_url,
            cors_origins,
            upload_dir: PathBuf::from(get_env_or_default("CAMELLIA_UPLOAD_DIR", "uploads")),
            otp_ttl_minutes,
            token_ttl_hours,
            smtp: SmtpConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_env_f32("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_env_f32("SENTRY_TRACES_SAMPLE_RATE", 0.1)?,
        })
    }

    /// Socket address to bind the server to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Verification code validity window.
    #[must_use]
    pub const fn otp_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.otp_ttl_minutes * 60)
    }

    /// Bearer token validity window.
    #[must_use]
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.token_ttl_hours)
    }
}

impl Default for AppConfig {
    /// Localhost defaults, used by tests.
    fn default() -> Self {
        Self {
            database_url: SecretString::from("sqlite://camellia.db"),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8000,
            base_url: "http://127.0.0.1:8000".to_owned(),
            cors_origins: vec![
                "http://localhost:5173".to_owned(),
                "http://localhost:3000".to_owned(),
            ],
            upload_dir: PathBuf::from("uploads"),
            otp_ttl_minutes: 10,
            token_ttl_hours: 24,
            smtp: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }
}

/// Split a comma-separated origin list, dropping empty entries.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_owned)
        .collect()
}

// =============================================================================
// Environment helpers
// =============================================================================

fn get_required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

fn get_optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn get_env_or_default(name: &str, default: &str) -> String {
    get_optional_env(name).unwrap_or_else(|| default.to_owned())
}

fn get_env_f32(name: &str, default: f32) -> Result<f32, ConfigError> {
    match get_optional_env(name) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar(name.to_owned(), raw)),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_trims_and_drops_empties() {
        let origins = parse_origins("http://localhost:5173, http://localhost:3000,,  ");
        assert_eq!(
            origins,
            vec!["http://localhost:5173", "http://localhost:3000"]
        );
    }

    #[test]
    fn test_smtp_debug_redacts_password() {
        let config = SmtpConfig {
            host: "smtp.example.com".to_owned(),
            port: 587,
            username: "mailer".to_owned(),
            password: SecretString::from("hunter2"),
            from_address: "noreply@example.com".to_owned(),
        };
        let output = format!("{config:?}");
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("hunter2"));
    }

    #[test]
    fn test_default_ttls() {
        let config = AppConfig::default();
        assert_eq!(config.otp_ttl(), std::time::Duration::from_secs(600));
        assert_eq!(config.token_ttl(), chrono::Duration::hours(24));
        assert_eq!(config.socket_addr().port(), 8000);
    }
}

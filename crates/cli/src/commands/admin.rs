//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! camellia-cli admin create -e admin@example.com -p s3cret-password
//! camellia-cli admin create -e admin@example.com -p s3cret-password --phone +15551234567
//! ```
//!
//! # Environment Variables
//!
//! - `CAMELLIA_DATABASE_URL` - `SQLite` connection string (falls back to
//!   `DATABASE_URL`)
//!
//! Accounts created here are admins: they can manage the catalog, upload
//! images, and see and update every order. There is no signup path for
//! admins through the API, so this command is how the first one is
//! bootstrapped.

use thiserror::Error;

use camellia_api::db::{self, RepositoryError, UserRepository};
use camellia_api::services::auth::{self, AuthError};
use camellia_core::{Email, Phone, UserId};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Invalid phone number.
    #[error("Invalid phone number: {0}. Use E.164 form, e.g. +15551234567")]
    InvalidPhone(String),

    /// Password validation or hashing failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// User already exists.
    #[error("Admin user already exists with email: {0}")]
    UserExists(String),

    /// Repository error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Create a new admin user.
///
/// # Arguments
///
/// * `email` - Admin's email address
/// * `password` - Admin's password (validated and hashed before storage)
/// * `phone` - Optional phone number in E.164 form
///
/// # Returns
///
/// The ID of the created admin user.
///
/// # Errors
///
/// Returns an error if validation fails, the email is already taken, or a
/// database operation fails.
pub async fn create_user(
    email: &str,
    password: &str,
    phone: Option<&str>,
) -> Result<UserId, AdminError> {
    dotenvy::dotenv().ok();

    // Lowercase like the signup routes do, so the address matches at login.
    let email = Email::parse(email.trim().to_lowercase().as_str())
        .map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let phone = phone
        .map(|raw| Phone::parse(raw).map_err(|_| AdminError::InvalidPhone(raw.to_owned())))
        .transpose()?;

    // Validate before touching the database so a weak password fails fast.
    auth::validate_password(password)?;
    let password_hash = auth::hash_password(password)?;

    let database_url =
        super::database_url().ok_or(AdminError::MissingEnvVar("CAMELLIA_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;
    let users = UserRepository::new(&pool);

    tracing::info!("Creating admin user: {}", email);

    if users.email_exists(&email).await? {
        return Err(AdminError::UserExists(email.to_string()));
    }

    let user = users.create_admin(&email, phone.as_ref(), &password_hash).await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id)
}

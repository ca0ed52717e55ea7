//! Password authentication and opaque bearer tokens.
//!
//! Passwords are hashed with Argon2id. Tokens are 32 random bytes,
//! base64-encoded, stored server-side with an expiry; nothing about the
//! user is encoded in the token itself.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use camellia_core::Email;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::{RepositoryError, UserRepository};
use crate::models::{CurrentUser, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Random bytes per bearer token.
const TOKEN_BYTES: usize = 32;

/// Errors that can occur during authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Bearer token unknown or expired.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Password failed validation.
    #[error("password too weak: {0}")]
    WeakPassword(String),

    /// Password hashing failed.
    #[error("password hashing failed")]
    PasswordHash,

    /// Database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Login and token resolution against the users table.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new service with the given pool.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Verify credentials and issue a bearer token valid for `ttl`.
    ///
    /// The email is normalized the same way signup normalizes it, so the
    /// address matches regardless of case.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown email or a
    /// wrong password; the two cases are not distinguished.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        ttl: Duration,
    ) -> Result<IssuedToken, AuthError> {
        let email = Email::parse(email.trim().to_lowercase().as_str())
            .map_err(|_| AuthError::InvalidCredentials)?;

        let Some((user, hash)) = self.users.get_with_password_hash(&email).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        verify_password(password, &hash)?;

        let token = generate_token();
        let expires_at = Utc::now() + ttl;
        self.users.insert_token(user.id, &token, expires_at).await?;

        tracing::info!(user_id = %user.id, "issued bearer token");
        Ok(IssuedToken {
            token,
            expires_at,
            user,
        })
    }

    /// Resolve a bearer token to the calling user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] for unknown or expired tokens.
    pub async fn authenticate(&self, token: &str) -> Result<CurrentUser, AuthError> {
        let user = self
            .users
            .get_by_token(token, Utc::now())
            .await?
            .ok_or(AuthError::InvalidToken)?;
        Ok(user.into())
    }
}

/// Validate password strength.
///
/// # Errors
///
/// Returns [`AuthError::WeakPassword`] if requirements are not met.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with Argon2id and a random salt.
///
/// # Errors
///
/// Returns [`AuthError::PasswordHash`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
///
/// # Errors
///
/// Returns [`AuthError::InvalidCredentials`] on mismatch or a malformed hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Generate an opaque URL-safe bearer token.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::test_pool;

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("a perfectly fine passphrase").is_ok());
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("same password").unwrap();
        let second = hash_password("same password").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        // 32 bytes -> 43 base64 chars, no padding.
        assert_eq!(token.len(), 43);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(generate_token(), generate_token());
    }

    #[tokio::test]
    async fn test_login_issues_usable_token() {
        let (pool, _dir) = test_pool().await;
        let email = Email::parse("ada@example.com").unwrap();
        let hash = hash_password("strong password").unwrap();
        UserRepository::new(&pool)
            .create_verified(&email, None, &hash)
            .await
            .unwrap();

        let auth = AuthService::new(&pool);
        let issued = auth
            .login("ada@example.com", "strong password", Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(issued.user.email, email);
        assert!(issued.expires_at > Utc::now());

        // Case does not matter; the address is normalized before lookup.
        assert!(
            auth.login("Ada@Example.COM", "strong password", Duration::hours(24))
                .await
                .is_ok()
        );

        let current = auth.authenticate(&issued.token).await.unwrap();
        assert_eq!(current.id, issued.user.id);
        assert_eq!(current.email, email);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let (pool, _dir) = test_pool().await;
        let email = Email::parse("ada@example.com").unwrap();
        let hash = hash_password("strong password").unwrap();
        UserRepository::new(&pool)
            .create_verified(&email, None, &hash)
            .await
            .unwrap();

        let auth = AuthService::new(&pool);

        let wrong_password = auth
            .login("ada@example.com", "not the password", Duration::hours(1))
            .await;
        assert!(matches!(wrong_password, Err(AuthError::InvalidCredentials)));

        let unknown_user = auth
            .login("nobody@example.com", "strong password", Duration::hours(1))
            .await;
        assert!(matches!(unknown_user, Err(AuthError::InvalidCredentials)));

        let malformed_email = auth
            .login("not-an-email", "strong password", Duration::hours(1))
            .await;
        assert!(matches!(malformed_email, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_garbage_token() {
        let (pool, _dir) = test_pool().await;
        let auth = AuthService::new(&pool);

        let result = auth.authenticate("no-such-token").await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }
}

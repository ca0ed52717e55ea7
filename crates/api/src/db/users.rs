//! User and auth token repository.
//!
//! Rows only appear here after the OTP gate has verified both contact
//! channels, so `create_verified` is the single insertion path for
//! customers; `create_admin` exists for the CLI.

use camellia_core::{Email, Phone, UserId};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::RepositoryError;
use crate::models::User;

/// Database row for the users table, without the password hash.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    phone: Option<String>,
    is_admin: bool,
    is_verified: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid stored email: {e}"))
        })?;
        let phone = row
            .phone
            .as_deref()
            .map(Phone::parse)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid stored phone: {e}")))?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            phone,
            is_admin: row.is_admin,
            is_verified: row.is_verified,
            created_at: row.created_at,
        })
    }
}

/// Map a unique violation on the users table to a client-facing conflict.
fn map_unique_violation(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        let message = db_err.message();
        if message.contains("users.email") {
            return RepositoryError::Conflict("email already registered".to_owned());
        }
        if message.contains("users.phone") {
            return RepositoryError::Conflict("phone already registered".to_owned());
        }
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// Repository for user accounts and bearer tokens.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new repository with the given pool.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a verified customer account.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] when the email or phone is
    /// already taken.
    pub async fn create_verified(
        &self,
        email: &Email,
        phone: Option<&Phone>,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (email, phone, password_hash, is_admin, is_verified, created_at)
            VALUES (?1, ?2, ?3, 0, 1, ?4)
            RETURNING id, email, phone, is_admin, is_verified, created_at
            ",
        )
        .bind(email.as_str())
        .bind(phone.map(Phone::as_str))
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await
        .map_err(map_unique_violation)?;

        row.try_into()
    }

    /// Insert an admin account. Used by `camellia-cli admin create`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] when the email or phone is
    /// already taken.
    pub async fn create_admin(
        &self,
        email: &Email,
        phone: Option<&Phone>,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (email, phone, password_hash, is_admin, is_verified, created_at)
            VALUES (?1, ?2, ?3, 1, 1, ?4)
            RETURNING id, email, phone, is_admin, is_verified, created_at
            ",
        )
        .bind(email.as_str())
        .bind(phone.map(Phone::as_str))
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await
        .map_err(map_unique_violation)?;

        row.try_into()
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, phone, is_admin, is_verified, created_at FROM users WHERE id = ?1",
        )
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Whether an account already uses this email.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    pub async fn email_exists(&self, email: &Email) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = ?1)")
                .bind(email.as_str())
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    /// Whether an account already uses this phone number.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    pub async fn phone_exists(&self, phone: &Phone) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE phone = ?1)")
                .bind(phone.as_str())
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    /// Get a user together with their password hash, for login.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<(i64, String, Option<String>, bool, bool, DateTime<Utc>, String)> =
            sqlx::query_as(
                r"
                SELECT id, email, phone, is_admin, is_verified, created_at, password_hash
                FROM users
                WHERE email = ?1
                ",
            )
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;

        let Some((id, email, phone, is_admin, is_verified, created_at, hash)) = row else {
            return Ok(None);
        };

        let user = UserRow {
            id,
            email,
            phone,
            is_admin,
            is_verified,
            created_at,
        }
        .try_into()?;
        Ok(Some((user, hash)))
    }

    // =========================================================================
    // Bearer tokens
    // =========================================================================

    /// Store a bearer token for a user.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the insert fails.
    pub async fn insert_token(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO auth_tokens (user_id, token, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(user_id.as_i64())
        .bind(token)
        .bind(Utc::now())
        .bind(expires_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Resolve an unexpired token to its user. Expired or unknown tokens
    /// return `None`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    pub async fn get_by_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(
            r"
            SELECT u.id, u.email, u.phone, u.is_admin, u.is_verified, u.created_at
            FROM auth_tokens t
            INNER JOIN users u ON u.id = t.user_id
            WHERE t.token = ?1 AND t.expires_at > ?2
            ",
        )
        .bind(token)
        .bind(now)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }
}

// =============================================================================
// Tests
// =============================================================================

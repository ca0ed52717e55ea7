//! OTP issuance, storage, and the signup gate.
//!
//! Codes live in an in-process cache with a TTL; expiry is eviction, no
//! sweeper needed. Verification does not consume a code, so checking the
//! email code cannot burn the phone code when the latter turns out to be
//! wrong. Codes are only removed once the whole signup succeeds.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use camellia_core::{Email, Phone};
use moka::future::Cache;
use rand::Rng;
use sqlx::SqlitePool;
use thiserror::Error;

use super::auth::{AuthError, hash_password, validate_password};
use super::notify::{CodeChannel, DeliveryError};
use crate::db::{RepositoryError, UserRepository};
use crate::models::User;

/// Which contact channel a code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpChannel {
    Email,
    Phone,
}

impl fmt::Display for OtpChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => write!(f, "email"),
            Self::Phone => write!(f, "phone"),
        }
    }
}

/// Key under which a pending code is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OtpKey {
    Email(String),
    Phone(String),
}

impl OtpKey {
    #[must_use]
    pub fn email(address: &Email) -> Self {
        Self::Email(address.as_str().to_owned())
    }

    #[must_use]
    pub fn phone(number: &Phone) -> Self {
        Self::Phone(number.as_str().to_owned())
    }

    #[must_use]
    pub const fn channel(&self) -> OtpChannel {
        match self {
            Self::Email(_) => OtpChannel::Email,
            Self::Phone(_) => OtpChannel::Phone,
        }
    }
}

impl fmt::Display for OtpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email(address) => write!(f, "email:{address}"),
            Self::Phone(number) => write!(f, "phone:{number}"),
        }
    }
}

/// Storage for pending verification codes.
///
/// Issuing a new code for a key replaces the old one; only the latest
/// code verifies.
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Store a code under a key, resetting its TTL.
    async fn put(&self, key: OtpKey, code: String);

    /// Check a code without consuming it.
    async fn verify(&self, key: &OtpKey, code: &str) -> bool;

    /// Drop a key's code, if present.
    async fn remove(&self, key: &OtpKey);
}

/// In-process [`OtpStore`] backed by a moka cache with time-to-live.
pub struct MokaOtpStore {
    codes: Cache<OtpKey, String>,
}

impl MokaOtpStore {
    /// Create a store whose entries expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            codes: Cache::builder()
                .max_capacity(100_000)
                .time_to_live(ttl)
                .build(),
        }
    }
}

#[async_trait]
impl OtpStore for MokaOtpStore {
    async fn put(&self, key: OtpKey, code: String) {
        self.codes.insert(key, code).await;
    }

    async fn verify(&self, key: &OtpKey, code: &str) -> bool {
        self.codes.get(key).await.is_some_and(|stored| stored == code)
    }

    async fn remove(&self, key: &OtpKey) {
        self.codes.invalidate(key).await;
    }
}

/// Generate a 6-digit verification code. Leading zeros are preserved, so
/// "003217" is a valid code.
#[must_use]
pub fn generate_code() -> String {
    let code = rand::rng().random_range(0..1_000_000);
    format!("{code:06}")
}

/// Errors that can occur during gated signup.
#[derive(Debug, Error)]
pub enum SignupError {
    /// The email or phone already belongs to an account.
    #[error("{0} already registered")]
    AlreadyRegistered(OtpChannel),

    /// A submitted code did not match or has expired.
    #[error("invalid or expired {0} code")]
    InvalidCode(OtpChannel),

    /// Password validation or hashing failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Code could not be delivered.
    #[error("failed to deliver code: {0}")]
    Delivery(#[from] DeliveryError),
}

/// The OTP signup gate: issues codes and creates accounts only after both
/// contact channels verified.
pub struct OtpGate<'a> {
    users: UserRepository<'a>,
    store: &'a dyn OtpStore,
    email_channel: &'a dyn CodeChannel,
    sms_channel: &'a dyn CodeChannel,
}

impl<'a> OtpGate<'a> {
    /// Create a gate over the given store and delivery channels.
    #[must_use]
    pub fn new(
        pool: &'a SqlitePool,
        store: &'a dyn OtpStore,
        email_channel: &'a dyn CodeChannel,
        sms_channel: &'a dyn CodeChannel,
    ) -> Self {
        Self {
            users: UserRepository::new(pool),
            store,
            email_channel,
            sms_channel,
        }
    }

    /// Issue and deliver a code for an email address.
    ///
    /// The code is stored before delivery is attempted: a flaky SMTP hop
    /// must not strand a user whose email actually arrived.
    ///
    /// # Errors
    ///
    /// Returns [`SignupError::AlreadyRegistered`] if an account already
    /// uses this address.
    pub async fn send_email_code(&self, email: &Email) -> Result<(), SignupError> {
        if self.users.email_exists(email).await? {
            return Err(SignupError::AlreadyRegistered(OtpChannel::Email));
        }

        let code = generate_code();
        self.store.put(OtpKey::email(email), code.clone()).await;
        self.email_channel.deliver(email.as_str(), &code).await?;

        tracing::info!(email = email.as_str(), "email verification code issued");
        Ok(())
    }

    /// Issue and deliver a code for a phone number.
    ///
    /// # Errors
    ///
    /// Returns [`SignupError::AlreadyRegistered`] if an account already
    /// uses this number.
    pub async fn send_phone_code(&self, phone: &Phone) -> Result<(), SignupError> {
        if self.users.phone_exists(phone).await? {
            return Err(SignupError::AlreadyRegistered(OtpChannel::Phone));
        }

        let code = generate_code();
        self.store.put(OtpKey::phone(phone), code.clone()).await;
        self.sms_channel.deliver(phone.as_str(), &code).await?;

        tracing::info!(phone = phone.as_str(), "phone verification code issued");
        Ok(())
    }

    /// Verify both codes and create the account.
    ///
    /// Both codes are checked before either is consumed; they are removed
    /// only on success, so a typo in one leaves both usable for a retry.
    ///
    /// # Errors
    ///
    /// - [`SignupError::InvalidCode`] naming the channel that failed
    /// - [`SignupError::Auth`] for a weak password
    /// - `Repository(Conflict)` if the address or number got registered
    ///   between code issue and confirmation
    pub async fn confirm_signup(
        &self,
        email: &Email,
        phone: &Phone,
        password: &str,
        email_code: &str,
        phone_code: &str,
    ) -> Result<User, SignupError> {
        let email_key = OtpKey::email(email);
        let phone_key = OtpKey::phone(phone);

        if !self.store.verify(&email_key, email_code).await {
            return Err(SignupError::InvalidCode(OtpChannel::Email));
        }
        if !self.store.verify(&phone_key, phone_code).await {
            return Err(SignupError::InvalidCode(OtpChannel::Phone));
        }

        validate_password(password)?;
        let password_hash = hash_password(password)?;

        self.store.remove(&email_key).await;
        self.store.remove(&phone_key).await;

        let user = self
            .users
            .create_verified(email, Some(phone), &password_hash)
            .await?;

        tracing::info!(user_id = %user.id, "signup confirmed");
        Ok(user)
    }
}

// =============================================================================
// Tests
// =============================================================================

//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Read the database connection string from the environment.
///
/// `CAMELLIA_DATABASE_URL` wins; `DATABASE_URL` is accepted as a fallback so
/// the CLI works against the same `.env` file as the API server.
pub(crate) fn database_url() -> Option<SecretString> {
    std::env::var("CAMELLIA_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}

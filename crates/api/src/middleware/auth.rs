//! Bearer token extractors.
//!
//! Handlers opt into authentication by taking [`RequireUser`] or
//! [`RequireAdmin`] as an argument; the extractor resolves the
//! `Authorization: Bearer` header against the token table and rejects
//! the request before the handler body runs.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::models::CurrentUser;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
pub struct RequireUser(pub CurrentUser);

/// Extractor that additionally requires the admin flag.
pub struct RequireAdmin(pub CurrentUser);

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_owned()))
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let user = AuthService::new(state.pool())
            .authenticate(token)
            .await
            .map_err(|e| match e {
                AuthError::Repository(inner) => AppError::Database(inner),
                _ => AppError::Unauthorized("invalid or expired token".to_owned()),
            })?;
        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(AppError::Forbidden("admin access required".to_owned()));
        }
        Ok(Self(user))
    }
}

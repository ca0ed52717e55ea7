//! Login and account routes.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::User;
use crate::services::AuthService;
use crate::state::AppState;

/// Create the user routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/token", post(token))
        .route("/api/users/me", get(me))
}

/// OAuth2-password style login form.
#[derive(Debug, Deserialize)]
pub struct TokenForm {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    access_token: String,
    token_type: String,
}

/// Exchange credentials for a bearer token.
#[instrument(skip(state, form))]
pub async fn token(
    State(state): State<AppState>,
    Form(form): Form<TokenForm>,
) -> Result<Json<TokenResponse>> {
    let issued = AuthService::new(state.pool())
        .login(&form.username, &form.password, state.config().token_ttl())
        .await?;

    Ok(Json(TokenResponse {
        access_token: issued.token,
        token_type: "bearer".to_owned(),
    }))
}

/// Return the calling user's account.
#[instrument(skip(state, current))]
pub async fn me(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
) -> Result<Json<User>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("user".to_owned()))?;
    Ok(Json(user))
}

//! Signup verification routes.
//!
//! The only way to create a customer account: request a code for each
//! contact channel, then confirm with both codes and a password.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use camellia_core::{Email, Phone};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::User;
use crate::services::OtpGate;
use crate::state::AppState;

/// Create the verification routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/verify/send-email-otp", post(send_email_otp))
        .route("/api/verify/send-phone-otp", post(send_phone_otp))
        .route("/api/verify/confirm", post(confirm))
}

#[derive(Debug, Deserialize)]
pub struct SendEmailBody {
    email: String,
}

#[derive(Debug, Deserialize)]
pub struct SendPhoneBody {
    phone: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmBody {
    email: String,
    phone: String,
    password: String,
    email_otp: String,
    phone_otp: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    message: String,
}

/// Emails are matched case-insensitively; normalize once at the boundary.
fn parse_email(raw: &str) -> Result<Email> {
    Email::parse(raw.trim().to_lowercase().as_str())
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

fn parse_phone(raw: &str) -> Result<Phone> {
    Phone::parse(raw.trim()).map_err(|e| AppError::BadRequest(e.to_string()))
}

fn gate(state: &AppState) -> OtpGate<'_> {
    OtpGate::new(
        state.pool(),
        state.otp_store(),
        state.email_channel(),
        state.sms_channel(),
    )
}

/// Issue a verification code to an email address.
#[instrument(skip(state, body))]
pub async fn send_email_otp(
    State(state): State<AppState>,
    Json(body): Json<SendEmailBody>,
) -> Result<Json<MessageResponse>> {
    let email = parse_email(&body.email)?;
    gate(&state).send_email_code(&email).await?;
    Ok(Json(MessageResponse {
        message: "verification code sent to email".to_owned(),
    }))
}

/// Issue a verification code to a phone number.
#[instrument(skip(state, body))]
pub async fn send_phone_otp(
    State(state): State<AppState>,
    Json(body): Json<SendPhoneBody>,
) -> Result<Json<MessageResponse>> {
    let phone = parse_phone(&body.phone)?;
    gate(&state).send_phone_code(&phone).await?;
    Ok(Json(MessageResponse {
        message: "verification code sent to phone".to_owned(),
    }))
}

/// Verify both codes and create the account.
#[instrument(skip(state, body))]
pub async fn confirm(
    State(state): State<AppState>,
    Json(body): Json<ConfirmBody>,
) -> Result<Json<User>> {
    let email = parse_email(&body.email)?;
    let phone = parse_phone(&body.phone)?;

    let user = gate(&state)
        .confirm_signup(&email, &phone, &body.password, &body.email_otp, &body.phone_otp)
        .await?;
    Ok(Json(user))
}

//! Product image upload.
//!
//! Accepts a multipart form of image files, stores each under a random
//! name in the upload directory, and returns the public URLs. Extensions
//! come from the declared content type, never from the client filename.

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Request bodies above this are rejected outright.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Create the upload routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/upload", post(upload_images))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// Store uploaded images and return their public URLs.
#[instrument(skip(state, _admin, multipart))]
pub async fn upload_images(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    mut multipart: Multipart,
) -> Result<Json<Vec<String>>> {
    let mut urls = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let content_type = field
            .content_type()
            .map(ToOwned::to_owned)
            .ok_or_else(|| AppError::BadRequest("missing content type".to_owned()))?;
        let Some(extension) = extension_for(&content_type) else {
            return Err(AppError::BadRequest(format!(
                "unsupported content type: {content_type}"
            )));
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let filename = format!("{}.{extension}", Uuid::new_v4().simple());
        let path = state.config().upload_dir.join(&filename);
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| AppError::Internal(format!("failed to store upload: {e}")))?;

        tracing::info!(file = filename, bytes = data.len(), "image uploaded");
        urls.push(format!("{}/uploads/{filename}", state.config().base_url));
    }

    if urls.is_empty() {
        return Err(AppError::BadRequest("no files provided".to_owned()));
    }
    Ok(Json(urls))
}

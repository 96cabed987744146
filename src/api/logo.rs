//! Logo API endpoints.
//!
//! The logo is stored as a single data-URI string under the
//! `church-logo` storage key, exactly as the browser drafts kept it.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::AppState;

/// Logo payload: the image as a data URI.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoPayload {
    pub data_uri: String,
}

/// GET /api/logo - Get the uploaded logo, if any.
pub async fn get_logo(State(state): State<AppState>) -> ApiResult<Option<LogoPayload>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_logo().await {
        Ok(logo) => success(logo.map(|data_uri| LogoPayload { data_uri }), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/logo - Replace the logo.
pub async fn set_logo(
    State(state): State<AppState>,
    Json(payload): Json<LogoPayload>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if payload.data_uri.trim().is_empty() {
        return error(
            AppError::Validation("Logo data is required".to_string()),
            revision_id,
        );
    }

    match state.repo.set_logo(&payload.data_uri).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/logo - Remove the logo.
pub async fn remove_logo(State(state): State<AppState>) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.remove_logo().await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

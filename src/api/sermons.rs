//! Sermon API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{Sermon, UpdateSermonRequest};
use crate::AppState;

/// GET /api/sermons - List all sermons, newest first.
pub async fn list_sermons(State(state): State<AppState>) -> ApiResult<Vec<Sermon>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_sermons().await {
        Ok(sermons) => success(sermons, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/sermons/live - Get the sermon currently designated live.
///
/// `data` is null when no sermon is live; that is the blank default
/// view, not an error.
pub async fn get_live_sermon(State(state): State<AppState>) -> ApiResult<Option<Sermon>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_live().await {
        Ok(live) => success(live, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/sermons/:id - Get a single sermon.
pub async fn get_sermon(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Sermon> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_sermon(id).await {
        Ok(Some(sermon)) => success(sermon, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Sermon {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/sermons - Create a blank sermon for immediate editing.
pub async fn create_sermon(State(state): State<AppState>) -> ApiResult<Sermon> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.create_sermon().await {
        Ok(sermon) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(sermon, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/sermons/:id - Replace a sermon wholesale.
///
/// An unknown id is a tolerated no-op (the editor only ever offers ids
/// that exist): the response is a success with `data` null and the
/// collection unchanged.
pub async fn update_sermon(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateSermonRequest>,
) -> ApiResult<Option<Sermon>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.update_sermon(id, &request).await {
        Ok(updated) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(updated, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// Result of a set-live call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLiveResult {
    /// False when the id matched nothing and the designation is unchanged.
    pub applied: bool,
}

/// POST /api/sermons/:id/live - Move the live designation to this sermon.
///
/// Unknown id is a tolerated no-op, reported as `applied: false`.
pub async fn set_live_sermon(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<SetLiveResult> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.set_live(id).await {
        Ok(applied) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(SetLiveResult { applied }, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

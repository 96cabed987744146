//! Annotation API endpoints.
//!
//! Annotations are the attendee's own notes for a sermon; reads and
//! writes are unauthenticated by design. Loading never fails on bad
//! stored data, it recovers to the empty record.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::{error, success, ApiResult};
use crate::errors::{AppError, ErrorResponse};
use crate::models::AnnotationRecord;
use crate::AppState;

/// GET /api/sermons/:id/notes - Load the annotation record for a sermon.
///
/// Always succeeds for any id: a sermon with no stored notes (or with
/// unreadable stored notes) yields the all-empty record.
pub async fn load_annotations(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<AnnotationRecord> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.load_annotations(id).await {
        Ok(record) => success(record, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/sermons/:id/notes - Save the full annotation record.
///
/// Write-through: the stored value becomes exactly this record.
pub async fn save_annotations(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(record): Json<AnnotationRecord>,
) -> ApiResult<AnnotationRecord> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.save_annotations(id, &record).await {
        Ok(()) => success(record, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/sermons/:id/notes/export - Download the notes as plain text.
///
/// A deterministic textual rendering of the sermon and its annotation
/// record, for the attendee to save locally. Same data path as load.
pub async fn export_annotations(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let sermon = match state.repo.get_sermon(id).await {
        Ok(Some(sermon)) => sermon,
        Ok(None) => {
            let body = ErrorResponse::new(
                &AppError::NotFound(format!("Sermon {} not found", id)),
                state.repo.get_revision_id().await.unwrap_or(0),
            );
            return (StatusCode::NOT_FOUND, Json(body)).into_response();
        }
        Err(e) => {
            let body = ErrorResponse::new(&e, 0);
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
        }
    };

    let record = match state.repo.load_annotations(id).await {
        Ok(record) => record,
        Err(e) => {
            let body = ErrorResponse::new(&e, 0);
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
        }
    };

    let text = record.render_export(&sermon);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        text,
    )
        .into_response()
}

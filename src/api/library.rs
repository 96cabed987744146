//! Library API endpoints.

use axum::extract::State;

use super::{success, ApiResult};
use crate::models::{Library, RevisionInfo};
use crate::AppState;

/// GET /api/library - Get the full library snapshot.
pub async fn get_library(State(state): State<AppState>) -> ApiResult<Library> {
    let library = state
        .repo
        .get_library()
        .await
        .map_err(|e| crate::errors::AppErrorWithRevision {
            error: e,
            revision_id: 0,
        })?;

    success(library.clone(), library.revision_id)
}

/// GET /api/library/revision - Get the current revision info.
///
/// Cheap poll target for the live-sermon selector: a changed revision
/// means the collection (or logo) changed.
pub async fn get_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    let revision_info =
        state
            .repo
            .get_revision_info()
            .await
            .map_err(|e| crate::errors::AppErrorWithRevision {
                error: e,
                revision_id: 0,
            })?;

    success(revision_info.clone(), revision_info.revision_id)
}

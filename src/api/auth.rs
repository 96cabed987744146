//! Auth API endpoints.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{error, success, ApiResult};
use crate::auth::verify_password;
use crate::AppState;

/// Request body for a login attempt.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub password: String,
}

/// Result of a successful login check.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub admin: bool,
}

/// POST /api/auth/login - Check the pastor credential.
///
/// A wrong password surfaces as 401 for the client to show; it is never
/// retried here. With no credential configured the gate reports its
/// disabled-login state instead.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<LoginResult> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match verify_password(state.config.admin_password.as_deref(), &request.password) {
        Ok(()) => success(LoginResult { admin: true }, revision_id),
        Err(e) => {
            tracing::info!("Rejected admin login attempt");
            error(e, revision_id)
        }
    }
}

//! Admin gate for mutating routes.
//!
//! The store itself performs no authorization checks; this layer is the
//! capability that guards it. Credential comparison is delegated here
//! and done in constant time to mitigate timing attacks. With no
//! credential configured the gate degrades to a disabled-login state:
//! reader routes keep serving, admin routes refuse.

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;

use crate::errors::{AppError, ErrorResponse};

/// Header name for the admin credential.
pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// Admin authentication layer function that takes the expected credential
/// as a parameter.
pub async fn admin_auth_layer(
    expected_password: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    // No credential configured: disabled-login state, never a crash
    let Some(expected) = expected_password else {
        return gate_error(AppError::AdminDisabled);
    };

    // Get the credential from the request header
    let provided = request
        .headers()
        .get(ADMIN_PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    match provided {
        Some(provided_password) => {
            if constant_time_compare(&provided_password, &expected) {
                next.run(request).await
            } else {
                gate_error(AppError::Unauthorized("Incorrect password".to_string()))
            }
        }
        None => {
            // Also check Authorization header as bearer token
            let bearer = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
                .map(|s| s.to_string());

            match bearer {
                Some(bearer_password) if constant_time_compare(&bearer_password, &expected) => {
                    next.run(request).await
                }
                _ => gate_error(AppError::Unauthorized(
                    "Missing or incorrect password".to_string(),
                )),
            }
        }
    }
}

/// Check a login attempt against the configured credential.
///
/// `Ok(())` on a match; a wrong password or a disabled gate surfaces as
/// an error for the caller to report. Never retried here.
pub fn verify_password(expected_password: Option<&str>, provided: &str) -> Result<(), AppError> {
    let Some(expected) = expected_password else {
        return Err(AppError::AdminDisabled);
    };
    if constant_time_compare(provided, expected) {
        Ok(())
    } else {
        Err(AppError::Unauthorized("Incorrect password".to_string()))
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    // Constant-time comparison
    a_bytes.ct_eq(b_bytes).into()
}

/// Create a response for a rejected request at the gate.
fn gate_error(error: AppError) -> Response {
    let body = ErrorResponse::new(&error, 0);
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

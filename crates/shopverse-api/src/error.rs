// HTTP error mapping
// Decision: One error type for every handler and the gate, rendered in the ApiResponse envelope
// Decision: Login failures share one code and message whether or not the login id exists

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shopverse_core::AuthError;

use crate::api::common::ApiResponse;

/// Error returned by handlers, extractors and the authentication gate
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    /// Request path, reported as `details.path`
    pub path: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// No authenticated principal on a route that needs one
    pub fn unauthenticated() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Authentication is required",
        )
    }

    pub fn missing_refresh_token() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "MISSING_REFRESH_TOKEN",
            "Refresh token cookie is missing",
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Internal server error",
        )
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let code = err.code();
        match err {
            AuthError::ExpiredToken => {
                Self::new(StatusCode::UNAUTHORIZED, code, "Token has expired")
            }
            AuthError::InvalidToken => {
                Self::new(StatusCode::UNAUTHORIZED, code, "Token is invalid")
            }
            AuthError::PrincipalNotFound | AuthError::BadCredentials => Self::new(
                StatusCode::UNAUTHORIZED,
                code,
                "Invalid login id or password",
            ),
            AuthError::SessionMismatch => Self::new(
                StatusCode::UNAUTHORIZED,
                code,
                "Refresh token does not match the active session",
            ),
            AuthError::RefreshTokenReused => Self::new(
                StatusCode::UNAUTHORIZED,
                code,
                "Refresh token was already used; the session has been revoked",
            ),
            AuthError::DuplicateLoginId => {
                Self::new(StatusCode::CONFLICT, code, "Login id is already registered")
            }
            AuthError::DuplicateEmail => {
                Self::new(StatusCode::CONFLICT, code, "Email is already registered")
            }
            AuthError::StoreUnavailable(e) => {
                tracing::error!(error = %e, "Backing store unavailable");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    code,
                    "Service temporarily unavailable",
                )
            }
            AuthError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = ApiResponse::<()>::error(self.code, self.message, self.status.as_u16());
        if let Some(path) = self.path {
            body = body.with_details(json!({ "path": path }));
        }
        (self.status, Json(body)).into_response()
    }
}

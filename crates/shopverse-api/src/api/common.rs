// Common DTOs for public API
//
// Every JSON body, success or failure, uses the same envelope.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Standard response envelope for API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// True for 2xx responses.
    pub success: bool,
    /// Payload, present on success when the endpoint returns data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable message.
    pub message: String,
    /// Machine-readable error code, present on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "TOKEN_EXPIRED")]
    pub error: Option<String>,
    /// HTTP status code.
    pub status: u16,
    /// Server time, `YYYY-MM-DD HH:MM:SS` (UTC).
    #[schema(example = "2025-01-01 12:00:00")]
    pub timestamp: String,
    /// Extra context such as the request path of a rejected call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

fn now() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::with_status(Some(data), message, 200)
    }

    pub fn with_status(data: Option<T>, message: impl Into<String>, status: u16) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
            error: None,
            status,
            timestamp: now(),
            details: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
            error: Some(code.into()),
            status,
            timestamp: now(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl ApiResponse<()> {
    /// Success without a payload
    pub fn message(message: impl Into<String>) -> Self {
        Self::with_status(None, message, 200)
    }
}

//! Crate-wide error type.
//!
//! Mirrors the teacher's hand-rolled `AuthError`/`RateLimitError` pattern
//! (manual `Display` + `IntoResponse`, no `thiserror`): every variant maps to
//! exactly one HTTP status and a client-facing message, and every response
//! uses the `{success: false, error: ...}` envelope.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    /// 401 - missing or invalid bearer token.
    Authentication(String),
    /// 403 - wrong role, inactive team, disabled leaderboard.
    Authorization(String),
    /// 400 - malformed input.
    Validation(String),
    /// 400 - a business rule rejected the request.
    BusinessRule(String),
    /// 409 - conflicting state transition or duplicate resource.
    Conflict(String),
    /// 404 - unknown resource.
    NotFound(String),
    /// 429 - rate limit exceeded; carries retry-after seconds and reset (unix ms).
    RateLimited { message: String, retry_after_secs: u64, reset_at_ms: u64 },
    /// 504 - handler exceeded its deadline.
    Timeout(String),
    /// 500 - unexpected internal failure (DB failure, provider exhaustion in
    /// a non-graceful path). The inner detail is logged, not echoed to callers.
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Authentication(m)
            | AppError::Authorization(m)
            | AppError::Validation(m)
            | AppError::BusinessRule(m)
            | AppError::Conflict(m)
            | AppError::NotFound(m)
            | AppError::Timeout(m)
            | AppError::Internal(m) => write!(f, "{m}"),
            AppError::RateLimited { message, .. } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::BusinessRule(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(detail) = &self {
            tracing::error!(detail, "internal error surfaced as 500");
        }
        let status = self.status();
        let body = match &self {
            // never echo the underlying DB/IO detail to a client; the full
            // message already went to the log above.
            AppError::Internal(_) => json!({ "success": false, "error": "internal server error" }),
            _ => json!({ "success": false, "error": self.to_string() }),
        };

        match &self {
            AppError::RateLimited { retry_after_secs, reset_at_ms, .. } => (
                status,
                [
                    ("Retry-After", retry_after_secs.to_string()),
                    ("X-RateLimit-Reset", reset_at_ms.to_string()),
                ],
                Json(body),
            )
                .into_response(),
            _ => (status, Json(body)).into_response(),
        }
    }
}

/// Helper conversions so handlers can use `?` against common fallible calls
/// without hand-writing a `map_err` at every call site.
impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Internal(format!("database error: {e}"))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

use serde_json::Value;
use thiserror::Error;

/// Error hierarchy for the Uni Control client.
///
/// Every public operation in the workspace returns `ApiResult<T>`. The
/// variants map directly onto the failure taxonomy: transport problems,
/// structured HTTP failures, the single terminal session-expired path,
/// decode failures and token-store persistence failures.
#[derive(Error, Debug)]
pub enum ApiError {
    // === Transport ===
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    // === Backend rejected the request ===
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        /// Raw server body, kept for diagnostics.
        detail: Option<Value>,
    },

    // === Terminal auth failure: refresh token absent or rejected ===
    #[error("session expired")]
    SessionExpired,

    // === Payload could not be decoded where a body was required ===
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    // === Token store persistence ===
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// HTTP status for `Http` errors, `None` for every other variant.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Build an `Http` error from a non-2xx response body.
    ///
    /// The human-readable message is sourced from the server's `detail`
    /// field, then `message`, then a generic fallback, matching the
    /// precedence the backend's FastAPI-style error bodies use.
    pub fn from_response(status: u16, body: Value) -> Self {
        let message = body
            .get("detail")
            .and_then(Value::as_str)
            .or_else(|| body.get("message").and_then(Value::as_str))
            .unwrap_or("Request failed")
            .to_string();
        let detail = if body.is_null() { None } else { Some(body) };
        ApiError::Http {
            status,
            message,
            detail,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
    }
}

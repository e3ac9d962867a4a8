//! Provider error types.

use thiserror::Error;

/// Errors raised while talking to a generative-AI API.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP 429. `retry_after_ms` comes from the `retry-after` header when present.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("network error: {0}")]
    NetworkError(String),

    /// The API answered 2xx but the body was not what we expected.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

//! Response handling shared by the HTTP providers.

use std::time::Duration;

use anyhow::{Context, Result};

use crate::error::AiError;

pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub(crate) fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .context("failed to build HTTP client")
}

pub(crate) fn send_error(e: reqwest::Error) -> AiError {
    if e.is_timeout() {
        AiError::Timeout(DEFAULT_TIMEOUT_SECS)
    } else {
        AiError::NetworkError(e.to_string())
    }
}

/// Turn a non-success status into an [`AiError`]. `error_message` pulls the
/// provider's own message out of an error body.
pub(crate) async fn check_status(
    response: reqwest::Response,
    model: &str,
    error_message: fn(&str) -> Option<String>,
) -> Result<reqwest::Response, AiError> {
    let status = response.status().as_u16();
    if status < 400 {
        return Ok(response);
    }
    if status == 429 {
        let retry_after_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(5);
        return Err(AiError::RateLimited {
            retry_after_ms: retry_after_secs.saturating_mul(1000),
        });
    }
    if status == 404 {
        return Err(AiError::ModelNotFound(model.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or(body);
    if status == 401 || status == 403 {
        return Err(AiError::AuthenticationFailed(message));
    }
    Err(AiError::ApiError { status, message })
}

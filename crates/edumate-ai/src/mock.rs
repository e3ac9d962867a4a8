//! Scriptable provider for tests and offline demos.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use edumate_core::traits::{AiProvider, StructuredRequest, StructuredResponse, TokenUsage};

use crate::error::AiError;

/// Answers by prompt substring, falls back to a default, or always fails.
pub struct MockProvider {
    /// Prompt substring → response body.
    responses: HashMap<String, String>,
    default_response: String,
    failure: Option<u16>,
    call_count: AtomicU32,
    last_request: Mutex<Option<StructuredRequest>>,
}

impl MockProvider {
    pub fn new(responses: HashMap<String, String>) -> Self {
        Self {
            responses,
            default_response: "{}".to_string(),
            failure: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn with_fixed_response(response: &str) -> Self {
        let mut mock = Self::new(HashMap::new());
        mock.default_response = response.to_string();
        mock
    }

    /// A provider whose every call fails with an API error of this status.
    pub fn failing(status: u16) -> Self {
        let mut mock = Self::new(HashMap::new());
        mock.failure = Some(status);
        mock
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<StructuredRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }
}

#[async_trait]
impl AiProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate_json(&self, request: &StructuredRequest) -> anyhow::Result<StructuredResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        if let Some(status) = self.failure {
            return Err(AiError::ApiError {
                status,
                message: "mock failure".into(),
            }
            .into());
        }

        let content = self
            .responses
            .iter()
            .find(|(key, _)| request.prompt.contains(key.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.default_response.clone());

        // Roughly four characters per token.
        let prompt_tokens = (request.prompt.len() / 4) as u32;
        let completion_tokens = (content.len() / 4) as u32;

        Ok(StructuredResponse {
            content,
            model: request.model.clone(),
            token_usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            latency_ms: 1,
        })
    }
}

//! Google Gemini provider using structured JSON output.

use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use edumate_core::traits::{
    AiProvider, StructuredRequest, StructuredResponse, TokenUsage, DEFAULT_SYSTEM_PROMPT,
};

use crate::error::AiError;
use crate::http::{build_client, check_status, send_error};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: &str, base_url: Option<String>) -> Result<Self> {
        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            client: build_client()?,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Default)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: GeminiUsage,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<GeminiErrorBody>(body)
        .ok()
        .map(|e| e.error.message)
}

fn text(content: &str) -> GeminiContent {
    GeminiContent {
        role: None,
        parts: vec![GeminiPart {
            text: content.to_string(),
        }],
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn generate_json(&self, request: &StructuredRequest) -> Result<StructuredResponse> {
        let start = Instant::now();

        let system_prompt = request
            .system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT);
        let mut user = text(&request.prompt);
        user.role = Some("user".to_string());

        let body = GeminiRequest {
            system_instruction: text(system_prompt),
            contents: vec![user],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                response_mime_type: "application/json",
                response_schema: request.schema.clone(),
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, request.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(send_error)?;
        let response = check_status(response, &request.model, error_message).await?;

        let api_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse(format!("failed to parse response: {e}")))?;

        let content: String = api_response
            .candidates
            .first()
            .map(|c| c.content.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(AiError::InvalidResponse("response contained no text".into()).into());
        }

        let usage = api_response.usage_metadata;
        Ok(StructuredResponse {
            content,
            model: api_response
                .model_version
                .unwrap_or_else(|| request.model.clone()),
            token_usage: TokenUsage {
                prompt_tokens: usage.prompt_token_count,
                completion_tokens: usage.candidates_token_count,
                total_tokens: usage.total_token_count,
            },
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(model: &str) -> StructuredRequest {
        StructuredRequest {
            model: model.into(),
            prompt: "List three topics".into(),
            system_prompt: None,
            schema: json!({"type": "object"}),
            max_tokens: 512,
            temperature: 0.2,
        }
    }

    #[tokio::test]
    async fn successful_generation() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "maxOutputTokens": 512
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "{\"topics\": []}"}]}}],
                "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 4, "totalTokenCount": 16},
                "modelVersion": "gemini-2.5-flash-001"
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("test-key", Some(server.uri())).unwrap();
        let response = provider
            .generate_json(&request("gemini-2.5-flash"))
            .await
            .unwrap();

        assert_eq!(response.content, "{\"topics\": []}");
        assert_eq!(response.model, "gemini-2.5-flash-001");
        assert_eq!(response.token_usage.total_tokens, 16);
    }

    #[tokio::test]
    async fn rate_limit_reads_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("key", Some(server.uri())).unwrap();
        let err = provider
            .generate_json(&request("gemini-2.5-flash"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AiError>(),
            Some(AiError::RateLimited {
                retry_after_ms: 7000
            })
        ));
    }

    #[tokio::test]
    async fn oversized_retry_after_saturates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429).insert_header("retry-after", "99999999999999999"),
            )
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("key", Some(server.uri())).unwrap();
        let err = provider
            .generate_json(&request("gemini-2.5-flash"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AiError>(),
            Some(AiError::RateLimited {
                retry_after_ms: u64::MAX
            })
        ));
    }

    #[tokio::test]
    async fn unknown_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("key", Some(server.uri())).unwrap();
        let err = provider.generate_json(&request("nope")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AiError>(),
            Some(AiError::ModelNotFound(m)) if m == "nope"
        ));
    }

    #[tokio::test]
    async fn forbidden_uses_api_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("bad", Some(server.uri())).unwrap();
        let err = provider
            .generate_json(&request("gemini-2.5-flash"))
            .await
            .unwrap_err();
        match err.downcast_ref::<AiError>() {
            Some(AiError::AuthenticationFailed(message)) => {
                assert_eq!(message, "API key not valid")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_candidates_are_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("key", Some(server.uri())).unwrap();
        let err = provider
            .generate_json(&request("gemini-2.5-flash"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AiError>(),
            Some(AiError::InvalidResponse(_))
        ));
    }
}

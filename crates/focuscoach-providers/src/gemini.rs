//! Google Gemini API provider implementation.

use std::time::Instant;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use focuscoach_core::traits::{ContentGenerator, GenerateRequest, GenerateResponse, ReplyFormat};

use crate::error::ProviderError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Gemini `generateContent` provider.
pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: &str, base_url: Option<String>, model: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            client,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
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
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    message: String,
    #[serde(default)]
    status: String,
}

#[async_trait]
impl ContentGenerator for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip(self, request), fields(model = %request.model.as_deref().unwrap_or(&self.model)))]
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        let start = Instant::now();
        let model = request.model.clone().unwrap_or_else(|| self.model.clone());

        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: request.instruction.clone(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                response_mime_type: match request.reply_format {
                    ReplyFormat::Structured => Some("application/json"),
                    ReplyFormat::PlainText => None,
                },
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(DEFAULT_TIMEOUT_SECS)
                } else {
                    ProviderError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry_after,
            }
            .into());
        }
        if status == 404 {
            return Err(ProviderError::ModelNotFound(model).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let parsed = serde_json::from_str::<GeminiError>(&body).ok();
            // Gemini reports a bad key as 400 INVALID_ARGUMENT
            let bad_key = parsed
                .as_ref()
                .is_some_and(|e| e.error.message.contains("API key"));
            if status == 401 || status == 403 || bad_key {
                let message = parsed.map(|e| e.error.message).unwrap_or(body);
                return Err(ProviderError::AuthenticationFailed(message).into());
            }
            let message = parsed
                .map(|e| format!("{} {}", e.error.status, e.error.message).trim().to_string())
                .unwrap_or(body);
            return Err(ProviderError::ApiError { status, message }.into());
        }

        let api_response: GeminiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            })?;

        let content: String = api_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(ProviderError::EmptyContent.into());
        }

        Ok(GenerateResponse {
            content,
            model: api_response.model_version.unwrap_or(model),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(reply_format: ReplyFormat) -> GenerateRequest {
        GenerateRequest {
            model: None,
            instruction: "Write five questions".into(),
            reply_format,
            temperature: 0.7,
        }
    }

    fn provider(server: &MockServer) -> GeminiProvider {
        GeminiProvider::new("test-key", Some(server.uri()), None).unwrap()
    }

    #[tokio::test]
    async fn successful_structured_generation() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "[{\"question\": \"q\"}]"}]}
            }],
            "modelVersion": "gemini-2.5-flash-001"
        });

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"parts": [{"text": "Write five questions"}]}],
                "generationConfig": {"responseMimeType": "application/json"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(&server)
            .generate(&request(ReplyFormat::Structured))
            .await
            .unwrap();
        assert_eq!(response.content, "[{\"question\": \"q\"}]");
        assert_eq!(response.model, "gemini-2.5-flash-001");
    }

    #[tokio::test]
    async fn plain_text_omits_json_mode() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-pro:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "Look at "}, {"text": "**B**."}]}}]
            })))
            .mount(&server)
            .await;

        let mut req = request(ReplyFormat::PlainText);
        req.model = Some("gemini-pro".into());
        let response = provider(&server).generate(&req).await.unwrap();
        assert_eq!(response.content, "Look at **B**.");
        assert_eq!(response.model, "gemini-pro");

        let received = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        assert!(body["generationConfig"].get("responseMimeType").is_none());
    }

    #[tokio::test]
    async fn rate_limit_handling() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "10"))
            .mount(&server)
            .await;

        let err = provider(&server)
            .generate(&request(ReplyFormat::Structured))
            .await
            .unwrap_err();
        let provider_err = err.downcast_ref::<ProviderError>().unwrap();
        assert_eq!(provider_err.retry_after_ms(), Some(10_000));
    }

    #[tokio::test]
    async fn invalid_key_is_authentication_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}
            })))
            .mount(&server)
            .await;

        let err = provider(&server)
            .generate(&request(ReplyFormat::Structured))
            .await
            .unwrap_err();
        let provider_err = err.downcast_ref::<ProviderError>().unwrap();
        assert!(provider_err.is_permanent());
        assert!(err.to_string().contains("API key not valid"));
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "error": {"code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE"}
            })))
            .mount(&server)
            .await;

        let err = provider(&server)
            .generate(&request(ReplyFormat::Structured))
            .await
            .unwrap_err();
        match err.downcast_ref::<ProviderError>().unwrap() {
            ProviderError::ApiError { status, message } => {
                assert_eq!(*status, 503);
                assert_eq!(message, "UNAVAILABLE The model is overloaded.");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_candidates_is_empty_content() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [],
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let err = provider(&server)
            .generate(&request(ReplyFormat::Structured))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProviderError>(),
            Some(ProviderError::EmptyContent)
        ));
    }

    #[tokio::test]
    async fn unknown_model() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = provider(&server)
            .generate(&request(ReplyFormat::Structured))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("model not found: gemini-2.5-flash"));
    }
}

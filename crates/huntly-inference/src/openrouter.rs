//! OpenRouter (OpenAI-compatible) generation backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use huntly_core::{defaults, Error, GenerationBackend, Result};

/// Configuration for the OpenRouter backend.
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    /// Base URL for the OpenAI-compatible API.
    pub base_url: String,
    /// API key (required by OpenRouter; optional for local-compatible servers).
    pub api_key: Option<String>,
    /// Generation model slug.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Optional HTTP-Referer header for OpenRouter rankings.
    pub http_referer: Option<String>,
    /// Optional X-Title header for app name.
    pub x_title: Option<String>,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::OPENROUTER_URL.to_string(),
            api_key: None,
            model: defaults::GEN_MODEL.to_string(),
            timeout_secs: defaults::GEN_TIMEOUT_SECS,
            http_referer: None,
            x_title: None,
        }
    }
}

/// OpenRouter generation backend.
pub struct OpenRouterBackend {
    client: Client,
    config: OpenRouterConfig,
}

impl OpenRouterBackend {
    pub fn new(config: OpenRouterConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            base_url = %config.base_url,
            model = %config.model,
            "Initializing OpenRouter backend"
        );
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    ///
    /// `OPENROUTER_KEY` is required; `OPENROUTER_MODEL`,
    /// `OPENROUTER_BASE_URL`, and `OPENROUTER_TIMEOUT` override defaults.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENROUTER_KEY")
            .map_err(|_| Error::Config("OPENROUTER_KEY not set".to_string()))?;
        let model =
            std::env::var("OPENROUTER_MODEL").unwrap_or_else(|_| defaults::GEN_MODEL.to_string());
        let base_url = std::env::var("OPENROUTER_BASE_URL")
            .unwrap_or_else(|_| defaults::OPENROUTER_URL.to_string());
        let timeout_secs = std::env::var("OPENROUTER_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults::GEN_TIMEOUT_SECS);

        Self::new(OpenRouterConfig {
            base_url,
            api_key: Some(api_key),
            model,
            timeout_secs,
            http_referer: std::env::var("OPENROUTER_HTTP_REFERER").ok(),
            x_title: std::env::var("OPENROUTER_X_TITLE").ok(),
        })
    }

    pub fn config(&self) -> &OpenRouterConfig {
        &self.config
    }
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Request payload for the `/chat/completions` endpoint.
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    /// Deterministic output for classification/extraction.
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[async_trait]
impl GenerationBackend for OpenRouterBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();
        debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Starting generation"
        );

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: 0.0,
        };

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        if let Some(referer) = &self.config.http_referer {
            builder = builder.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.config.x_title {
            builder = builder.header("X-Title", title);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            // 429 and 5xx are worth retrying; anything else is not.
            return if status.as_u16() == 429 || status.is_server_error() {
                Err(Error::Transient(format!(
                    "OpenRouter returned {}: {}",
                    status, body
                )))
            } else {
                Err(Error::Inference(format!(
                    "OpenRouter returned {}: {}",
                    status, body
                )))
            };
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse response: {}", e)))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Inference("Response contained no choices".to_string()))?;

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            response_len = content.len(),
            duration_ms = elapsed,
            "Generation complete"
        );
        if elapsed > 30_000 {
            warn!(duration_ms = elapsed, slow = true, "Slow generation operation");
        }
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer) -> OpenRouterBackend {
        OpenRouterBackend::new(OpenRouterConfig {
            base_url: server.uri(),
            api_key: Some("sk-or-test".to_string()),
            model: "test-model".to_string(),
            timeout_secs: 5,
            http_referer: None,
            x_title: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn generate_returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-or-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "test-model",
                "temperature": 0.0
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "APPLICATION"}}]
            })))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let out = backend.generate("classify this").await.unwrap();
        assert_eq!(out, "APPLICATION");
    }

    #[tokio::test]
    async fn rate_limit_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate-limited"))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let err = backend.generate("x").await.unwrap_err();
        assert!(err.is_transient(), "expected transient, got: {}", err);
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        assert!(backend.generate("x").await.unwrap_err().is_transient());
    }

    #[tokio::test]
    async fn auth_failure_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let err = backend.generate("x").await.unwrap_err();
        assert!(!err.is_transient());
        assert!(matches!(err, Error::Inference(_)));
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let err = backend.generate("x").await.unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }

    #[test]
    fn default_config_uses_shared_defaults() {
        let config = OpenRouterConfig::default();
        assert_eq!(config.base_url, defaults::OPENROUTER_URL);
        assert_eq!(config.model, defaults::GEN_MODEL);
    }
}

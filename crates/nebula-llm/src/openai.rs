//! OpenAI-compatible chat-completions client
//!
//! Speaks the `/v1/chat/completions` wire format directly with reqwest, so
//! any compatible endpoint works (Moonshot, Ollama Cloud, OpenRouter, a
//! local proxy). Implements both the reasoning capability and, via image
//! content parts, the perception capability.

use crate::capability::{ImageData, PerceptionCapability, ReasoningCapability};
use crate::completion::{CompletionRequest, CompletionResponse};
use crate::error::{Error, Result};
use crate::message::Message;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default model when none is configured
pub const DEFAULT_MODEL: &str = "kimi-k2.5";

/// Default API base URL
const DEFAULT_BASE_URL: &str = "https://api.moonshot.ai/v1";

/// Sanitize API error messages before they reach logs or users
fn sanitize_api_error(error: &str) -> String {
    let lower = error.to_lowercase();

    if lower.contains("api key")
        || lower.contains("unauthorized")
        || lower.contains("authentication")
    {
        return "API authentication error. Please check your API key configuration.".to_string();
    }

    if lower.contains("rate limit") || lower.contains("quota") {
        return "API rate limit exceeded. Please try again later.".to_string();
    }

    if error.len() > 300 {
        let truncated: String = error.chars().take(300).collect();
        format!("{}...(truncated)", truncated)
    } else {
        error.to_string()
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: ChatContent,
}

/// Either a plain string or multimodal content parts
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ChatContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: Option<String>,
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Configuration for the OpenAI-compatible provider
#[derive(Clone)]
pub struct OpenAiCompatConfig {
    /// API key for authentication
    pub api_key: String,
    /// API base URL (must end with the version segment, e.g. `/v1`)
    pub base_url: String,
    /// Default model for completions
    pub default_model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl fmt::Debug for OpenAiCompatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiCompatConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for OpenAiCompatConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl OpenAiCompatConfig {
    /// Create a configuration with the given API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the default model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create configuration from `NEBULA_API_KEY` / `NEBULA_BASE_URL` /
    /// `NEBULA_MODEL` environment variables.
    ///
    /// # Errors
    /// Returns [`Error::NotConfigured`] when no API key is available.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("NEBULA_API_KEY")
            .map_err(|_| Error::NotConfigured("NEBULA_API_KEY not set".to_string()))?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("NEBULA_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(model) = std::env::var("NEBULA_MODEL") {
            config.default_model = model;
        }
        Ok(config)
    }
}

/// OpenAI-compatible provider
pub struct OpenAiCompatProvider {
    config: OpenAiCompatConfig,
    client: Client,
}

impl OpenAiCompatProvider {
    /// Create a new provider
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: OpenAiCompatConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn send(&self, body: ChatRequest) -> Result<CompletionResponse> {
        let timeout_ms = self.config.timeout.as_millis() as u64;
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(timeout_ms)
                } else {
                    Error::Network(sanitize_api_error(&e.to_string()))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&text)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {}", status));
            return Err(Error::Api(sanitize_api_error(&message)));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| Error::InvalidResponse(format!("malformed completion: {}", e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidResponse("no choices in response".to_string()))?;

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            model: parsed.model.unwrap_or_else(|| body.model.clone()),
            finish_reason: choice.finish_reason,
        })
    }

    fn to_chat_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|m| ChatMessage {
                role: m.role.as_str().to_string(),
                content: ChatContent::Text(m.content.clone()),
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl ReasoningCapability for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai-compat"
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!(messages = request.messages.len(), "Sending completion request");
        self.send(ChatRequest {
            model: request.model,
            messages: Self::to_chat_messages(&request.messages),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        })
        .await
    }
}

#[async_trait::async_trait]
impl PerceptionCapability for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai-compat"
    }

    #[instrument(skip(self, prompt, images))]
    async fn describe(&self, prompt: &str, images: &[ImageData]) -> Result<String> {
        let mut parts = vec![ContentPart::Text {
            text: prompt.to_string(),
        }];
        for image in images {
            parts.push(ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: format!("data:{};base64,{}", image.mime_type, image.base64),
                },
            });
        }

        debug!(image_count = images.len(), "Sending perception request");

        let response = self
            .send(ChatRequest {
                model: self.config.default_model.clone(),
                messages: vec![ChatMessage {
                    role: "user".to_string(),
                    content: ChatContent::Parts(parts),
                }],
                max_tokens: Some(1024),
                temperature: Some(0.2),
                stream: false,
            })
            .await?;

        Ok(response.content)
    }
}

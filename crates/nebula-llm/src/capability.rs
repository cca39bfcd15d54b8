//! Capability traits — the narrow contracts the orchestration core consumes
//!
//! The core never implements these itself; they describe external services
//! (model providers, search backends) behind object-safe async traits.
//! Implementations are injected explicitly, never looked up globally.

use crate::completion::{CompletionRequest, CompletionResponse};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// An image passed to the perception capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageData {
    /// Base64-encoded image bytes
    pub base64: String,
    /// MIME type (e.g. "image/png")
    pub mime_type: String,
}

impl ImageData {
    /// Create a PNG image payload
    #[must_use]
    pub fn png(base64: impl Into<String>) -> Self {
        Self {
            base64: base64.into(),
            mime_type: "image/png".to_string(),
        }
    }
}

/// Recency filter for live search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recency {
    /// Past day
    Day,
    /// Past week
    Week,
    /// Past month
    Month,
}

/// Reasoning capability — chat completion for planning and text tasks
#[async_trait::async_trait]
pub trait ReasoningCapability: Send + Sync {
    /// Provider name (for logging)
    fn name(&self) -> &str;

    /// Default model identifier
    fn default_model(&self) -> &str;

    /// Run a chat completion
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;
}

/// Perception capability — vision understanding of screen captures
#[async_trait::async_trait]
pub trait PerceptionCapability: Send + Sync {
    /// Provider name (for logging)
    fn name(&self) -> &str;

    /// Describe one or more images given a prompt.
    ///
    /// Returns free-form text or a JSON object describing element
    /// coordinates; malformed JSON from the provider is a recoverable
    /// error for the caller, not a fatal one.
    async fn describe(&self, prompt: &str, images: &[ImageData]) -> Result<String>;
}

/// Live-search capability — real-time web information
#[async_trait::async_trait]
pub trait SearchCapability: Send + Sync {
    /// Provider name (for logging)
    fn name(&self) -> &str;

    /// Search the web, optionally filtered by recency
    async fn search(&self, query: &str, recency: Option<Recency>) -> Result<String>;
}

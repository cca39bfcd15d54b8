//! Nebula LLM - Capability Abstraction
//!
//! This crate provides the external capability contracts for Nebula:
//! - Reasoning: chat-completion provider used for planning and text tasks
//! - Perception: vision provider for screen/image understanding
//! - Search: live web search for real-time information
//! - OpenAI-compatible client speaking the chat-completions wire format
//! - DuckDuckGo HTML search (no API key required)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod capability;
pub mod completion;
pub mod duckduckgo;
pub mod error;
pub mod message;
pub mod openai;

pub use capability::{
    ImageData, PerceptionCapability, ReasoningCapability, Recency, SearchCapability,
};
pub use completion::{CompletionRequest, CompletionResponse};
pub use duckduckgo::DuckDuckGoSearch;
pub use error::{Error, Result};
pub use message::{Message, MessageRole};
pub use openai::{OpenAiCompatConfig, OpenAiCompatProvider};

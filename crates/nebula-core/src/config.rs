//! Core configuration
//!
//! Loaded by the binary through the `config` crate (embedded defaults,
//! optional external files, `NEBULA_`-prefixed environment variables).
//! Every field has a serde default so partial configuration files work.

use serde::{Deserialize, Serialize};

/// Risk evaluator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Directories where delete/modify is always high risk
    #[serde(default = "default_protected_paths")]
    pub protected_paths: Vec<String>,
    /// Skip the approval gate for low-risk plans. The default is to ask
    /// for everything.
    #[serde(default)]
    pub auto_approve_low: bool,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            protected_paths: default_protected_paths(),
            auto_approve_low: false,
        }
    }
}

/// Approval gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalConfig {
    /// How long to wait for a responder before denying
    #[serde(default = "default_approval_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_approval_timeout(),
        }
    }
}

/// Execution engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Per-subtask collaborator timeout
    #[serde(default = "default_subtask_timeout")]
    pub subtask_timeout_secs: u64,
    /// Plans with more subtasks than this are rejected as invalid
    #[serde(default = "default_max_subtasks")]
    pub max_subtasks: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            subtask_timeout_secs: default_subtask_timeout(),
            max_subtasks: default_max_subtasks(),
        }
    }
}

/// LLM capability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key; usually supplied via NEBULA_API_KEY
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// HTTP request timeout
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// Top-level configuration for the orchestration core
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Risk evaluator settings
    #[serde(default)]
    pub risk: RiskConfig,
    /// Approval gate settings
    #[serde(default)]
    pub approval: ApprovalConfig,
    /// Execution engine settings
    #[serde(default)]
    pub engine: EngineConfig,
    /// LLM capability settings
    #[serde(default)]
    pub llm: LlmConfig,
}

fn default_protected_paths() -> Vec<String> {
    nebula_tools::security::PROTECTED_DIRECTORIES
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

fn default_approval_timeout() -> u64 {
    300
}

fn default_subtask_timeout() -> u64 {
    120
}

fn default_max_subtasks() -> usize {
    20
}

fn default_base_url() -> String {
    "https://api.moonshot.ai/v1".to_string()
}

fn default_model() -> String {
    "kimi-k2.5".to_string()
}

fn default_llm_timeout() -> u64 {
    60
}

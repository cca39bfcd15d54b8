//! Error types for nebula-core
//!
//! Subtask-level failures are carried as `SubtaskResult` values, never as
//! `Err`. Only plan-level conditions (invalid plan structure, approval
//! problems, internal faults) surface through this enum.

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Plan returned by the reasoning capability violates the schema
    #[error("schema validation error: {0}")]
    SchemaValidation(String),

    /// Plan structure is invalid (forward or self dependency references)
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    /// External collaborator failed at the plan level
    #[error("collaborator error: {0}")]
    Collaborator(String),

    /// Approval machinery failed
    #[error("approval error: {0}")]
    Approval(String),

    /// Plan was cancelled before execution started
    #[error("plan cancelled")]
    Cancelled,

    /// Invalid configuration
    #[error("invalid configuration: {field}: {message}")]
    InvalidConfig {
        /// Config field name
        field: String,
        /// Detailed message
        message: String,
    },

    /// LLM capability error
    #[error("llm error: {0}")]
    Llm(#[from] nebula_llm::Error),

    /// Tool error
    #[error("tool error: {0}")]
    Tool(#[from] nebula_tools::Error),

    /// Internal invariant violation
    #[error("internal error: {0}")]
    Internal(String),
}

/// Core result type
pub type Result<T> = std::result::Result<T, Error>;

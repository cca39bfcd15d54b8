//! Plan data model
//!
//! An `ExecutionPlan` is built fresh per user request, owned exclusively by
//! the execution engine for the duration of one run, and discarded after
//! its results are returned. Dependencies are expressed as back-references
//! only, so a plan is a DAG by construction.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse risk classification gating whether approval is required
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Safe, read-only or reversible action
    #[default]
    Low,
    /// Potentially disruptive action
    Medium,
    /// Destructive or privileged action
    High,
}

/// The kind of work a subtask performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtaskType {
    /// Describe what is visible on screen
    ScreenRead,
    /// Drive a desktop application
    AppControl,
    /// Run a code snippet through an interpreter
    CodeExecution,
    /// Create, read, modify, or delete a file
    FileOperation,
    /// Live web search
    WebSearch,
    /// Execute a shell command
    SystemCommand,
    /// Run a named skill from the skill registry
    SkillExecution,
}

impl SubtaskType {
    /// The tool name this kind dispatches to by default
    #[must_use]
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::ScreenRead => "screen_read",
            Self::AppControl => "app_control",
            Self::CodeExecution => "code_execution",
            Self::FileOperation => "file_operation",
            Self::WebSearch => "web_search",
            Self::SystemCommand => "system_command",
            Self::SkillExecution => "skill_execution",
        }
    }
}

/// One planned unit of work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    /// What kind of work this is
    pub kind: SubtaskType,
    /// Human-readable description
    pub description: String,
    /// Author-set approval flag, independent of computed risk
    #[serde(default)]
    pub requires_approval: bool,
    /// Explicit capability/tool override; `None` uses the kind mapping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_capability: Option<String>,
    /// Operation-specific parameters (schema varies by kind)
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
    /// Indices of earlier subtasks that must succeed first
    #[serde(default)]
    pub depends_on: Vec<usize>,
    /// Computed risk level, assigned before execution
    #[serde(default)]
    pub risk_level: RiskLevel,
}

impl Subtask {
    /// Create a new subtask with empty parameters and no dependencies
    #[must_use]
    pub fn new(kind: SubtaskType, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            requires_approval: false,
            target_capability: None,
            parameters: serde_json::Map::new(),
            depends_on: Vec::new(),
            risk_level: RiskLevel::Low,
        }
    }

    /// Set a parameter
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Set the dependency list
    #[must_use]
    pub fn with_depends_on(mut self, depends_on: Vec<usize>) -> Self {
        self.depends_on = depends_on;
        self
    }

    /// Mark the subtask as requiring explicit approval
    #[must_use]
    pub fn with_approval_required(mut self) -> Self {
        self.requires_approval = true;
        self
    }

    /// Override the target capability
    #[must_use]
    pub fn with_target_capability(mut self, target: impl Into<String>) -> Self {
        self.target_capability = Some(target.into());
        self
    }
}

/// The ordered sequence of subtasks for one user request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Unique plan ID
    pub id: Uuid,
    /// The verbatim user request this plan was built from
    pub original_query: String,
    /// Subtasks in execution order
    pub subtasks: Vec<Subtask>,
    /// Aggregate risk, max over subtasks
    pub risk_level: RiskLevel,
    /// Rough duration estimate
    pub estimated_duration_secs: u64,
    /// When the plan was created
    pub created_at: DateTime<Utc>,
}

impl ExecutionPlan {
    /// Create a new plan. Aggregate risk and duration start at their
    /// defaults; callers recompute them after risk evaluation.
    #[must_use]
    pub fn new(original_query: impl Into<String>, subtasks: Vec<Subtask>) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_query: original_query.into(),
            subtasks,
            risk_level: RiskLevel::Low,
            estimated_duration_secs: 0,
            created_at: Utc::now(),
        }
    }

    /// Validate the backward-reference invariant: every `depends_on` index
    /// must point at an earlier subtask. An empty plan is valid.
    ///
    /// # Errors
    /// Returns `Error::InvalidPlan` on a forward or self reference.
    pub fn validate(&self) -> Result<()> {
        for (i, subtask) in self.subtasks.iter().enumerate() {
            for &dep in &subtask.depends_on {
                if dep >= i {
                    return Err(Error::InvalidPlan(format!(
                        "subtask {} depends on {} which is not an earlier subtask",
                        i, dep
                    )));
                }
            }
        }
        Ok(())
    }

    /// Recompute the aggregate risk level as the max over subtasks
    pub fn update_aggregate_risk(&mut self) {
        self.risk_level = self
            .subtasks
            .iter()
            .map(|s| s.risk_level)
            .max()
            .unwrap_or(RiskLevel::Low);
    }

    /// One-line summary for approval prompts and logs
    #[must_use]
    pub fn summary(&self) -> String {
        let kinds: Vec<&str> = self.subtasks.iter().map(|s| s.kind.tool_name()).collect();
        format!(
            "{} ({} subtasks: {})",
            self.original_query,
            self.subtasks.len(),
            kinds.join(", ")
        )
    }
}

/// Status of one executed subtask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtaskStatus {
    /// Collaborator ran and reported success
    Success,
    /// Collaborator ran and failed, or could not be dispatched
    Failed,
    /// Not run because a dependency did not succeed, or the plan was cancelled
    Skipped,
}

/// Outcome of running one subtask
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtaskResult {
    /// Terminal status
    pub status: SubtaskStatus,
    /// Collaborator output, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Error text, if the subtask failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock execution time
    pub duration_ms: u64,
}

impl SubtaskResult {
    /// A successful result
    #[must_use]
    pub fn success(data: Option<serde_json::Value>, duration_ms: u64) -> Self {
        Self {
            status: SubtaskStatus::Success,
            data,
            error: None,
            duration_ms,
        }
    }

    /// A failed result with a captured error string
    #[must_use]
    pub fn failed(error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            status: SubtaskStatus::Failed,
            data: None,
            error: Some(error.into()),
            duration_ms,
        }
    }

    /// A skipped result (dependency unmet or plan cancelled)
    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: SubtaskStatus::Skipped,
            data: None,
            error: Some(reason.into()),
            duration_ms: 0,
        }
    }
}

/// Plan-level outcome returned by the execution engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum PlanOutcome {
    /// The plan ran to completion, one result per subtask in input order
    Completed {
        /// Per-subtask results
        results: Vec<SubtaskResult>,
    },
    /// The plan was denied before any subtask executed
    Rejected {
        /// Why the plan was denied
        reason: String,
    },
}

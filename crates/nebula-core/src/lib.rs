//! Nebula Core - Orchestration Engine
//!
//! The planning and execution core of the Nebula assistant:
//! - Plan model: typed subtasks with backward-only dependencies
//! - Risk evaluator: pure classification of subtask danger
//! - Capability router: keyword routing to perception / live-search /
//!   reasoning capabilities
//! - Plan generator: LLM-backed planning with strict validation and a
//!   guaranteed gated fallback
//! - Approval gate: fail-closed human approval before risky plans run
//! - Execution engine: sequential, dependency-aware subtask execution
//!
//! The core treats every external service as a collaborator behind a
//! narrow trait and never crashes the host process: all failure paths
//! resolve to typed result values.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod approval;
pub mod config;
pub mod engine;
pub mod error;
pub mod plan;
pub mod planner;
pub mod risk;
pub mod router;
pub mod skills;

pub use approval::{ApprovalGate, ApprovalRequest, ApprovalResponder, ApprovalStatus};
pub use config::{ApprovalConfig, CoreConfig, EngineConfig, LlmConfig, RiskConfig};
pub use engine::{ExecutionContext, ExecutionEngine};
pub use error::{Error, Result};
pub use plan::{
    ExecutionPlan, PlanOutcome, RiskLevel, Subtask, SubtaskResult, SubtaskStatus, SubtaskType,
};
pub use planner::{PlanContext, PlanGenerator};
pub use risk::RiskEvaluator;
pub use router::{route, CapabilityTarget, RouteContext};
pub use skills::{Skill, SkillRegistry};

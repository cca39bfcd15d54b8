//! Execution engine
//!
//! Runs a plan's subtasks sequentially in plan order. The engine owns the
//! plan for the duration of one run; subtask failures become typed
//! results that downstream subtasks observe through the dependency-skip
//! rule, they never abort the plan. The approval gate is consulted at
//! most once, before subtask 0.


use crate::approval::ApprovalGate;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::plan::{ExecutionPlan, PlanOutcome, Subtask, SubtaskResult, SubtaskStatus, SubtaskType};
use crate::risk::RiskEvaluator;
use crate::skills::SkillRegistry;
use nebula_tools::ToolRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Per-run execution context
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// Advisory cancellation, effective at subtask boundaries only. A
    /// subtask already dispatched to a collaborator is not interrupted.
    pub cancel: CancellationToken,
}

/// Sequential plan executor
pub struct ExecutionEngine {
    registry: Arc<ToolRegistry>,
    evaluator: RiskEvaluator,
    gate: ApprovalGate,
    skills: SkillRegistry,
    config: EngineConfig,
}

impl ExecutionEngine {
    /// Create a new engine
    #[must_use]
    pub fn new(
        registry: Arc<ToolRegistry>,
        evaluator: RiskEvaluator,
        gate: ApprovalGate,
        skills: SkillRegistry,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry,
            evaluator,
            gate,
            skills,
            config,
        }
    }

    /// Run a plan to completion.
    ///
    /// Returns `PlanOutcome::Completed` with exactly one result per
    /// subtask in input order, or `PlanOutcome::Rejected` if the approval
    /// gate denied the plan before anything executed.
    ///
    /// # Errors
    /// Only structural problems (invalid dependencies, oversized plan)
    /// surface as `Err`; subtask failures are result values.
    #[instrument(skip(self, plan, context), fields(plan_id = %plan.id, subtasks = plan.subtasks.len()))]
    pub async fn run(
        &self,
        mut plan: ExecutionPlan,
        context: &ExecutionContext,
    ) -> Result<PlanOutcome> {
        plan.validate()?;
        if plan.subtasks.len() > self.config.max_subtasks {
            return Err(Error::InvalidPlan(format!(
                "plan has {} subtasks, limit is {}",
                plan.subtasks.len(),
                self.config.max_subtasks
            )));
        }

        // risk is recomputed here so hand-built plans get the same
        // classification as generated ones
        for subtask in &mut plan.subtasks {
            subtask.risk_level = self.evaluator.evaluate(subtask);
        }
        plan.update_aggregate_risk();

        let needs_approval = plan
            .subtasks
            .iter()
            .any(|s| s.requires_approval || self.evaluator.requires_approval(s.risk_level));

        if needs_approval {
            info!(plan_id = %plan.id, risk = ?plan.risk_level, "Plan requires approval");
            if !self.gate.request_approval(&plan).await {
                return Ok(PlanOutcome::Rejected {
                    reason: "approval denied".to_string(),
                });
            }
        }

        let mut results: Vec<SubtaskResult> = Vec::with_capacity(plan.subtasks.len());

        for (i, subtask) in plan.subtasks.iter().enumerate() {
            if context.cancel.is_cancelled() {
                debug!(index = i, "Plan cancelled, skipping remaining subtasks");
                results.push(SubtaskResult::skipped("plan cancelled"));
                continue;
            }

            let unmet = subtask
                .depends_on
                .iter()
                .any(|&dep| results[dep].status != SubtaskStatus::Success);
            if unmet {
                debug!(index = i, "Dependency unmet, skipping subtask");
                results.push(SubtaskResult::skipped("dependency not satisfied"));
                continue;
            }

            results.push(self.run_subtask(i, subtask).await);
        }

        info!(plan_id = %plan.id, "Plan completed");
        Ok(PlanOutcome::Completed { results })
    }

    /// Execute one subtask, converting every collaborator failure into a
    /// `Failed` result with a captured error string.
    async fn run_subtask(&self, index: usize, subtask: &Subtask) -> SubtaskResult {
        let (tool_name, parameters) = match self.resolve_dispatch(subtask) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(index, error = %e, "Subtask dispatch failed");
                return SubtaskResult::failed(e.to_string(), 0);
            }
        };

        let Some(tool) = self.registry.get(&tool_name) else {
            warn!(index, tool = %tool_name, "No collaborator registered");
            return SubtaskResult::failed(format!("tool '{}' not registered", tool_name), 0);
        };

        debug!(index, tool = %tool_name, "Running subtask");

        let timeout = Duration::from_secs(self.config.subtask_timeout_secs);
        let input = serde_json::Value::Object(parameters);

        match tokio::time::timeout(timeout, tool.execute(input)).await {
            Ok(Ok(result)) => {
                if result.success {
                    SubtaskResult::success(Some(result.output), result.duration_ms)
                } else {
                    SubtaskResult::failed(
                        result.error.unwrap_or_else(|| "tool reported failure".to_string()),
                        result.duration_ms,
                    )
                }
            }
            Ok(Err(e)) => SubtaskResult::failed(e.to_string(), 0),
            Err(_) => SubtaskResult::failed(
                format!(
                    "subtask timed out after {}s",
                    self.config.subtask_timeout_secs
                ),
                self.config.subtask_timeout_secs * 1000,
            ),
        }
    }

    /// Resolve which tool handles a subtask and with what parameters.
    ///
    /// An explicit `target_capability` wins when a tool of that name is
    /// registered; otherwise the kind mapping applies. SkillExecution
    /// resolves through the skill registry, merging the skill's parameter
    /// template under the subtask's own parameters.
    fn resolve_dispatch(
        &self,
        subtask: &Subtask,
    ) -> Result<(String, serde_json::Map<String, serde_json::Value>)> {
        if subtask.kind == SubtaskType::SkillExecution {
            let name = subtask
                .parameters
                .get("skill")
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    Error::InvalidPlan("skill_execution subtask missing 'skill' parameter".into())
                })?;
            let skill = self
                .skills
                .get(name)
                .ok_or_else(|| Error::InvalidPlan(format!("skill '{}' not registered", name)))?;

            let mut parameters = skill.parameters.clone();
            for (key, value) in &subtask.parameters {
                if key != "skill" {
                    parameters.insert(key.clone(), value.clone());
                }
            }
            return Ok((skill.tool.clone(), parameters));
        }

        let tool_name = match &subtask.target_capability {
            Some(target) if self.registry.has(target) => target.clone(),
            _ => subtask.kind.tool_name().to_string(),
        };
        Ok((tool_name, subtask.parameters.clone()))
    }
}

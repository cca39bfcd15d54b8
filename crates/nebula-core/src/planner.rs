//! Plan generator
//!
//! Turns a natural-language request into a validated `ExecutionPlan` by
//! prompting the reasoning capability for a JSON plan. The model's output
//! is untrusted input: it goes through strict extraction and schema
//! validation with a guaranteed fallback, never a dynamic interpretation.

use crate::plan::{ExecutionPlan, Subtask, SubtaskType};
use crate::risk::RiskEvaluator;
use crate::router::{route, CapabilityTarget, RouteContext};
use nebula_llm::{CompletionRequest, Message, ReasoningCapability};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Max characters of screen context carried into the prompt
const MAX_SCREEN_CONTEXT_CHARS: usize = 2000;

/// Sampling temperature for planning; low for structural stability
const PLANNING_TEMPERATURE: f32 = 0.2;

const PLAN_SCHEMA_PROMPT: &str = r#"You are a task planner for a desktop assistant.
Decompose the user's request into an ordered list of subtasks.

Respond with ONLY a JSON object of this exact shape:
{
  "subtasks": [
    {
      "kind": "<one of: screen_read, app_control, code_execution, file_operation, web_search, system_command, skill_execution>",
      "description": "<what this step does>",
      "parameters": { },
      "depends_on": [<indices of earlier subtasks this step needs>]
    }
  ]
}

Rules:
- depends_on may only reference earlier subtasks (lower indices).
- Keep plans minimal; an empty subtask list means nothing is actionable.
- Parameters by kind: app_control {action, app}, file_operation
  {operation, path, content}, system_command {command}, code_execution
  {language, code}, web_search {query}, screen_read {prompt},
  skill_execution {skill}."#;

/// Additional context handed to the planner per request
#[derive(Debug, Clone, Default)]
pub struct PlanContext {
    /// Text describing what is currently on screen, if captured
    pub screen_context: Option<String>,
    /// The request carries images
    pub has_images: bool,
}

/// Raw, untrusted plan shape as returned by the model
#[derive(Debug, Deserialize)]
struct RawPlan {
    #[serde(default)]
    subtasks: Vec<RawSubtask>,
}

#[derive(Debug, Deserialize)]
struct RawSubtask {
    // kept as a string so unknown kinds coerce instead of failing the
    // whole plan
    #[serde(default)]
    kind: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    requires_approval: bool,
    #[serde(default)]
    target_capability: Option<String>,
    #[serde(default)]
    parameters: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    depends_on: Vec<usize>,
}

/// Generates execution plans via the reasoning capability
pub struct PlanGenerator {
    reasoning: Arc<dyn ReasoningCapability>,
    evaluator: RiskEvaluator,
}

impl PlanGenerator {
    /// Create a new plan generator
    #[must_use]
    pub fn new(reasoning: Arc<dyn ReasoningCapability>, evaluator: RiskEvaluator) -> Self {
        Self {
            reasoning,
            evaluator,
        }
    }

    /// Build a plan for a user request.
    ///
    /// Never fails: any capability error, parse failure, or schema
    /// violation degrades to a single-subtask fallback plan that wraps
    /// the raw query and always requires approval.
    #[instrument(skip(self, context), fields(query_len = user_query.len()))]
    pub async fn create_plan(&self, user_query: &str, context: &PlanContext) -> ExecutionPlan {
        let request = CompletionRequest::new(
            self.reasoning.default_model(),
            self.build_messages(user_query, context),
        )
        .with_temperature(PLANNING_TEMPERATURE);

        let response = match self.reasoning.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Reasoning capability failed, using fallback plan");
                return self.fallback_plan(user_query);
            }
        };

        match self.parse_plan(user_query, &response.content, context) {
            Some(plan) => plan,
            None => {
                warn!("Could not extract a valid plan from model output, using fallback");
                self.fallback_plan(user_query)
            }
        }
    }

    fn build_messages(&self, user_query: &str, context: &PlanContext) -> Vec<Message> {
        let mut messages = vec![Message::system(PLAN_SCHEMA_PROMPT)];
        if let Some(screen) = &context.screen_context {
            let truncated: String = screen.chars().take(MAX_SCREEN_CONTEXT_CHARS).collect();
            messages.push(Message::system(format!(
                "Current screen content:\n{}",
                truncated
            )));
        }
        messages.push(Message::user(user_query));
        messages
    }

    /// Validate the raw model output into a plan. `None` means fallback.
    fn parse_plan(
        &self,
        user_query: &str,
        response: &str,
        context: &PlanContext,
    ) -> Option<ExecutionPlan> {
        let json = extract_json(response)?;
        let raw: RawPlan = serde_json::from_str(&json).ok()?;

        let route_context = RouteContext {
            has_images: context.has_images,
        };

        let subtasks: Vec<Subtask> = raw
            .subtasks
            .into_iter()
            .enumerate()
            .map(|(i, raw)| self.validate_subtask(i, raw, &route_context))
            .collect();

        let mut plan = ExecutionPlan::new(user_query, subtasks);
        plan.estimated_duration_secs = plan.subtasks.iter().map(|s| baseline_secs(s.kind)).sum();
        plan.update_aggregate_risk();
        debug!(plan_id = %plan.id, subtasks = plan.subtasks.len(), "Generated plan");
        Some(plan)
    }

    fn validate_subtask(
        &self,
        index: usize,
        raw: RawSubtask,
        route_context: &RouteContext,
    ) -> Subtask {
        // unknown kind strings coerce to a gated system command rather
        // than dropping the step silently
        let kind = match serde_json::from_value::<SubtaskType>(serde_json::Value::String(
            raw.kind.clone(),
        )) {
            Ok(kind) => kind,
            Err(_) => {
                warn!(kind = %raw.kind, index, "Unknown subtask kind, coercing to system_command");
                let mut subtask =
                    Subtask::new(SubtaskType::SystemCommand, raw.description.clone());
                subtask.requires_approval = true;
                subtask
                    .parameters
                    .insert("command".to_string(), raw.description.clone().into());
                subtask.depends_on = clamp_depends_on(raw.depends_on, index);
                subtask.risk_level = self.evaluator.evaluate(&subtask);
                return subtask;
            }
        };

        let target_capability = raw
            .target_capability
            .or_else(|| Some(capability_name(route(&raw.description, route_context)).to_string()));

        let mut subtask = Subtask {
            kind,
            description: raw.description,
            requires_approval: raw.requires_approval,
            target_capability,
            parameters: raw.parameters,
            depends_on: clamp_depends_on(raw.depends_on, index),
            risk_level: Default::default(),
        };
        subtask.risk_level = self.evaluator.evaluate(&subtask);
        subtask
    }

    /// Degenerate single-subtask plan wrapping the raw query. Always
    /// gated; guarantees no request is silently dropped and nothing
    /// unvalidated runs without approval.
    fn fallback_plan(&self, user_query: &str) -> ExecutionPlan {
        let mut subtask = Subtask::new(SubtaskType::SystemCommand, user_query)
            .with_parameter("command", user_query.into())
            .with_approval_required();
        subtask.risk_level = self.evaluator.evaluate(&subtask);

        let mut plan = ExecutionPlan::new(user_query, vec![subtask]);
        plan.estimated_duration_secs = baseline_secs(SubtaskType::SystemCommand);
        plan.update_aggregate_risk();
        plan
    }
}

/// Keep only backward references; forward and self references are
/// clamped out so the invariant holds by construction.
fn clamp_depends_on(depends_on: Vec<usize>, index: usize) -> Vec<usize> {
    depends_on.into_iter().filter(|&dep| dep < index).collect()
}

fn capability_name(target: CapabilityTarget) -> &'static str {
    match target {
        CapabilityTarget::Perception => "perception",
        CapabilityTarget::LiveSearch => "live_search",
        CapabilityTarget::Reasoning => "reasoning",
    }
}

/// Rough per-kind duration baseline used for the plan estimate
fn baseline_secs(kind: SubtaskType) -> u64 {
    match kind {
        SubtaskType::FileOperation => 2,
        SubtaskType::AppControl => 3,
        SubtaskType::ScreenRead | SubtaskType::SystemCommand => 5,
        SubtaskType::WebSearch => 8,
        SubtaskType::CodeExecution | SubtaskType::SkillExecution => 10,
    }
}

/// Pull a JSON object out of free-form model text: a fenced ```json block
/// if present, otherwise the first balanced brace span.
fn extract_json(text: &str) -> Option<String> {
    if let Some(start) = text.find("```json") {
        let after = &text[start + 7..];
        if let Some(end) = after.find("```") {
            return Some(after[..end].trim().to_string());
        }
    }
    if let Some(start) = text.find("```") {
        let after = &text[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return Some(inner.to_string());
            }
        }
    }

    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..=start + offset].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RiskConfig;
    use crate::plan::RiskLevel;
    use nebula_llm::{CompletionResponse, Result as LlmResult};

    /// Reasoning capability that replays a canned response
    struct CannedReasoning {
        response: std::result::Result<String, String>,
    }

    impl CannedReasoning {
        fn ok(response: &str) -> Self {
            Self {
                response: Ok(response.to_string()),
            }
        }

        fn failing() -> Self {
            Self {
                response: Err("connection refused".to_string()),
            }
        }
    }

    #[async_trait::async_trait]
    impl ReasoningCapability for CannedReasoning {
        fn name(&self) -> &str {
            "canned"
        }

        fn default_model(&self) -> &str {
            "test-model"
        }

        async fn complete(&self, _request: CompletionRequest) -> LlmResult<CompletionResponse> {
            match &self.response {
                Ok(content) => Ok(CompletionResponse {
                    content: content.clone(),
                    model: "test-model".to_string(),
                    finish_reason: Some("stop".to_string()),
                }),
                Err(e) => Err(nebula_llm::Error::Network(e.clone())),
            }
        }
    }

    fn generator(reasoning: CannedReasoning) -> PlanGenerator {
        PlanGenerator::new(
            Arc::new(reasoning),
            RiskEvaluator::new(&RiskConfig::default()),
        )
    }

    const EDITOR_NOTES_PLAN: &str = r#"{
        "subtasks": [
            {
                "kind": "app_control",
                "description": "open a text editor",
                "parameters": {"action": "open", "app": "gedit"},
                "depends_on": []
            },
            {
                "kind": "file_operation",
                "description": "create notes.txt containing hello",
                "parameters": {"operation": "create", "path": "notes.txt", "content": "hello"},
                "depends_on": [0]
            }
        ]
    }"#;

    #[tokio::test]
    async fn test_well_formed_plan_parsed() {
        let plan = generator(CannedReasoning::ok(EDITOR_NOTES_PLAN))
            .create_plan("open a text editor and create notes.txt", &PlanContext::default())
            .await;

        assert_eq!(plan.subtasks.len(), 2);
        assert_eq!(plan.subtasks[0].kind, SubtaskType::AppControl);
        assert_eq!(plan.subtasks[1].kind, SubtaskType::FileOperation);
        assert_eq!(plan.subtasks[1].depends_on, vec![0]);
        assert!(plan.validate().is_ok());
        // both steps classify at or below medium
        assert!(plan.risk_level <= RiskLevel::Medium);
        assert!(plan.estimated_duration_secs > 0);
    }

    #[tokio::test]
    async fn test_fenced_json_extracted() {
        let fenced = format!("Here is the plan:\n```json\n{}\n```\nDone.", EDITOR_NOTES_PLAN);
        let plan = generator(CannedReasoning::ok(&fenced))
            .create_plan("open editor", &PlanContext::default())
            .await;
        assert_eq!(plan.subtasks.len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_response_falls_back() {
        let plan = generator(CannedReasoning::ok("I cannot help with that."))
            .create_plan("organize my desktop", &PlanContext::default())
            .await;

        assert_eq!(plan.subtasks.len(), 1);
        let fallback = &plan.subtasks[0];
        assert_eq!(fallback.kind, SubtaskType::SystemCommand);
        assert!(fallback.requires_approval);
        assert_eq!(
            fallback.parameters.get("command").and_then(|v| v.as_str()),
            Some("organize my desktop")
        );
    }

    #[tokio::test]
    async fn test_capability_error_falls_back() {
        let plan = generator(CannedReasoning::failing())
            .create_plan("do something", &PlanContext::default())
            .await;
        assert_eq!(plan.subtasks.len(), 1);
        assert!(plan.subtasks[0].requires_approval);
    }

    #[tokio::test]
    async fn test_forward_and_self_references_clamped() {
        let response = r#"{
            "subtasks": [
                {"kind": "web_search", "description": "search", "depends_on": [0, 1, 5]},
                {"kind": "screen_read", "description": "look at screen", "depends_on": [0, 1]}
            ]
        }"#;
        let plan = generator(CannedReasoning::ok(response))
            .create_plan("query", &PlanContext::default())
            .await;

        assert!(plan.subtasks[0].depends_on.is_empty());
        assert_eq!(plan.subtasks[1].depends_on, vec![0]);
        assert!(plan.validate().is_ok());
    }

    #[tokio::test]
    async fn test_unknown_kind_coerced_to_gated_command() {
        let response = r#"{
            "subtasks": [
                {"kind": "teleport", "description": "move the window somehow"}
            ]
        }"#;
        let plan = generator(CannedReasoning::ok(response))
            .create_plan("move window", &PlanContext::default())
            .await;

        assert_eq!(plan.subtasks[0].kind, SubtaskType::SystemCommand);
        assert!(plan.subtasks[0].requires_approval);
    }

    #[tokio::test]
    async fn test_empty_subtask_list_is_valid() {
        let plan = generator(CannedReasoning::ok(r#"{"subtasks": []}"#))
            .create_plan("hello", &PlanContext::default())
            .await;
        assert!(plan.subtasks.is_empty());
        assert!(plan.validate().is_ok());
        assert_eq!(plan.risk_level, RiskLevel::Low);
    }

    #[tokio::test]
    async fn test_router_fills_missing_target_capability() {
        let response = r#"{
            "subtasks": [
                {"kind": "web_search", "description": "latest rust news"}
            ]
        }"#;
        let plan = generator(CannedReasoning::ok(response))
            .create_plan("news", &PlanContext::default())
            .await;
        assert_eq!(
            plan.subtasks[0].target_capability.as_deref(),
            Some("live_search")
        );
    }

    #[test]
    fn test_extract_json_plain_object() {
        let text = r#"Sure: {"subtasks": []} hope that helps"#;
        assert_eq!(extract_json(text).unwrap(), r#"{"subtasks": []}"#);
    }

    #[test]
    fn test_extract_json_braces_inside_strings() {
        let text = r#"{"subtasks": [{"kind": "system_command", "description": "print {}"}]}"#;
        let extracted = extract_json(text).unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(&extracted).is_ok());
    }

    #[test]
    fn test_extract_json_none_for_plain_text() {
        assert!(extract_json("no json here").is_none());
    }
}

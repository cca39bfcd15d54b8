//! End-to-end orchestration tests: plan generation through execution
//! with the approval gate in the loop.

use nebula_core::{
    ApprovalConfig, ApprovalGate, ApprovalRequest, ApprovalResponder, EngineConfig,
    ExecutionContext, ExecutionEngine, PlanContext, PlanGenerator, PlanOutcome, RiskConfig,
    RiskEvaluator, SkillRegistry, SubtaskStatus, SubtaskType,
};
use nebula_llm::{
    CompletionRequest, CompletionResponse, ReasoningCapability, Result as LlmResult,
};
use nebula_tools::{register_builtins, BuiltinsConfig, ToolRegistry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Reasoning capability that replays a canned planning response
struct CannedReasoning(String);

#[async_trait::async_trait]
impl ReasoningCapability for CannedReasoning {
    fn name(&self) -> &str {
        "canned"
    }

    fn default_model(&self) -> &str {
        "test-model"
    }

    async fn complete(&self, _request: CompletionRequest) -> LlmResult<CompletionResponse> {
        Ok(CompletionResponse {
            content: self.0.clone(),
            model: "test-model".to_string(),
            finish_reason: Some("stop".to_string()),
        })
    }
}

/// Responder with a fixed answer and an invocation counter
struct FixedResponder {
    answer: bool,
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl ApprovalResponder for FixedResponder {
    async fn respond(&self, _request: &ApprovalRequest) -> nebula_core::Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer)
    }
}

fn builtin_registry() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    register_builtins(&mut registry, &BuiltinsConfig::default());
    Arc::new(registry)
}

fn engine(answer: bool) -> (ExecutionEngine, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let responder = FixedResponder {
        answer,
        calls: calls.clone(),
    };
    let gate = ApprovalGate::new(&ApprovalConfig::default()).with_responder(Arc::new(responder));
    let engine = ExecutionEngine::new(
        builtin_registry(),
        RiskEvaluator::new(&RiskConfig::default()),
        gate,
        SkillRegistry::new(),
        EngineConfig::default(),
    );
    (engine, calls)
}

const EDITOR_NOTES_RESPONSE: &str = r#"```json
{
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
      "parameters": {"operation": "create", "path": "/tmp/nebula-test-notes.txt", "content": "hello"},
      "depends_on": [0]
    }
  ]
}
```"#;

#[tokio::test]
async fn plan_then_execute_with_approval() {
    let generator = PlanGenerator::new(
        Arc::new(CannedReasoning(EDITOR_NOTES_RESPONSE.to_string())),
        RiskEvaluator::new(&RiskConfig::default()),
    );

    let plan = generator
        .create_plan(
            "open a text editor and create file notes.txt containing 'hello'",
            &PlanContext::default(),
        )
        .await;

    assert_eq!(plan.subtasks.len(), 2);
    assert_eq!(plan.subtasks[0].kind, SubtaskType::AppControl);
    assert_eq!(plan.subtasks[1].kind, SubtaskType::FileOperation);
    assert_eq!(plan.subtasks[1].depends_on, vec![0]);

    let _ = std::fs::remove_file("/tmp/nebula-test-notes.txt");

    let (engine, gate_calls) = engine(true);
    let outcome = engine
        .run(plan, &ExecutionContext::default())
        .await
        .expect("plan should execute");

    let PlanOutcome::Completed { results } = outcome else {
        panic!("expected completion");
    };
    assert_eq!(results.len(), 2);
    // app control runs against the noop driver, file op writes for real
    assert_eq!(results[0].status, SubtaskStatus::Success);
    assert_eq!(results[1].status, SubtaskStatus::Success);
    assert_eq!(gate_calls.load(Ordering::SeqCst), 1);

    let written = std::fs::read_to_string("/tmp/nebula-test-notes.txt").unwrap();
    assert_eq!(written, "hello");
    let _ = std::fs::remove_file("/tmp/nebula-test-notes.txt");
}

#[tokio::test]
async fn denied_plan_executes_nothing() {
    let generator = PlanGenerator::new(
        Arc::new(CannedReasoning(EDITOR_NOTES_RESPONSE.to_string())),
        RiskEvaluator::new(&RiskConfig::default()),
    );
    let plan = generator
        .create_plan("open an editor and write a file", &PlanContext::default())
        .await;

    let _ = std::fs::remove_file("/tmp/nebula-test-notes.txt");

    let (engine, gate_calls) = engine(false);
    let outcome = engine
        .run(plan, &ExecutionContext::default())
        .await
        .expect("rejection is not an error");

    assert!(matches!(outcome, PlanOutcome::Rejected { .. }));
    assert_eq!(gate_calls.load(Ordering::SeqCst), 1);
    assert!(!std::path::Path::new("/tmp/nebula-test-notes.txt").exists());
}

#[tokio::test]
async fn malformed_model_output_degrades_to_gated_fallback() {
    let generator = PlanGenerator::new(
        Arc::new(CannedReasoning("I'd rather not produce JSON today.".to_string())),
        RiskEvaluator::new(&RiskConfig::default()),
    );
    let plan = generator
        .create_plan("organize my desktop", &PlanContext::default())
        .await;

    assert_eq!(plan.subtasks.len(), 1);
    assert_eq!(plan.subtasks[0].kind, SubtaskType::SystemCommand);
    assert!(plan.subtasks[0].requires_approval);

    // the fallback is always gated: a denying responder stops it cold
    let (engine, gate_calls) = engine(false);
    let outcome = engine
        .run(plan, &ExecutionContext::default())
        .await
        .expect("rejection is not an error");
    assert!(matches!(outcome, PlanOutcome::Rejected { .. }));
    assert_eq!(gate_calls.load(Ordering::SeqCst), 1);
}

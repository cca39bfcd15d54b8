//! CLI commands for Nebula

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{Config, Environment, File, FileFormat};
use nebula_core::{
    ApprovalGate, ApprovalRequest, ApprovalResponder, CoreConfig, ExecutionContext,
    ExecutionEngine, ExecutionPlan, PlanContext, PlanGenerator, PlanOutcome, RiskEvaluator,
    SkillRegistry, SubtaskStatus,
};
use nebula_llm::{DuckDuckGoSearch, OpenAiCompatConfig, OpenAiCompatProvider};
use nebula_tools::{register_builtins, BuiltinsConfig, ToolRegistry};
use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

/// Embedded default configuration
const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Nebula - plan and execute desktop tasks with risk-gated approval
#[derive(Parser)]
#[command(name = "nebula", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand)]
pub enum Command {
    /// Generate a plan for a request and print it (no execution)
    Plan {
        /// The natural-language request
        request: String,
    },
    /// Plan and execute a request, asking for approval when needed
    Run {
        /// The natural-language request
        request: String,
    },
    /// List registered collaborator tools
    Tools,
}

/// Run the parsed CLI command
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config()?;

    match cli.command {
        Command::Plan { request } => plan_command(&config, &request).await,
        Command::Run { request } => run_command(&config, &request).await,
        Command::Tools => tools_command(&config),
    }
}

/// Layer embedded defaults, an optional local file, and NEBULA_ env vars
fn load_config() -> Result<CoreConfig> {
    let config = Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .add_source(File::with_name("config/local").required(false))
        .add_source(
            Environment::with_prefix("NEBULA")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .context("failed to build configuration")?;

    config
        .try_deserialize()
        .context("failed to parse configuration")
}

fn build_reasoning(config: &CoreConfig) -> Result<Arc<OpenAiCompatProvider>> {
    let api_key = config
        .llm
        .api_key
        .clone()
        .or_else(|| std::env::var("NEBULA_API_KEY").ok())
        .context("no API key configured; set NEBULA_API_KEY or llm.api_key")?;

    let provider_config = OpenAiCompatConfig::new(api_key)
        .with_base_url(&config.llm.base_url)
        .with_model(&config.llm.model)
        .with_timeout(Duration::from_secs(config.llm.timeout_secs));

    Ok(Arc::new(OpenAiCompatProvider::new(provider_config)?))
}

fn build_registry(config: &CoreConfig, reasoning: Option<Arc<OpenAiCompatProvider>>) -> ToolRegistry {
    let mut builtins = BuiltinsConfig {
        protected_paths: config.risk.protected_paths.clone(),
        command_timeout_secs: config.engine.subtask_timeout_secs,
        ..BuiltinsConfig::default()
    };
    if let Some(provider) = reasoning {
        builtins.perception = Some(provider as Arc<dyn nebula_llm::PerceptionCapability>);
    }
    if let Ok(search) = DuckDuckGoSearch::new() {
        builtins.search = Some(Arc::new(search) as Arc<dyn nebula_llm::SearchCapability>);
    }

    let mut registry = ToolRegistry::new();
    register_builtins(&mut registry, &builtins);
    registry
}

async fn plan_command(config: &CoreConfig, request: &str) -> Result<()> {
    let reasoning = build_reasoning(config)?;
    let generator = PlanGenerator::new(reasoning, RiskEvaluator::new(&config.risk));

    let plan = generator.create_plan(request, &PlanContext::default()).await;
    print_plan(&plan);
    Ok(())
}

async fn run_command(config: &CoreConfig, request: &str) -> Result<()> {
    let reasoning = build_reasoning(config)?;
    let generator = PlanGenerator::new(reasoning.clone(), RiskEvaluator::new(&config.risk));

    let plan = generator.create_plan(request, &PlanContext::default()).await;
    print_plan(&plan);

    let registry = build_registry(config, Some(reasoning));
    let gate =
        ApprovalGate::new(&config.approval).with_responder(Arc::new(StdinApprovalResponder));
    let skills = SkillRegistry::load_dir("skills")?;

    let engine = ExecutionEngine::new(
        Arc::new(registry),
        RiskEvaluator::new(&config.risk),
        gate,
        skills,
        config.engine.clone(),
    );

    match engine.run(plan, &ExecutionContext::default()).await? {
        PlanOutcome::Completed { results } => {
            println!("\nResults:");
            for (i, result) in results.iter().enumerate() {
                let marker = match result.status {
                    SubtaskStatus::Success => "ok",
                    SubtaskStatus::Failed => "failed",
                    SubtaskStatus::Skipped => "skipped",
                };
                print!("  [{}] {} ({} ms)", i, marker, result.duration_ms);
                if let Some(error) = &result.error {
                    print!(" - {}", error);
                }
                println!();
            }
        }
        PlanOutcome::Rejected { reason } => {
            println!("\nPlan rejected: {}", reason);
        }
    }
    Ok(())
}

fn tools_command(config: &CoreConfig) -> Result<()> {
    let registry = build_registry(config, None);
    println!("Registered tools:");
    for definition in registry.list_definitions() {
        println!("  {} - {}", definition.name, definition.description);
    }
    Ok(())
}

fn print_plan(plan: &ExecutionPlan) {
    println!("Plan {} ({:?} risk)", plan.id, plan.risk_level);
    println!("  query: {}", plan.original_query);
    println!("  estimated duration: {}s", plan.estimated_duration_secs);
    for (i, subtask) in plan.subtasks.iter().enumerate() {
        let deps = if subtask.depends_on.is_empty() {
            String::new()
        } else {
            format!(" deps={:?}", subtask.depends_on)
        };
        println!(
            "  [{}] {:?} ({:?}){} - {}",
            i, subtask.kind, subtask.risk_level, deps, subtask.description
        );
    }
}

/// Approval responder backed by a stdin y/n prompt
struct StdinApprovalResponder;

#[async_trait::async_trait]
impl ApprovalResponder for StdinApprovalResponder {
    async fn respond(&self, request: &ApprovalRequest) -> nebula_core::Result<bool> {
        let summary = request.summary.clone();
        let risk = request.risk_description.clone();

        tokio::task::spawn_blocking(move || {
            println!("\nApproval required:");
            println!("  {}", summary);
            println!("  {}", risk);
            print!("Proceed? [y/N] ");
            std::io::stdout()
                .flush()
                .map_err(|e| nebula_core::Error::Approval(e.to_string()))?;

            let mut answer = String::new();
            std::io::stdin()
                .read_line(&mut answer)
                .map_err(|e| nebula_core::Error::Approval(e.to_string()))?;
            Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
        })
        .await
        .map_err(|e| nebula_core::Error::Approval(e.to_string()))?
    }
}

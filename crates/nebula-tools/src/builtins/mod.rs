//! Builtins - Built-in collaborators for Nebula
//!
//! This module provides the core set of built-in tools, one per subtask
//! kind the execution engine dispatches:
//! - `app_control`: structured desktop automation via an injected driver
//! - `file_operation`: create/read/modify/delete with path validation
//! - `system_command`: command execution with a security analyzer
//! - `code_execution`: interpreter subprocess, workspace-jailed
//! - `screen_read`: delegates to a perception capability
//! - `web_search`: delegates to a live-search capability

mod app_control;
mod code_exec;
mod file_op;
mod screen_read;
mod system_command;
mod web_search;

pub use app_control::AppControlTool;
pub use code_exec::CodeExecutionTool;
pub use file_op::FileOperationTool;
pub use screen_read::ScreenReadTool;
pub use system_command::SystemCommandTool;
pub use web_search::WebSearchTool;

use crate::actions::{AutomationDriver, NoopDriver};
use crate::registry::ToolRegistry;
use nebula_llm::{PerceptionCapability, SearchCapability};
use std::sync::Arc;

/// Configuration for built-in tools
#[derive(Clone)]
pub struct BuiltinsConfig {
    /// Automation backend for app control
    pub driver: Arc<dyn AutomationDriver>,
    /// Perception capability for screen reading (optional)
    pub perception: Option<Arc<dyn PerceptionCapability>>,
    /// Live-search capability for web search (optional)
    pub search: Option<Arc<dyn SearchCapability>>,
    /// Extra protected directories beyond the built-in set
    pub protected_paths: Vec<String>,
    /// Working directory jail for code execution
    pub workspace: Option<String>,
    /// Per-command timeout in seconds
    pub command_timeout_secs: u64,
}

impl Default for BuiltinsConfig {
    fn default() -> Self {
        Self {
            driver: Arc::new(NoopDriver),
            perception: None,
            search: None,
            protected_paths: Vec::new(),
            workspace: None,
            command_timeout_secs: 120,
        }
    }
}

/// Register all built-in tools with the registry
pub fn register_builtins(registry: &mut ToolRegistry, config: &BuiltinsConfig) {
    registry.register(Arc::new(AppControlTool::new(config.driver.clone())));
    registry.register(Arc::new(FileOperationTool::new(
        config.protected_paths.clone(),
    )));
    registry.register(Arc::new(SystemCommandTool::new(
        config.command_timeout_secs,
    )));
    registry.register(Arc::new(CodeExecutionTool::new(
        config.workspace.clone().map(std::path::PathBuf::from),
        config.command_timeout_secs,
    )));
    if let Some(perception) = &config.perception {
        registry.register(Arc::new(ScreenReadTool::new(perception.clone())));
    }
    if let Some(search) = &config.search {
        registry.register(Arc::new(WebSearchTool::new(search.clone())));
    }
}

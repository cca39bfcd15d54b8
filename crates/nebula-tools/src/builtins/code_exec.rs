//! Code execution tool — runs snippets through a language interpreter

use crate::error::{Error, Result};
use crate::registry::{Tool, ToolDefinition, ToolResult};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::debug;

const MAX_OUTPUT_BYTES: usize = 100 * 1024;

/// Languages the tool knows how to launch
const SUPPORTED_LANGUAGES: &[(&str, &str, &str)] = &[
    ("python", "python3", "-c"),
    ("sh", "sh", "-c"),
    ("bash", "bash", "-c"),
    ("node", "node", "-e"),
    ("javascript", "node", "-e"),
];

/// Tool for executing short code snippets in a sandboxed workspace
pub struct CodeExecutionTool {
    definition: ToolDefinition,
    workspace: Option<PathBuf>,
    timeout_secs: u64,
}

impl CodeExecutionTool {
    /// Create a new code execution tool
    #[must_use]
    pub fn new(workspace: Option<PathBuf>, timeout_secs: u64) -> Self {
        let definition = ToolDefinition::new(
            "code_execution",
            "Execute a code snippet with an interpreter (python3, sh, bash, \
             node). The snippet runs inside the configured workspace \
             directory and is killed after the timeout expires.",
        )
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "language": {
                    "type": "string",
                    "description": "Interpreter: python, sh, bash, node"
                },
                "code": {
                    "type": "string",
                    "description": "Snippet to execute"
                }
            },
            "required": ["language", "code"]
        }));

        Self {
            definition,
            workspace,
            timeout_secs,
        }
    }

    fn resolve_interpreter(language: &str) -> Result<(&'static str, &'static str)> {
        SUPPORTED_LANGUAGES
            .iter()
            .find(|(name, _, _)| *name == language.to_lowercase())
            .map(|(_, bin, flag)| (*bin, *flag))
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "Unsupported language '{}', supported: python, sh, bash, node",
                    language
                ))
            })
    }
}

fn cap_output(s: &str) -> String {
    if s.len() <= MAX_OUTPUT_BYTES {
        return s.to_string();
    }
    let truncated: String = s
        .char_indices()
        .take_while(|(i, _)| *i < MAX_OUTPUT_BYTES)
        .map(|(_, c)| c)
        .collect();
    format!("{}...\n[truncated: {} total bytes]", truncated, s.len())
}

#[async_trait::async_trait]
impl Tool for CodeExecutionTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolResult> {
        let start = Instant::now();

        let language = input
            .get("language")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::InvalidInput("Missing 'language' parameter".to_string()))?;
        let code = input
            .get("code")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::InvalidInput("Missing 'code' parameter".to_string()))?;

        if code.trim().is_empty() {
            return Err(Error::InvalidInput("Code must not be empty".to_string()));
        }

        let (interpreter, flag) = Self::resolve_interpreter(language)?;

        debug!(interpreter = %interpreter, "Executing code snippet");

        let mut cmd = Command::new(interpreter);
        cmd.arg(flag).arg(code);
        if let Some(workspace) = &self.workspace {
            cmd.current_dir(workspace);
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        // Reap the interpreter if the timeout drops the wait future mid-flight.
        cmd.kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| Error::Execution(e.to_string()))?;

        let output = tokio::time::timeout(
            std::time::Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| Error::Timeout(self.timeout_secs * 1000))?
        .map_err(|e| Error::Execution(e.to_string()))?;

        let stdout = cap_output(&String::from_utf8_lossy(&output.stdout));
        let stderr = cap_output(&String::from_utf8_lossy(&output.stderr));
        let duration = start.elapsed().as_millis() as u64;

        if output.status.success() {
            Ok(ToolResult::success(
                serde_json::json!({
                    "stdout": stdout,
                    "stderr": stderr,
                }),
                duration,
            ))
        } else {
            Ok(ToolResult::failure(
                format!(
                    "exit code {}: {}",
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                ),
                duration,
            ))
        }
    }
}

//! System command tool — command execution with a security analyzer

use crate::error::{Error, Result};
use crate::registry::{Tool, ToolDefinition, ToolResult};
use crate::security::analyze_command;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::debug;

/// Output cap sent back to the caller (100 KB)
const MAX_OUTPUT_BYTES: usize = 100 * 1024;

/// Tool for executing system commands
pub struct SystemCommandTool {
    definition: ToolDefinition,
    timeout_secs: u64,
}

impl SystemCommandTool {
    /// Create a new system command tool with the given timeout
    #[must_use]
    pub fn new(timeout_secs: u64) -> Self {
        let definition = ToolDefinition::new(
            "system_command",
            "Execute a system command via the shell. Privileged and \
             destructive commands (rm, sudo, shutdown, kill, ...) are \
             blocked by the security analyzer before anything is spawned.",
        )
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Command line to execute"
                },
                "cwd": {
                    "type": "string",
                    "description": "Working directory (optional)"
                }
            },
            "required": ["command"]
        }));

        Self {
            definition,
            timeout_secs,
        }
    }
}

/// Truncate output at a byte cap, preserving UTF-8 boundaries
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
impl Tool for SystemCommandTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolResult> {
        let start = Instant::now();

        let command = input
            .get("command")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::InvalidInput("Missing 'command' parameter".to_string()))?;

        if command.trim().is_empty() {
            return Err(Error::InvalidInput("Command must not be empty".to_string()));
        }

        analyze_command(command)?;

        debug!(command = %command, "Executing system command");

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        if let Some(cwd) = input.get("cwd").and_then(|v| v.as_str()) {
            cmd.current_dir(cwd);
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        // Reap the child if the timeout drops the wait future mid-flight.
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
        let exit_code = output.status.code().unwrap_or(-1);
        let duration = start.elapsed().as_millis() as u64;

        if output.status.success() {
            Ok(ToolResult::success(
                serde_json::json!({
                    "stdout": stdout,
                    "stderr": stderr,
                    "exit_code": exit_code,
                }),
                duration,
            ))
        } else {
            Ok(ToolResult::failure(
                format!("exit code {}: {}", exit_code, stderr.trim()),
                duration,
            ))
        }
    }
}

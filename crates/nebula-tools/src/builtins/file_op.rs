//! File operation tool — create/read/modify/delete with path validation

use crate::error::{Error, Result};
use crate::registry::{Tool, ToolDefinition, ToolResult};
use crate::security::{is_sensitive_file, validate_path};
use std::time::Instant;
use tracing::{debug, warn};

/// Maximum file size for reads (1 MB keeps results LLM-friendly)
const MAX_READ_BYTES: u64 = 1024 * 1024;

/// Tool for file operations
pub struct FileOperationTool {
    definition: ToolDefinition,
    protected_paths: Vec<String>,
}

impl FileOperationTool {
    /// Create a new file operation tool with extra protected directories
    #[must_use]
    pub fn new(protected_paths: Vec<String>) -> Self {
        let definition = ToolDefinition::new(
            "file_operation",
            "Perform file operations: create (write content to a new file), \
             read (return file content), modify (overwrite content), \
             delete (remove a file). Paths inside protected system \
             directories are rejected.",
        )
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": ["create", "read", "modify", "delete"],
                    "description": "Operation to perform"
                },
                "path": {
                    "type": "string",
                    "description": "Target file path"
                },
                "content": {
                    "type": "string",
                    "description": "File content (for create/modify)"
                }
            },
            "required": ["operation", "path"]
        }));

        Self {
            definition,
            protected_paths,
        }
    }
}

#[async_trait::async_trait]
impl Tool for FileOperationTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolResult> {
        let start = Instant::now();

        let operation = input
            .get("operation")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::InvalidInput("Missing 'operation' parameter".to_string()))?;
        let path = input
            .get("path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::InvalidInput("Missing 'path' parameter".to_string()))?;

        let validated = validate_path(path, &self.protected_paths)?;

        if is_sensitive_file(&validated) && operation != "read" {
            warn!(path = %path, "Write to sensitive file blocked");
            return Err(Error::PermissionDenied(format!(
                "Writing to sensitive file '{}' is not allowed",
                path
            )));
        }

        debug!(operation = %operation, path = %validated.display(), "File operation");

        let output = match operation {
            "create" | "modify" => {
                let content = input
                    .get("content")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        Error::InvalidInput("Missing 'content' parameter".to_string())
                    })?;
                if operation == "create" && validated.exists() {
                    return Err(Error::InvalidInput(format!(
                        "File '{}' already exists; use modify",
                        path
                    )));
                }
                tokio::fs::write(&validated, content).await?;
                serde_json::json!({
                    "path": validated.display().to_string(),
                    "bytes_written": content.len(),
                })
            }
            "read" => {
                let metadata = tokio::fs::metadata(&validated).await?;
                if metadata.len() > MAX_READ_BYTES {
                    return Err(Error::InvalidInput(format!(
                        "File too large: {} bytes (max {})",
                        metadata.len(),
                        MAX_READ_BYTES
                    )));
                }
                let content = tokio::fs::read_to_string(&validated).await?;
                serde_json::json!({
                    "path": validated.display().to_string(),
                    "content": content,
                })
            }
            "delete" => {
                tokio::fs::remove_file(&validated).await?;
                serde_json::json!({
                    "path": validated.display().to_string(),
                    "deleted": true,
                })
            }
            other => {
                return Err(Error::InvalidInput(format!(
                    "Unknown file operation: '{}'",
                    other
                )))
            }
        };

        Ok(ToolResult::success(output, start.elapsed().as_millis() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> FileOperationTool {
        FileOperationTool::new(Vec::new())
    }

    #[tokio::test]
    async fn test_create_read_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let path_str = path.to_string_lossy().to_string();

        let result = tool()
            .execute(serde_json::json!({
                "operation": "create",
                "path": path_str,
                "content": "hello"
            }))
            .await
            .unwrap();
        assert!(result.success);

        let result = tool()
            .execute(serde_json::json!({"operation": "read", "path": path_str}))
            .await
            .unwrap();
        assert_eq!(result.output["content"], "hello");

        let result = tool()
            .execute(serde_json::json!({"operation": "delete", "path": path_str}))
            .await
            .unwrap();
        assert!(result.success);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_create_existing_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("existing.txt");
        std::fs::write(&path, "old").unwrap();

        let err = tool()
            .execute(serde_json::json!({
                "operation": "create",
                "path": path.to_string_lossy(),
                "content": "new"
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_protected_path_rejected() {
        let err = tool()
            .execute(serde_json::json!({"operation": "delete", "path": "/etc/hosts"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_sensitive_file_write_blocked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");

        let err = tool()
            .execute(serde_json::json!({
                "operation": "create",
                "path": path.to_string_lossy(),
                "content": "SECRET=1"
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
    }
}

//! App control tool — structured desktop automation
//!
//! Translates high-level actions (open, focus, close, steps) into
//! [`ActionStep`] sequences and forwards them to the injected driver.
//! How steps are physically performed is the driver's concern.

use crate::actions::{ActionStep, AutomationDriver};
use crate::error::{Error, Result};
use crate::registry::{Tool, ToolDefinition, ToolResult};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Tool for controlling desktop applications
pub struct AppControlTool {
    definition: ToolDefinition,
    driver: Arc<dyn AutomationDriver>,
}

impl AppControlTool {
    /// Create a new app control tool with the given automation driver
    #[must_use]
    pub fn new(driver: Arc<dyn AutomationDriver>) -> Self {
        let definition = ToolDefinition::new(
            "app_control",
            "Control desktop applications through structured automation steps. \
             Actions: open (launch an app), focus (bring to front), close (quit an app), \
             steps (perform raw click/type/key_combo/wait/drag/scroll steps).",
        )
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["open", "focus", "close", "steps"],
                    "description": "Action to perform"
                },
                "app": {
                    "type": "string",
                    "description": "Application name (for open/focus/close)"
                },
                "steps": {
                    "type": "array",
                    "description": "Raw action steps (for the steps action)"
                }
            },
            "required": ["action"]
        }));

        Self { definition, driver }
    }

    /// Build the step sequence for a named action
    fn build_steps(action: &str, app: Option<&str>, raw: Option<&serde_json::Value>) -> Result<Vec<ActionStep>> {
        match action {
            "open" => {
                let app = app.ok_or_else(|| {
                    Error::InvalidInput("Missing 'app' parameter for open".to_string())
                })?;
                // Launcher flow: open the system launcher, type the app name, confirm
                Ok(vec![
                    ActionStep::KeyCombo {
                        keys: vec!["super".to_string()],
                    },
                    ActionStep::Wait { ms: 300 },
                    ActionStep::Type {
                        text: app.to_string(),
                    },
                    ActionStep::Wait { ms: 300 },
                    ActionStep::KeyCombo {
                        keys: vec!["enter".to_string()],
                    },
                ])
            }
            "focus" => {
                let app = app.ok_or_else(|| {
                    Error::InvalidInput("Missing 'app' parameter for focus".to_string())
                })?;
                Ok(vec![
                    ActionStep::KeyCombo {
                        keys: vec!["super".to_string()],
                    },
                    ActionStep::Type {
                        text: app.to_string(),
                    },
                    ActionStep::KeyCombo {
                        keys: vec!["enter".to_string()],
                    },
                ])
            }
            "close" => Ok(vec![ActionStep::KeyCombo {
                keys: vec!["alt".to_string(), "f4".to_string()],
            }]),
            "steps" => {
                let raw = raw.ok_or_else(|| {
                    Error::InvalidInput("Missing 'steps' parameter".to_string())
                })?;
                serde_json::from_value(raw.clone())
                    .map_err(|e| Error::InvalidInput(format!("Invalid steps: {}", e)))
            }
            other => Err(Error::InvalidInput(format!(
                "Unknown app_control action: '{}'",
                other
            ))),
        }
    }
}

#[async_trait::async_trait]
impl Tool for AppControlTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolResult> {
        let start = Instant::now();

        let action = input
            .get("action")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::InvalidInput("Missing 'action' parameter".to_string()))?;
        let app = input.get("app").and_then(|v| v.as_str());
        let steps = Self::build_steps(action, app, input.get("steps"))?;

        debug!(action = %action, driver = %self.driver.name(), steps = steps.len(), "Performing app control");

        let outcome = self.driver.perform(&steps).await?;
        let duration = start.elapsed().as_millis() as u64;

        if outcome.success {
            Ok(ToolResult::success(
                serde_json::json!({
                    "action": action,
                    "app": app,
                    "steps_performed": steps.len(),
                }),
                duration,
            ))
        } else {
            Ok(ToolResult::failure(
                outcome
                    .error
                    .unwrap_or_else(|| "automation driver failed".to_string()),
                duration,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::NoopDriver;

    #[tokio::test]
    async fn test_open_action() {
        let tool = AppControlTool::new(Arc::new(NoopDriver));
        let result = tool
            .execute(serde_json::json!({"action": "open", "app": "gedit"}))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output["steps_performed"], 5);
    }

    #[tokio::test]
    async fn test_open_requires_app() {
        let tool = AppControlTool::new(Arc::new(NoopDriver));
        let err = tool
            .execute(serde_json::json!({"action": "open"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_raw_steps() {
        let tool = AppControlTool::new(Arc::new(NoopDriver));
        let result = tool
            .execute(serde_json::json!({
                "action": "steps",
                "steps": [{"step": "click", "x": 10, "y": 20}, {"step": "wait", "ms": 50}]
            }))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output["steps_performed"], 2);
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let tool = AppControlTool::new(Arc::new(NoopDriver));
        assert!(tool
            .execute(serde_json::json!({"action": "explode"}))
            .await
            .is_err());
    }
}

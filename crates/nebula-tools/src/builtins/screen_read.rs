//! Screen reading tool — delegates to a vision-capable model

use crate::error::{Error, Result};
use crate::registry::{Tool, ToolDefinition, ToolResult};
use nebula_llm::{ImageData, PerceptionCapability};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Tool that describes screenshots via a perception capability
pub struct ScreenReadTool {
    definition: ToolDefinition,
    perception: Arc<dyn PerceptionCapability>,
}

impl ScreenReadTool {
    /// Create a new screen read tool backed by the given perception provider
    #[must_use]
    pub fn new(perception: Arc<dyn PerceptionCapability>) -> Self {
        let definition = ToolDefinition::new(
            "screen_read",
            "Describe what is visible in one or more screenshots. Images \
             are passed as base64-encoded PNG data.",
        )
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "What to look for or describe"
                },
                "images": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Base64-encoded PNG screenshots"
                }
            },
            "required": ["prompt", "images"]
        }));

        Self {
            definition,
            perception,
        }
    }
}

#[async_trait::async_trait]
impl Tool for ScreenReadTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolResult> {
        let start = Instant::now();

        let prompt = input
            .get("prompt")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::InvalidInput("Missing 'prompt' parameter".to_string()))?;

        let images: Vec<ImageData> = input
            .get("images")
            .and_then(|v| v.as_array())
            .ok_or_else(|| Error::InvalidInput("Missing 'images' parameter".to_string()))?
            .iter()
            .filter_map(|v| v.as_str())
            .map(ImageData::png)
            .collect();

        if images.is_empty() {
            return Err(Error::InvalidInput(
                "At least one image is required".to_string(),
            ));
        }

        debug!(provider = %self.perception.name(), count = images.len(), "Describing screen");

        let description = self.perception.describe(prompt, &images).await?;
        let duration = start.elapsed().as_millis() as u64;

        Ok(ToolResult::success(
            serde_json::json!({"description": description}),
            duration,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_llm::Result as LlmResult;

    struct FakePerception;

    #[async_trait::async_trait]
    impl PerceptionCapability for FakePerception {
        fn name(&self) -> &str {
            "fake"
        }

        async fn describe(&self, prompt: &str, images: &[ImageData]) -> LlmResult<String> {
            Ok(format!("{} ({} images)", prompt, images.len()))
        }
    }

    #[tokio::test]
    async fn test_describe_delegates_to_provider() {
        let tool = ScreenReadTool::new(Arc::new(FakePerception));
        let result = tool
            .execute(serde_json::json!({
                "prompt": "what app is open",
                "images": ["aGVsbG8="]
            }))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(
            result.output["description"].as_str().unwrap(),
            "what app is open (1 images)"
        );
    }

    #[tokio::test]
    async fn test_no_images_rejected() {
        let tool = ScreenReadTool::new(Arc::new(FakePerception));
        let err = tool
            .execute(serde_json::json!({"prompt": "x", "images": []}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}

//! Web search tool — delegates to a search capability

use crate::error::{Error, Result};
use crate::registry::{Tool, ToolDefinition, ToolResult};
use nebula_llm::{Recency, SearchCapability};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Tool that performs live web searches
pub struct WebSearchTool {
    definition: ToolDefinition,
    search: Arc<dyn SearchCapability>,
}

impl WebSearchTool {
    /// Create a new web search tool backed by the given search provider
    #[must_use]
    pub fn new(search: Arc<dyn SearchCapability>) -> Self {
        let definition = ToolDefinition::new(
            "web_search",
            "Search the web for current information. Use the 'recency' \
             parameter to restrict results to the last day, week, or month.",
        )
        .with_parameters(serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query"
                },
                "recency": {
                    "type": "string",
                    "enum": ["day", "week", "month"],
                    "description": "Restrict results by publication age (optional)"
                }
            },
            "required": ["query"]
        }));

        Self { definition, search }
    }
}

fn parse_recency(value: &str) -> Result<Recency> {
    match value {
        "day" => Ok(Recency::Day),
        "week" => Ok(Recency::Week),
        "month" => Ok(Recency::Month),
        other => Err(Error::InvalidInput(format!(
            "Invalid recency '{}', expected day, week, or month",
            other
        ))),
    }
}

#[async_trait::async_trait]
impl Tool for WebSearchTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, input: serde_json::Value) -> Result<ToolResult> {
        let start = Instant::now();

        let query = input
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::InvalidInput("Missing 'query' parameter".to_string()))?;

        if query.trim().is_empty() {
            return Err(Error::InvalidInput("Query must not be empty".to_string()));
        }

        let recency = input
            .get("recency")
            .and_then(|v| v.as_str())
            .map(parse_recency)
            .transpose()?;

        debug!(provider = %self.search.name(), query = %query, "Searching the web");

        let results = self.search.search(query, recency).await?;
        let duration = start.elapsed().as_millis() as u64;

        Ok(ToolResult::success(
            serde_json::json!({"results": results}),
            duration,
        ))
    }
}

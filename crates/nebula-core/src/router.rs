//! Capability router
//!
//! Keyword-heuristic routing of a task description to a capability. Rules
//! are evaluated in a fixed priority order; ties resolve to the default
//! reasoning capability. An explicit `target_capability` on a subtask
//! always overrides the router.

use serde::{Deserialize, Serialize};

/// Keywords implying the task needs to see the screen
const VISUAL_KEYWORDS: &[&str] = &[
    "screen",
    "screenshot",
    "see",
    "look",
    "visible",
    "display",
    "window",
    "image",
    "picture",
    "ui",
    "button",
    "icon",
];

/// Keywords implying the task needs live information
const RECENCY_KEYWORDS: &[&str] = &[
    "latest", "current", "today", "news", "weather", "now", "recent", "price", "stock",
];

/// Keywords implying an action or coding task
const ACTION_KEYWORDS: &[&str] = &[
    "code", "file", "create", "modify", "run", "debug", "fix", "write", "script", "install",
];

/// Which external capability should handle a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityTarget {
    /// Vision model over screen captures
    Perception,
    /// Real-time web search
    LiveSearch,
    /// General reasoning and coding
    Reasoning,
}

/// Context flags the router consults beyond the description text
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteContext {
    /// The request carries one or more images
    pub has_images: bool,
}

/// Route a task description to a capability. Pure function of text plus
/// context flags.
#[must_use]
pub fn route(description: &str, context: &RouteContext) -> CapabilityTarget {
    let text = description.to_lowercase();

    if context.has_images || contains_any(&text, VISUAL_KEYWORDS) {
        CapabilityTarget::Perception
    } else if contains_any(&text, RECENCY_KEYWORDS) {
        CapabilityTarget::LiveSearch
    } else if contains_any(&text, ACTION_KEYWORDS) {
        CapabilityTarget::Reasoning
    } else {
        CapabilityTarget::Reasoning
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|word| keywords.contains(&word))
}

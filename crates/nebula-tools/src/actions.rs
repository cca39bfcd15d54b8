//! Structured automation steps for desktop control
//!
//! The orchestration core never knows how an action is physically
//! performed — it hands a sequence of typed steps to an injected
//! [`AutomationDriver`]. Host applications supply a platform driver;
//! tests and headless deployments use [`NoopDriver`].

use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One structured automation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ActionStep {
    /// Click at screen coordinates
    Click {
        /// X coordinate
        x: i32,
        /// Y coordinate
        y: i32,
    },
    /// Type text into the focused element
    Type {
        /// Text to type
        text: String,
    },
    /// Press a key combination (e.g. ["ctrl", "s"])
    KeyCombo {
        /// Keys pressed together
        keys: Vec<String>,
    },
    /// Wait before the next step
    Wait {
        /// Delay in milliseconds
        ms: u64,
    },
    /// Drag from one point to another
    Drag {
        /// Start coordinates
        from: (i32, i32),
        /// End coordinates
        to: (i32, i32),
    },
    /// Scroll by the given deltas
    Scroll {
        /// Horizontal delta
        dx: i32,
        /// Vertical delta
        dy: i32,
    },
}

/// Outcome of driving a step sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveOutcome {
    /// Whether all steps completed
    pub success: bool,
    /// Error message if a step failed
    pub error: Option<String>,
}

/// Trait for automation backends that physically perform action steps
#[async_trait::async_trait]
pub trait AutomationDriver: Send + Sync {
    /// Driver name (for logging)
    fn name(&self) -> &str;

    /// Perform a sequence of steps in order
    async fn perform(&self, steps: &[ActionStep]) -> Result<DriveOutcome>;
}

/// Driver that logs steps without touching the host desktop.
///
/// Useful for dry runs, tests, and headless deployments where no display
/// server is available.
#[derive(Debug, Default)]
pub struct NoopDriver;

#[async_trait::async_trait]
impl AutomationDriver for NoopDriver {
    fn name(&self) -> &str {
        "noop"
    }

    async fn perform(&self, steps: &[ActionStep]) -> Result<DriveOutcome> {
        for step in steps {
            debug!(?step, "noop driver: step skipped");
        }
        Ok(DriveOutcome {
            success: true,
            error: None,
        })
    }
}

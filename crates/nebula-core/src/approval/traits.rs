use super::types::ApprovalRequest;
use crate::error::Result;

/// A yes/no decision source for plan approval.
///
/// Implementations carry the transport (CLI prompt, UI dialog, remote
/// callback); the gate only sees a single-shot boolean. Responders are
/// injected into the gate explicitly, never looked up globally.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ApprovalResponder: Send + Sync {
    /// Present the request and return the decision.
    ///
    /// # Errors
    /// Any error is treated as a denial by the gate.
    async fn respond(&self, request: &ApprovalRequest) -> Result<bool>;
}

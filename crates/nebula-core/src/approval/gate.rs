use super::traits::ApprovalResponder;
use super::types::{ApprovalRequest, ApprovalStatus};
use crate::config::ApprovalConfig;
use crate::plan::ExecutionPlan;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// The single suspension point in the pipeline.
///
/// Fail closed: no responder, a responder error, and a timeout all
/// resolve to denial. Nothing executes while a decision is pending.
pub struct ApprovalGate {
    responder: Option<Arc<dyn ApprovalResponder>>,
    timeout: Duration,
    timeout_secs: u64,
}

impl ApprovalGate {
    /// Create a gate with no responder. Every request is denied.
    #[must_use]
    pub fn new(config: &ApprovalConfig) -> Self {
        Self {
            responder: None,
            timeout: Duration::from_secs(config.timeout_secs),
            timeout_secs: config.timeout_secs,
        }
    }

    /// Attach a responder
    #[must_use]
    pub fn with_responder(mut self, responder: Arc<dyn ApprovalResponder>) -> Self {
        self.responder = Some(responder);
        self
    }

    /// Ask for approval of a whole plan. Returns `true` only on an
    /// explicit, in-time "yes".
    pub async fn request_approval(&self, plan: &ExecutionPlan) -> bool {
        let Some(responder) = &self.responder else {
            warn!(plan_id = %plan.id, "No approval responder registered, denying plan");
            return false;
        };

        let mut request = ApprovalRequest::new(
            plan.id,
            plan.summary(),
            format!("aggregate risk: {:?}", plan.risk_level),
            self.timeout_secs,
        );

        info!(plan_id = %plan.id, request_id = %request.id, "Requesting plan approval");

        match tokio::time::timeout(self.timeout, responder.respond(&request)).await {
            Ok(Ok(true)) => {
                request.status = ApprovalStatus::Approved;
                info!(request_id = %request.id, "Plan approved");
                true
            }
            Ok(Ok(false)) => {
                request.status = ApprovalStatus::Rejected;
                info!(request_id = %request.id, "Plan rejected");
                false
            }
            Ok(Err(e)) => {
                request.status = ApprovalStatus::Rejected;
                warn!(request_id = %request.id, error = %e, "Responder failed, denying plan");
                false
            }
            Err(_) => {
                request.expire();
                warn!(request_id = %request.id, "Approval timed out, denying plan");
                false
            }
        }
    }
}

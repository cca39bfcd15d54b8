use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of an approval request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    /// Waiting for the responder's decision
    Pending,
    /// Responder approved the plan
    Approved,
    /// Responder rejected the plan
    Rejected,
    /// Request expired without a response
    Expired,
}

/// A pending plan-approval request handed to a responder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Unique request ID
    pub id: Uuid,
    /// Plan this request gates
    pub plan_id: Uuid,
    /// One-line plan summary shown to the responder
    pub summary: String,
    /// Why approval is being asked for
    pub risk_description: String,
    /// Current status
    pub status: ApprovalStatus,
    /// When the request was created
    pub created_at: DateTime<Utc>,
    /// When the request expires
    pub expires_at: DateTime<Utc>,
}

impl ApprovalRequest {
    /// Create a new pending request
    #[must_use]
    pub fn new(
        plan_id: Uuid,
        summary: impl Into<String>,
        risk_description: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            plan_id,
            summary: summary.into(),
            risk_description: risk_description.into(),
            status: ApprovalStatus::Pending,
            created_at: now,
            expires_at: now + Duration::seconds(timeout_secs as i64),
        }
    }

    /// Check if the request has expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Mark the request expired. An expired request counts as a denial.
    pub fn expire(&mut self) {
        if self.status == ApprovalStatus::Pending {
            self.status = ApprovalStatus::Expired;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_is_pending() {
        let request = ApprovalRequest::new(Uuid::new_v4(), "plan", "medium risk", 300);
        assert_eq!(request.status, ApprovalStatus::Pending);
        assert!(!request.is_expired());
    }

    #[test]
    fn test_zero_timeout_expires_immediately() {
        let request = ApprovalRequest::new(Uuid::new_v4(), "plan", "medium risk", 0);
        assert!(request.is_expired());
    }

    #[test]
    fn test_expire_only_touches_pending() {
        let mut request = ApprovalRequest::new(Uuid::new_v4(), "plan", "high risk", 300);
        request.status = ApprovalStatus::Approved;
        request.expire();
        assert_eq!(request.status, ApprovalStatus::Approved);

        request.status = ApprovalStatus::Pending;
        request.expire();
        assert_eq!(request.status, ApprovalStatus::Expired);
    }
}

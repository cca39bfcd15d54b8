//! Approval gate
//!
//! Plan execution pauses here for an external yes/no decision. The gate
//! is transport-agnostic; responders are injected and the gate fails
//! closed on every abnormal path.

mod gate;
mod traits;
mod types;

pub use gate::ApprovalGate;
pub use traits::ApprovalResponder;
pub use types::{ApprovalRequest, ApprovalStatus};

#[cfg(test)]
pub(crate) use traits::MockApprovalResponder;

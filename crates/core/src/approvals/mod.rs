use serde::{Deserialize, Serialize};

use crate::domain::booking::BookingStatus;
use crate::session::Role;

pub const DEFAULT_REJECTION_REMARK: &str = "No reason provided";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalCheckInput {
    pub approver_user_id: String,
    pub approver_role: Role,
    pub booking_status: BookingStatus,
    pub requested_by: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApprovalCheckFailure {
    RoleNotPermitted { approver_role: Role },
    BookingNotPending { booking_status: BookingStatus },
    SelfApproval { user_id: String },
}

impl ApprovalCheckFailure {
    fn reason(&self) -> String {
        match self {
            Self::RoleNotPermitted { approver_role } => {
                format!("role `{}` may not decide booking requests", approver_role.as_str())
            }
            Self::BookingNotPending { booking_status } => {
                format!(
                    "booking is `{}`; only requested bookings can be decided",
                    booking_status.as_str()
                )
            }
            Self::SelfApproval { user_id } => {
                format!("`{user_id}` cannot decide their own booking request")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalCheckResult {
    pub allowed: bool,
    pub reason: String,
    pub failure: Option<ApprovalCheckFailure>,
}

impl ApprovalCheckResult {
    fn allow(reason: impl Into<String>) -> Self {
        Self { allowed: true, reason: reason.into(), failure: None }
    }

    fn deny(failure: ApprovalCheckFailure) -> Self {
        Self { allowed: false, reason: failure.reason(), failure: Some(failure) }
    }
}

/// Gatekeeper for the approve/reject decision on a booking request.
#[derive(Clone, Debug, Default)]
pub struct ApprovalGate;

impl ApprovalGate {
    pub fn check(&self, input: &ApprovalCheckInput) -> ApprovalCheckResult {
        if !input.approver_role.can_decide_bookings() {
            return ApprovalCheckResult::deny(ApprovalCheckFailure::RoleNotPermitted {
                approver_role: input.approver_role,
            });
        }

        if input.booking_status != BookingStatus::Requested {
            return ApprovalCheckResult::deny(ApprovalCheckFailure::BookingNotPending {
                booking_status: input.booking_status,
            });
        }

        if input.approver_user_id == input.requested_by {
            return ApprovalCheckResult::deny(ApprovalCheckFailure::SelfApproval {
                user_id: input.approver_user_id.clone(),
            });
        }

        ApprovalCheckResult::allow(format!(
            "approver `{}` may decide this request",
            input.approver_user_id
        ))
    }
}

/// The remark persisted with a denial; blank input falls back on the default.
pub fn rejection_remark(remark: Option<String>) -> String {
    match remark {
        Some(remark) if !remark.trim().is_empty() => remark,
        _ => DEFAULT_REJECTION_REMARK.to_owned(),
    }
}

use serde::{Deserialize, Serialize};

use crate::domain::booking::BookingStatus;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingEvent {
    ApprovalGranted,
    ApprovalDenied,
    StockUnavailable,
    AllocationCompleted,
    RetryRequested,
    CancelRequested,
}

/// Side effects the caller must run after a transition commits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingAction {
    ResolveStock,
    BindChassis,
    RecordRejection,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FlowContext {
    /// Who granted or denied the approval that triggered the event.
    pub approver: Option<String>,
    /// The unit being bound on allocation events.
    pub chassis_number: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub event: BookingEvent,
    pub actions: Vec<BookingAction>,
}

use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::booking::BookingStatus;
use crate::flows::states::{BookingAction, BookingEvent, FlowContext, TransitionOutcome};

pub trait FlowDefinition {
    fn initial_state(&self) -> BookingStatus;
    fn transition(
        &self,
        current: BookingStatus,
        event: BookingEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

#[derive(Clone, Debug, Default)]
pub struct BookingFlow;

impl FlowDefinition for BookingFlow {
    fn initial_state(&self) -> BookingStatus {
        BookingStatus::Requested
    }

    fn transition(
        &self,
        current: BookingStatus,
        event: BookingEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_booking(current, event, context)
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_state(&self) -> BookingStatus {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: BookingStatus,
        event: BookingEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event, context)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: BookingStatus,
        event: BookingEvent,
        context: &FlowContext,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>
    where
        S: AuditSink,
    {
        let result = self.apply(current, event, context);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        audit.booking_id.clone(),
                        audit.correlation_id.clone(),
                        "flow.transition_applied",
                        AuditCategory::Flow,
                        audit.actor.clone(),
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", outcome.from.as_str())
                    .with_metadata("to", outcome.to.as_str())
                    .with_metadata("event", format!("{:?}", outcome.event)),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit.booking_id.clone(),
                        audit.correlation_id.clone(),
                        "flow.transition_rejected",
                        AuditCategory::Flow,
                        audit.actor.clone(),
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

impl Default for FlowEngine<BookingFlow> {
    fn default() -> Self {
        Self::new(BookingFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("missing `{field}` before transition from {state:?}")]
    MissingContext { state: BookingStatus, field: &'static str },
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: BookingStatus, event: BookingEvent },
}

fn transition_booking(
    current: BookingStatus,
    event: BookingEvent,
    context: &FlowContext,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use BookingAction::{BindChassis, RecordRejection, ResolveStock};
    use BookingEvent::{
        AllocationCompleted, ApprovalDenied, ApprovalGranted, CancelRequested, RetryRequested,
        StockUnavailable,
    };
    use BookingStatus::{Cancelled, Confirmed, InProgress, Rejected, Requested};

    let (to, actions) = match (current, event) {
        (Requested, ApprovalGranted) => {
            if context.approver.is_none() {
                return Err(FlowTransitionError::MissingContext {
                    state: current,
                    field: "approver",
                });
            }
            (Confirmed, vec![ResolveStock])
        }
        (Requested, ApprovalDenied) => {
            if context.approver.is_none() {
                return Err(FlowTransitionError::MissingContext {
                    state: current,
                    field: "approver",
                });
            }
            (Rejected, vec![RecordRejection])
        }
        (Confirmed, StockUnavailable) => (InProgress, Vec::new()),
        (InProgress, AllocationCompleted) => {
            if context.chassis_number.is_none() {
                return Err(FlowTransitionError::MissingContext {
                    state: current,
                    field: "chassis_number",
                });
            }
            (Confirmed, vec![BindChassis])
        }
        (InProgress, RetryRequested) => (InProgress, vec![ResolveStock]),
        (Confirmed, CancelRequested) | (InProgress, CancelRequested) => (Cancelled, Vec::new()),
        _ => {
            return Err(FlowTransitionError::InvalidTransition { state: current, event });
        }
    };

    Ok(TransitionOutcome { from: current, to, event, actions })
}

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use showroom_core::approvals::{rejection_remark, ApprovalCheckInput, ApprovalGate};
use showroom_core::audit::{AuditCategory, AuditEvent, AuditOutcome};
use showroom_core::domain::booking::{Booking, BookingId, BookingStatus, PaymentInputs};
use showroom_core::domain::quotation::QuotationId;
use showroom_core::domain::stock::{Resolution, StockQuery, StockSnapshot, StockUnit};
use showroom_core::errors::{ApplicationError, DomainError};
use showroom_core::flows::{BookingEvent, BookingFlow, FlowContext, FlowEngine};
use showroom_core::session::ActorContext;
use showroom_db::repositories::{
    AuditRepository, BookingInsert, BookingRepository, ChassisAllocation, QuotationRepository,
    StockRepository,
};

use crate::persistence;

/// The dealer identity snapshots are computed against.
#[derive(Clone, Debug)]
pub struct DealerIdentity {
    pub dealer_code: String,
    pub zone: String,
}

/// Result of a booking submission. A resubmission against a quotation with a
/// live booking reports that booking instead of creating a second one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(Booking),
    Existing(Booking),
}

impl SubmitOutcome {
    pub fn booking(&self) -> &Booking {
        match self {
            Self::Created(booking) | Self::Existing(booking) => booking,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Existing(booking) => match booking.status {
                BookingStatus::Confirmed => "existing_confirmed",
                BookingStatus::InProgress => "existing_inprogress",
                _ => "existing_requested",
            },
        }
    }
}

/// Result of stock resolution after an approval or retry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveOutcome {
    Allocated { booking: Booking, chassis_number: String },
    /// Vehicle not available in the dealer pool. Outer-pool counts are
    /// informational only.
    Vna { booking: Booking, zonal: usize, plant: usize },
}

impl ResolveOutcome {
    pub fn booking(&self) -> &Booking {
        match self {
            Self::Allocated { booking, .. } | Self::Vna { booking, .. } => booking,
        }
    }
}

/// Booking lifecycle orchestration: submission, the approval decision,
/// stock resolution and manual allocation, cancellation. Every state change
/// is persisted and leaves an audit event.
pub struct BookingService<B, Q, S, A> {
    bookings: Arc<B>,
    quotations: Arc<Q>,
    stock: Arc<S>,
    audit: Arc<A>,
    flow: FlowEngine<BookingFlow>,
    gate: ApprovalGate,
    dealer: DealerIdentity,
}

impl<B, Q, S, A> BookingService<B, Q, S, A>
where
    B: BookingRepository,
    Q: QuotationRepository,
    S: StockRepository,
    A: AuditRepository,
{
    pub fn new(
        bookings: Arc<B>,
        quotations: Arc<Q>,
        stock: Arc<S>,
        audit: Arc<A>,
        dealer: DealerIdentity,
    ) -> Self {
        Self {
            bookings,
            quotations,
            stock,
            audit,
            flow: FlowEngine::default(),
            gate: ApprovalGate,
            dealer,
        }
    }

    pub async fn stock_snapshot(
        &self,
        query: &StockQuery,
    ) -> Result<StockSnapshot, ApplicationError> {
        self.stock
            .snapshot(query, &self.dealer.dealer_code, &self.dealer.zone)
            .await
            .map_err(persistence)
    }

    /// Idempotent per quotation: when a live booking already exists, the
    /// caller observes it rather than a failure or a second row.
    pub async fn submit_booking_request(
        &self,
        actor: &ActorContext,
        quotation_id: &QuotationId,
        payment: PaymentInputs,
    ) -> Result<SubmitOutcome, ApplicationError> {
        let quotation = self
            .quotations
            .find_by_id(quotation_id)
            .await
            .map_err(persistence)?
            .ok_or_else(|| {
                ApplicationError::from(DomainError::validation(
                    "quotation_id",
                    format!("`{}` not found", quotation_id.0),
                ))
            })?;

        if let Some(existing) =
            self.bookings.find_active_for_quotation(quotation_id).await.map_err(persistence)?
        {
            return Ok(SubmitOutcome::Existing(existing));
        }

        let booking = Booking::request(
            BookingId(Uuid::new_v4().to_string()),
            &quotation,
            payment,
            actor.user_id.clone(),
        )?;

        match self.bookings.insert(&booking).await.map_err(persistence)? {
            BookingInsert::Created => {
                self.record(
                    actor,
                    Some(booking.id.clone()),
                    "booking.requested",
                    AuditCategory::Flow,
                    AuditOutcome::Success,
                    &[("quotation_id", quotation_id.0.as_str())],
                )
                .await?;
                info!(
                    event_name = "booking.requested",
                    correlation_id = %actor.correlation_id,
                    booking_id = %booking.id.0,
                    quotation_id = %quotation_id.0,
                );
                Ok(SubmitOutcome::Created(booking))
            }
            // Lost the race against a concurrent submission; surface the row
            // that won.
            BookingInsert::DuplicateActive => {
                let existing = self
                    .bookings
                    .find_active_for_quotation(quotation_id)
                    .await
                    .map_err(persistence)?
                    .ok_or_else(|| {
                        ApplicationError::Conflict(format!(
                            "active booking for quotation `{}` disappeared mid-submit",
                            quotation_id.0
                        ))
                    })?;
                Ok(SubmitOutcome::Existing(existing))
            }
        }
    }

    /// Approve a requested booking, then resolve stock immediately: a free
    /// dealer-pool unit confirms with a bound chassis, otherwise the booking
    /// parks in `InProgress` (VNA).
    pub async fn approve_booking(
        &self,
        actor: &ActorContext,
        booking_id: &BookingId,
    ) -> Result<ResolveOutcome, ApplicationError> {
        let mut booking = self.find_required(booking_id).await?;
        self.check_gate(actor, &booking).await?;

        let context = FlowContext { approver: Some(actor.user_id.clone()), chassis_number: None };
        let outcome = self
            .flow
            .apply(booking.status, BookingEvent::ApprovalGranted, &context)
            .map_err(DomainError::from)?;
        booking.transition_to(outcome.to)?;
        booking.approved_by = Some(actor.user_id.clone());
        self.bookings.update(&booking).await.map_err(persistence)?;
        self.record_transition(actor, &booking, "requested", "confirmed").await?;

        self.resolve_stock(actor, booking).await
    }

    /// Deny a requested booking. A blank remark falls back on the default.
    pub async fn reject_booking(
        &self,
        actor: &ActorContext,
        booking_id: &BookingId,
        remark: Option<String>,
    ) -> Result<Booking, ApplicationError> {
        let mut booking = self.find_required(booking_id).await?;
        self.check_gate(actor, &booking).await?;

        let context = FlowContext { approver: Some(actor.user_id.clone()), chassis_number: None };
        let outcome = self
            .flow
            .apply(booking.status, BookingEvent::ApprovalDenied, &context)
            .map_err(DomainError::from)?;
        booking.transition_to(outcome.to)?;
        booking.rejection_remark = Some(rejection_remark(remark));
        self.bookings.update(&booking).await.map_err(persistence)?;
        self.record_transition(actor, &booking, "requested", "rejected").await?;

        info!(
            event_name = "booking.rejected",
            correlation_id = %actor.correlation_id,
            booking_id = %booking.id.0,
        );
        Ok(booking)
    }

    /// Cancel a confirmed or in-progress booking. A chassis bound to the
    /// booking stays bound; releasing it is an inventory-side decision.
    pub async fn cancel_booking(
        &self,
        actor: &ActorContext,
        booking_id: &BookingId,
    ) -> Result<Booking, ApplicationError> {
        let mut booking = self.find_required(booking_id).await?;

        let from = booking.status;
        let outcome = self
            .flow
            .apply(booking.status, BookingEvent::CancelRequested, &FlowContext::default())
            .map_err(DomainError::from)?;
        booking.transition_to(outcome.to)?;
        self.bookings.update(&booking).await.map_err(persistence)?;
        self.record_transition(actor, &booking, from.as_str(), "cancelled").await?;

        info!(
            event_name = "booking.cancelled",
            correlation_id = %actor.correlation_id,
            booking_id = %booking.id.0,
        );
        Ok(booking)
    }

    /// Manually bind a specific chassis to an in-progress booking. The
    /// compare-and-set on the stock unit makes exactly one of two concurrent
    /// attempts win; the loser learns who holds the unit.
    pub async fn allocate_vehicle(
        &self,
        actor: &ActorContext,
        booking_id: &BookingId,
        chassis_number: &str,
        color: &str,
        remark: Option<String>,
    ) -> Result<Booking, ApplicationError> {
        let mut booking = self.find_required(booking_id).await?;

        let context = FlowContext {
            approver: None,
            chassis_number: Some(chassis_number.to_string()),
        };
        let outcome = self
            .flow
            .apply(booking.status, BookingEvent::AllocationCompleted, &context)
            .map_err(DomainError::from)?;

        match self.stock.try_allocate(chassis_number, booking_id).await.map_err(persistence)? {
            ChassisAllocation::Allocated => {}
            // A unit already held by this booking means an earlier attempt
            // won the compare-and-set but was interrupted before the booking
            // row advanced; re-binding it is idempotent.
            ChassisAllocation::AlreadyHeld { holder: Some(holder) } if holder == *booking_id => {}
            ChassisAllocation::AlreadyHeld { holder } => {
                let holder = holder.map(|id| id.0).unwrap_or_else(|| "unknown".to_string());
                self.record(
                    actor,
                    Some(booking.id.clone()),
                    "stock.allocation_conflict",
                    AuditCategory::Stock,
                    AuditOutcome::Rejected,
                    &[("chassis_number", chassis_number), ("holder", holder.as_str())],
                )
                .await?;
                warn!(
                    event_name = "stock.allocation_conflict",
                    correlation_id = %actor.correlation_id,
                    booking_id = %booking.id.0,
                    chassis_number,
                    holder = %holder,
                );
                return Err(ApplicationError::Conflict(format!(
                    "chassis `{chassis_number}` is already allocated to booking `{holder}`"
                )));
            }
        }

        let from = booking.status;
        booking.transition_to(outcome.to)?;
        booking.bind_chassis(chassis_number, color)?;
        self.bookings.update(&booking).await.map_err(persistence)?;
        self.record_transition(actor, &booking, from.as_str(), outcome.to.as_str()).await?;

        let mut metadata: Vec<(&str, &str)> =
            vec![("chassis_number", chassis_number), ("color", color)];
        if let Some(remark) = remark.as_deref() {
            metadata.push(("remark", remark));
        }
        self.record(
            actor,
            Some(booking.id.clone()),
            "stock.allocation_completed",
            AuditCategory::Stock,
            AuditOutcome::Success,
            &metadata,
        )
        .await?;

        info!(
            event_name = "stock.allocation_completed",
            correlation_id = %actor.correlation_id,
            booking_id = %booking.id.0,
            chassis_number,
        );
        Ok(booking)
    }

    /// Re-run stock resolution for an in-progress booking. Safe to repeat;
    /// proceeds exactly as post-approval resolution when stock has appeared.
    pub async fn retry_booking(
        &self,
        actor: &ActorContext,
        booking_id: &BookingId,
    ) -> Result<ResolveOutcome, ApplicationError> {
        let booking = self.find_required(booking_id).await?;

        // A confirmed booking without a chassis is an interrupted
        // resolution; it may re-run resolution as well.
        let interrupted =
            booking.status == BookingStatus::Confirmed && booking.chassis_number.is_none();
        if !interrupted {
            self.flow
                .apply(booking.status, BookingEvent::RetryRequested, &FlowContext::default())
                .map_err(DomainError::from)?;
        }

        self.resolve_stock(actor, booking).await
    }

    pub async fn find_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<Booking>, ApplicationError> {
        self.bookings.find_by_id(booking_id).await.map_err(persistence)
    }

    async fn resolve_stock(
        &self,
        actor: &ActorContext,
        mut booking: Booking,
    ) -> Result<ResolveOutcome, ApplicationError> {
        // A unit bound by an interrupted earlier resolution takes priority
        // over fresh stock; free snapshots no longer contain it.
        if let Some(unit) =
            self.stock.find_allocated_for_booking(&booking.id).await.map_err(persistence)?
        {
            return self.bind_resolved_unit(actor, booking, unit).await;
        }

        let quotation = self
            .quotations
            .find_by_id(&booking.quotation_id)
            .await
            .map_err(persistence)?
            .ok_or_else(|| {
                ApplicationError::Persistence(format!(
                    "quotation `{}` missing for booking `{}`",
                    booking.quotation_id.0, booking.id.0
                ))
            })?;

        let query = StockQuery {
            year: quotation.vehicle.year,
            model: quotation.vehicle.model.clone(),
            fuel: quotation.vehicle.fuel,
            color: Some(booking.color.clone()),
        };
        let snapshot = self.stock_snapshot(&query).await?;

        if let Resolution::Allocate(unit) = snapshot.resolve() {
            let allocation = self
                .stock
                .try_allocate(&unit.chassis_number, &booking.id)
                .await
                .map_err(persistence)?;
            if allocation == ChassisAllocation::Allocated {
                return self.bind_resolved_unit(actor, booking, unit).await;
            }
            // Lost the unit to a concurrent allocation; fall through to the
            // not-available path.
        }

        let (zonal, plant) = match snapshot.resolve() {
            Resolution::Vna { zonal, plant } => (zonal, plant),
            Resolution::Allocate(_) => (0, 0),
        };

        if booking.status == BookingStatus::Confirmed {
            let outcome = self
                .flow
                .apply(booking.status, BookingEvent::StockUnavailable, &FlowContext::default())
                .map_err(DomainError::from)?;
            let from = booking.status;
            booking.transition_to(outcome.to)?;
            self.bookings.update(&booking).await.map_err(persistence)?;
            self.record_transition(actor, &booking, from.as_str(), outcome.to.as_str()).await?;
        }

        info!(
            event_name = "stock.vna",
            correlation_id = %actor.correlation_id,
            booking_id = %booking.id.0,
            zonal,
            plant,
        );
        Ok(ResolveOutcome::Vna { booking, zonal, plant })
    }

    /// Final leg of resolution once a unit belongs to the booking: step an
    /// InProgress booking back to Confirmed, bind the chassis, persist.
    async fn bind_resolved_unit(
        &self,
        actor: &ActorContext,
        mut booking: Booking,
        unit: StockUnit,
    ) -> Result<ResolveOutcome, ApplicationError> {
        if booking.status == BookingStatus::InProgress {
            let context = FlowContext {
                approver: None,
                chassis_number: Some(unit.chassis_number.clone()),
            };
            let outcome = self
                .flow
                .apply(booking.status, BookingEvent::AllocationCompleted, &context)
                .map_err(DomainError::from)?;
            let from = booking.status;
            booking.transition_to(outcome.to)?;
            self.record_transition(actor, &booking, from.as_str(), outcome.to.as_str()).await?;
        }
        booking.bind_chassis(&unit.chassis_number, &unit.color)?;
        self.bookings.update(&booking).await.map_err(persistence)?;
        self.record(
            actor,
            Some(booking.id.clone()),
            "stock.allocation_completed",
            AuditCategory::Stock,
            AuditOutcome::Success,
            &[("chassis_number", unit.chassis_number.as_str())],
        )
        .await?;
        info!(
            event_name = "stock.allocation_completed",
            correlation_id = %actor.correlation_id,
            booking_id = %booking.id.0,
            chassis_number = %unit.chassis_number,
        );
        Ok(ResolveOutcome::Allocated { chassis_number: unit.chassis_number, booking })
    }

    async fn check_gate(
        &self,
        actor: &ActorContext,
        booking: &Booking,
    ) -> Result<(), ApplicationError> {
        let result = self.gate.check(&ApprovalCheckInput {
            approver_user_id: actor.user_id.clone(),
            approver_role: actor.role,
            booking_status: booking.status,
            requested_by: booking.requested_by.clone(),
        });
        if result.allowed {
            return Ok(());
        }

        self.record(
            actor,
            Some(booking.id.clone()),
            "approval.denied",
            AuditCategory::Approval,
            AuditOutcome::Rejected,
            &[("reason", result.reason.as_str())],
        )
        .await?;
        Err(DomainError::validation("approver", result.reason).into())
    }

    async fn record_transition(
        &self,
        actor: &ActorContext,
        booking: &Booking,
        from: &str,
        to: &str,
    ) -> Result<(), ApplicationError> {
        self.record(
            actor,
            Some(booking.id.clone()),
            "flow.transition_applied",
            AuditCategory::Flow,
            AuditOutcome::Success,
            &[("from", from), ("to", to)],
        )
        .await
    }

    async fn record(
        &self,
        actor: &ActorContext,
        booking_id: Option<BookingId>,
        event_type: &str,
        category: AuditCategory,
        outcome: AuditOutcome,
        metadata: &[(&str, &str)],
    ) -> Result<(), ApplicationError> {
        let mut event = AuditEvent::new(
            booking_id,
            actor.correlation_id.clone(),
            event_type,
            category,
            actor.user_id.clone(),
            outcome,
        );
        for (key, value) in metadata {
            event = event.with_metadata(*key, *value);
        }
        self.audit.append(&event).await.map_err(persistence)
    }

    async fn find_required(&self, id: &BookingId) -> Result<Booking, ApplicationError> {
        self.bookings.find_by_id(id).await.map_err(persistence)?.ok_or_else(|| {
            DomainError::validation("booking_id", format!("`{}` not found", id.0)).into()
        })
    }
}

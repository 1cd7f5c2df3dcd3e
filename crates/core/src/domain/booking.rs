use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quotation::{Quotation, QuotationId};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Requested,
    Confirmed,
    InProgress,
    Rejected,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Confirmed => "confirmed",
            Self::InProgress => "inprogress",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "requested" => Some(Self::Requested),
            "confirmed" => Some(Self::Confirmed),
            "inprogress" => Some(Self::InProgress),
            "rejected" => Some(Self::Rejected),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled)
    }
}

/// Payment details captured at booking-request time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInputs {
    pub amount_paid: Decimal,
    pub order_category: String,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub quotation_id: QuotationId,
    /// User who submitted the request; the approval gate forbids the same
    /// user from deciding it.
    pub requested_by: String,
    pub amount_paid: Decimal,
    pub amount_remaining: Decimal,
    pub order_category: String,
    pub chassis_number: Option<String>,
    pub color: String,
    pub status: BookingStatus,
    pub approved_by: Option<String>,
    pub rejection_remark: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Create a `Requested` booking against a priced quotation. The paid and
    /// remaining amounts must add up to the quotation's grand total.
    pub fn request(
        id: BookingId,
        quotation: &Quotation,
        payment: PaymentInputs,
        requested_by: impl Into<String>,
    ) -> Result<Self, DomainError> {
        if payment.amount_paid < Decimal::ZERO {
            return Err(DomainError::validation("amount_paid", "cannot be negative"));
        }
        let grand_total = quotation.grand_total();
        if payment.amount_paid > grand_total {
            return Err(DomainError::validation(
                "amount_paid",
                format!("exceeds quotation grand total {grand_total}"),
            ));
        }
        if payment.color.trim().is_empty() {
            return Err(DomainError::validation("color", "is required"));
        }

        let now = Utc::now();
        Ok(Self {
            id,
            quotation_id: quotation.id.clone(),
            requested_by: requested_by.into(),
            amount_paid: payment.amount_paid,
            amount_remaining: grand_total - payment.amount_paid,
            order_category: payment.order_category,
            chassis_number: None,
            color: payment.color,
            status: BookingStatus::Requested,
            approved_by: None,
            rejection_remark: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self.status, next),
            (BookingStatus::Requested, BookingStatus::Confirmed)
                | (BookingStatus::Requested, BookingStatus::Rejected)
                | (BookingStatus::Confirmed, BookingStatus::InProgress)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
                | (BookingStatus::InProgress, BookingStatus::Confirmed)
                | (BookingStatus::InProgress, BookingStatus::Cancelled)
        )
    }

    pub fn transition_to(&mut self, next: BookingStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            self.updated_at = Utc::now();
            return Ok(());
        }

        Err(DomainError::InvalidBookingTransition { from: self.status, to: next })
    }

    /// Bind a concrete chassis. Only a `Confirmed` booking may hold one, and
    /// a bound chassis is never replaced.
    pub fn bind_chassis(
        &mut self,
        chassis_number: impl Into<String>,
        color: impl Into<String>,
    ) -> Result<(), DomainError> {
        if self.status != BookingStatus::Confirmed {
            return Err(DomainError::InvariantViolation(format!(
                "chassis can only be bound to a confirmed booking (status is {:?})",
                self.status
            )));
        }
        if let Some(existing) = &self.chassis_number {
            return Err(DomainError::InvariantViolation(format!(
                "booking already holds chassis `{existing}`"
            )));
        }

        let chassis_number = chassis_number.into();
        if chassis_number.trim().is_empty() {
            return Err(DomainError::validation("chassis_number", "is required"));
        }

        self.chassis_number = Some(chassis_number);
        self.color = color.into();
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::catalog::{CatalogKey, Fuel, RtoKind};
    use crate::domain::customer::{CustomerId, CustomerRef};
    use crate::domain::quotation::{
        FinancingMode, InsuranceMode, Quotation, QuotationId, QuoteSelections,
    };
    use crate::errors::DomainError;
    use crate::pricing::discounts::DiscountSelection;
    use crate::pricing::engine::PriceBreakdown;

    use super::{Booking, BookingId, BookingStatus, PaymentInputs};

    fn quotation(grand_total: Decimal) -> Quotation {
        let mut breakdown = PriceBreakdown::zero();
        breakdown.grand_total = grand_total;
        Quotation {
            id: QuotationId("QT-1".to_string()),
            customer: CustomerRef {
                id: CustomerId("C-1".to_string()),
                name: "A. Rao".to_string(),
                phone: "9000000001".to_string(),
            },
            vehicle: CatalogKey {
                year: 2025,
                model: "BALENO".to_string(),
                fuel: Fuel::Petrol,
                variant: "ZXI".to_string(),
            },
            selections: QuoteSelections {
                discounts: DiscountSelection::default(),
                rto_kind: RtoKind::Individual,
                scrap_by_dealer: false,
                insurance_mode: InsuranceMode::Dealer,
                insurance_addons: Vec::new(),
                warranty_tier: None,
                accessories: Vec::new(),
                vas: None,
                financing: FinancingMode::Cash,
            },
            breakdown,
            document: None,
            created_at: Utc::now(),
        }
    }

    fn booking(status: BookingStatus) -> Booking {
        let mut booking = Booking::request(
            BookingId("BK-1".to_string()),
            &quotation(Decimal::new(1_000_000, 0)),
            PaymentInputs {
                amount_paid: Decimal::new(25_000, 0),
                order_category: "retail".to_string(),
                color: "Pearl White".to_string(),
            },
            "U-100",
        )
        .expect("request booking");
        booking.status = status;
        booking
    }

    #[test]
    fn paid_plus_remaining_equals_grand_total_at_creation() {
        let booking = booking(BookingStatus::Requested);
        assert_eq!(
            booking.amount_paid + booking.amount_remaining,
            Decimal::new(1_000_000, 0),
        );
    }

    #[test]
    fn request_rejects_payment_above_grand_total() {
        let error = Booking::request(
            BookingId("BK-2".to_string()),
            &quotation(Decimal::new(10_000, 0)),
            PaymentInputs {
                amount_paid: Decimal::new(20_000, 0),
                order_category: "retail".to_string(),
                color: "Red".to_string(),
            },
            "U-100",
        )
        .expect_err("overpayment should fail");
        assert!(matches!(error, DomainError::Validation { .. }));
    }

    #[test]
    fn terminal_states_permit_no_further_transition() {
        for terminal in [BookingStatus::Rejected, BookingStatus::Cancelled] {
            let booking = booking(terminal);
            for next in [
                BookingStatus::Requested,
                BookingStatus::Confirmed,
                BookingStatus::InProgress,
                BookingStatus::Rejected,
                BookingStatus::Cancelled,
            ] {
                assert!(!booking.can_transition_to(next), "{terminal:?} -> {next:?}");
            }
        }
    }

    #[test]
    fn requested_can_only_confirm_or_reject() {
        let booking = booking(BookingStatus::Requested);
        assert!(booking.can_transition_to(BookingStatus::Confirmed));
        assert!(booking.can_transition_to(BookingStatus::Rejected));
        assert!(!booking.can_transition_to(BookingStatus::Cancelled));
        assert!(!booking.can_transition_to(BookingStatus::InProgress));
    }

    #[test]
    fn chassis_binds_only_to_confirmed_booking() {
        let mut requested = booking(BookingStatus::Requested);
        let error = requested.bind_chassis("MA3ABCD1234", "Red").expect_err("must fail");
        assert!(matches!(error, DomainError::InvariantViolation(_)));

        let mut confirmed = booking(BookingStatus::Confirmed);
        confirmed.bind_chassis("MA3ABCD1234", "Red").expect("bind chassis");
        assert_eq!(confirmed.chassis_number.as_deref(), Some("MA3ABCD1234"));

        let error = confirmed.bind_chassis("MA3ABCD9999", "Red").expect_err("rebind must fail");
        assert!(matches!(error, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn status_round_trips_from_storage_encoding() {
        for status in [
            BookingStatus::Requested,
            BookingStatus::Confirmed,
            BookingStatus::InProgress,
            BookingStatus::Rejected,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
    }
}

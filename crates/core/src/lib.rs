pub mod approvals;
pub mod audit;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod pricing;
pub mod session;

pub use approvals::{
    rejection_remark, ApprovalCheckFailure, ApprovalCheckInput, ApprovalCheckResult, ApprovalGate,
    DEFAULT_REJECTION_REMARK,
};
pub use audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
pub use catalog::{
    is_premium_suv, AccessoryItem, CatalogKey, CatalogRow, DiscountAmounts, Fuel, InsuranceAddOn,
    RtoKind, VasOption, WarrantyTier,
};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::booking::{Booking, BookingId, BookingStatus, PaymentInputs};
pub use domain::customer::{CustomerId, CustomerRef};
pub use domain::quotation::{
    DocumentRef, FinancingMode, InsuranceMode, Quotation, QuotationId, QuoteSelections,
};
pub use domain::stock::{Resolution, StockPool, StockQuery, StockSnapshot, StockUnit};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{
    BookingAction, BookingEvent, BookingFlow, FlowContext, FlowDefinition, FlowEngine,
    FlowTransitionError, TransitionOutcome,
};
pub use pricing::{
    available_categories, compute_total_discount, price_list_extra_tax, price_with_trace,
    CorporateOfferKind, DeterministicPricingEngine, DiscountCategory, DiscountContext,
    DiscountSelection, LoyaltyKind, PriceBreakdown, PricingEngine, PricingOutcome, PricingTrace,
    PricingTraceStep,
};
pub use session::{ActorContext, Role};

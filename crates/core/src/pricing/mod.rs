pub mod discounts;
pub mod engine;

pub use discounts::{
    available_categories, compute_total_discount, CorporateOfferKind, DiscountCategory,
    DiscountContext, DiscountSelection, LoyaltyKind,
};
pub use engine::{
    price_list_extra_tax, price_with_trace, DeterministicPricingEngine, PriceBreakdown,
    PricingEngine, PricingOutcome, PricingTrace, PricingTraceStep,
};

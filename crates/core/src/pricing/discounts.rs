use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{is_premium_suv, CatalogRow, Fuel, RtoKind};
use crate::errors::DomainError;
use crate::session::Role;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountCategory {
    Consumer,
    Intervention,
    CorporateOffer,
    Grid,
    Exchange,
    Loyalty,
    Mdmr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorporateOfferKind {
    Msme,
    Solar,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoyaltyKind {
    IceToEv,
    EvToEv,
}

/// The operator's discount picks for one quotation. Fixed categories are
/// toggles; corporate and loyalty carry a sub-option; the three trailing
/// fields are free-form amounts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountSelection {
    pub consumer: bool,
    pub intervention: bool,
    pub grid: bool,
    pub corporate_offer: Option<CorporateOfferKind>,
    pub exchange: bool,
    pub loyalty: Option<LoyaltyKind>,
    pub additional_discount: Decimal,
    /// Secondary special scheme amount.
    pub sss_discount: Decimal,
    /// Manual discretionary discount; privileged roles only.
    pub mdmr_discount: Decimal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiscountContext {
    pub rto_kind: RtoKind,
    pub role: Role,
}

/// Categories offered for a catalog row: a category appears only when its
/// eligibility amount is strictly positive, and MDMR only for privileged
/// roles.
pub fn available_categories(row: &CatalogRow, role: Role) -> Vec<DiscountCategory> {
    let d = &row.discounts;
    let mut categories = Vec::new();

    if d.consumer > Decimal::ZERO {
        categories.push(DiscountCategory::Consumer);
    }
    if d.intervention > Decimal::ZERO {
        categories.push(DiscountCategory::Intervention);
    }
    if d.corporate_msme > Decimal::ZERO || d.corporate_solar > Decimal::ZERO {
        categories.push(DiscountCategory::CorporateOffer);
    }
    if d.grid > Decimal::ZERO {
        categories.push(DiscountCategory::Grid);
    }
    if d.exchange + d.additional_exchange > Decimal::ZERO {
        categories.push(DiscountCategory::Exchange);
    }
    if d.loyalty_ice_to_ev + d.loyalty_ev_to_ev > Decimal::ZERO {
        categories.push(DiscountCategory::Loyalty);
    }
    if role.is_privileged() {
        categories.push(DiscountCategory::Mdmr);
    }

    categories
}

pub fn corporate_amount(row: &CatalogRow, kind: CorporateOfferKind) -> Decimal {
    match kind {
        CorporateOfferKind::Msme => row.discounts.corporate_msme,
        CorporateOfferKind::Solar => row.discounts.corporate_solar,
    }
}

pub fn loyalty_amount(row: &CatalogRow, kind: LoyaltyKind) -> Decimal {
    match kind {
        LoyaltyKind::IceToEv => row.discounts.loyalty_ice_to_ev,
        LoyaltyKind::EvToEv => row.discounts.loyalty_ev_to_ev,
    }
}

/// Cap for the free-form additional discount, or `None` when the role or
/// model year is exempt. The base limit shrinks by the COD scrap amount on
/// premium-SUV Scrap-RTO deals, then by the chosen corporate amount on
/// electric vehicles.
pub fn additional_discount_cap(
    row: &CatalogRow,
    selection: &DiscountSelection,
    ctx: &DiscountContext,
) -> Option<Decimal> {
    if ctx.role.is_privileged() || row.key.year != 2025 {
        return None;
    }

    let mut cap = row.add_disc_lim;
    if is_premium_suv(&row.key.model) && ctx.rto_kind == RtoKind::Scrap {
        cap -= row.cod;
    }
    if row.key.fuel == Fuel::Electric {
        if let Some(kind) = selection.corporate_offer {
            cap -= corporate_amount(row, kind);
        }
    }
    Some(cap)
}

/// Aggregate discount for the selection, enforcing eligibility and the
/// additional-discount cap. Over-cap values are rejected with the computed
/// cap so the operator can re-enter a valid amount; nothing is clamped.
pub fn compute_total_discount(
    row: &CatalogRow,
    selection: &DiscountSelection,
    ctx: &DiscountContext,
) -> Result<Decimal, DomainError> {
    validate_selection(row, selection, ctx)?;

    if let Some(cap) = additional_discount_cap(row, selection, ctx) {
        if selection.additional_discount > cap {
            return Err(DomainError::CapExceeded {
                attempted: selection.additional_discount,
                cap,
            });
        }
    }

    let d = &row.discounts;
    let mut total = Decimal::ZERO;

    if selection.consumer {
        total += d.consumer;
    }
    if selection.intervention {
        total += d.intervention;
    }
    if selection.grid {
        total += d.grid;
    }
    if let Some(kind) = selection.corporate_offer {
        total += corporate_amount(row, kind);
    }
    if selection.exchange {
        total += d.exchange;
        if row.key.fuel == Fuel::Electric {
            total += d.additional_exchange;
        }
    }
    if let Some(kind) = selection.loyalty {
        total += loyalty_amount(row, kind);
    }

    total += selection.additional_discount;
    total += selection.sss_discount;
    total += selection.mdmr_discount;

    Ok(total)
}

fn validate_selection(
    row: &CatalogRow,
    selection: &DiscountSelection,
    ctx: &DiscountContext,
) -> Result<(), DomainError> {
    let d = &row.discounts;

    for (field, value) in [
        ("additional_discount", selection.additional_discount),
        ("sss_discount", selection.sss_discount),
        ("mdmr_discount", selection.mdmr_discount),
    ] {
        if value < Decimal::ZERO {
            return Err(DomainError::validation(field, "cannot be negative"));
        }
    }

    if selection.consumer && d.consumer <= Decimal::ZERO {
        return Err(DomainError::validation("consumer", "not offered for this vehicle"));
    }
    if selection.intervention && d.intervention <= Decimal::ZERO {
        return Err(DomainError::validation("intervention", "not offered for this vehicle"));
    }
    if selection.grid && d.grid <= Decimal::ZERO {
        return Err(DomainError::validation("grid", "not offered for this vehicle"));
    }
    if let Some(kind) = selection.corporate_offer {
        if corporate_amount(row, kind) <= Decimal::ZERO {
            return Err(DomainError::validation(
                "corporate_offer",
                "chosen sub-option is not offered for this vehicle",
            ));
        }
    }
    if selection.exchange && d.exchange + d.additional_exchange <= Decimal::ZERO {
        return Err(DomainError::validation("exchange", "not offered for this vehicle"));
    }
    if let Some(kind) = selection.loyalty {
        if row.key.fuel != Fuel::Electric {
            return Err(DomainError::validation(
                "loyalty",
                "loyalty bonus applies to electric vehicles only",
            ));
        }
        if loyalty_amount(row, kind) <= Decimal::ZERO {
            return Err(DomainError::validation(
                "loyalty",
                "chosen sub-option is not offered for this vehicle",
            ));
        }
    }
    if selection.mdmr_discount > Decimal::ZERO && !ctx.role.is_privileged() {
        return Err(DomainError::validation(
            "mdmr_discount",
            "manual discretionary discount requires an elevated role",
        ));
    }

    Ok(())
}

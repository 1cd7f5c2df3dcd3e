use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogKey, CatalogRow, RtoKind};
use crate::domain::quotation::{InsuranceMode, QuoteSelections};
use crate::errors::DomainError;
use crate::pricing::discounts::{compute_total_discount, DiscountContext};
use crate::session::Role;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTrace {
    pub vehicle: CatalogKey,
    pub steps: Vec<PricingTraceStep>,
}

/// One priced quotation. `cod_scrap` is the cash-on-delivery scrap charge,
/// carried separately from the registration amount so document rendering can
/// show it as its own line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub discounted_esp: Decimal,
    pub discount_total: Decimal,
    pub tcs: Decimal,
    pub rto_total: Decimal,
    pub cod_scrap: Decimal,
    pub insurance_total: Decimal,
    pub warranty_total: Decimal,
    pub accessories_total: Decimal,
    pub vas_total: Decimal,
    pub fast_tag_fee: Decimal,
    pub grand_total: Decimal,
}

impl PriceBreakdown {
    pub fn zero() -> Self {
        Self {
            discounted_esp: Decimal::ZERO,
            discount_total: Decimal::ZERO,
            tcs: Decimal::ZERO,
            rto_total: Decimal::ZERO,
            cod_scrap: Decimal::ZERO,
            insurance_total: Decimal::ZERO,
            warranty_total: Decimal::ZERO,
            accessories_total: Decimal::ZERO,
            vas_total: Decimal::ZERO,
            fast_tag_fee: Decimal::ZERO,
            grand_total: Decimal::ZERO,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingOutcome {
    pub breakdown: PriceBreakdown,
    pub trace: PricingTrace,
}

pub trait PricingEngine: Send + Sync {
    fn price(
        &self,
        row: &CatalogRow,
        selections: &QuoteSelections,
        role: Role,
    ) -> Result<PricingOutcome, DomainError>;
}

#[derive(Default)]
pub struct DeterministicPricingEngine;

impl PricingEngine for DeterministicPricingEngine {
    fn price(
        &self,
        row: &CatalogRow,
        selections: &QuoteSelections,
        role: Role,
    ) -> Result<PricingOutcome, DomainError> {
        price_with_trace(row, selections, role)
    }
}

fn tcs_threshold() -> Decimal {
    Decimal::new(1_000_000, 0)
}

fn one_percent() -> Decimal {
    Decimal::new(1, 2)
}

/// Surcharge shown on the pre-discount price list. Unlike the quotation
/// path, this applies the 1% rule to gross ESP.
pub fn price_list_extra_tax(esp: Decimal) -> Decimal {
    if esp > tcs_threshold() {
        esp * one_percent()
    } else {
        Decimal::ZERO
    }
}

/// Prices a selection against a catalog row. The surcharge check runs on the
/// discounted ESP, so it must be computed before any other charge is added.
pub fn price_with_trace(
    row: &CatalogRow,
    selections: &QuoteSelections,
    role: Role,
) -> Result<PricingOutcome, DomainError> {
    let ctx = DiscountContext { rto_kind: selections.rto_kind, role };
    let discount_total = compute_total_discount(row, &selections.discounts, &ctx)?;
    let discounted_esp = row.esp - discount_total;

    let tcs = if discounted_esp > tcs_threshold() {
        discounted_esp * one_percent()
    } else {
        Decimal::ZERO
    };

    let rto_total = row.rto_amount(selections.rto_kind);
    let cod_scrap = if selections.rto_kind == RtoKind::Scrap && selections.scrap_by_dealer {
        row.cod
    } else {
        Decimal::ZERO
    };

    let insurance_base = match selections.insurance_mode {
        InsuranceMode::Dealer => row.insurance_base,
        InsuranceMode::SelfArranged => Decimal::ZERO,
    };
    let insurance_total = insurance_base
        + selections
            .insurance_addons
            .iter()
            .map(|addon| row.addon_amount(*addon))
            .sum::<Decimal>();

    let warranty_total =
        selections.warranty_tier.map(|tier| row.warranty_amount(tier)).unwrap_or(Decimal::ZERO);
    let accessories_total =
        selections.accessories.iter().map(|item| item.price).sum::<Decimal>();
    let vas_total = selections.vas.as_ref().map(|vas| vas.price).unwrap_or(Decimal::ZERO);

    let grand_total = discounted_esp
        + rto_total
        + cod_scrap
        + insurance_total
        + tcs
        + warranty_total
        + accessories_total
        + vas_total
        + row.fast_tag_fee;

    let breakdown = PriceBreakdown {
        discounted_esp,
        discount_total,
        tcs,
        rto_total,
        cod_scrap,
        insurance_total,
        warranty_total,
        accessories_total,
        vas_total,
        fast_tag_fee: row.fast_tag_fee,
        grand_total,
    };

    let trace = PricingTrace {
        vehicle: row.key.clone(),
        steps: vec![
            step("discounted_esp", "esp - total_discount", discounted_esp),
            step("tcs", "1% of discounted esp above threshold", tcs),
            step("rto", "registration amount for selected type", rto_total),
            step("cod_scrap", "dealer-handled scrap charge", cod_scrap),
            step("insurance", "base plus selected add-ons", insurance_total),
            step("warranty", "extended warranty tier", warranty_total),
            step("accessories", "sum of selected accessory prices", accessories_total),
            step("vas", "chosen value-added service", vas_total),
            step("fast_tag", "flat fast-tag fee", row.fast_tag_fee),
            step("grand_total", "sum of all charges", grand_total),
        ],
    };

    Ok(PricingOutcome { breakdown, trace })
}

fn step(stage: &str, detail: &str, amount: Decimal) -> PricingTraceStep {
    PricingTraceStep { stage: stage.to_string(), detail: detail.to_string(), amount }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rust_decimal::Decimal;

    use crate::catalog::{
        AccessoryItem, CatalogKey, CatalogRow, DiscountAmounts, Fuel, InsuranceAddOn, RtoKind,
        VasOption, WarrantyTier,
    };
    use crate::domain::quotation::{InsuranceMode, QuoteSelections};
    use crate::pricing::discounts::DiscountSelection;
    use crate::session::Role;

    use super::{price_list_extra_tax, price_with_trace, DeterministicPricingEngine, PricingEngine};

    fn catalog_row() -> CatalogRow {
        let mut rto_amounts = BTreeMap::new();
        rto_amounts.insert(RtoKind::Individual, Decimal::new(80_000, 0));
        rto_amounts.insert(RtoKind::Scrap, Decimal::new(70_000, 0));

        let mut insurance_addons = BTreeMap::new();
        insurance_addons.insert(InsuranceAddOn::ZeroDepreciation, Decimal::new(6_000, 0));

        let mut warranty_tiers = BTreeMap::new();
        warranty_tiers.insert(WarrantyTier::FifthYear, Decimal::new(9_000, 0));

        CatalogRow {
            key: CatalogKey {
                year: 2025,
                model: "GRAND VITARA".to_string(),
                fuel: Fuel::Petrol,
                variant: "ALPHA".to_string(),
            },
            esp: Decimal::new(1_200_000, 0),
            rto_amounts,
            insurance_base: Decimal::new(25_000, 0),
            insurance_addons,
            discounts: DiscountAmounts {
                consumer: Decimal::new(20_000, 0),
                intervention: Decimal::ZERO,
                corporate_msme: Decimal::ZERO,
                corporate_solar: Decimal::ZERO,
                grid: Decimal::ZERO,
                exchange: Decimal::ZERO,
                additional_exchange: Decimal::ZERO,
                loyalty_ice_to_ev: Decimal::ZERO,
                loyalty_ev_to_ev: Decimal::ZERO,
            },
            add_disc_lim: Decimal::new(30_000, 0),
            cod: Decimal::new(12_000, 0),
            warranty_tiers,
            fast_tag_fee: Decimal::new(1_500, 0),
        }
    }

    fn consumer_only_selections() -> QuoteSelections {
        QuoteSelections {
            discounts: DiscountSelection { consumer: true, ..DiscountSelection::default() },
            rto_kind: RtoKind::Individual,
            scrap_by_dealer: false,
            insurance_mode: InsuranceMode::Dealer,
            insurance_addons: Vec::new(),
            warranty_tier: None,
            accessories: Vec::new(),
            vas: None,
            financing: crate::domain::quotation::FinancingMode::Cash,
        }
    }

    #[test]
    fn worked_example_totals_match() {
        let outcome = price_with_trace(&catalog_row(), &consumer_only_selections(), Role::Consultant)
            .expect("price");

        let breakdown = &outcome.breakdown;
        assert_eq!(breakdown.discounted_esp, Decimal::new(1_180_000, 0));
        assert_eq!(breakdown.tcs, Decimal::new(11_800, 0));
        assert_eq!(breakdown.rto_total, Decimal::new(80_000, 0));
        assert_eq!(breakdown.insurance_total, Decimal::new(25_000, 0));
        assert_eq!(breakdown.grand_total, Decimal::new(1_298_300, 0));
    }

    #[test]
    fn surcharge_is_zero_at_or_below_threshold() {
        let mut row = catalog_row();
        row.esp = Decimal::new(1_020_000, 0);

        // discounted ESP lands exactly on 1,000,000
        let outcome =
            price_with_trace(&row, &consumer_only_selections(), Role::Consultant).expect("price");
        assert_eq!(outcome.breakdown.tcs, Decimal::ZERO);
    }

    #[test]
    fn surcharge_uses_discounted_esp_not_gross() {
        let mut row = catalog_row();
        row.esp = Decimal::new(1_010_000, 0);

        // gross is above the threshold, discounted is below
        let outcome =
            price_with_trace(&row, &consumer_only_selections(), Role::Consultant).expect("price");
        assert_eq!(outcome.breakdown.tcs, Decimal::ZERO);

        // the price-list view applies the rule to gross ESP
        assert_eq!(price_list_extra_tax(row.esp), Decimal::new(10_100, 0));
        assert_eq!(price_list_extra_tax(Decimal::new(900_000, 0)), Decimal::ZERO);
    }

    #[test]
    fn scrap_rto_by_dealer_adds_cod_once() {
        let mut selections = consumer_only_selections();
        selections.rto_kind = RtoKind::Scrap;
        selections.scrap_by_dealer = true;

        let outcome =
            price_with_trace(&catalog_row(), &selections, Role::Consultant).expect("price");
        assert_eq!(outcome.breakdown.rto_total, Decimal::new(70_000, 0));
        assert_eq!(outcome.breakdown.cod_scrap, Decimal::new(12_000, 0));

        // 1,180,000 + 11,800 + 70,000 + 12,000 + 25,000 + 1,500
        assert_eq!(outcome.breakdown.grand_total, Decimal::new(1_300_300, 0));
    }

    #[test]
    fn scrap_rto_without_dealer_handling_skips_cod() {
        let mut selections = consumer_only_selections();
        selections.rto_kind = RtoKind::Scrap;
        selections.scrap_by_dealer = false;

        let outcome =
            price_with_trace(&catalog_row(), &selections, Role::Consultant).expect("price");
        assert_eq!(outcome.breakdown.cod_scrap, Decimal::ZERO);
    }

    #[test]
    fn self_arranged_insurance_drops_the_base_amount() {
        let mut selections = consumer_only_selections();
        selections.insurance_mode = InsuranceMode::SelfArranged;
        selections.insurance_addons = vec![InsuranceAddOn::ZeroDepreciation];

        let outcome =
            price_with_trace(&catalog_row(), &selections, Role::Consultant).expect("price");
        assert_eq!(outcome.breakdown.insurance_total, Decimal::new(6_000, 0));
    }

    #[test]
    fn warranty_accessories_and_vas_are_added() {
        let mut selections = consumer_only_selections();
        selections.warranty_tier = Some(WarrantyTier::FifthYear);
        selections.accessories = vec![
            AccessoryItem {
                code: "MAT-3D".to_string(),
                name: "3D floor mats".to_string(),
                price: Decimal::new(4_500, 0),
            },
            AccessoryItem {
                code: "MUDFLAP".to_string(),
                name: "Mud flaps".to_string(),
                price: Decimal::new(900, 0),
            },
        ];
        selections.vas = Some(VasOption {
            code: "COAT-CER".to_string(),
            name: "Ceramic coating".to_string(),
            price: Decimal::new(15_000, 0),
        });

        let outcome =
            price_with_trace(&catalog_row(), &selections, Role::Consultant).expect("price");
        assert_eq!(outcome.breakdown.warranty_total, Decimal::new(9_000, 0));
        assert_eq!(outcome.breakdown.accessories_total, Decimal::new(5_400, 0));
        assert_eq!(outcome.breakdown.vas_total, Decimal::new(15_000, 0));
        assert_eq!(outcome.breakdown.grand_total, Decimal::new(1_327_700, 0));
    }

    #[test]
    fn pricing_is_deterministic_for_identical_inputs() {
        let engine = DeterministicPricingEngine;
        let row = catalog_row();
        let selections = consumer_only_selections();

        let first = engine.price(&row, &selections, Role::Consultant).expect("price");
        let second = engine.price(&row, &selections, Role::Consultant).expect("price");
        assert_eq!(first.breakdown, second.breakdown);
        assert_eq!(first.trace, second.trace);
    }
}

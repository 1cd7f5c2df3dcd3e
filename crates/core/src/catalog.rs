use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fuel {
    Petrol,
    Diesel,
    Cng,
    Electric,
}

impl Fuel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Petrol => "petrol",
            Self::Diesel => "diesel",
            Self::Cng => "cng",
            Self::Electric => "electric",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "petrol" => Some(Self::Petrol),
            "diesel" => Some(Self::Diesel),
            "cng" => Some(Self::Cng),
            "electric" => Some(Self::Electric),
            _ => None,
        }
    }
}

/// Registration-type policies. `Scrap` is the "Scrap RTO" path that can pull
/// in the cash-on-delivery scrap amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RtoKind {
    Individual,
    Company,
    Bharat,
    Scrap,
}

impl RtoKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Company => "company",
            Self::Bharat => "bharat",
            Self::Scrap => "scrap",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "individual" => Some(Self::Individual),
            "company" => Some(Self::Company),
            "bharat" => Some(Self::Bharat),
            "scrap" => Some(Self::Scrap),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceAddOn {
    ZeroDepreciation,
    Consumables,
    EngineProtect,
    ReturnToInvoice,
    KeyProtect,
    TyreProtect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarrantyTier {
    ThirdYear,
    FourthYear,
    FifthYear,
}

/// Per-category discount eligibility amounts for one catalog row. A category
/// is offered only when its amount here is strictly positive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountAmounts {
    pub consumer: Decimal,
    pub intervention: Decimal,
    pub corporate_msme: Decimal,
    pub corporate_solar: Decimal,
    pub grid: Decimal,
    pub exchange: Decimal,
    pub additional_exchange: Decimal,
    pub loyalty_ice_to_ev: Decimal,
    pub loyalty_ev_to_ev: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CatalogKey {
    pub year: i32,
    pub model: String,
    pub fuel: Fuel,
    pub variant: String,
}

/// One immutable price-list row per (year, model, fuel, variant).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub key: CatalogKey,
    /// Ex-showroom price.
    pub esp: Decimal,
    pub rto_amounts: BTreeMap<RtoKind, Decimal>,
    pub insurance_base: Decimal,
    pub insurance_addons: BTreeMap<InsuranceAddOn, Decimal>,
    pub discounts: DiscountAmounts,
    /// Cap for the free-form additional discount.
    pub add_disc_lim: Decimal,
    /// Cash-on-delivery scrap amount for the Scrap RTO path.
    pub cod: Decimal,
    pub warranty_tiers: BTreeMap<WarrantyTier, Decimal>,
    pub fast_tag_fee: Decimal,
}

impl CatalogRow {
    pub fn rto_amount(&self, kind: RtoKind) -> Decimal {
        self.rto_amounts.get(&kind).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn addon_amount(&self, addon: InsuranceAddOn) -> Decimal {
        self.insurance_addons.get(&addon).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn warranty_amount(&self, tier: WarrantyTier) -> Decimal {
        self.warranty_tiers.get(&tier).copied().unwrap_or(Decimal::ZERO)
    }
}

/// Models whose Scrap-RTO bookings reduce the additional-discount cap by the
/// COD scrap amount.
pub const PREMIUM_SUV_MODELS: &[&str] = &["GRAND VITARA", "INVICTO"];

pub fn is_premium_suv(model: &str) -> bool {
    let model = model.trim().to_ascii_uppercase();
    PREMIUM_SUV_MODELS.iter().any(|candidate| *candidate == model)
}

/// Flat accessory price list entry; not catalog-row-dependent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryItem {
    pub code: String,
    pub name: String,
    pub price: Decimal,
}

/// Value-added service option (coatings, detailing and similar).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VasOption {
    pub code: String,
    pub name: String,
    pub price: Decimal,
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{AccessoryItem, CatalogKey, InsuranceAddOn, RtoKind, VasOption, WarrantyTier};
use crate::domain::customer::CustomerRef;
use crate::errors::DomainError;
use crate::pricing::discounts::DiscountSelection;
use crate::pricing::engine::PriceBreakdown;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuotationId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceMode {
    Dealer,
    SelfArranged,
}

/// Financing mode; `Loan` carries the chosen financier (HPN).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FinancingMode {
    Cash,
    Loan { financier: String },
}

/// Everything the operator chose on top of the catalog row. Re-pricing the
/// same selections must be deterministic, so this is the fingerprint input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSelections {
    pub discounts: DiscountSelection,
    pub rto_kind: RtoKind,
    pub scrap_by_dealer: bool,
    pub insurance_mode: InsuranceMode,
    pub insurance_addons: Vec<InsuranceAddOn>,
    pub warranty_tier: Option<WarrantyTier>,
    pub accessories: Vec<AccessoryItem>,
    pub vas: Option<VasOption>,
    pub financing: FinancingMode,
}

/// Reference to an externally rendered shareable document. The fingerprint
/// pins the document to the exact selections it was generated from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub reference: String,
    pub selection_fingerprint: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quotation {
    pub id: QuotationId,
    pub customer: CustomerRef,
    pub vehicle: CatalogKey,
    pub selections: QuoteSelections,
    pub breakdown: PriceBreakdown,
    pub document: Option<DocumentRef>,
    pub created_at: DateTime<Utc>,
}

impl Quotation {
    pub fn grand_total(&self) -> Decimal {
        self.breakdown.grand_total
    }

    /// blake3 over the canonical JSON of (vehicle, selections).
    pub fn selection_fingerprint(&self) -> Result<String, DomainError> {
        selection_fingerprint(&self.vehicle, &self.selections)
    }

    pub fn attach_document(
        &mut self,
        reference: impl Into<String>,
    ) -> Result<DocumentRef, DomainError> {
        let document = DocumentRef {
            reference: reference.into(),
            selection_fingerprint: self.selection_fingerprint()?,
            generated_at: Utc::now(),
        };
        self.document = Some(document.clone());
        Ok(document)
    }

    /// True only when a document exists and was generated from the current
    /// selections. Any selection change leaves stale documents behind.
    pub fn document_is_current(&self) -> Result<bool, DomainError> {
        let Some(document) = &self.document else {
            return Ok(false);
        };
        Ok(document.selection_fingerprint == self.selection_fingerprint()?)
    }

    /// Replace vehicle/selection inputs and the recomputed breakdown. The
    /// previously generated document reference is dropped, forcing
    /// regeneration.
    pub fn revise(
        &mut self,
        vehicle: CatalogKey,
        selections: QuoteSelections,
        breakdown: PriceBreakdown,
    ) {
        self.vehicle = vehicle;
        self.selections = selections;
        self.breakdown = breakdown;
        self.document = None;
    }
}

pub fn selection_fingerprint(
    vehicle: &CatalogKey,
    selections: &QuoteSelections,
) -> Result<String, DomainError> {
    let canonical = serde_json::to_vec(&(vehicle, selections)).map_err(|error| {
        DomainError::InvariantViolation(format!("selections are not serializable: {error}"))
    })?;
    Ok(blake3::hash(&canonical).to_hex().to_string())
}

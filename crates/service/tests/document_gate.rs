use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rust_decimal::Decimal;

use showroom_core::catalog::{CatalogKey, CatalogRow, DiscountAmounts, Fuel, RtoKind};
use showroom_core::domain::customer::{CustomerId, CustomerRef};
use showroom_core::domain::quotation::{
    FinancingMode, InsuranceMode, Quotation, QuoteSelections,
};
use showroom_core::errors::ApplicationError;
use showroom_core::pricing::discounts::DiscountSelection;
use showroom_core::pricing::engine::DeterministicPricingEngine;
use showroom_core::session::{ActorContext, Role};
use showroom_db::repositories::{CatalogRepository, InMemoryCatalogRepository, InMemoryQuotationRepository};
use showroom_service::{DocumentRenderer, QuotationService};

struct CountingRenderer {
    calls: AtomicUsize,
}

impl CountingRenderer {
    fn new() -> Self {
        Self { calls: AtomicUsize::new(0) }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DocumentRenderer for CountingRenderer {
    fn render(&self, quotation: &Quotation) -> Result<String, ApplicationError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("doc/{}/{n}", quotation.id.0))
    }
}

fn catalog_row() -> CatalogRow {
    let mut rto_amounts = BTreeMap::new();
    rto_amounts.insert(RtoKind::Individual, Decimal::new(80_000, 0));
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
        insurance_addons: BTreeMap::new(),
        discounts: DiscountAmounts {
            consumer: Decimal::new(20_000, 0),
            ..DiscountAmounts::default()
        },
        add_disc_lim: Decimal::new(10_000, 0),
        cod: Decimal::new(25_000, 0),
        warranty_tiers: BTreeMap::new(),
        fast_tag_fee: Decimal::new(1_500, 0),
    }
}

fn selections(consumer: bool) -> QuoteSelections {
    QuoteSelections {
        discounts: DiscountSelection { consumer, ..DiscountSelection::default() },
        rto_kind: RtoKind::Individual,
        scrap_by_dealer: false,
        insurance_mode: InsuranceMode::Dealer,
        insurance_addons: Vec::new(),
        warranty_tier: None,
        accessories: Vec::new(),
        vas: None,
        financing: FinancingMode::Cash,
    }
}

fn customer() -> CustomerRef {
    CustomerRef {
        id: CustomerId("C-1".to_string()),
        name: "R. Deshmukh".to_string(),
        phone: "+91-98000-00001".to_string(),
    }
}

fn actor() -> ActorContext {
    ActorContext::new("U-100", Role::Consultant, "corr-1")
}

async fn service() -> QuotationService<InMemoryCatalogRepository, InMemoryQuotationRepository> {
    let catalog = Arc::new(InMemoryCatalogRepository::default());
    catalog.save_row(catalog_row()).await.expect("save row");
    QuotationService::new(
        catalog,
        Arc::new(InMemoryQuotationRepository::default()),
        Arc::new(DeterministicPricingEngine),
    )
}

#[tokio::test]
async fn repricing_the_same_selections_is_deterministic() {
    let service = service().await;

    let (quotation, _) = service
        .create_quotation(&actor(), customer(), catalog_row().key, selections(true))
        .await
        .expect("create");
    assert_eq!(quotation.breakdown.grand_total, Decimal::new(1_298_300, 0));

    let (repriced, _) =
        service.reprice(&actor(), &quotation.id, selections(true)).await.expect("reprice");
    assert_eq!(repriced.breakdown, quotation.breakdown);
}

#[tokio::test]
async fn document_is_reused_until_selections_change() {
    let service = service().await;
    let renderer = CountingRenderer::new();

    let (quotation, _) = service
        .create_quotation(&actor(), customer(), catalog_row().key, selections(true))
        .await
        .expect("create");

    let first = service
        .generate_document(&actor(), &quotation.id, &renderer)
        .await
        .expect("generate");
    assert!(first.regenerated);

    let second = service
        .generate_document(&actor(), &quotation.id, &renderer)
        .await
        .expect("regenerate");
    assert!(!second.regenerated);
    assert_eq!(second.reference, first.reference);
    assert_eq!(renderer.calls(), 1);

    // A selection change invalidates the stored reference.
    service.reprice(&actor(), &quotation.id, selections(false)).await.expect("reprice");
    let third = service
        .generate_document(&actor(), &quotation.id, &renderer)
        .await
        .expect("generate after revision");
    assert!(third.regenerated);
    assert_ne!(third.reference, first.reference);
    assert_eq!(renderer.calls(), 2);
}

#[tokio::test]
async fn unknown_vehicles_are_rejected_at_creation() {
    let service = service().await;
    let missing = CatalogKey {
        year: 2024,
        model: "CELERIO".to_string(),
        fuel: Fuel::Petrol,
        variant: "LXI".to_string(),
    };

    let error = service
        .create_quotation(&actor(), customer(), missing, selections(false))
        .await
        .expect_err("unknown vehicle must fail");
    assert!(matches!(error, ApplicationError::Domain(_)));
}

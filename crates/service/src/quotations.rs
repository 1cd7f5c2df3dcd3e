use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use showroom_core::catalog::{CatalogKey, CatalogRow};
use showroom_core::domain::customer::CustomerRef;
use showroom_core::domain::quotation::{Quotation, QuotationId, QuoteSelections};
use showroom_core::errors::{ApplicationError, DomainError};
use showroom_core::pricing::engine::{PricingEngine, PricingTrace};
use showroom_core::session::ActorContext;
use showroom_db::repositories::{CatalogRepository, QuotationRepository};

use crate::documents::{DocumentOutcome, DocumentRenderer};
use crate::persistence;

/// Quotation lifecycle against the immutable catalog: create, reprice,
/// gate document generation on the selection fingerprint.
pub struct QuotationService<C, Q> {
    catalog: Arc<C>,
    quotations: Arc<Q>,
    engine: Arc<dyn PricingEngine>,
}

impl<C, Q> QuotationService<C, Q>
where
    C: CatalogRepository,
    Q: QuotationRepository,
{
    pub fn new(catalog: Arc<C>, quotations: Arc<Q>, engine: Arc<dyn PricingEngine>) -> Self {
        Self { catalog, quotations, engine }
    }

    pub async fn find_catalog_row(
        &self,
        key: &CatalogKey,
    ) -> Result<Option<CatalogRow>, ApplicationError> {
        self.catalog.find_row(key).await.map_err(persistence)
    }

    pub async fn create_quotation(
        &self,
        actor: &ActorContext,
        customer: CustomerRef,
        vehicle: CatalogKey,
        selections: QuoteSelections,
    ) -> Result<(Quotation, PricingTrace), ApplicationError> {
        let row = self
            .catalog
            .find_row(&vehicle)
            .await
            .map_err(persistence)?
            .ok_or_else(|| catalog_row_missing(&vehicle))?;

        let outcome = self.engine.price(&row, &selections, actor.role)?;
        let quotation = Quotation {
            id: QuotationId(Uuid::new_v4().to_string()),
            customer,
            vehicle,
            selections,
            breakdown: outcome.breakdown,
            document: None,
            created_at: Utc::now(),
        };
        self.quotations.save(quotation.clone()).await.map_err(persistence)?;

        info!(
            event_name = "quotation.created",
            correlation_id = %actor.correlation_id,
            quotation_id = %quotation.id.0,
            grand_total = %quotation.breakdown.grand_total,
        );
        Ok((quotation, outcome.trace))
    }

    /// Re-price an existing quotation with new selections. Drops any
    /// previously generated document reference.
    pub async fn reprice(
        &self,
        actor: &ActorContext,
        quotation_id: &QuotationId,
        selections: QuoteSelections,
    ) -> Result<(Quotation, PricingTrace), ApplicationError> {
        let mut quotation = self.find_required(quotation_id).await?;
        let row = self
            .catalog
            .find_row(&quotation.vehicle)
            .await
            .map_err(persistence)?
            .ok_or_else(|| catalog_row_missing(&quotation.vehicle))?;

        let outcome = self.engine.price(&row, &selections, actor.role)?;
        quotation.revise(quotation.vehicle.clone(), selections, outcome.breakdown.clone());
        self.quotations.save(quotation.clone()).await.map_err(persistence)?;

        info!(
            event_name = "quotation.repriced",
            correlation_id = %actor.correlation_id,
            quotation_id = %quotation.id.0,
            grand_total = %quotation.breakdown.grand_total,
        );
        Ok((quotation, outcome.trace))
    }

    /// Returns the stored reference when it still matches the current
    /// selections; renders a fresh document otherwise.
    pub async fn generate_document(
        &self,
        actor: &ActorContext,
        quotation_id: &QuotationId,
        renderer: &dyn DocumentRenderer,
    ) -> Result<DocumentOutcome, ApplicationError> {
        let mut quotation = self.find_required(quotation_id).await?;

        if quotation.document_is_current()? {
            let document = quotation.document.clone().ok_or_else(|| {
                DomainError::InvariantViolation("current document vanished".to_string())
            })?;
            return Ok(DocumentOutcome { reference: document.reference, regenerated: false });
        }

        let reference = renderer.render(&quotation)?;
        quotation.attach_document(reference.clone())?;
        self.quotations.save(quotation).await.map_err(persistence)?;

        info!(
            event_name = "quotation.document_generated",
            correlation_id = %actor.correlation_id,
            quotation_id = %quotation_id.0,
            reference = %reference,
        );
        Ok(DocumentOutcome { reference, regenerated: true })
    }

    async fn find_required(&self, id: &QuotationId) -> Result<Quotation, ApplicationError> {
        self.quotations
            .find_by_id(id)
            .await
            .map_err(persistence)?
            .ok_or_else(|| DomainError::validation("quotation_id", format!("`{}` not found", id.0)).into())
    }
}

fn catalog_row_missing(key: &CatalogKey) -> ApplicationError {
    DomainError::validation(
        "vehicle",
        format!("no catalog row for {} {} {} {}", key.year, key.model, key.fuel.as_str(), key.variant),
    )
    .into()
}

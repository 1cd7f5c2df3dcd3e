use sqlx::{sqlite::SqliteRow, Row};

use showroom_core::catalog::{CatalogKey, Fuel};
use showroom_core::domain::customer::{CustomerId, CustomerRef};
use showroom_core::domain::quotation::{DocumentRef, Quotation, QuotationId};

use super::{
    parse_json, parse_optional_timestamp, parse_timestamp, to_json, QuotationRepository,
    RepositoryError,
};
use crate::DbPool;

pub struct SqlQuotationRepository {
    pool: DbPool,
}

impl SqlQuotationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl QuotationRepository for SqlQuotationRepository {
    async fn find_by_id(&self, id: &QuotationId) -> Result<Option<Quotation>, RepositoryError> {
        let row = sqlx::query(
            "SELECT
                id,
                customer_id,
                customer_name,
                customer_phone,
                year,
                model,
                fuel,
                variant,
                selections_json,
                breakdown_json,
                document_reference,
                document_fingerprint,
                document_generated_at,
                created_at
             FROM quotation
             WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(quotation_from_row).transpose()
    }

    async fn save(&self, quotation: Quotation) -> Result<(), RepositoryError> {
        let (document_reference, document_fingerprint, document_generated_at) =
            match &quotation.document {
                Some(document) => (
                    Some(document.reference.as_str()),
                    Some(document.selection_fingerprint.as_str()),
                    Some(document.generated_at.to_rfc3339()),
                ),
                None => (None, None, None),
            };

        sqlx::query(
            "INSERT INTO quotation (
                id,
                customer_id,
                customer_name,
                customer_phone,
                year,
                model,
                fuel,
                variant,
                selections_json,
                breakdown_json,
                document_reference,
                document_fingerprint,
                document_generated_at,
                created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                customer_id = excluded.customer_id,
                customer_name = excluded.customer_name,
                customer_phone = excluded.customer_phone,
                year = excluded.year,
                model = excluded.model,
                fuel = excluded.fuel,
                variant = excluded.variant,
                selections_json = excluded.selections_json,
                breakdown_json = excluded.breakdown_json,
                document_reference = excluded.document_reference,
                document_fingerprint = excluded.document_fingerprint,
                document_generated_at = excluded.document_generated_at",
        )
        .bind(&quotation.id.0)
        .bind(&quotation.customer.id.0)
        .bind(&quotation.customer.name)
        .bind(&quotation.customer.phone)
        .bind(quotation.vehicle.year)
        .bind(&quotation.vehicle.model)
        .bind(quotation.vehicle.fuel.as_str())
        .bind(&quotation.vehicle.variant)
        .bind(to_json("selections_json", &quotation.selections)?)
        .bind(to_json("breakdown_json", &quotation.breakdown)?)
        .bind(document_reference)
        .bind(document_fingerprint)
        .bind(document_generated_at)
        .bind(quotation.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn quotation_from_row(row: SqliteRow) -> Result<Quotation, RepositoryError> {
    let fuel_raw = row.try_get::<String, _>("fuel")?;
    let fuel = Fuel::parse(&fuel_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown fuel `{fuel_raw}`")))?;

    let document = match (
        row.try_get::<Option<String>, _>("document_reference")?,
        row.try_get::<Option<String>, _>("document_fingerprint")?,
        parse_optional_timestamp(
            "document_generated_at",
            row.try_get::<Option<String>, _>("document_generated_at")?,
        )?,
    ) {
        (Some(reference), Some(selection_fingerprint), Some(generated_at)) => {
            Some(DocumentRef { reference, selection_fingerprint, generated_at })
        }
        (None, None, None) => None,
        _ => {
            return Err(RepositoryError::Decode(
                "document columns must be all present or all null".to_string(),
            ))
        }
    };

    Ok(Quotation {
        id: QuotationId(row.try_get("id")?),
        customer: CustomerRef {
            id: CustomerId(row.try_get("customer_id")?),
            name: row.try_get("customer_name")?,
            phone: row.try_get("customer_phone")?,
        },
        vehicle: CatalogKey {
            year: row.try_get("year")?,
            model: row.try_get("model")?,
            fuel,
            variant: row.try_get("variant")?,
        },
        selections: parse_json("selections_json", row.try_get("selections_json")?)?,
        breakdown: parse_json("breakdown_json", row.try_get("breakdown_json")?)?,
        document,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
    })
}

use sqlx::{sqlite::SqliteRow, Row};

use showroom_core::audit::{AuditCategory, AuditEvent, AuditOutcome};
use showroom_core::domain::booking::BookingId;

use super::{parse_json, parse_timestamp, to_json, AuditRepository, RepositoryError};
use crate::DbPool;

pub struct SqlAuditRepository {
    pool: DbPool,
}

impl SqlAuditRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AuditRepository for SqlAuditRepository {
    async fn append(&self, event: &AuditEvent) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO audit_event (
                event_id, booking_id, correlation_id, event_type,
                category, actor, outcome, metadata_json, occurred_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&event.event_id)
        .bind(event.booking_id.as_ref().map(|id| id.0.as_str()))
        .bind(&event.correlation_id)
        .bind(&event.event_type)
        .bind(event.category.as_str())
        .bind(&event.actor)
        .bind(event.outcome.as_str())
        .bind(to_json("metadata_json", &event.metadata)?)
        .bind(event.occurred_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_for_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Vec<AuditEvent>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT event_id, booking_id, correlation_id, event_type,
                    category, actor, outcome, metadata_json, occurred_at
             FROM audit_event
             WHERE booking_id = ?
             ORDER BY occurred_at, event_id",
        )
        .bind(&booking_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(audit_event_from_row).collect()
    }
}

fn audit_event_from_row(row: SqliteRow) -> Result<AuditEvent, RepositoryError> {
    let category_raw = row.try_get::<String, _>("category")?;
    let category = AuditCategory::parse(&category_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown audit category `{category_raw}`")))?;
    let outcome_raw = row.try_get::<String, _>("outcome")?;
    let outcome = AuditOutcome::parse(&outcome_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown audit outcome `{outcome_raw}`")))?;

    Ok(AuditEvent {
        event_id: row.try_get("event_id")?,
        booking_id: row.try_get::<Option<String>, _>("booking_id")?.map(BookingId),
        correlation_id: row.try_get("correlation_id")?,
        event_type: row.try_get("event_type")?,
        category,
        actor: row.try_get("actor")?,
        outcome,
        metadata: parse_json("metadata_json", row.try_get("metadata_json")?)?,
        occurred_at: parse_timestamp("occurred_at", row.try_get("occurred_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use showroom_core::audit::{AuditCategory, AuditEvent, AuditOutcome};
    use showroom_core::domain::booking::BookingId;

    use super::SqlAuditRepository;
    use crate::repositories::AuditRepository;
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn events_round_trip_in_order() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        let repo = SqlAuditRepository::new(pool);

        let booking_id = BookingId("BK-7".to_string());
        let first = AuditEvent::new(
            Some(booking_id.clone()),
            "corr-1",
            "flow.transition_applied",
            AuditCategory::Flow,
            "U-100",
            AuditOutcome::Success,
        )
        .with_metadata("from", "requested")
        .with_metadata("to", "confirmed");
        let second = AuditEvent::new(
            Some(booking_id.clone()),
            "corr-1",
            "stock.allocation_completed",
            AuditCategory::Stock,
            "U-100",
            AuditOutcome::Success,
        );
        repo.append(&first).await.expect("append");
        repo.append(&second).await.expect("append");

        let events = repo.list_for_booking(&booking_id).await.expect("list");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "flow.transition_applied");
        assert_eq!(events[0].metadata.get("to").map(String::as_str), Some("confirmed"));
        assert_eq!(events[1].category, AuditCategory::Stock);
    }
}

use sqlx::{sqlite::SqliteRow, Row};

use showroom_core::domain::booking::{Booking, BookingId, BookingStatus};
use showroom_core::domain::quotation::QuotationId;

use super::{parse_decimal, parse_timestamp, BookingInsert, BookingRepository, RepositoryError};
use crate::DbPool;

const BOOKING_COLUMNS: &str = "id, quotation_id, requested_by, amount_paid, amount_remaining, \
     order_category, chassis_number, color, status, approved_by, rejection_remark, created_at, \
     updated_at";

pub struct SqlBookingRepository {
    pool: DbPool,
}

impl SqlBookingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl BookingRepository for SqlBookingRepository {
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {BOOKING_COLUMNS} FROM booking WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(booking_from_row).transpose()
    }

    async fn find_active_for_quotation(
        &self,
        quotation_id: &QuotationId,
    ) -> Result<Option<Booking>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM booking
             WHERE quotation_id = ?
               AND status IN ('requested', 'confirmed', 'inprogress')"
        ))
        .bind(&quotation_id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.map(booking_from_row).transpose()
    }

    async fn insert(&self, booking: &Booking) -> Result<BookingInsert, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO booking (
                id, quotation_id, requested_by, amount_paid, amount_remaining,
                order_category, chassis_number, color, status, approved_by,
                rejection_remark, created_at, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&booking.id.0)
        .bind(&booking.quotation_id.0)
        .bind(&booking.requested_by)
        .bind(booking.amount_paid.to_string())
        .bind(booking.amount_remaining.to_string())
        .bind(&booking.order_category)
        .bind(booking.chassis_number.as_deref())
        .bind(&booking.color)
        .bind(booking.status.as_str())
        .bind(booking.approved_by.as_deref())
        .bind(booking.rejection_remark.as_deref())
        .bind(booking.created_at.to_rfc3339())
        .bind(booking.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(BookingInsert::Created),
            // The partial unique index on quotation_id only covers live
            // statuses, so a violation here means an active booking exists.
            Err(err)
                if err
                    .as_database_error()
                    .is_some_and(|db_err| db_err.is_unique_violation()) =>
            {
                Ok(BookingInsert::DuplicateActive)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn update(&self, booking: &Booking) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE booking SET
                amount_paid = ?,
                amount_remaining = ?,
                order_category = ?,
                chassis_number = ?,
                color = ?,
                status = ?,
                approved_by = ?,
                rejection_remark = ?,
                updated_at = ?
             WHERE id = ?",
        )
        .bind(booking.amount_paid.to_string())
        .bind(booking.amount_remaining.to_string())
        .bind(&booking.order_category)
        .bind(booking.chassis_number.as_deref())
        .bind(&booking.color)
        .bind(booking.status.as_str())
        .bind(booking.approved_by.as_deref())
        .bind(booking.rejection_remark.as_deref())
        .bind(booking.updated_at.to_rfc3339())
        .bind(&booking.id.0)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn booking_from_row(row: SqliteRow) -> Result<Booking, RepositoryError> {
    let status_raw = row.try_get::<String, _>("status")?;
    let status = BookingStatus::parse(&status_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown booking status `{status_raw}`")))?;

    Ok(Booking {
        id: BookingId(row.try_get("id")?),
        quotation_id: QuotationId(row.try_get("quotation_id")?),
        requested_by: row.try_get("requested_by")?,
        amount_paid: parse_decimal("amount_paid", row.try_get("amount_paid")?)?,
        amount_remaining: parse_decimal("amount_remaining", row.try_get("amount_remaining")?)?,
        order_category: row.try_get("order_category")?,
        chassis_number: row.try_get("chassis_number")?,
        color: row.try_get("color")?,
        status,
        approved_by: row.try_get("approved_by")?,
        rejection_remark: row.try_get("rejection_remark")?,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
        updated_at: parse_timestamp("updated_at", row.try_get("updated_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use showroom_core::domain::booking::{Booking, BookingId, BookingStatus};
    use showroom_core::domain::quotation::QuotationId;

    use super::SqlBookingRepository;
    use crate::repositories::{BookingInsert, BookingRepository};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn pool_with_quotation(quotation_id: &str) -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        sqlx::query(
            "INSERT INTO quotation (
                id, customer_id, customer_name, customer_phone,
                year, model, fuel, variant,
                selections_json, breakdown_json, created_at
             ) VALUES (?, 'C-1', 'A. Kulkarni', '+91-98000-00002',
                2025, 'BREZZA', 'petrol', 'ZXI', '{}', '{}', ?)",
        )
        .bind(quotation_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&pool)
        .await
        .expect("seed quotation");
        pool
    }

    fn sample_booking(id: &str, quotation_id: &str, status: BookingStatus) -> Booking {
        let now = Utc::now();
        Booking {
            id: BookingId(id.to_string()),
            quotation_id: QuotationId(quotation_id.to_string()),
            requested_by: "U-100".to_string(),
            amount_paid: Decimal::new(25_000, 0),
            amount_remaining: Decimal::new(1_273_300, 0),
            order_category: "retail".to_string(),
            chassis_number: None,
            color: "Pearl White".to_string(),
            status,
            approved_by: None,
            rejection_remark: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn second_live_booking_for_a_quotation_reports_duplicate() {
        let pool = pool_with_quotation("QT-100").await;
        let repo = SqlBookingRepository::new(pool);

        let first = sample_booking("BK-1", "QT-100", BookingStatus::Requested);
        assert_eq!(repo.insert(&first).await.expect("insert"), BookingInsert::Created);

        let second = sample_booking("BK-2", "QT-100", BookingStatus::Requested);
        assert_eq!(repo.insert(&second).await.expect("insert"), BookingInsert::DuplicateActive);

        let active = repo
            .find_active_for_quotation(&first.quotation_id)
            .await
            .expect("query")
            .expect("active booking");
        assert_eq!(active.id, first.id);
    }

    #[tokio::test]
    async fn terminal_booking_does_not_block_resubmission() {
        let pool = pool_with_quotation("QT-101").await;
        let repo = SqlBookingRepository::new(pool);

        let rejected = sample_booking("BK-10", "QT-101", BookingStatus::Rejected);
        assert_eq!(repo.insert(&rejected).await.expect("insert"), BookingInsert::Created);

        let fresh = sample_booking("BK-11", "QT-101", BookingStatus::Requested);
        assert_eq!(repo.insert(&fresh).await.expect("insert"), BookingInsert::Created);

        assert!(repo
            .find_active_for_quotation(&rejected.quotation_id)
            .await
            .expect("query")
            .is_some_and(|b| b.id == fresh.id));
    }

    #[tokio::test]
    async fn update_persists_status_and_chassis() {
        let pool = pool_with_quotation("QT-102").await;
        let repo = SqlBookingRepository::new(pool);

        let mut booking = sample_booking("BK-20", "QT-102", BookingStatus::Requested);
        repo.insert(&booking).await.expect("insert");

        booking.status = BookingStatus::Confirmed;
        booking.approved_by = Some("U-300".to_string());
        booking.chassis_number = Some("MA3EYD32S00100001".to_string());
        booking.updated_at = Utc::now();
        repo.update(&booking).await.expect("update");

        let found = repo.find_by_id(&booking.id).await.expect("find").expect("present");
        assert_eq!(found.status, BookingStatus::Confirmed);
        assert_eq!(found.chassis_number.as_deref(), Some("MA3EYD32S00100001"));
        assert_eq!(found.approved_by.as_deref(), Some("U-300"));
    }
}

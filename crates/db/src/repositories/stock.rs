use sqlx::{sqlite::SqliteRow, Row};

use showroom_core::catalog::Fuel;
use showroom_core::domain::booking::BookingId;
use showroom_core::domain::stock::{StockPool, StockQuery, StockSnapshot, StockUnit};

use super::{ChassisAllocation, RepositoryError, StockRepository};
use crate::DbPool;

const UNIT_COLUMNS: &str =
    "chassis_number, year, model, fuel, variant, color, dealer_code, zone, allocated_booking_id";

pub struct SqlStockRepository {
    pool: DbPool,
}

impl SqlStockRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl StockRepository for SqlStockRepository {
    async fn snapshot(
        &self,
        query: &StockQuery,
        dealer_code: &str,
        zone: &str,
    ) -> Result<StockSnapshot, RepositoryError> {
        let mut sql = format!(
            "SELECT {UNIT_COLUMNS} FROM stock_unit
             WHERE year = ? AND model = ? AND fuel = ?"
        );
        if query.color.is_some() {
            sql.push_str(" AND color = ?");
        }
        sql.push_str(" ORDER BY chassis_number");

        let mut q = sqlx::query(&sql)
            .bind(query.year)
            .bind(&query.model)
            .bind(query.fuel.as_str());
        if let Some(color) = &query.color {
            q = q.bind(color);
        }
        let rows = q.fetch_all(&self.pool).await?;

        let mut snapshot = StockSnapshot { local: Vec::new(), zonal: Vec::new(), plant: Vec::new() };
        for row in rows {
            let unit = stock_unit_from_row(row, dealer_code, zone)?;
            match unit.pool {
                StockPool::Dealer => snapshot.local.push(unit),
                StockPool::Zonal => snapshot.zonal.push(unit),
                StockPool::Plant => snapshot.plant.push(unit),
            }
        }
        Ok(snapshot)
    }

    async fn find_unit(&self, chassis_number: &str) -> Result<Option<StockUnit>, RepositoryError> {
        let row =
            sqlx::query(&format!("SELECT {UNIT_COLUMNS} FROM stock_unit WHERE chassis_number = ?"))
                .bind(chassis_number)
                .fetch_optional(&self.pool)
                .await?;
        // A unit looked up by chassis is always viewed from its own dealer,
        // so classify it into the local pool.
        row.map(|row| {
            let dealer_code = row.try_get::<Option<String>, _>("dealer_code")?;
            stock_unit_from_row(row, dealer_code.as_deref().unwrap_or(""), "")
        })
        .transpose()
    }

    async fn find_allocated_for_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<StockUnit>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {UNIT_COLUMNS} FROM stock_unit WHERE allocated_booking_id = ?"
        ))
        .bind(&booking_id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| {
            let dealer_code = row.try_get::<Option<String>, _>("dealer_code")?;
            stock_unit_from_row(row, dealer_code.as_deref().unwrap_or(""), "")
        })
        .transpose()
    }

    async fn try_allocate(
        &self,
        chassis_number: &str,
        booking_id: &BookingId,
    ) -> Result<ChassisAllocation, RepositoryError> {
        let result = sqlx::query(
            "UPDATE stock_unit
             SET allocated_booking_id = ?
             WHERE chassis_number = ? AND allocated_booking_id IS NULL",
        )
        .bind(&booking_id.0)
        .bind(chassis_number)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(ChassisAllocation::Allocated);
        }

        let row = sqlx::query(
            "SELECT allocated_booking_id FROM stock_unit WHERE chassis_number = ?",
        )
        .bind(chassis_number)
        .fetch_optional(&self.pool)
        .await?;
        let holder = match row {
            Some(row) => {
                row.try_get::<Option<String>, _>("allocated_booking_id")?.map(BookingId)
            }
            None => None,
        };

        Ok(ChassisAllocation::AlreadyHeld { holder })
    }
}

fn stock_unit_from_row(
    row: SqliteRow,
    viewer_dealer_code: &str,
    viewer_zone: &str,
) -> Result<StockUnit, RepositoryError> {
    let fuel_raw = row.try_get::<String, _>("fuel")?;
    let fuel = Fuel::parse(&fuel_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown fuel `{fuel_raw}`")))?;

    let unit_dealer = row.try_get::<Option<String>, _>("dealer_code")?;
    let unit_zone = row.try_get::<Option<String>, _>("zone")?;
    let pool = match (unit_dealer.as_deref(), unit_zone.as_deref()) {
        (Some(code), _) if code == viewer_dealer_code => StockPool::Dealer,
        (_, Some(z)) if z == viewer_zone => StockPool::Zonal,
        _ => StockPool::Plant,
    };

    Ok(StockUnit {
        chassis_number: row.try_get("chassis_number")?,
        year: row.try_get("year")?,
        model: row.try_get("model")?,
        fuel,
        variant: row.try_get("variant")?,
        color: row.try_get("color")?,
        pool,
        allocated_to: row.try_get::<Option<String>, _>("allocated_booking_id")?.map(BookingId),
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use showroom_core::catalog::Fuel;
    use showroom_core::domain::booking::BookingId;
    use showroom_core::domain::stock::StockQuery;

    use super::SqlStockRepository;
    use crate::repositories::{ChassisAllocation, StockRepository};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn seeded_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        for (chassis, color, dealer, zone) in [
            ("CH-0001", "Pearl White", Some("DLR-0001"), Some("west")),
            ("CH-0002", "Pearl White", Some("DLR-0002"), Some("west")),
            ("CH-0003", "Midnight Black", None, None),
        ] {
            sqlx::query(
                "INSERT INTO stock_unit (
                    chassis_number, year, model, fuel, variant, color,
                    dealer_code, zone, created_at
                 ) VALUES (?, 2025, 'BREZZA', 'petrol', 'ZXI', ?, ?, ?, ?)",
            )
            .bind(chassis)
            .bind(color)
            .bind(dealer)
            .bind(zone)
            .bind(Utc::now().to_rfc3339())
            .execute(&pool)
            .await
            .expect("seed stock");
        }
        sqlx::query(
            "INSERT INTO quotation (
                id, customer_id, customer_name, customer_phone,
                year, model, fuel, variant,
                selections_json, breakdown_json, created_at
             ) VALUES ('QT-1', 'C-1', 'A. Kulkarni', '+91-98000-00002',
                2025, 'BREZZA', 'petrol', 'ZXI', '{}', '{}', ?)",
        )
        .bind(Utc::now().to_rfc3339())
        .execute(&pool)
        .await
        .expect("seed quotation");
        for id in ["BK-1", "BK-2"] {
            sqlx::query(
                "INSERT INTO booking (
                    id, quotation_id, requested_by, amount_paid, amount_remaining,
                    order_category, color, status, created_at, updated_at
                 ) VALUES (?, 'QT-1', 'U-100', '0', '0', 'retail', 'Pearl White', ?, ?, ?)",
            )
            .bind(id)
            .bind(if id == "BK-1" { "confirmed" } else { "cancelled" })
            .bind(Utc::now().to_rfc3339())
            .bind(Utc::now().to_rfc3339())
            .execute(&pool)
            .await
            .expect("seed booking");
        }
        pool
    }

    #[tokio::test]
    async fn snapshot_classifies_units_relative_to_the_viewer() {
        let pool = seeded_pool().await;
        let repo = SqlStockRepository::new(pool);

        let query = StockQuery {
            year: 2025,
            model: "BREZZA".to_string(),
            fuel: Fuel::Petrol,
            color: None,
        };
        let snapshot = repo.snapshot(&query, "DLR-0001", "west").await.expect("snapshot");
        assert_eq!(snapshot.local.len(), 1);
        assert_eq!(snapshot.zonal.len(), 1);
        assert_eq!(snapshot.plant.len(), 1);
        assert_eq!(snapshot.local[0].chassis_number, "CH-0001");
        assert_eq!(snapshot.zonal[0].chassis_number, "CH-0002");
    }

    #[tokio::test]
    async fn snapshot_filters_by_color_when_given() {
        let pool = seeded_pool().await;
        let repo = SqlStockRepository::new(pool);

        let query = StockQuery {
            year: 2025,
            model: "BREZZA".to_string(),
            fuel: Fuel::Petrol,
            color: Some("Midnight Black".to_string()),
        };
        let snapshot = repo.snapshot(&query, "DLR-0001", "west").await.expect("snapshot");
        assert!(snapshot.local.is_empty());
        assert!(snapshot.zonal.is_empty());
        assert_eq!(snapshot.plant.len(), 1);
    }

    #[tokio::test]
    async fn allocation_is_first_writer_wins() {
        let pool = seeded_pool().await;
        let repo = SqlStockRepository::new(pool);

        let winner = BookingId("BK-1".to_string());
        let loser = BookingId("BK-2".to_string());
        assert_eq!(
            repo.try_allocate("CH-0001", &winner).await.expect("allocate"),
            ChassisAllocation::Allocated
        );
        assert_eq!(
            repo.try_allocate("CH-0001", &loser).await.expect("allocate"),
            ChassisAllocation::AlreadyHeld { holder: Some(winner.clone()) }
        );

        let unit = repo.find_unit("CH-0001").await.expect("find").expect("present");
        assert_eq!(unit.allocated_to, Some(winner));
    }
}

use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Catalog rows the seed dataset guarantees, keyed by their full identity.
const SEED_VEHICLES: &[SeedVehicleContract] = &[
    SeedVehicleContract {
        year: 2025,
        model: "GRAND VITARA",
        fuel: "petrol",
        variant: "ALPHA",
        esp: "1200000",
        free_stock_units: 3,
    },
    SeedVehicleContract {
        year: 2025,
        model: "BREZZA",
        fuel: "petrol",
        variant: "ZXI",
        esp: "950000",
        free_stock_units: 2,
    },
    SeedVehicleContract {
        year: 2025,
        model: "EVX",
        fuel: "electric",
        variant: "SIGMA",
        esp: "1750000",
        free_stock_units: 1,
    },
];

const SEED_ACCESSORY_COUNT: i64 = 3;
const SEED_VAS_COUNT: i64 = 2;
const SEED_QUOTATION_ID: &str = "QT-SEED-001";
const SEED_BOOKING_ID: &str = "BK-SEED-001";

struct SeedVehicleContract {
    year: i32,
    model: &'static str,
    fuel: &'static str,
    variant: &'static str,
    esp: &'static str,
    free_stock_units: i64,
}

#[derive(Clone, Debug)]
pub struct VehicleSeedInfo {
    pub model: &'static str,
    pub variant: &'static str,
    pub stock_units: i64,
}

#[derive(Clone, Debug)]
pub struct SeedResult {
    pub vehicles_seeded: Vec<VehicleSeedInfo>,
}

#[derive(Clone, Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(String, bool)>,
}

/// Deterministic dealership dataset: three catalog rows, the accessory and
/// VAS menus, yard stock in all three pools, and one priced quotation with
/// its requested booking.
pub struct SeedDataset;

impl SeedDataset {
    pub const SQL: &'static str = include_str!("../../../config/fixtures/seed_dealership.sql");

    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let vehicles_seeded = SEED_VEHICLES
            .iter()
            .map(|vehicle| VehicleSeedInfo {
                model: vehicle.model,
                variant: vehicle.variant,
                stock_units: vehicle.free_stock_units,
            })
            .collect();
        Ok(SeedResult { vehicles_seeded })
    }

    /// Verify that the seed data exists and still matches the contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks: Vec<(String, bool)> = Vec::new();

        for vehicle in SEED_VEHICLES {
            let row_ok: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM catalog_row
                 WHERE year = ?1 AND model = ?2 AND fuel = ?3 AND variant = ?4 AND esp = ?5)",
            )
            .bind(vehicle.year)
            .bind(vehicle.model)
            .bind(vehicle.fuel)
            .bind(vehicle.variant)
            .bind(vehicle.esp)
            .fetch_one(pool)
            .await?;
            checks.push((format!("catalog {} {}", vehicle.model, vehicle.variant), row_ok == 1));

            let free_units: i64 = sqlx::query_scalar(
                "SELECT COUNT(1) FROM stock_unit
                 WHERE year = ?1 AND model = ?2 AND fuel = ?3 AND variant = ?4
                   AND allocated_booking_id IS NULL",
            )
            .bind(vehicle.year)
            .bind(vehicle.model)
            .bind(vehicle.fuel)
            .bind(vehicle.variant)
            .fetch_one(pool)
            .await?;
            checks.push((
                format!("stock {} {}", vehicle.model, vehicle.variant),
                free_units == vehicle.free_stock_units,
            ));
        }

        let accessory_count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM accessory").fetch_one(pool).await?;
        checks.push(("accessory menu".to_string(), accessory_count == SEED_ACCESSORY_COUNT));

        let vas_count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM vas_option").fetch_one(pool).await?;
        checks.push(("vas menu".to_string(), vas_count == SEED_VAS_COUNT));

        let quotation_ok: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM quotation WHERE id = ?1)")
                .bind(SEED_QUOTATION_ID)
                .fetch_one(pool)
                .await?;
        checks.push(("seed quotation".to_string(), quotation_ok == 1));

        let booking_ok: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM booking
             WHERE id = ?1 AND quotation_id = ?2 AND status = 'requested')",
        )
        .bind(SEED_BOOKING_ID)
        .bind(SEED_QUOTATION_ID)
        .fetch_one(pool)
        .await?;
        checks.push(("seed booking".to_string(), booking_ok == 1));

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }
}

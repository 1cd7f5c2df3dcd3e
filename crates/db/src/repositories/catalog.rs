use sqlx::{sqlite::SqliteRow, Row};

use showroom_core::catalog::{AccessoryItem, CatalogKey, CatalogRow, Fuel, VasOption};

use super::{parse_decimal, parse_json, to_json, CatalogRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const ROW_COLUMNS: &str = "year, model, fuel, variant, esp, rto_amounts_json, insurance_base,
    insurance_addons_json, discounts_json, add_disc_lim, cod, warranty_tiers_json, fast_tag_fee";

#[async_trait::async_trait]
impl CatalogRepository for SqlCatalogRepository {
    async fn find_row(&self, key: &CatalogKey) -> Result<Option<CatalogRow>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {ROW_COLUMNS}
             FROM catalog_row
             WHERE year = ? AND model = ? AND fuel = ? AND variant = ?"
        ))
        .bind(key.year)
        .bind(&key.model)
        .bind(key.fuel.as_str())
        .bind(&key.variant)
        .fetch_optional(&self.pool)
        .await?;

        row.map(catalog_row_from_row).transpose()
    }

    async fn list_rows(&self, year: i32) -> Result<Vec<CatalogRow>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {ROW_COLUMNS}
             FROM catalog_row
             WHERE year = ?
             ORDER BY model ASC, variant ASC"
        ))
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(catalog_row_from_row).collect()
    }

    async fn list_accessories(&self) -> Result<Vec<AccessoryItem>, RepositoryError> {
        let rows = sqlx::query("SELECT code, name, price FROM accessory ORDER BY code ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(AccessoryItem {
                    code: row.try_get("code")?,
                    name: row.try_get("name")?,
                    price: parse_decimal("price", row.try_get("price")?)?,
                })
            })
            .collect()
    }

    async fn list_vas_options(&self) -> Result<Vec<VasOption>, RepositoryError> {
        let rows = sqlx::query("SELECT code, name, price FROM vas_option ORDER BY code ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(VasOption {
                    code: row.try_get("code")?,
                    name: row.try_get("name")?,
                    price: parse_decimal("price", row.try_get("price")?)?,
                })
            })
            .collect()
    }

    async fn save_row(&self, row: CatalogRow) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO catalog_row (
                year, model, fuel, variant, esp, rto_amounts_json, insurance_base,
                insurance_addons_json, discounts_json, add_disc_lim, cod,
                warranty_tiers_json, fast_tag_fee
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(year, model, fuel, variant) DO UPDATE SET
                esp = excluded.esp,
                rto_amounts_json = excluded.rto_amounts_json,
                insurance_base = excluded.insurance_base,
                insurance_addons_json = excluded.insurance_addons_json,
                discounts_json = excluded.discounts_json,
                add_disc_lim = excluded.add_disc_lim,
                cod = excluded.cod,
                warranty_tiers_json = excluded.warranty_tiers_json,
                fast_tag_fee = excluded.fast_tag_fee",
        )
        .bind(row.key.year)
        .bind(&row.key.model)
        .bind(row.key.fuel.as_str())
        .bind(&row.key.variant)
        .bind(row.esp.to_string())
        .bind(to_json("rto_amounts_json", &row.rto_amounts)?)
        .bind(row.insurance_base.to_string())
        .bind(to_json("insurance_addons_json", &row.insurance_addons)?)
        .bind(to_json("discounts_json", &row.discounts)?)
        .bind(row.add_disc_lim.to_string())
        .bind(row.cod.to_string())
        .bind(to_json("warranty_tiers_json", &row.warranty_tiers)?)
        .bind(row.fast_tag_fee.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn catalog_row_from_row(row: SqliteRow) -> Result<CatalogRow, RepositoryError> {
    let fuel_raw = row.try_get::<String, _>("fuel")?;
    let fuel = Fuel::parse(&fuel_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown fuel `{fuel_raw}`")))?;

    Ok(CatalogRow {
        key: CatalogKey {
            year: row.try_get("year")?,
            model: row.try_get("model")?,
            fuel,
            variant: row.try_get("variant")?,
        },
        esp: parse_decimal("esp", row.try_get("esp")?)?,
        rto_amounts: parse_json("rto_amounts_json", row.try_get("rto_amounts_json")?)?,
        insurance_base: parse_decimal("insurance_base", row.try_get("insurance_base")?)?,
        insurance_addons: parse_json("insurance_addons_json", row.try_get("insurance_addons_json")?)?,
        discounts: parse_json("discounts_json", row.try_get("discounts_json")?)?,
        add_disc_lim: parse_decimal("add_disc_lim", row.try_get("add_disc_lim")?)?,
        cod: parse_decimal("cod", row.try_get("cod")?)?,
        warranty_tiers: parse_json("warranty_tiers_json", row.try_get("warranty_tiers_json")?)?,
        fast_tag_fee: parse_decimal("fast_tag_fee", row.try_get("fast_tag_fee")?)?,
    })
}

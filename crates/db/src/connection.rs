use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqliteConnection;

use showroom_core::config::DatabaseConfig;

pub type DbPool = sqlx::SqlitePool;

/// Pragmas applied to every pooled connection. Foreign keys are enforced
/// because `stock_unit.allocated_booking_id` references booking rows.
async fn apply_session_pragmas(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    for pragma in
        ["PRAGMA foreign_keys = ON", "PRAGMA journal_mode = WAL", "PRAGMA busy_timeout = 5000"]
    {
        sqlx::query(pragma).execute(&mut *conn).await?;
    }
    Ok(())
}

pub async fn connect(settings: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(&settings.url, settings.max_connections, settings.timeout_secs).await
}

pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| Box::pin(apply_session_pragmas(conn)))
        .connect(database_url)
        .await
}

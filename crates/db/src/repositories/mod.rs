use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use showroom_core::audit::AuditEvent;
use showroom_core::catalog::{AccessoryItem, CatalogKey, CatalogRow, VasOption};
use showroom_core::domain::booking::{Booking, BookingId};
use showroom_core::domain::quotation::{Quotation, QuotationId};
use showroom_core::domain::stock::{StockQuery, StockSnapshot, StockUnit};

pub mod audit;
pub mod booking;
pub mod catalog;
pub mod memory;
pub mod quotation;
pub mod stock;

pub use audit::SqlAuditRepository;
pub use booking::SqlBookingRepository;
pub use catalog::SqlCatalogRepository;
pub use memory::{
    InMemoryAuditRepository, InMemoryBookingRepository, InMemoryCatalogRepository,
    InMemoryQuotationRepository, InMemoryStockRepository,
};
pub use quotation::SqlQuotationRepository;
pub use stock::SqlStockRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Result of inserting a booking under the one-live-booking-per-quotation
/// constraint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookingInsert {
    Created,
    /// The partial unique index rejected the row; another live booking
    /// already references the quotation.
    DuplicateActive,
}

/// Result of the compare-and-set allocation of one chassis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChassisAllocation {
    Allocated,
    /// The unit was already bound. The holder is reported when the unit
    /// still exists.
    AlreadyHeld { holder: Option<BookingId> },
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn find_row(&self, key: &CatalogKey) -> Result<Option<CatalogRow>, RepositoryError>;
    async fn list_rows(&self, year: i32) -> Result<Vec<CatalogRow>, RepositoryError>;
    async fn list_accessories(&self) -> Result<Vec<AccessoryItem>, RepositoryError>;
    async fn list_vas_options(&self) -> Result<Vec<VasOption>, RepositoryError>;
    async fn save_row(&self, row: CatalogRow) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait QuotationRepository: Send + Sync {
    async fn find_by_id(&self, id: &QuotationId) -> Result<Option<Quotation>, RepositoryError>;
    async fn save(&self, quotation: Quotation) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError>;

    /// The live (non-terminal) booking for a quotation, if any.
    async fn find_active_for_quotation(
        &self,
        quotation_id: &QuotationId,
    ) -> Result<Option<Booking>, RepositoryError>;

    async fn insert(&self, booking: &Booking) -> Result<BookingInsert, RepositoryError>;
    async fn update(&self, booking: &Booking) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait StockRepository: Send + Sync {
    /// Matching units partitioned into dealer/zonal/plant pools relative to
    /// the given dealer identity.
    async fn snapshot(
        &self,
        query: &StockQuery,
        dealer_code: &str,
        zone: &str,
    ) -> Result<StockSnapshot, RepositoryError>;

    async fn find_unit(&self, chassis_number: &str) -> Result<Option<StockUnit>, RepositoryError>;

    /// The unit currently bound to a booking, if any. Lets an interrupted
    /// resolution pick its allocation back up.
    async fn find_allocated_for_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<StockUnit>, RepositoryError>;

    /// Binds a chassis to a booking only if it is currently unallocated.
    async fn try_allocate(
        &self,
        chassis_number: &str,
        booking_id: &BookingId,
    ) -> Result<ChassisAllocation, RepositoryError>;
}

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn append(&self, event: &AuditEvent) -> Result<(), RepositoryError>;
    async fn list_for_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Vec<AuditEvent>, RepositoryError>;
}

pub(crate) fn parse_decimal(column: &str, value: String) -> Result<Decimal, RepositoryError> {
    value.parse::<Decimal>().map_err(|error| {
        RepositoryError::Decode(format!("invalid decimal in `{column}`: `{value}` ({error})"))
    })
}

pub(crate) fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}

pub(crate) fn parse_optional_timestamp(
    column: &str,
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>, RepositoryError> {
    value.map(|timestamp| parse_timestamp(column, timestamp)).transpose()
}

pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    column: &str,
    value: String,
) -> Result<T, RepositoryError> {
    serde_json::from_str(&value).map_err(|error| {
        RepositoryError::Decode(format!("invalid json in `{column}`: {error}"))
    })
}

pub(crate) fn to_json<T: serde::Serialize>(
    column: &str,
    value: &T,
) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|error| {
        RepositoryError::Decode(format!("could not encode `{column}` as json: {error}"))
    })
}

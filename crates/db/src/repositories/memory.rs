use std::collections::HashMap;

use tokio::sync::RwLock;

use showroom_core::audit::AuditEvent;
use showroom_core::catalog::{AccessoryItem, CatalogKey, CatalogRow, VasOption};
use showroom_core::domain::booking::{Booking, BookingId};
use showroom_core::domain::quotation::{Quotation, QuotationId};
use showroom_core::domain::stock::{StockPool, StockQuery, StockSnapshot, StockUnit};

use super::{
    AuditRepository, BookingInsert, BookingRepository, CatalogRepository, ChassisAllocation,
    QuotationRepository, RepositoryError, StockRepository,
};

#[derive(Default)]
pub struct InMemoryCatalogRepository {
    rows: RwLock<HashMap<CatalogKey, CatalogRow>>,
    accessories: RwLock<Vec<AccessoryItem>>,
    vas_options: RwLock<Vec<VasOption>>,
}

impl InMemoryCatalogRepository {
    pub async fn set_accessories(&self, items: Vec<AccessoryItem>) {
        *self.accessories.write().await = items;
    }

    pub async fn set_vas_options(&self, items: Vec<VasOption>) {
        *self.vas_options.write().await = items;
    }
}

#[async_trait::async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn find_row(&self, key: &CatalogKey) -> Result<Option<CatalogRow>, RepositoryError> {
        let rows = self.rows.read().await;
        Ok(rows.get(key).cloned())
    }

    async fn list_rows(&self, year: i32) -> Result<Vec<CatalogRow>, RepositoryError> {
        let rows = self.rows.read().await;
        let mut matching: Vec<CatalogRow> =
            rows.values().filter(|row| row.key.year == year).cloned().collect();
        matching.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(matching)
    }

    async fn list_accessories(&self) -> Result<Vec<AccessoryItem>, RepositoryError> {
        Ok(self.accessories.read().await.clone())
    }

    async fn list_vas_options(&self) -> Result<Vec<VasOption>, RepositoryError> {
        Ok(self.vas_options.read().await.clone())
    }

    async fn save_row(&self, row: CatalogRow) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().await;
        rows.insert(row.key.clone(), row);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryQuotationRepository {
    quotations: RwLock<HashMap<String, Quotation>>,
}

#[async_trait::async_trait]
impl QuotationRepository for InMemoryQuotationRepository {
    async fn find_by_id(&self, id: &QuotationId) -> Result<Option<Quotation>, RepositoryError> {
        let quotations = self.quotations.read().await;
        Ok(quotations.get(&id.0).cloned())
    }

    async fn save(&self, quotation: Quotation) -> Result<(), RepositoryError> {
        let mut quotations = self.quotations.write().await;
        quotations.insert(quotation.id.0.clone(), quotation);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryBookingRepository {
    bookings: RwLock<HashMap<String, Booking>>,
}

#[async_trait::async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        let bookings = self.bookings.read().await;
        Ok(bookings.get(&id.0).cloned())
    }

    async fn find_active_for_quotation(
        &self,
        quotation_id: &QuotationId,
    ) -> Result<Option<Booking>, RepositoryError> {
        let bookings = self.bookings.read().await;
        Ok(bookings
            .values()
            .find(|b| b.quotation_id == *quotation_id && !b.status.is_terminal())
            .cloned())
    }

    async fn insert(&self, booking: &Booking) -> Result<BookingInsert, RepositoryError> {
        let mut bookings = self.bookings.write().await;
        let has_active = bookings
            .values()
            .any(|b| b.quotation_id == booking.quotation_id && !b.status.is_terminal());
        if has_active && !booking.status.is_terminal() {
            return Ok(BookingInsert::DuplicateActive);
        }
        bookings.insert(booking.id.0.clone(), booking.clone());
        Ok(BookingInsert::Created)
    }

    async fn update(&self, booking: &Booking) -> Result<(), RepositoryError> {
        let mut bookings = self.bookings.write().await;
        bookings.insert(booking.id.0.clone(), booking.clone());
        Ok(())
    }
}

/// In-memory units carry their pool directly instead of a dealer identity,
/// so snapshots ignore the viewer arguments.
#[derive(Default)]
pub struct InMemoryStockRepository {
    units: RwLock<HashMap<String, StockUnit>>,
}

impl InMemoryStockRepository {
    pub async fn add_unit(&self, unit: StockUnit) {
        let mut units = self.units.write().await;
        units.insert(unit.chassis_number.clone(), unit);
    }
}

#[async_trait::async_trait]
impl StockRepository for InMemoryStockRepository {
    async fn snapshot(
        &self,
        query: &StockQuery,
        _dealer_code: &str,
        _zone: &str,
    ) -> Result<StockSnapshot, RepositoryError> {
        let units = self.units.read().await;
        let mut matching: Vec<StockUnit> = units
            .values()
            .filter(|unit| {
                unit.year == query.year
                    && unit.model == query.model
                    && unit.fuel == query.fuel
                    && query.color.as_ref().map_or(true, |color| unit.color == *color)
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.chassis_number.cmp(&b.chassis_number));

        let mut snapshot = StockSnapshot { local: Vec::new(), zonal: Vec::new(), plant: Vec::new() };
        for unit in matching {
            match unit.pool {
                StockPool::Dealer => snapshot.local.push(unit),
                StockPool::Zonal => snapshot.zonal.push(unit),
                StockPool::Plant => snapshot.plant.push(unit),
            }
        }
        Ok(snapshot)
    }

    async fn find_unit(&self, chassis_number: &str) -> Result<Option<StockUnit>, RepositoryError> {
        let units = self.units.read().await;
        Ok(units.get(chassis_number).cloned())
    }

    async fn find_allocated_for_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<StockUnit>, RepositoryError> {
        let units = self.units.read().await;
        Ok(units.values().find(|unit| unit.allocated_to.as_ref() == Some(booking_id)).cloned())
    }

    async fn try_allocate(
        &self,
        chassis_number: &str,
        booking_id: &BookingId,
    ) -> Result<ChassisAllocation, RepositoryError> {
        let mut units = self.units.write().await;
        match units.get_mut(chassis_number) {
            Some(unit) => match &unit.allocated_to {
                Some(holder) => {
                    Ok(ChassisAllocation::AlreadyHeld { holder: Some(holder.clone()) })
                }
                None => {
                    unit.allocated_to = Some(booking_id.clone());
                    Ok(ChassisAllocation::Allocated)
                }
            },
            None => Ok(ChassisAllocation::AlreadyHeld { holder: None }),
        }
    }
}

#[derive(Default)]
pub struct InMemoryAuditRepository {
    events: RwLock<Vec<AuditEvent>>,
}

#[async_trait::async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn append(&self, event: &AuditEvent) -> Result<(), RepositoryError> {
        let mut events = self.events.write().await;
        events.push(event.clone());
        Ok(())
    }

    async fn list_for_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Vec<AuditEvent>, RepositoryError> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .filter(|event| event.booking_id.as_ref() == Some(booking_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use showroom_core::catalog::Fuel;
    use showroom_core::domain::booking::{Booking, BookingId, BookingStatus};
    use showroom_core::domain::quotation::QuotationId;
    use showroom_core::domain::stock::{StockPool, StockQuery, StockUnit};

    use super::{InMemoryBookingRepository, InMemoryStockRepository};
    use crate::repositories::{
        BookingInsert, BookingRepository, ChassisAllocation, StockRepository,
    };

    fn booking(id: &str, quotation_id: &str, status: BookingStatus) -> Booking {
        let now = Utc::now();
        Booking {
            id: BookingId(id.to_string()),
            quotation_id: QuotationId(quotation_id.to_string()),
            requested_by: "U-100".to_string(),
            amount_paid: Decimal::ZERO,
            amount_remaining: Decimal::ZERO,
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

    fn unit(chassis: &str, pool: StockPool) -> StockUnit {
        StockUnit {
            chassis_number: chassis.to_string(),
            year: 2025,
            model: "BREZZA".to_string(),
            fuel: Fuel::Petrol,
            variant: "ZXI".to_string(),
            color: "Pearl White".to_string(),
            pool,
            allocated_to: None,
        }
    }

    #[tokio::test]
    async fn duplicate_live_booking_is_rejected() {
        let repo = InMemoryBookingRepository::default();
        let first = booking("BK-1", "QT-1", BookingStatus::Requested);
        assert_eq!(repo.insert(&first).await.expect("insert"), BookingInsert::Created);
        let second = booking("BK-2", "QT-1", BookingStatus::Requested);
        assert_eq!(repo.insert(&second).await.expect("insert"), BookingInsert::DuplicateActive);
    }

    #[tokio::test]
    async fn allocation_reports_the_current_holder() {
        let repo = InMemoryStockRepository::default();
        repo.add_unit(unit("CH-1", StockPool::Dealer)).await;

        let winner = BookingId("BK-1".to_string());
        assert_eq!(
            repo.try_allocate("CH-1", &winner).await.expect("allocate"),
            ChassisAllocation::Allocated
        );
        assert_eq!(
            repo.try_allocate("CH-1", &BookingId("BK-2".to_string())).await.expect("allocate"),
            ChassisAllocation::AlreadyHeld { holder: Some(winner) }
        );
    }

    #[tokio::test]
    async fn snapshot_orders_units_by_chassis_within_each_pool() {
        let repo = InMemoryStockRepository::default();
        repo.add_unit(unit("CH-2", StockPool::Dealer)).await;
        repo.add_unit(unit("CH-1", StockPool::Dealer)).await;
        repo.add_unit(unit("CH-3", StockPool::Plant)).await;

        let query = StockQuery {
            year: 2025,
            model: "BREZZA".to_string(),
            fuel: Fuel::Petrol,
            color: None,
        };
        let snapshot = repo.snapshot(&query, "DLR-0001", "west").await.expect("snapshot");
        let local: Vec<&str> =
            snapshot.local.iter().map(|u| u.chassis_number.as_str()).collect();
        assert_eq!(local, vec!["CH-1", "CH-2"]);
        assert_eq!(snapshot.plant.len(), 1);
    }
}

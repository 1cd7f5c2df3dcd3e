use serde::{Deserialize, Serialize};

use crate::catalog::Fuel;
use crate::domain::booking::BookingId;

/// Tiered stock pools, nearest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockPool {
    Dealer,
    Zonal,
    Plant,
}

impl StockPool {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dealer => "dealer",
            Self::Zonal => "zonal",
            Self::Plant => "plant",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dealer" => Some(Self::Dealer),
            "zonal" => Some(Self::Zonal),
            "plant" => Some(Self::Plant),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockUnit {
    pub chassis_number: String,
    pub year: i32,
    pub model: String,
    pub fuel: Fuel,
    pub variant: String,
    pub color: String,
    pub pool: StockPool,
    pub allocated_to: Option<BookingId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockQuery {
    pub year: i32,
    pub model: String,
    pub fuel: Fuel,
    pub color: Option<String>,
}

/// Transient availability view for one vehicle specification. Recomputed on
/// demand, never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub local: Vec<StockUnit>,
    pub zonal: Vec<StockUnit>,
    pub plant: Vec<StockUnit>,
}

/// Outcome of resolving a snapshot for a booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// A dealer-pool unit is free; the booking can proceed automatically.
    Allocate(StockUnit),
    /// Vehicle not available locally. Counts are informational only; stock
    /// in outer pools never auto-allocates.
    Vna { zonal: usize, plant: usize },
}

impl StockSnapshot {
    fn first_free_local(&self) -> Option<&StockUnit> {
        self.local.iter().find(|unit| unit.allocated_to.is_none())
    }

    /// Only the dealer pool qualifies a booking for automatic confirmation.
    pub fn resolve(&self) -> Resolution {
        match self.first_free_local() {
            Some(unit) => Resolution::Allocate(unit.clone()),
            None => Resolution::Vna {
                zonal: self.zonal.iter().filter(|unit| unit.allocated_to.is_none()).count(),
                plant: self.plant.iter().filter(|unit| unit.allocated_to.is_none()).count(),
            },
        }
    }
}

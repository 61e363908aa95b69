//! Row structs for the proposal itinerary tables.
//!
//! These are read by `ItineraryRepo` and folded into
//! [`kitasuro_core::itinerary::ItineraryData`]; handlers never see them.

use serde::Deserialize;
use sqlx::FromRow;
use kitasuro_core::itinerary::Day;
use kitasuro_core::pricing::{Extra, PricingRow};
use kitasuro_core::types::DbId;

/// A row from `proposal_days`, with the destination name resolved.
#[derive(Debug, Clone, FromRow)]
pub struct DayRow {
    pub id: DbId,
    pub day_number: i32,
    pub title: String,
    pub description: Option<String>,
    pub destination_id: Option<DbId>,
    pub destination_name: Option<String>,
    pub breakfast: bool,
    pub lunch: bool,
    pub dinner: bool,
}

/// A row from `day_activities`.
#[derive(Debug, Clone, FromRow)]
pub struct ActivityRow {
    pub day_id: DbId,
    pub name: String,
    pub moment: String,
    pub is_optional: bool,
    pub description: Option<String>,
}

/// A row from `day_accommodations`.
#[derive(Debug, Clone, FromRow)]
pub struct AccommodationRow {
    pub day_id: DbId,
    pub name: String,
}

/// A row from `proposal_pricing_rows`.
#[derive(Debug, Clone, FromRow)]
pub struct PricingRowRow {
    pub traveler_type: String,
    pub unit_price: f64,
    pub count: i32,
}

impl From<PricingRowRow> for PricingRow {
    fn from(row: PricingRowRow) -> Self {
        Self {
            traveler_type: row.traveler_type,
            unit_price: row.unit_price,
            count: row.count,
        }
    }
}

/// A row from `proposal_extras`.
#[derive(Debug, Clone, FromRow)]
pub struct ExtraRow {
    pub name: String,
    pub price: f64,
    pub selected: bool,
}

impl From<ExtraRow> for Extra {
    fn from(row: ExtraRow) -> Self {
        Self {
            name: row.name,
            price: row.price,
            selected: row.selected,
        }
    }
}

/// Full replacement of a proposal's itinerary.
///
/// Day numbers in the payload are ignored; days are stored in list order.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveItinerary {
    pub expected_version: i64,
    #[serde(default)]
    pub days: Vec<Day>,
    #[serde(default)]
    pub pricing_rows: Vec<PricingRow>,
    #[serde(default)]
    pub extras: Vec<Extra>,
}

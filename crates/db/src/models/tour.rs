//! Tour template model.

use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use kitasuro_core::itinerary::Day;
use kitasuro_core::types::{DbId, Timestamp};

/// A row from the `tours` table.
///
/// Days are stored as one JSONB document.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tour {
    pub id: DbId,
    pub organization_id: DbId,
    pub name: String,
    pub overview: String,
    pub price: f64,
    pub tags: Vec<String>,
    pub days: Json<Vec<Day>>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

//! Destination (park / location) model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use kitasuro_core::types::{DbId, Timestamp};

/// A row from the `destinations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Destination {
    pub id: DbId,
    pub organization_id: DbId,
    pub name: String,
    pub kind: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a destination.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDestination {
    pub name: String,
    pub kind: Option<String>,
}

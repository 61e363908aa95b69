//! Staff user model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use kitasuro_core::types::{DbId, Timestamp};

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub organization_id: DbId,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a user. `role` defaults to `staff`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub organization_id: DbId,
    pub email: String,
    pub display_name: String,
    pub role: Option<String>,
}

//! Organization (agency tenant) model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use kitasuro_core::types::{DbId, Timestamp};

/// A row from the `organizations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Organization {
    pub id: DbId,
    pub name: Option<String>,
    pub notification_email: Option<String>,
    pub onboarding_completed: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new organization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOrganization {
    pub name: Option<String>,
    pub notification_email: Option<String>,
}

/// DTO for updating organization settings (admin only).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOrganization {
    pub name: Option<String>,
    pub notification_email: Option<String>,
}

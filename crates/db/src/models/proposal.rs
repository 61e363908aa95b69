//! Proposal model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use kitasuro_core::error::CoreError;
use kitasuro_core::proposal::ProposalStatus;
use kitasuro_core::theme::ThemeId;
use kitasuro_core::types::{DbId, Timestamp};
use uuid::Uuid;

/// A row from the `proposals` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Proposal {
    pub id: DbId,
    pub organization_id: DbId,
    pub tour_id: Option<DbId>,
    pub title: String,
    pub client_name: Option<String>,
    pub theme: String,
    pub status: String,
    pub version: i64,
    pub share_token: Uuid,
    pub shared_at: Option<Timestamp>,
    pub confirmed_by_name: Option<String>,
    pub confirmed_at: Option<Timestamp>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Proposal {
    pub fn status(&self) -> Result<ProposalStatus, CoreError> {
        ProposalStatus::from_str(&self.status)
    }

    pub fn theme(&self) -> Result<ThemeId, CoreError> {
        ThemeId::from_str(&self.theme)
    }
}

/// DTO for creating a blank proposal.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProposal {
    pub title: String,
    pub client_name: Option<String>,
    pub theme: Option<ThemeId>,
}

/// DTO for cloning a proposal from a tour template.
#[derive(Debug, Clone, Deserialize)]
pub struct CloneFromTour {
    pub tour_id: DbId,
    pub title: Option<String>,
    pub client_name: Option<String>,
    pub theme: Option<ThemeId>,
}

/// DTO for editing proposal metadata. `expected_version` is mandatory.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProposal {
    pub expected_version: i64,
    pub title: Option<String>,
    pub client_name: Option<String>,
    pub theme: Option<ThemeId>,
}

/// Body of a share request.
#[derive(Debug, Clone, Deserialize)]
pub struct ShareProposal {
    pub expected_version: i64,
}

/// Body of a client confirmation.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmProposal {
    pub name: String,
}

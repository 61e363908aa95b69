//! Proposal lifecycle and concurrency rules.
//!
//! Status moves strictly forward: `draft -> shared -> confirmed`. Sharing is
//! done by staff; confirming is done by the client through the share link.
//! Every mutable write carries the version the editor last saw.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const PROPOSAL_STATUS_DRAFT: &str = "draft";
pub const PROPOSAL_STATUS_SHARED: &str = "shared";
pub const PROPOSAL_STATUS_CONFIRMED: &str = "confirmed";

/// Maximum length of a proposal title.
pub const MAX_PROPOSAL_TITLE_LENGTH: usize = 200;

/// Maximum length of the name a client confirms with.
pub const MAX_CONFIRMER_NAME_LENGTH: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Draft,
    Shared,
    Confirmed,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => PROPOSAL_STATUS_DRAFT,
            Self::Shared => PROPOSAL_STATUS_SHARED,
            Self::Confirmed => PROPOSAL_STATUS_CONFIRMED,
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            PROPOSAL_STATUS_DRAFT => Ok(Self::Draft),
            PROPOSAL_STATUS_SHARED => Ok(Self::Shared),
            PROPOSAL_STATUS_CONFIRMED => Ok(Self::Confirmed),
            _ => Err(CoreError::Validation(format!(
                "Invalid proposal status '{s}'. Must be one of: draft, shared, confirmed"
            ))),
        }
    }

    /// Staff share a draft with the client.
    pub fn share(self) -> Result<Self, CoreError> {
        match self {
            Self::Draft => Ok(Self::Shared),
            other => Err(invalid_transition(other, Self::Shared)),
        }
    }

    /// The client confirms a shared proposal.
    pub fn confirm(self) -> Result<Self, CoreError> {
        match self {
            Self::Shared => Ok(Self::Confirmed),
            other => Err(invalid_transition(other, Self::Confirmed)),
        }
    }

    /// Whether staff may still edit the itinerary.
    pub fn is_editable(self) -> bool {
        self != Self::Confirmed
    }

    /// Whether the share link exposes the proposal to the client.
    pub fn is_client_visible(self) -> bool {
        self != Self::Draft
    }
}

fn invalid_transition(from: ProposalStatus, to: ProposalStatus) -> CoreError {
    CoreError::Conflict(format!(
        "Cannot move proposal from '{}' to '{}'",
        from.as_str(),
        to.as_str()
    ))
}

/// Reject a write whose expected version is stale.
pub fn check_version(current: i64, expected: i64) -> Result<(), CoreError> {
    if current != expected {
        return Err(CoreError::Conflict(format!(
            "Proposal was modified by someone else (expected version {expected}, current {current})"
        )));
    }
    Ok(())
}

pub fn validate_proposal_title(title: &str) -> Result<(), CoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Proposal title must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_PROPOSAL_TITLE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Proposal title exceeds {MAX_PROPOSAL_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

pub fn validate_confirmer_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "A name is required to confirm the proposal".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_CONFIRMER_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Name exceeds {MAX_CONFIRMER_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

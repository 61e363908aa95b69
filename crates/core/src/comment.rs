//! Proposal comment constants, status transitions, and validation.
//!
//! Comments are pinned to a proposal at an [`Anchor`](crate::anchor::Anchor)
//! and carry a flat list of replies. Status only ever moves
//! `open -> resolved`; resolved threads are read-only but kept for history.

use serde::{Deserialize, Serialize};

use crate::anchor::{validate_comment_anchor, CommentAnchor};
use crate::error::CoreError;

/* --------------------------------------------------------------------------
Constants
-------------------------------------------------------------------------- */

/// Maximum length for a comment or reply body.
pub const MAX_COMMENT_LENGTH: usize = 5_000;

/// Maximum length for a free-text author name.
pub const MAX_AUTHOR_NAME_LENGTH: usize = 120;

pub const COMMENT_STATUS_OPEN: &str = "open";
pub const COMMENT_STATUS_RESOLVED: &str = "resolved";

/* --------------------------------------------------------------------------
Status
-------------------------------------------------------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentStatus {
    Open,
    Resolved,
}

impl CommentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => COMMENT_STATUS_OPEN,
            Self::Resolved => COMMENT_STATUS_RESOLVED,
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            COMMENT_STATUS_OPEN => Ok(Self::Open),
            COMMENT_STATUS_RESOLVED => Ok(Self::Resolved),
            _ => Err(CoreError::Validation(format!(
                "Invalid comment status '{s}'. Must be one of: open, resolved"
            ))),
        }
    }

    /// Apply a resolve request. Resolving twice is a no-op.
    pub fn resolve(self) -> Self {
        Self::Resolved
    }

    /// Replies are only accepted on open threads.
    pub fn ensure_accepts_replies(self) -> Result<(), CoreError> {
        match self {
            Self::Open => Ok(()),
            Self::Resolved => Err(CoreError::Conflict(
                "Comment is resolved and no longer accepts replies".to_string(),
            )),
        }
    }
}

/// Which threads a list request returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentFilter {
    #[default]
    All,
    Open,
    Resolved,
}

impl CommentFilter {
    pub fn admits(&self, status: CommentStatus) -> bool {
        match self {
            Self::All => true,
            Self::Open => status == CommentStatus::Open,
            Self::Resolved => status == CommentStatus::Resolved,
        }
    }
}

/* --------------------------------------------------------------------------
Validation
-------------------------------------------------------------------------- */

fn validate_text(value: &str, label: &str, max: usize) -> Result<(), CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{label} must not be empty")));
    }
    if trimmed.chars().count() > max {
        return Err(CoreError::Validation(format!(
            "{label} exceeds maximum length of {max} characters"
        )));
    }
    Ok(())
}

/// Validate a comment or reply body (non-empty after trimming).
pub fn validate_comment_content(content: &str) -> Result<(), CoreError> {
    validate_text(content, "Comment content", MAX_COMMENT_LENGTH)
}

/// Validate a free-text author name (not a verified identity).
pub fn validate_author_name(name: &str) -> Result<(), CoreError> {
    validate_text(name, "Author name", MAX_AUTHOR_NAME_LENGTH)
}

/// Validate everything a new comment carries.
pub fn validate_new_comment(
    author_name: &str,
    content: &str,
    anchor: &CommentAnchor,
) -> Result<(), CoreError> {
    validate_author_name(author_name)?;
    validate_comment_content(content)?;
    validate_comment_anchor(anchor)
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::Anchor;
    use assert_matches::assert_matches;

    #[test]
    fn status_round_trip() {
        for s in [CommentStatus::Open, CommentStatus::Resolved] {
            assert_eq!(CommentStatus::from_str(s.as_str()).unwrap(), s);
        }
        assert!(CommentStatus::from_str("reopened").is_err());
    }

    #[test]
    fn resolve_is_idempotent() {
        let once = CommentStatus::Open.resolve();
        assert_eq!(once, CommentStatus::Resolved);
        assert_eq!(once.resolve(), CommentStatus::Resolved);
    }

    #[test]
    fn resolved_thread_rejects_replies() {
        assert!(CommentStatus::Open.ensure_accepts_replies().is_ok());
        assert_matches!(
            CommentStatus::Resolved.ensure_accepts_replies(),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn filter_admits() {
        assert!(CommentFilter::All.admits(CommentStatus::Resolved));
        assert!(CommentFilter::Open.admits(CommentStatus::Open));
        assert!(!CommentFilter::Open.admits(CommentStatus::Resolved));
        assert!(CommentFilter::Resolved.admits(CommentStatus::Resolved));
    }

    #[test]
    fn blank_content_rejected() {
        assert!(validate_comment_content("   \n\t").is_err());
        assert!(validate_comment_content(" ok ").is_ok());
    }

    #[test]
    fn overlong_content_rejected() {
        let long = "a".repeat(MAX_COMMENT_LENGTH + 1);
        let err = validate_comment_content(&long).unwrap_err();
        assert!(err.to_string().contains("maximum length"));
    }

    #[test]
    fn new_comment_checks_anchor() {
        let bad = CommentAnchor {
            container: Anchor::Point { x: 140.0, y: 10.0 },
            sticky: None,
        };
        assert!(validate_new_comment("Ana", "Looks good", &bad).is_err());
        assert!(validate_new_comment("Ana", "Looks good", &CommentAnchor::point(40.0, 60.0)).is_ok());
        assert!(validate_new_comment("  ", "Looks good", &CommentAnchor::point(1.0, 1.0)).is_err());
    }
}

//! Anchored comment and reply models.
//!
//! The anchor is stored flat (`pos_x`, `width`, `sticky_ref_kind`, ...) and
//! exposed as a nested [`CommentAnchor`].

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use kitasuro_core::anchor::{Anchor, AnchorRef, AnchorRefKind, CommentAnchor, StickyAnchor};
use kitasuro_core::comment::CommentStatus;
use kitasuro_core::error::CoreError;
use kitasuro_core::session::ThreadRecord;
use kitasuro_core::types::{DbId, Timestamp};

/// A raw row from the `comments` table.
#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: DbId,
    pub proposal_id: DbId,
    pub author_name: String,
    pub content: String,
    pub pos_x: f64,
    pub pos_y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub sticky_ref_kind: Option<String>,
    pub sticky_ref_value: Option<String>,
    pub sticky_pos_x: Option<f64>,
    pub sticky_pos_y: Option<f64>,
    pub sticky_width: Option<f64>,
    pub sticky_height: Option<f64>,
    pub status: String,
    pub resolved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A comment as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: DbId,
    pub proposal_id: DbId,
    pub author_name: String,
    pub content: String,
    pub anchor: CommentAnchor,
    pub status: CommentStatus,
    pub resolved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<CommentRow> for Comment {
    type Error = CoreError;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        let container = Anchor::from_parts(row.pos_x, row.pos_y, row.width, row.height)?;

        let sticky = match (row.sticky_ref_kind, row.sticky_ref_value, row.sticky_pos_x, row.sticky_pos_y) {
            (Some(kind), Some(value), Some(x), Some(y)) => Some(StickyAnchor {
                anchor_ref: AnchorRef {
                    kind: AnchorRefKind::from_str(&kind)?,
                    value,
                },
                anchor: Anchor::from_parts(x, y, row.sticky_width, row.sticky_height)?,
            }),
            _ => None,
        };

        Ok(Self {
            id: row.id,
            proposal_id: row.proposal_id,
            author_name: row.author_name,
            content: row.content,
            anchor: CommentAnchor { container, sticky },
            status: CommentStatus::from_str(&row.status)?,
            resolved_at: row.resolved_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A row from the `comment_replies` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Reply {
    pub id: DbId,
    pub comment_id: DbId,
    pub author_name: String,
    pub content: String,
    pub created_at: Timestamp,
}

/// Result of resolving a comment.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub comment: Comment,
    /// `true` only for the call that moved the comment from open to resolved.
    pub changed: bool,
}

/// A comment together with its replies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<Reply>,
}

impl ThreadRecord for CommentThread {
    type Reply = Reply;

    fn id(&self) -> DbId {
        self.comment.id
    }

    fn status(&self) -> CommentStatus {
        self.comment.status
    }

    fn push_reply(&mut self, reply: Reply) {
        self.replies.push(reply);
    }

    fn mark_resolved(&mut self) {
        self.comment.status = self.comment.status.resolve();
    }
}

/// DTO for creating a comment. The proposal comes from the path.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateComment {
    pub author_name: String,
    pub content: String,
    pub anchor: CommentAnchor,
}

/// DTO for replying to a comment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReply {
    pub author_name: String,
    pub content: String,
}

/// Query string for comment list endpoints (`?status=open`).
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CommentListParams {
    #[serde(default)]
    pub status: kitasuro_core::comment::CommentFilter,
}

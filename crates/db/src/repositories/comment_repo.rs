//! Repository for the `comments` and `comment_replies` tables.

use std::collections::HashMap;

use sqlx::PgPool;
use kitasuro_core::anchor::CommentAnchor;
use kitasuro_core::comment::{CommentFilter, COMMENT_STATUS_OPEN, COMMENT_STATUS_RESOLVED};
use kitasuro_core::types::DbId;

use crate::models::comment::{
    Comment, CommentRow, CommentThread, CreateComment, CreateReply, Reply, Resolution,
};

/// Column list for comments queries.
const COMMENT_COLUMNS: &str = "id, proposal_id, author_name, content, pos_x, pos_y, \
    width, height, sticky_ref_kind, sticky_ref_value, sticky_pos_x, sticky_pos_y, \
    sticky_width, sticky_height, status, resolved_at, created_at, updated_at";

/// Column list for comment_replies queries.
const REPLY_COLUMNS: &str = "id, comment_id, author_name, content, created_at";

/// Provides create/list/reply/resolve for anchored comments.
///
/// There is no delete: comments are kept for history.
pub struct CommentRepo;

impl CommentRepo {
    /// List comment threads for a proposal, oldest first, replies nested.
    pub async fn list_threads(
        pool: &PgPool,
        proposal_id: DbId,
        filter: CommentFilter,
    ) -> Result<Vec<CommentThread>, sqlx::Error> {
        let status = match filter {
            CommentFilter::All => None,
            CommentFilter::Open => Some(COMMENT_STATUS_OPEN),
            CommentFilter::Resolved => Some(COMMENT_STATUS_RESOLVED),
        };
        let query = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments
             WHERE proposal_id = $1 AND ($2::TEXT IS NULL OR status = $2)
             ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, CommentRow>(&query)
            .bind(proposal_id)
            .bind(status)
            .fetch_all(pool)
            .await?;

        let ids: Vec<DbId> = rows.iter().map(|r| r.id).collect();
        let query = format!(
            "SELECT {REPLY_COLUMNS} FROM comment_replies
             WHERE comment_id = ANY($1)
             ORDER BY created_at ASC, id ASC"
        );
        let replies = sqlx::query_as::<_, Reply>(&query)
            .bind(&ids)
            .fetch_all(pool)
            .await?;

        let mut by_comment: HashMap<DbId, Vec<Reply>> = HashMap::new();
        for reply in replies {
            by_comment.entry(reply.comment_id).or_default().push(reply);
        }

        rows.into_iter()
            .map(|row| {
                let replies = by_comment.remove(&row.id).unwrap_or_default();
                Ok(CommentThread {
                    comment: to_comment(row)?,
                    replies,
                })
            })
            .collect()
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Comment>, sqlx::Error> {
        let query = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        sqlx::query_as::<_, CommentRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .map(to_comment)
            .transpose()
    }

    /// Insert a comment and return the stored row.
    ///
    /// Input is expected to be validated already.
    pub async fn create(
        pool: &PgPool,
        proposal_id: DbId,
        input: &CreateComment,
    ) -> Result<Comment, sqlx::Error> {
        let CommentAnchor { container, sticky } = &input.anchor;
        let origin = container.origin();
        let extent = container.extent();
        let sticky_origin = sticky.as_ref().map(|s| s.anchor.origin());
        let sticky_extent = sticky.as_ref().and_then(|s| s.anchor.extent());

        let query = format!(
            "INSERT INTO comments
                (proposal_id, author_name, content, pos_x, pos_y, width, height,
                 sticky_ref_kind, sticky_ref_value, sticky_pos_x, sticky_pos_y,
                 sticky_width, sticky_height)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING {COMMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CommentRow>(&query)
            .bind(proposal_id)
            .bind(input.author_name.trim())
            .bind(input.content.trim())
            .bind(origin.x)
            .bind(origin.y)
            .bind(extent.map(|(w, _)| w))
            .bind(extent.map(|(_, h)| h))
            .bind(sticky.as_ref().map(|s| s.anchor_ref.kind.as_str()))
            .bind(sticky.as_ref().map(|s| s.anchor_ref.value.as_str()))
            .bind(sticky_origin.map(|p| p.x))
            .bind(sticky_origin.map(|p| p.y))
            .bind(sticky_extent.map(|(w, _)| w))
            .bind(sticky_extent.map(|(_, h)| h))
            .fetch_one(pool)
            .await?;
        to_comment(row)
    }

    /// Append a reply to an open comment.
    ///
    /// The open check and the insert are one statement. Returns `None` when
    /// the comment does not exist or is resolved.
    pub async fn add_reply(
        pool: &PgPool,
        comment_id: DbId,
        input: &CreateReply,
    ) -> Result<Option<Reply>, sqlx::Error> {
        let query = format!(
            "INSERT INTO comment_replies (comment_id, author_name, content)
             SELECT id, $2, $3 FROM comments WHERE id = $1 AND status = 'open'
             RETURNING {REPLY_COLUMNS}"
        );
        sqlx::query_as::<_, Reply>(&query)
            .bind(comment_id)
            .bind(input.author_name.trim())
            .bind(input.content.trim())
            .fetch_optional(pool)
            .await
    }

    /// Mark a comment resolved. Resolving twice keeps the first `resolved_at`.
    ///
    /// Returns `None` if the comment does not exist.
    /// Resolve a comment. Idempotent; only the call that actually flips the
    /// status reports `changed`, even when several race.
    pub async fn resolve(pool: &PgPool, id: DbId) -> Result<Option<Resolution>, sqlx::Error> {
        let query = format!(
            "UPDATE comments SET
                status = 'resolved',
                resolved_at = NOW()
             WHERE id = $1 AND status = 'open'
             RETURNING {COMMENT_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, CommentRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .map(to_comment)
            .transpose()?;

        if let Some(comment) = updated {
            return Ok(Some(Resolution {
                comment,
                changed: true,
            }));
        }
        Ok(Self::find_by_id(pool, id).await?.map(|comment| Resolution {
            comment,
            changed: false,
        }))
    }

    pub async fn count_open(pool: &PgPool, proposal_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM comments WHERE proposal_id = $1 AND status = 'open'",
        )
        .bind(proposal_id)
        .fetch_one(pool)
        .await
    }
}

/// A stored row that fails to map back to an anchor is a decode error.
fn to_comment(row: CommentRow) -> Result<Comment, sqlx::Error> {
    Comment::try_from(row).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

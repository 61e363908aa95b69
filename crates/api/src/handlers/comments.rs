//! Staff-side handlers for anchored comments.
//!
//! The reply and resolve helpers are shared with the client share-link
//! handlers; only the way the proposal is located differs.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use kitasuro_core::comment::{validate_author_name, validate_comment_content, validate_new_comment};
use kitasuro_core::error::CoreError;
use kitasuro_core::types::DbId;
use kitasuro_db::models::comment::{
    Comment, CommentListParams, CreateComment, CreateReply, Reply,
};
use kitasuro_db::repositories::CommentRepo;
use kitasuro_db::DbPool;
use kitasuro_events::bus::EVENT_COMMENT_RESOLVED;
use kitasuro_events::{EventBus, PlatformEvent};

use crate::error::{AppError, AppResult};
use crate::handlers::proposals::load_proposal;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

fn comment_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Comment",
        id,
    })
}

/// Load a comment, requiring it to belong to `proposal_id`.
pub(crate) async fn load_comment_on(
    pool: &DbPool,
    proposal_id: DbId,
    comment_id: DbId,
) -> AppResult<Comment> {
    CommentRepo::find_by_id(pool, comment_id)
        .await?
        .filter(|c| c.proposal_id == proposal_id)
        .ok_or_else(|| comment_not_found(comment_id))
}

/// Append a reply. Resolved threads reject with 409.
pub(crate) async fn add_reply(
    pool: &DbPool,
    comment: &Comment,
    input: &CreateReply,
) -> AppResult<Reply> {
    validate_author_name(&input.author_name)?;
    validate_comment_content(&input.content)?;
    comment.status.ensure_accepts_replies()?;

    match CommentRepo::add_reply(pool, comment.id, input).await? {
        Some(reply) => Ok(reply),
        // Resolved between the read and the insert.
        None => match CommentRepo::find_by_id(pool, comment.id).await? {
            Some(current) => {
                current.status.ensure_accepts_replies()?;
                Err(comment_not_found(comment.id))
            }
            None => Err(comment_not_found(comment.id)),
        },
    }
}

/// Resolve a comment and announce it. Resolving twice is a no-op.
pub(crate) async fn resolve_comment(
    pool: &DbPool,
    event_bus: &EventBus,
    organization_id: DbId,
    comment: &Comment,
    actor_user_id: Option<DbId>,
) -> AppResult<Comment> {
    let resolution = CommentRepo::resolve(pool, comment.id)
        .await?
        .ok_or_else(|| comment_not_found(comment.id))?;
    let resolved = resolution.comment;

    if resolution.changed {
        let mut event = PlatformEvent::new(EVENT_COMMENT_RESOLVED)
            .for_organization(organization_id)
            .with_source("comment", resolved.id)
            .with_payload(serde_json::json!({ "proposal_id": resolved.proposal_id }));
        if let Some(user_id) = actor_user_id {
            event = event.with_actor(user_id);
        }
        event_bus.publish(event);
    }

    Ok(resolved)
}

// ---------------------------------------------------------------------------
// /proposals/{id}/comments
// ---------------------------------------------------------------------------

/// GET /proposals/{id}/comments?status=open|resolved|all
pub async fn list_for_proposal(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(proposal_id): Path<DbId>,
    Query(params): Query<CommentListParams>,
) -> AppResult<impl IntoResponse> {
    let proposal = load_proposal(&state.pool, auth.organization_id, proposal_id).await?;
    let threads = CommentRepo::list_threads(&state.pool, proposal.id, params.status).await?;
    Ok(Json(DataResponse { data: threads }))
}

/// POST /proposals/{id}/comments
pub async fn create_for_proposal(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(proposal_id): Path<DbId>,
    Json(input): Json<CreateComment>,
) -> AppResult<impl IntoResponse> {
    validate_new_comment(&input.author_name, &input.content, &input.anchor)?;
    let proposal = load_proposal(&state.pool, auth.organization_id, proposal_id).await?;

    let comment = CommentRepo::create(&state.pool, proposal.id, &input).await?;

    tracing::info!(
        user_id = auth.user_id,
        proposal_id,
        comment_id = comment.id,
        "Staff comment created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: comment })))
}

// ---------------------------------------------------------------------------
// /comments/{id}
// ---------------------------------------------------------------------------

/// Load a comment and check it belongs to the caller's organization.
async fn load_scoped(auth: &AuthUser, pool: &DbPool, comment_id: DbId) -> AppResult<Comment> {
    let comment = CommentRepo::find_by_id(pool, comment_id)
        .await?
        .ok_or_else(|| comment_not_found(comment_id))?;
    // Another organization's comment is reported as missing.
    load_proposal(pool, auth.organization_id, comment.proposal_id)
        .await
        .map_err(|_| comment_not_found(comment_id))?;
    Ok(comment)
}

/// POST /comments/{id}/replies
pub async fn reply(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<DbId>,
    Json(input): Json<CreateReply>,
) -> AppResult<impl IntoResponse> {
    let comment = load_scoped(&auth, &state.pool, comment_id).await?;
    let reply = add_reply(&state.pool, &comment, &input).await?;

    tracing::info!(
        user_id = auth.user_id,
        comment_id,
        reply_id = reply.id,
        "Staff reply added"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: reply })))
}

/// POST /comments/{id}/resolve
pub async fn resolve(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let comment = load_scoped(&auth, &state.pool, comment_id).await?;
    let resolved = resolve_comment(
        &state.pool,
        &state.event_bus,
        auth.organization_id,
        &comment,
        Some(auth.user_id),
    )
    .await?;

    tracing::info!(user_id = auth.user_id, comment_id, "Comment resolved");

    Ok(Json(DataResponse { data: resolved }))
}

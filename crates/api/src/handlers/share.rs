//! Client-facing handlers behind a proposal's share link.
//!
//! Clients have no account: the share token in the path is the only
//! credential, and author names are free text. A draft behaves exactly like
//! an unknown token so links cannot be probed before staff share them.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use kitasuro_core::comment::validate_new_comment;
use kitasuro_core::itinerary::ItineraryData;
use kitasuro_core::pricing::display_price;
use kitasuro_core::proposal::validate_confirmer_name;
use kitasuro_core::theme::{self, Section, ThemeId};
use kitasuro_core::types::{DbId, Timestamp};
use kitasuro_db::models::comment::{CommentListParams, CreateComment, CreateReply};
use kitasuro_db::models::proposal::{ConfirmProposal, Proposal};
use kitasuro_db::repositories::{CommentRepo, ItineraryRepo, OrganizationRepo, ProposalRepo};
use kitasuro_db::DbPool;
use kitasuro_events::bus::{EVENT_COMMENT_CREATED, EVENT_PROPOSAL_CONFIRMED};
use kitasuro_events::PlatformEvent;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::comments::{add_reply, load_comment_on, resolve_comment};
use crate::response::DataResponse;
use crate::state::AppState;

/// What the client sees at the share link.
#[derive(Debug, Serialize)]
pub struct ShareView {
    pub title: String,
    pub client_name: Option<String>,
    pub theme: ThemeId,
    pub status: String,
    pub version: i64,
    pub confirmed_by_name: Option<String>,
    pub confirmed_at: Option<Timestamp>,
    pub itinerary: ItineraryData,
    pub sections: Vec<Section>,
    pub total_price: i64,
}

async fn load_shared(pool: &DbPool, token: Uuid) -> AppResult<Proposal> {
    let proposal = ProposalRepo::find_by_share_token(pool, token).await?;
    match proposal {
        Some(p) if p.status()?.is_client_visible() => Ok(p),
        _ => Err(AppError::NotFound("Share link not found".into())),
    }
}

/// The agency's notification address, if one is configured.
///
/// A lookup failure only costs the notification, never the client's request.
async fn notification_email(pool: &DbPool, organization_id: DbId) -> Option<String> {
    match OrganizationRepo::find_by_id(pool, organization_id).await {
        Ok(org) => org.and_then(|o| o.notification_email),
        Err(e) => {
            tracing::warn!(organization_id, error = %e, "Failed to look up notification email");
            None
        }
    }
}

/// GET /share/{token}
pub async fn view(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let proposal = load_shared(&state.pool, token).await?;
    let theme_id = proposal.theme()?;
    let itinerary = ItineraryRepo::load(&state.pool, &proposal).await?;

    Ok(Json(DataResponse {
        data: ShareView {
            sections: theme::render(theme_id, &itinerary),
            total_price: display_price(itinerary.total_price()),
            title: proposal.title,
            client_name: proposal.client_name,
            theme: theme_id,
            status: proposal.status,
            version: proposal.version,
            confirmed_by_name: proposal.confirmed_by_name,
            confirmed_at: proposal.confirmed_at,
            itinerary,
        },
    }))
}

/// GET /share/{token}/comments?status=
pub async fn list_comments(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
    Query(params): Query<CommentListParams>,
) -> AppResult<impl IntoResponse> {
    let proposal = load_shared(&state.pool, token).await?;
    let threads = CommentRepo::list_threads(&state.pool, proposal.id, params.status).await?;
    Ok(Json(DataResponse { data: threads }))
}

/// POST /share/{token}/comments
pub async fn create_comment(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
    Json(input): Json<CreateComment>,
) -> AppResult<impl IntoResponse> {
    validate_new_comment(&input.author_name, &input.content, &input.anchor)?;
    let proposal = load_shared(&state.pool, token).await?;

    let comment = CommentRepo::create(&state.pool, proposal.id, &input).await?;

    let recipient = notification_email(&state.pool, proposal.organization_id).await;
    state.event_bus.publish(
        PlatformEvent::new(EVENT_COMMENT_CREATED)
            .for_organization(proposal.organization_id)
            .with_source("comment", comment.id)
            .with_payload(serde_json::json!({
                "proposal_id": proposal.id,
                "title": proposal.title,
                "author_name": comment.author_name,
                "content": comment.content,
                "notification_email": recipient,
            })),
    );

    tracing::info!(
        proposal_id = proposal.id,
        comment_id = comment.id,
        "Client comment created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: comment })))
}

/// POST /share/{token}/comments/{comment_id}/replies
pub async fn reply(
    State(state): State<AppState>,
    Path((token, comment_id)): Path<(Uuid, DbId)>,
    Json(input): Json<CreateReply>,
) -> AppResult<impl IntoResponse> {
    let proposal = load_shared(&state.pool, token).await?;
    let comment = load_comment_on(&state.pool, proposal.id, comment_id).await?;
    let reply = add_reply(&state.pool, &comment, &input).await?;

    tracing::info!(
        proposal_id = proposal.id,
        comment_id,
        reply_id = reply.id,
        "Client reply added"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: reply })))
}

/// POST /share/{token}/comments/{comment_id}/resolve
pub async fn resolve(
    State(state): State<AppState>,
    Path((token, comment_id)): Path<(Uuid, DbId)>,
) -> AppResult<impl IntoResponse> {
    let proposal = load_shared(&state.pool, token).await?;
    let comment = load_comment_on(&state.pool, proposal.id, comment_id).await?;
    let resolved = resolve_comment(
        &state.pool,
        &state.event_bus,
        proposal.organization_id,
        &comment,
        None,
    )
    .await?;

    tracing::info!(proposal_id = proposal.id, comment_id, "Comment resolved by client");

    Ok(Json(DataResponse { data: resolved }))
}

/// POST /share/{token}/confirm
///
/// `shared -> confirmed`. A second confirmation is a 409, not a no-op, so
/// the recorded name is never overwritten.
pub async fn confirm(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
    Json(input): Json<ConfirmProposal>,
) -> AppResult<impl IntoResponse> {
    validate_confirmer_name(&input.name)?;
    let current = load_shared(&state.pool, token).await?;
    current.status()?.confirm()?;

    let Some(proposal) = ProposalRepo::confirm(&state.pool, current.id, &input.name).await? else {
        // Confirmed concurrently.
        let latest = load_shared(&state.pool, token).await?;
        latest.status()?.confirm()?;
        return Err(AppError::InternalError(format!(
            "Confirmation of proposal {} matched no row",
            current.id
        )));
    };

    let recipient = notification_email(&state.pool, proposal.organization_id).await;
    state.event_bus.publish(
        PlatformEvent::new(EVENT_PROPOSAL_CONFIRMED)
            .for_organization(proposal.organization_id)
            .with_source("proposal", proposal.id)
            .with_payload(serde_json::json!({
                "title": proposal.title,
                "confirmed_by_name": proposal.confirmed_by_name,
                "notification_email": recipient,
            })),
    );

    tracing::info!(proposal_id = proposal.id, "Proposal confirmed by client");

    Ok(Json(DataResponse { data: proposal }))
}

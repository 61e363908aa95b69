//! Handlers for the `/proposals` resource.
//!
//! Every write carries the version the editor last saw. Guarded repository
//! writes return `None` when nothing matched; [`rejected_write`] re-reads the
//! row to report 404, a read-only (confirmed) proposal, or a stale version.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use kitasuro_core::error::CoreError;
use kitasuro_core::itinerary::{renumber_days, validate_itinerary, ItineraryData};
use kitasuro_core::pricing::display_price;
use kitasuro_core::proposal::{check_version, validate_proposal_title, ProposalStatus};
use kitasuro_core::theme::{self, Section, ThemeId};
use kitasuro_core::types::DbId;
use kitasuro_db::models::itinerary::SaveItinerary;
use kitasuro_db::models::proposal::{
    CloneFromTour, CreateProposal, Proposal, ShareProposal, UpdateProposal,
};
use kitasuro_db::repositories::{CommentRepo, ItineraryRepo, ProposalRepo, TourRepo};
use kitasuro_db::DbPool;
use kitasuro_events::bus::EVENT_PROPOSAL_SHARED;
use kitasuro_events::PlatformEvent;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::handlers::destinations::ensure_own_destinations;
use crate::middleware::auth::AuthUser;
use crate::query::ThemeParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Proposal with its itinerary, as shown in the staff editor.
#[derive(Debug, Serialize)]
pub struct ProposalDetail {
    #[serde(flatten)]
    pub proposal: Proposal,
    pub itinerary: ItineraryData,
    /// Whole-currency total shown to the client.
    pub total_price: i64,
    pub open_comment_count: i64,
}

#[derive(Debug, Serialize)]
pub struct RenderedItinerary {
    pub theme: ThemeId,
    pub sections: Vec<Section>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn proposal_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Proposal",
        id,
    })
}

pub(crate) async fn load_proposal(
    pool: &DbPool,
    organization_id: DbId,
    id: DbId,
) -> AppResult<Proposal> {
    ProposalRepo::find_by_id(pool, organization_id, id)
        .await?
        .ok_or_else(|| proposal_not_found(id))
}

/// Explain why a version-guarded write matched no row.
async fn rejected_write(
    pool: &DbPool,
    organization_id: DbId,
    id: DbId,
    expected_version: i64,
) -> AppError {
    let current = match load_proposal(pool, organization_id, id).await {
        Ok(p) => p,
        Err(e) => return e,
    };
    if let Ok(ProposalStatus::Confirmed) = current.status() {
        return CoreError::Conflict("Confirmed proposals are read-only".into()).into();
    }
    match check_version(current.version, expected_version) {
        Err(e) => e.into(),
        // Matched on re-read: another writer got in between.
        Ok(()) => CoreError::Conflict("Proposal changed while saving, reload and retry".into())
            .into(),
    }
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /proposals
pub async fn list(auth: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let proposals = ProposalRepo::list(&state.pool, auth.organization_id).await?;
    Ok(Json(DataResponse { data: proposals }))
}

/// POST /proposals
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateProposal>,
) -> AppResult<impl IntoResponse> {
    validate_proposal_title(&input.title)?;
    let proposal =
        ProposalRepo::create(&state.pool, auth.organization_id, auth.user_id, &input).await?;

    tracing::info!(
        user_id = auth.user_id,
        proposal_id = proposal.id,
        "Proposal created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: proposal })))
}

/// POST /proposals/from-tour
///
/// Deep-copies the tour's days into a new draft. The title defaults to the
/// tour name.
pub async fn create_from_tour(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CloneFromTour>,
) -> AppResult<impl IntoResponse> {
    let tour = TourRepo::find_by_id(&state.pool, auth.organization_id, input.tour_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Tour",
            id: input.tour_id,
        }))?;

    let title = input.title.as_deref().unwrap_or(&tour.name);
    validate_proposal_title(title)?;

    let proposal = ProposalRepo::create_from_tour(
        &state.pool,
        auth.user_id,
        &tour,
        title,
        input.client_name.as_deref(),
        input.theme.unwrap_or_default(),
    )
    .await?;

    tracing::info!(
        user_id = auth.user_id,
        proposal_id = proposal.id,
        tour_id = tour.id,
        "Proposal cloned from tour"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: proposal })))
}

/// GET /proposals/{id}
pub async fn get_detail(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let proposal = load_proposal(&state.pool, auth.organization_id, id).await?;
    let itinerary = ItineraryRepo::load(&state.pool, &proposal).await?;
    let open_comment_count = CommentRepo::count_open(&state.pool, proposal.id).await?;

    Ok(Json(DataResponse {
        data: ProposalDetail {
            total_price: display_price(itinerary.total_price()),
            proposal,
            itinerary,
            open_comment_count,
        },
    }))
}

/// PUT /proposals/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProposal>,
) -> AppResult<impl IntoResponse> {
    if let Some(title) = &input.title {
        validate_proposal_title(title)?;
    }
    // Scope check before the guarded write, which is keyed by id only.
    load_proposal(&state.pool, auth.organization_id, id).await?;

    let Some(proposal) = ProposalRepo::update(&state.pool, id, &input).await? else {
        return Err(
            rejected_write(&state.pool, auth.organization_id, id, input.expected_version).await,
        );
    };

    tracing::info!(
        user_id = auth.user_id,
        proposal_id = id,
        version = proposal.version,
        "Proposal updated"
    );

    Ok(Json(DataResponse { data: proposal }))
}

/// DELETE /proposals/{id}
///
/// Only drafts can be deleted; once shared, the client's comments are kept.
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if ProposalRepo::delete_draft(&state.pool, auth.organization_id, id).await? {
        tracing::info!(user_id = auth.user_id, proposal_id = id, "Draft proposal deleted");
        return Ok(StatusCode::NO_CONTENT);
    }
    // Exists but is past draft.
    load_proposal(&state.pool, auth.organization_id, id).await?;
    Err(CoreError::Conflict("Only draft proposals can be deleted".into()).into())
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// POST /proposals/{id}/share
pub async fn share(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ShareProposal>,
) -> AppResult<impl IntoResponse> {
    let current = load_proposal(&state.pool, auth.organization_id, id).await?;
    current.status()?.share()?;
    check_version(current.version, input.expected_version)?;

    let Some(proposal) =
        ProposalRepo::mark_shared(&state.pool, id, input.expected_version).await?
    else {
        return Err(
            rejected_write(&state.pool, auth.organization_id, id, input.expected_version).await,
        );
    };

    state.event_bus.publish(
        PlatformEvent::new(EVENT_PROPOSAL_SHARED)
            .for_organization(proposal.organization_id)
            .with_source("proposal", proposal.id)
            .with_actor(auth.user_id)
            .with_payload(serde_json::json!({ "title": proposal.title })),
    );

    tracing::info!(user_id = auth.user_id, proposal_id = id, "Proposal shared");

    Ok(Json(DataResponse { data: proposal }))
}

// ---------------------------------------------------------------------------
// Itinerary
// ---------------------------------------------------------------------------

/// GET /proposals/{id}/itinerary
pub async fn get_itinerary(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let proposal = load_proposal(&state.pool, auth.organization_id, id).await?;
    let itinerary = ItineraryRepo::load(&state.pool, &proposal).await?;
    Ok(Json(DataResponse { data: itinerary }))
}

/// PUT /proposals/{id}/itinerary
///
/// Replaces the whole itinerary. Days are renumbered in list order before
/// validation, so the editor never has to send consistent numbers.
pub async fn save_itinerary(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SaveItinerary>,
) -> AppResult<impl IntoResponse> {
    let proposal = load_proposal(&state.pool, auth.organization_id, id).await?;
    if !proposal.status()?.is_editable() {
        return Err(CoreError::Conflict("Confirmed proposals are read-only".into()).into());
    }

    let mut data = ItineraryData {
        title: proposal.title.clone(),
        client_name: proposal.client_name.clone(),
        days: input.days,
        pricing_rows: input.pricing_rows,
        extras: input.extras,
    };
    renumber_days(&mut data.days);
    validate_itinerary(&data)?;
    ensure_own_destinations(&state.pool, auth.organization_id, &data.days).await?;

    let saved = ItineraryRepo::replace(
        &state.pool,
        id,
        input.expected_version,
        &data.days,
        &data.pricing_rows,
        &data.extras,
    )
    .await?;
    let Some(version) = saved else {
        return Err(
            rejected_write(&state.pool, auth.organization_id, id, input.expected_version).await,
        );
    };

    tracing::info!(
        user_id = auth.user_id,
        proposal_id = id,
        version,
        days = data.days.len(),
        "Itinerary saved"
    );

    let proposal = load_proposal(&state.pool, auth.organization_id, id).await?;
    let itinerary = ItineraryRepo::load(&state.pool, &proposal).await?;
    Ok(Json(DataResponse {
        data: ProposalDetail {
            total_price: display_price(itinerary.total_price()),
            open_comment_count: CommentRepo::count_open(&state.pool, id).await?,
            proposal,
            itinerary,
        },
    }))
}

/// GET /proposals/{id}/render?theme=
///
/// Uses the proposal's own theme unless `theme` overrides it (preview).
pub async fn render(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<ThemeParams>,
) -> AppResult<impl IntoResponse> {
    let proposal = load_proposal(&state.pool, auth.organization_id, id).await?;
    let theme_id = match params.theme {
        Some(t) => t,
        None => proposal.theme()?,
    };
    let itinerary = ItineraryRepo::load(&state.pool, &proposal).await?;

    Ok(Json(DataResponse {
        data: RenderedItinerary {
            theme: theme_id,
            sections: theme::render(theme_id, &itinerary),
        },
    }))
}

//! Handlers for the `/destinations` resource.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use kitasuro_core::error::CoreError;
use kitasuro_core::itinerary::Day;
use kitasuro_core::types::DbId;
use kitasuro_db::models::destination::CreateDestination;
use kitasuro_db::repositories::DestinationRepo;
use kitasuro_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::SearchParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Reject days that reference another organization's destination by id.
///
/// Free-text destinations (no id) are always allowed.
pub(crate) async fn ensure_own_destinations(
    pool: &DbPool,
    organization_id: DbId,
    days: &[Day],
) -> Result<(), AppError> {
    let mut ids: Vec<DbId> = days
        .iter()
        .filter_map(|d| d.destination.as_ref().and_then(|dest| dest.id))
        .collect();
    ids.sort_unstable();
    ids.dedup();

    let foreign = DestinationRepo::foreign_ids(pool, organization_id, &ids).await?;
    if let Some(id) = foreign.first() {
        return Err(CoreError::Validation(format!("Unknown destination id {id}")).into());
    }
    Ok(())
}

/// GET /destinations?q=&limit=
///
/// With a non-blank `q`, returns a case-insensitive prefix match for the
/// day editor's autocomplete; otherwise every destination by name.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<impl IntoResponse> {
    let destinations = match params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(prefix) => {
            DestinationRepo::search(
                &state.pool,
                auth.organization_id,
                prefix,
                params.clamped_limit(),
            )
            .await?
        }
        None => DestinationRepo::list(&state.pool, auth.organization_id).await?,
    };
    Ok(Json(DataResponse { data: destinations }))
}

/// POST /destinations
///
/// Duplicate names within an organization return 409.
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateDestination>,
) -> AppResult<impl IntoResponse> {
    if input.name.trim().is_empty() {
        return Err(CoreError::Validation("Destination name must not be empty".into()).into());
    }
    let destination = DestinationRepo::create(&state.pool, auth.organization_id, &input).await?;

    tracing::info!(
        user_id = auth.user_id,
        destination_id = destination.id,
        "Destination created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: destination })))
}

//! Handlers for the `/tours` resource (tour templates).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use kitasuro_core::error::CoreError;
use kitasuro_core::tour_form::TourForm;
use kitasuro_core::types::DbId;
use kitasuro_db::repositories::TourRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::destinations::ensure_own_destinations;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

fn tour_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Tour", id })
}

/// GET /tours
pub async fn list(auth: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let tours = TourRepo::list(&state.pool, auth.organization_id).await?;
    Ok(Json(DataResponse { data: tours }))
}

/// POST /tours
///
/// Invalid forms return 400 with per-field messages under `fields`.
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(form): Json<TourForm>,
) -> AppResult<impl IntoResponse> {
    let tour = form.into_validated()?;
    ensure_own_destinations(&state.pool, auth.organization_id, &tour.days).await?;
    let tour = TourRepo::create(&state.pool, auth.organization_id, auth.user_id, &tour).await?;

    tracing::info!(
        user_id = auth.user_id,
        tour_id = tour.id,
        days = tour.days.0.len(),
        "Tour created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: tour })))
}

/// GET /tours/{id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let tour = TourRepo::find_by_id(&state.pool, auth.organization_id, id)
        .await?
        .ok_or_else(|| tour_not_found(id))?;
    Ok(Json(DataResponse { data: tour }))
}

/// PUT /tours/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(form): Json<TourForm>,
) -> AppResult<impl IntoResponse> {
    let tour = form.into_validated()?;
    ensure_own_destinations(&state.pool, auth.organization_id, &tour.days).await?;
    let tour = TourRepo::update(&state.pool, auth.organization_id, id, &tour)
        .await?
        .ok_or_else(|| tour_not_found(id))?;

    tracing::info!(user_id = auth.user_id, tour_id = id, "Tour updated");

    Ok(Json(DataResponse { data: tour }))
}

/// DELETE /tours/{id}
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !TourRepo::delete(&state.pool, auth.organization_id, id).await? {
        return Err(tour_not_found(id));
    }
    tracing::info!(user_id = auth.user_id, tour_id = id, "Tour deleted");
    Ok(StatusCode::NO_CONTENT)
}

//! Handlers for organization settings, onboarding and staff accounts.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use kitasuro_core::error::CoreError;
use kitasuro_core::onboarding::{self, OnboardingSteps};
use kitasuro_core::roles::VALID_ROLES;
use kitasuro_core::types::DbId;
use kitasuro_db::models::organization::{Organization, UpdateOrganization};
use kitasuro_db::models::user::CreateUser;
use kitasuro_db::repositories::{OrganizationRepo, TourRepo, UserRepo};
use serde::Deserialize;
use validator::ValidateEmail;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /organization/users`. The organization is the caller's.
#[derive(Debug, Deserialize)]
pub struct InviteUser {
    pub email: String,
    pub display_name: String,
    pub role: Option<String>,
}

async fn load_organization(state: &AppState, id: DbId) -> AppResult<Organization> {
    OrganizationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Organization",
            id,
        }))
}

fn validate_email(email: &str) -> Result<(), CoreError> {
    if !email.trim().validate_email() {
        return Err(CoreError::Validation(format!(
            "'{}' is not a valid email address",
            email.trim()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// GET /organization
pub async fn get_settings(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let org = load_organization(&state, auth.organization_id).await?;
    Ok(Json(DataResponse { data: org }))
}

/// PUT /organization
///
/// Blank strings are rejected rather than stored; omit a field to keep it.
pub async fn update_settings(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<UpdateOrganization>,
) -> AppResult<impl IntoResponse> {
    if let Some(name) = &input.name {
        if name.trim().is_empty() {
            return Err(CoreError::Validation("Agency name must not be empty".into()).into());
        }
    }
    if let Some(email) = &input.notification_email {
        validate_email(email)?;
    }

    let input = UpdateOrganization {
        name: input.name.map(|n| n.trim().to_string()),
        notification_email: input.notification_email.map(|e| e.trim().to_string()),
    };

    let org = OrganizationRepo::update(&state.pool, admin.organization_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Organization",
            id: admin.organization_id,
        }))?;

    tracing::info!(
        user_id = admin.user_id,
        organization_id = org.id,
        "Organization settings updated"
    );

    Ok(Json(DataResponse { data: org }))
}

// ---------------------------------------------------------------------------
// Onboarding
// ---------------------------------------------------------------------------

/// GET /organization/onboarding
///
/// Derives status from current data until every step holds, then latches
/// the completed flag so later edits never re-open onboarding.
pub async fn get_onboarding(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let org = load_organization(&state, auth.organization_id).await?;

    let tour_count = TourRepo::count_for_organization(&state.pool, org.id).await?;
    let steps = OnboardingSteps::from_fields(
        org.name.as_deref(),
        org.notification_email.as_deref(),
        tour_count,
    );

    let outcome = onboarding::evaluate(org.onboarding_completed, steps);
    if outcome.persist_completion
        && OrganizationRepo::mark_onboarding_completed(&state.pool, org.id).await?
    {
        tracing::info!(organization_id = org.id, "Onboarding completed");
    }

    Ok(Json(DataResponse {
        data: outcome.status,
    }))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// GET /organization/users
pub async fn list_users(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let users = UserRepo::list_for_organization(&state.pool, auth.organization_id).await?;
    Ok(Json(DataResponse { data: users }))
}

/// POST /organization/users
pub async fn create_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<InviteUser>,
) -> AppResult<impl IntoResponse> {
    validate_email(&input.email)?;
    if input.display_name.trim().is_empty() {
        return Err(CoreError::Validation("Display name must not be empty".into()).into());
    }
    if let Some(role) = &input.role {
        if !VALID_ROLES.contains(&role.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Invalid role '{role}'. Must be one of: {}",
                VALID_ROLES.join(", ")
            )));
        }
    }

    let create = CreateUser {
        organization_id: admin.organization_id,
        email: input.email.trim().to_string(),
        display_name: input.display_name.trim().to_string(),
        role: input.role,
    };
    let user = UserRepo::create(&state.pool, &create).await?;

    tracing::info!(
        user_id = admin.user_id,
        new_user_id = user.id,
        role = %user.role,
        "Staff user created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: user })))
}

//! Route definitions for the `/organization` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::organization;
use crate::state::AppState;

/// Routes mounted at `/organization`.
///
/// ```text
/// GET    /              -> get_settings
/// PUT    /              -> update_settings (admin)
/// GET    /onboarding    -> get_onboarding
/// GET    /users         -> list_users
/// POST   /users         -> create_user (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(organization::get_settings).put(organization::update_settings),
        )
        .route("/onboarding", get(organization::get_onboarding))
        .route(
            "/users",
            get(organization::list_users).post(organization::create_user),
        )
}

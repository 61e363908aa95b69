pub mod comments;
pub mod destinations;
pub mod health;
pub mod organization;
pub mod proposals;
pub mod share;
pub mod tours;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /organization                          settings get, update (admin)
/// /organization/onboarding               onboarding status (GET)
/// /organization/users                    list, create (admin)
///
/// /tours                                 list, create
/// /tours/{id}                            get, update, delete
///
/// /destinations                          list / prefix search, create
///
/// /proposals                             list, create
/// /proposals/from-tour                   clone a tour (POST)
/// /proposals/{id}                        detail, update, delete (drafts)
/// /proposals/{id}/share                  draft -> shared (POST)
/// /proposals/{id}/itinerary              get, replace
/// /proposals/{id}/render                 themed outline (GET)
/// /proposals/{id}/comments               list, create
///
/// /comments/{id}/replies                 reply (POST)
/// /comments/{id}/resolve                 resolve (POST)
///
/// /share/{token}                         client view (public)
/// /share/{token}/comments                list, create (public)
/// /share/{token}/comments/{id}/replies   reply (public)
/// /share/{token}/comments/{id}/resolve   resolve (public)
/// /share/{token}/confirm                 shared -> confirmed (public)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Agency settings, onboarding and staff accounts.
        .nest("/organization", organization::router())
        // Tour templates.
        .nest("/tours", tours::router())
        .nest("/destinations", destinations::router())
        // Proposals, their itinerary and staff-side comments.
        .nest("/proposals", proposals::router())
        .nest("/comments", comments::router())
        // Client share links. No bearer token; the share token is the key.
        .nest("/share", share::router())
}

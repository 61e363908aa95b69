//! Route definitions for the `/proposals` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{comments, proposals};
use crate::state::AppState;

/// Routes mounted at `/proposals`.
///
/// ```text
/// GET    /                      -> list
/// POST   /                      -> create
/// POST   /from-tour             -> create_from_tour
/// GET    /{id}                  -> get_detail
/// PUT    /{id}                  -> update
/// DELETE /{id}                  -> delete (drafts only)
/// POST   /{id}/share            -> share
/// GET    /{id}/itinerary        -> get_itinerary
/// PUT    /{id}/itinerary        -> save_itinerary
/// GET    /{id}/render?theme=    -> render
/// GET    /{id}/comments?status= -> comments::list_for_proposal
/// POST   /{id}/comments         -> comments::create_for_proposal
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(proposals::list).post(proposals::create))
        .route("/from-tour", post(proposals::create_from_tour))
        .route(
            "/{id}",
            get(proposals::get_detail)
                .put(proposals::update)
                .delete(proposals::delete),
        )
        .route("/{id}/share", post(proposals::share))
        .route(
            "/{id}/itinerary",
            get(proposals::get_itinerary).put(proposals::save_itinerary),
        )
        .route("/{id}/render", get(proposals::render))
        .route(
            "/{id}/comments",
            get(comments::list_for_proposal).post(comments::create_for_proposal),
        )
}

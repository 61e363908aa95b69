//! Route definitions for staff actions on individual comments.

use axum::routing::post;
use axum::Router;

use crate::handlers::comments;
use crate::state::AppState;

/// Routes mounted at `/comments`.
///
/// ```text
/// POST   /{id}/replies   -> reply
/// POST   /{id}/resolve   -> resolve
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/replies", post(comments::reply))
        .route("/{id}/resolve", post(comments::resolve))
}

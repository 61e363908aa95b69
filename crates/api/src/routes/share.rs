//! Route definitions for client share links.
//!
//! None of these require a bearer token. A draft proposal is invisible
//! through its link until staff share it.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::share;
use crate::state::AppState;

/// Routes mounted at `/share`.
///
/// ```text
/// GET    /{token}                                  -> view
/// GET    /{token}/comments?status=                 -> list_comments
/// POST   /{token}/comments                         -> create_comment
/// POST   /{token}/comments/{comment_id}/replies    -> reply
/// POST   /{token}/comments/{comment_id}/resolve    -> resolve
/// POST   /{token}/confirm                          -> confirm
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{token}", get(share::view))
        .route(
            "/{token}/comments",
            get(share::list_comments).post(share::create_comment),
        )
        .route("/{token}/comments/{comment_id}/replies", post(share::reply))
        .route("/{token}/comments/{comment_id}/resolve", post(share::resolve))
        .route("/{token}/confirm", post(share::confirm))
}

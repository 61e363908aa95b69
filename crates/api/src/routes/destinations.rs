//! Route definitions for the `/destinations` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::destinations;
use crate::state::AppState;

/// Routes mounted at `/destinations`.
///
/// ```text
/// GET    /?q=&limit=   -> list (prefix search when `q` is given)
/// POST   /             -> create
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(destinations::list).post(destinations::create))
}

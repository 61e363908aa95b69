use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheap to clone: the pool and everything else sits behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: kitasuro_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Domain events (shares, confirmations, comments) for background
    /// listeners such as the notification dispatcher.
    pub event_bus: Arc<kitasuro_events::EventBus>,
}

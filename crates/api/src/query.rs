//! Shared query parameter types for API handlers.

use kitasuro_core::theme::ThemeId;
use serde::Deserialize;

/// Default and maximum number of search results.
pub const DEFAULT_SEARCH_LIMIT: i64 = 20;
pub const MAX_SEARCH_LIMIT: i64 = 100;

/// Prefix search parameters (`?q=&limit=`).
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

impl SearchParams {
    /// Clamp the requested limit into `1..=MAX_SEARCH_LIMIT`.
    pub fn clamped_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT)
    }
}

/// Theme override for render endpoints (`?theme=compact`).
#[derive(Debug, Deserialize)]
pub struct ThemeParams {
    pub theme: Option<ThemeId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        let params = |limit| SearchParams { q: None, limit };
        assert_eq!(params(None).clamped_limit(), DEFAULT_SEARCH_LIMIT);
        assert_eq!(params(Some(0)).clamped_limit(), 1);
        assert_eq!(params(Some(10_000)).clamped_limit(), MAX_SEARCH_LIMIT);
    }
}

//! JWT-based authentication extractor for staff routes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use kitasuro_core::error::CoreError;
use kitasuro_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Staff user extracted from the `Authorization: Bearer <token>` header.
///
/// Client-facing share routes do not use this; clients are identified only
/// by the share token in the path.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    pub organization_id: DbId,
    pub role: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            organization_id: claims.org,
            role: claims.role,
        })
    }
}

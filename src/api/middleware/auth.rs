use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::api::errors::ApiError;
use crate::api::state::AppState;

/// Admin credential extractor for privileged routes
///
/// The `Authorization` header must equal the configured admin token
/// verbatim (no `Bearer` scheme).
///
/// Usage:
/// ```rust,ignore
/// async fn admin_handler(_admin: AdminAuth) -> Result<String, ApiError> {
///     Ok("ok".to_string())
/// }
/// ```
pub struct AdminAuth;

#[async_trait]
impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        match token {
            Some(token) if token == &*state.admin_token => Ok(AdminAuth),
            _ => {
                tracing::warn!(path = %parts.uri.path(), "rejected admin request");
                Err(ApiError::unauthorized("invalid admin token"))
            }
        }
    }
}

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::token::{Claims, TokenKeys};
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{Role, User};

/// Extracts and verifies the bearer token, yielding the caller's claims.
/// Missing or malformed credentials and any verification failure all read
/// the same to the client; detail goes to the server log only.
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized".into()))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized".into()))?;

        let keys = TokenKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "token verification failed");
            ApiError::Unauthorized("Invalid or expired token".into())
        })?;

        Ok(AuthUser(claims))
    }
}

/// Authenticated caller whose *current* store record has the admin role.
/// The role is read live on every call — it is never embedded in the token
/// — so removing someone's admin role takes effect immediately.
pub struct AdminUser {
    pub claims: Claims,
    pub user: User,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;

        let user = state
            .store
            .find_user_by_id(claims.sub)
            .await?
            .filter(|u| u.role == Role::Admin)
            .ok_or_else(|| ApiError::Forbidden("Admin access required".into()))?;

        Ok(AdminUser { claims, user })
    }
}

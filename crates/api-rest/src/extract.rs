//! Bearer-token authentication extractor.
//!
//! Handlers that take an [`AuthUser`] argument require a valid access token;
//! the extractor resolves the token back to a live user row and derives the
//! caller's role, so a token for a deleted account stops working immediately.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use medibook_core::repositories::accounts::{AccountService, User};
use medibook_core::security::{self, TokenUse};
use medibook_core::{ApiError, Role};

use crate::error::ApiFailure;
use crate::AppState;

/// The authenticated caller: user row plus derived role.
pub struct AuthUser {
    pub user: User,
    pub role: Role,
}

impl AuthUser {
    /// Gate for admin-only resources.
    pub fn require_admin(&self) -> Result<(), ApiFailure> {
        if self.role != Role::Admin {
            return Err(ApiError::Permission("admin access required".into()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiFailure;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::Authentication("missing bearer token".into()))?;

        let claims = security::verify_token(&state.cfg, token, TokenUse::Access)?;
        let user_id = claims.user_id()?;

        let accounts = AccountService::new(state.pool.clone());
        let user = accounts
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::Authentication("unknown user".into()))?;
        let role = accounts.role_for(&user).await?;

        Ok(AuthUser { user, role })
    }
}

//! Bearer-token authentication and role gating.
//!
//! Flow: read `Authorization: Bearer <token>`, verify it, then reload the
//! user by the embedded id so role and profile data are never taken from
//! stale claims. Handlers that need identity call [`require_auth`] first and
//! receive an [`AuthUser`]; role checks compose after it.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use tracing::debug;

use crate::{
    api::error::ApiError,
    store::{MarketStore, Role, User},
};

use super::state::AuthState;

pub const MISSING_TOKEN: &str = "Access token required";
pub const INVALID_TOKEN: &str = "Invalid or expired token";
pub const ADMIN_REQUIRED: &str = "Admin access required";

/// Roles allowed on catalog administration routes.
pub const CATALOG_ADMINS: &[Role] = &[Role::Admin, Role::Moderator];

/// Identity resolved from a verified token.
#[derive(Clone, Debug)]
pub struct AuthUser {
    user: User,
}

impl AuthUser {
    #[must_use]
    pub fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub fn id(&self) -> uuid::Uuid {
        self.user.id
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.user.role
    }

    #[must_use]
    pub fn into_user(self) -> User {
        self.user
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Resolves the bearer token into an authenticated user.
///
/// # Errors
/// `401 Access token required` without a bearer header; `401 Invalid or
/// expired token` for any verification failure or when the user no longer
/// exists.
pub async fn require_auth(
    headers: &HeaderMap,
    store: &dyn MarketStore,
    auth: &AuthState,
) -> Result<AuthUser, ApiError> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthorized(MISSING_TOKEN))?;
    let claims = auth.tokens().verify(token).map_err(|err| {
        debug!("Rejected bearer token: {err}");
        ApiError::Unauthorized(INVALID_TOKEN)
    })?;
    match store.user_by_id(claims.user_id).await? {
        Some(user) => Ok(AuthUser { user }),
        None => {
            debug!("Token subject {} no longer exists", claims.user_id);
            Err(ApiError::Unauthorized(INVALID_TOKEN))
        }
    }
}

/// Fails with `403` unless the user holds one of `allowed`.
///
/// # Errors
/// Returns [`ApiError::Forbidden`] on role mismatch.
pub fn require_role(user: &AuthUser, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&user.role()) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(ADMIN_REQUIRED))
    }
}

/// Authentication followed by the catalog admin role gate.
///
/// # Errors
/// See [`require_auth`] and [`require_role`].
pub async fn require_catalog_admin(
    headers: &HeaderMap,
    store: &dyn MarketStore,
    auth: &AuthState,
) -> Result<AuthUser, ApiError> {
    let user = require_auth(headers, store, auth).await?;
    require_role(&user, CATALOG_ADMINS)?;
    Ok(user)
}

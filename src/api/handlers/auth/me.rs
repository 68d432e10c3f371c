use std::sync::Arc;

use axum::{
    extract::Extension,
    http::HeaderMap,
    response::{IntoResponse, Json},
};

use super::{
    principal::require_auth,
    state::AuthState,
    types::{UserEnvelope, UserResponse},
};
use crate::api::{
    error::{ApiError, ErrorBody},
    handlers::SharedStore,
};

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserEnvelope),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(
    headers: HeaderMap,
    store: Extension<SharedStore>,
    auth: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let user = require_auth(&headers, &**store, &auth).await?;
    Ok(Json(UserEnvelope {
        success: true,
        user: UserResponse::from(user.user()),
    }))
}

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    response::{IntoResponse, Json},
};
use tracing::{debug, info};

use super::{
    password::verify_password,
    state::AuthState,
    types::{LoginRequest, LoginResponse, UserResponse},
};
use crate::api::{
    error::{ApiError, ErrorBody},
    handlers::{validate, SharedStore},
};

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 401, description = "Invalid email or password", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    ),
    tag = "auth"
)]
pub async fn login(
    store: Extension<SharedStore>,
    auth: Extension<Arc<AuthState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = validate::body(payload)?;
    let email = validate::required(request.email)?;
    if !validate::is_email(&email) {
        return validate::fail("Invalid email format");
    }
    let email = email.to_lowercase();
    let password = validate::required(request.password)?;
    if password.is_empty() {
        return validate::fail("Password is required");
    }

    // Unknown email and wrong password must be indistinguishable.
    let Some(user) = store.user_by_email(&email).await? else {
        debug!("Login rejected: unknown email");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
    };
    if !verify_password(password, user.password_hash.clone()).await? {
        debug!(user_id = %user.id, "Login rejected: password mismatch");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
    }

    let token = auth.tokens().issue(&user).map_err(ApiError::internal)?;
    info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        success: true,
        token,
        user: UserResponse::from(&user),
    }))
}

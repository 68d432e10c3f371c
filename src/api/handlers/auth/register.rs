use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::{debug, info};

use super::{
    password::hash_password,
    state::AuthState,
    types::{RegisterRequest, UserEnvelope, UserResponse},
};
use crate::{
    api::{
        error::{ApiError, ErrorBody},
        handlers::{validate, SharedStore},
    },
    store::NewUser,
};

pub(crate) struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Applies the registration rules in field order; the email comes back lowercased.
pub(crate) fn validate_registration(request: RegisterRequest) -> Result<Registration, ApiError> {
    let username = validate::required(request.username)?;
    validate::length(
        &username,
        3,
        20,
        "Username must be at least 3 characters",
        "Username must be less than 20 characters",
    )?;
    if !validate::is_username(&username) {
        return validate::fail("Username can only contain letters, numbers, and underscores");
    }

    let email = validate::required(request.email)?;
    if !validate::is_email(&email) {
        return validate::fail("Invalid email format");
    }

    let password = validate::required(request.password)?;
    validate::length(
        &password,
        6,
        100,
        "Password must be at least 6 characters",
        "Password must be less than 100 characters",
    )?;

    Ok(Registration {
        username,
        email: email.to_lowercase(),
        password,
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = UserEnvelope),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 409, description = "Email or username already exists", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    ),
    tag = "auth"
)]
pub async fn register(
    store: Extension<SharedStore>,
    auth: Extension<Arc<AuthState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let registration = validate_registration(validate::body(payload)?)?;

    if store.user_by_email(&registration.email).await?.is_some() {
        debug!("Registration rejected: email already exists");
        return Err(ApiError::Conflict("Email already exists"));
    }
    if store
        .user_by_username(&registration.username)
        .await?
        .is_some()
    {
        debug!("Registration rejected: username already exists");
        return Err(ApiError::Conflict("Username already exists"));
    }

    let password_hash =
        hash_password(registration.password, auth.config().bcrypt_cost()).await?;
    let user = store
        .insert_user(NewUser {
            username: registration.username,
            email: registration.email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(UserEnvelope {
            success: true,
            user: UserResponse::from(&user),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: Some(username.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    fn message(request: RegisterRequest) -> String {
        match validate_registration(request) {
            Err(ApiError::Validation(message)) => message,
            Err(other) => panic!("unexpected error {other:?}"),
            Ok(_) => panic!("expected validation failure"),
        }
    }

    #[test]
    fn lowercases_email() {
        let registration = validate_registration(request("alice", "Alice@X.com", "Secret1")).unwrap();
        assert_eq!(registration.email, "alice@x.com");
        assert_eq!(registration.username, "alice");
    }

    #[test]
    fn first_violation_wins() {
        assert_eq!(
            message(request("al", "bad", "1")),
            "Username must be at least 3 characters"
        );
        assert_eq!(
            message(request("a".repeat(21).as_str(), "a@b.co", "Secret1")),
            "Username must be less than 20 characters"
        );
        assert_eq!(
            message(request("al ice", "a@b.co", "Secret1")),
            "Username can only contain letters, numbers, and underscores"
        );
        assert_eq!(message(request("alice", "bad", "1")), "Invalid email format");
        assert_eq!(
            message(request("alice", "a@b.co", "12345")),
            "Password must be at least 6 characters"
        );
        assert_eq!(
            message(request("alice", "a@b.co", &"x".repeat(101))),
            "Password must be less than 100 characters"
        );
    }

    #[test]
    fn missing_fields_are_required() {
        assert_eq!(message(RegisterRequest::default()), validate::REQUIRED);
    }
}

//! Auth route tests.

use anyhow::{Context, Result};
use axum::http::{Method, StatusCode};
use serde_json::json;

use super::login::INVALID_CREDENTIALS;
use super::principal::{INVALID_TOKEN, MISSING_TOKEN};
use crate::api::handlers::testing::{error_of, TestApp};
use crate::store::MarketStore;

fn alice() -> serde_json::Value {
    json!({"username": "alice", "email": "alice@x.com", "password": "Secret1"})
}

#[tokio::test]
async fn register_login_me_round_trip() -> Result<()> {
    let app = TestApp::new()?;

    let (status, body) = app
        .send(Method::POST, "/api/auth/register", None, Some(alice()))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["role"], "USER");
    assert_eq!(body["user"]["verified"], false);
    assert_eq!(body["user"]["balance"].as_f64(), Some(0.0));
    assert!(body["user"].get("passwordHash").is_none());
    let user_id = body["user"]["id"].clone();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "alice@x.com", "password": "Secret1"})),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().context("token")?.to_string();
    assert_eq!(body["user"]["id"], user_id);

    let (status, body) = app
        .send(Method::GET, "/api/auth/me", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user_id);
    assert_eq!(body["user"]["role"], "USER");
    Ok(())
}

#[tokio::test]
async fn register_reports_which_field_collided() -> Result<()> {
    let app = TestApp::new()?;
    app.send(Method::POST, "/api/auth/register", None, Some(alice()))
        .await?;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "other", "email": "ALICE@x.com", "password": "Secret1"})),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_of(&body), "Email already exists");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "alice", "email": "new@x.com", "password": "Secret1"})),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_of(&body), "Username already exists");
    Ok(())
}

#[tokio::test]
async fn register_validation_and_bad_json() -> Result<()> {
    let app = TestApp::new()?;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "al", "email": "alice@x.com", "password": "Secret1"})),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(error_of(&body), "Username must be at least 3 characters");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": 42})),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn login_failures_are_indistinguishable() -> Result<()> {
    let app = TestApp::new()?;
    app.send(Method::POST, "/api/auth/register", None, Some(alice()))
        .await?;

    let (wrong_status, wrong_body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "alice@x.com", "password": "Secret2"})),
        )
        .await?;
    let (unknown_status, unknown_body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "bob@x.com", "password": "Secret1"})),
        )
        .await?;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(error_of(&wrong_body), INVALID_CREDENTIALS);
    Ok(())
}

#[tokio::test]
async fn login_validates_shape() -> Result<()> {
    let app = TestApp::new()?;
    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "alice@x.com", "password": ""})),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_of(&body), "Password is required");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "nope", "password": "Secret1"})),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_of(&body), "Invalid email format");
    Ok(())
}

#[tokio::test]
async fn me_rejects_missing_and_garbage_tokens() -> Result<()> {
    let app = TestApp::new()?;

    let (status, body) = app.get("/api/auth/me").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_of(&body), MISSING_TOKEN);

    let (status, body) = app
        .send(Method::GET, "/api/auth/me", Some("not-a-jwt"), None)
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_of(&body), INVALID_TOKEN);
    Ok(())
}

#[tokio::test]
async fn expired_token_is_rejected() -> Result<()> {
    let app = TestApp::new()?;
    let (user_id, _) = app.user("alice").await?;
    let user = app.store.user_by_id(user_id).await?.context("user")?;

    let ttl = app.auth.config().token_ttl_seconds();
    let issued_at = chrono::Utc::now().timestamp() - ttl - 60;
    let token = app.auth.tokens().issue_at(&user, issued_at)?;

    let (status, body) = app
        .send(Method::GET, "/api/auth/me", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_of(&body), INVALID_TOKEN);
    Ok(())
}

#[tokio::test]
async fn token_of_deleted_user_is_rejected() -> Result<()> {
    let app = TestApp::new()?;
    let (user_id, token) = app.user("alice").await?;
    assert!(app.store.delete_user(user_id).await);

    let (status, body) = app
        .send(Method::GET, "/api/auth/me", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_of(&body), INVALID_TOKEN);
    Ok(())
}

#[tokio::test]
async fn me_reflects_current_role_not_token_claims() -> Result<()> {
    let app = TestApp::new()?;
    let (user_id, token) = app.user("alice").await?;
    assert!(app.store.set_role(user_id, crate::store::Role::Moderator).await);

    let (status, body) = app
        .send(Method::GET, "/api/auth/me", Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "MODERATOR");
    Ok(())
}

//! Router-level helpers shared by the handler tests.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use super::{auth, SharedStore};
use crate::store::{MemoryStore, Role};

pub(crate) const SECRET: &str = "router-test-secret-router-test-secret";

pub(crate) struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub auth: Arc<auth::AuthState>,
}

impl TestApp {
    pub(crate) fn new() -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let shared: SharedStore = store.clone();
        let auth = Arc::new(auth::AuthState::new(
            auth::AuthConfig::new(SecretString::from(SECRET.to_string())).with_bcrypt_cost(4),
        ));
        let router = crate::api::app(
            shared,
            auth.clone(),
            &["http://localhost:3000".to_string()],
        )?;
        Ok(Self {
            router,
            store,
            auth,
        })
    }

    /// Sends a request and returns the status with the JSON body (`Null` when empty).
    pub(crate) async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => request.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let payload = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, payload))
    }

    pub(crate) async fn get(&self, uri: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, uri, None, None).await
    }

    /// Registers and logs in a user, returning `(user_id, token)`.
    pub(crate) async fn user(&self, username: &str) -> Result<(Uuid, String)> {
        let email = format!("{username}@bazaar.test");
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({"username": username, "email": email, "password": "Secret1"})),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "register failed: {body}");

        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"email": email, "password": "Secret1"})),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {body}");

        let id = body["user"]["id"]
            .as_str()
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or_else(|| anyhow::anyhow!("missing user id in {body}"))?;
        let token = body["token"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("missing token in {body}"))?
            .to_string();
        Ok((id, token))
    }

    /// A user promoted to `role` after registration.
    pub(crate) async fn user_with_role(&self, username: &str, role: Role) -> Result<(Uuid, String)> {
        let (id, token) = self.user(username).await?;
        anyhow::ensure!(self.store.set_role(id, role).await, "unknown user {id}");
        Ok((id, token))
    }

    /// Creates a game through the admin route and returns its id.
    pub(crate) async fn game(&self, admin_token: &str, slug: &str) -> Result<String> {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/games/admin",
                Some(admin_token),
                Some(json!({"name": slug.to_uppercase(), "slug": slug, "platformTypes": ["PC"]})),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create game failed: {body}");
        id_of(&body["game"])
    }

    /// Creates a category under `game_id` and returns its id.
    pub(crate) async fn category(
        &self,
        admin_token: &str,
        game_id: &str,
        slug: &str,
    ) -> Result<String> {
        let (status, body) = self
            .send(
                Method::POST,
                &format!("/api/games/admin/{game_id}/categories"),
                Some(admin_token),
                Some(json!({"name": slug.to_uppercase(), "slug": slug})),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create category failed: {body}");
        id_of(&body["category"])
    }

    /// Creates a listing and returns its id.
    pub(crate) async fn listing(
        &self,
        seller_token: &str,
        game_id: &str,
        category_id: &str,
        fields: Value,
    ) -> Result<String> {
        let mut payload = json!({
            "gameId": game_id,
            "categoryId": category_id,
            "title": "1000 gold",
            "price": 9.99,
            "description": "Delivered within the hour",
        });
        if let (Some(target), Some(extra)) = (payload.as_object_mut(), fields.as_object()) {
            for (key, value) in extra {
                target.insert(key.clone(), value.clone());
            }
        }
        let (status, body) = self
            .send(Method::POST, "/api/listings", Some(seller_token), Some(payload))
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create listing failed: {body}");
        id_of(&body["listing"])
    }
}

pub(crate) fn id_of(value: &Value) -> Result<String> {
    value["id"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("missing id in {value}"))
}

pub(crate) fn error_of(body: &Value) -> &str {
    body["error"].as_str().unwrap_or_default()
}

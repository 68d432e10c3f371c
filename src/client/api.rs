//! Typed HTTP client for the marketplace REST API.
//!
//! Every call shares one `reqwest::Client` with the crate user agent and a
//! fixed timeout policy. Non-2xx answers become [`ClientError::Http`] carrying
//! the server's `error` message so callers can show it as is.

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::{debug, info_span, Instrument};
use url::Url;
use uuid::Uuid;

use super::ClientError;
use crate::{
    api::handlers::{
        auth::types::{LoginResponse, UserEnvelope, UserResponse},
        categories::CategoryList,
        games::{GameDetail, GameDetailEnvelope, GameList, GameListItem},
        listings::types::{ListingDetailEnvelope, ListingDetailResponse, ListingPage},
    },
    APP_USER_AGENT,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Query parameters of a listing page; unset fields are left to the server defaults.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ListingParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Builds a client for the API rooted at `base_url`.
    /// # Errors
    /// Returns [`ClientError::Config`] if the URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|err| ClientError::Config(format!("invalid API base URL: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "invalid API base URL: {base_url}"
            )));
        }
        let http = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| ClientError::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(Self { http, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                ClientError::Config(format!("invalid API base URL: {}", self.base_url))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: &'static str,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<T, ClientError> {
        let span = info_span!("api.request", http.method = method, url = %url);
        let response = request.send().instrument(span).await?;
        decode(response).await
    }

    /// `POST /api/auth/register`
    /// # Errors
    /// Returns the server's validation or conflict message on failure.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserResponse, ClientError> {
        let url = self.endpoint(&["api", "auth", "register"])?;
        let request = self
            .http
            .post(url.clone())
            .json(&json!({"username": username, "email": email, "password": password}));
        let envelope: UserEnvelope = self.send("POST", request, &url).await?;
        Ok(envelope.user)
    }

    /// `POST /api/auth/login`
    /// # Errors
    /// Returns [`ClientError::Http`] with status 401 on bad credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let url = self.endpoint(&["api", "auth", "login"])?;
        let request = self
            .http
            .post(url.clone())
            .json(&json!({"email": email, "password": password}));
        self.send("POST", request, &url).await
    }

    /// `GET /api/auth/me`
    /// # Errors
    /// Returns [`ClientError::Http`] with status 401 when the token is no longer valid.
    pub async fn me(&self, token: &str) -> Result<UserResponse, ClientError> {
        let url = self.endpoint(&["api", "auth", "me"])?;
        let request = self.http.get(url.clone()).bearer_auth(token);
        let envelope: UserEnvelope = self.send("GET", request, &url).await?;
        Ok(envelope.user)
    }

    /// `GET /api/games`
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn games(&self) -> Result<Vec<GameListItem>, ClientError> {
        let url = self.endpoint(&["api", "games"])?;
        let request = self.http.get(url.clone());
        let list: GameList = self.send("GET", request, &url).await?;
        Ok(list.games)
    }

    /// `GET /api/games/{slug}`
    /// # Errors
    /// Returns [`ClientError::Http`] with status 404 for unknown or inactive games.
    pub async fn game(&self, slug: &str) -> Result<GameDetail, ClientError> {
        let url = self.endpoint(&["api", "games", slug])?;
        let request = self.http.get(url.clone());
        let envelope: GameDetailEnvelope = self.send("GET", request, &url).await?;
        Ok(envelope.game)
    }

    /// `GET /api/games/{slug}/categories`
    /// # Errors
    /// Returns [`ClientError::Http`] with status 404 for unknown or inactive games.
    pub async fn categories(&self, game_slug: &str) -> Result<CategoryList, ClientError> {
        let url = self.endpoint(&["api", "games", game_slug, "categories"])?;
        let request = self.http.get(url.clone());
        self.send("GET", request, &url).await
    }

    /// `GET /api/games/{slug}/{category_slug}/listings`
    /// # Errors
    /// Returns [`ClientError::Http`] with status 400 for invalid parameters.
    pub async fn listings(
        &self,
        game_slug: &str,
        category_slug: &str,
        params: &ListingParams,
    ) -> Result<ListingPage, ClientError> {
        let url = self.endpoint(&["api", "games", game_slug, category_slug, "listings"])?;
        let request = self.http.get(url.clone()).query(params);
        self.send("GET", request, &url).await
    }

    /// `GET /api/listings/{id}`
    /// # Errors
    /// Returns [`ClientError::Http`] with status 404 for missing or hidden listings.
    pub async fn listing(&self, id: Uuid) -> Result<ListingDetailResponse, ClientError> {
        let id = id.to_string();
        let url = self.endpoint(&["api", "listings", &id])?;
        let request = self.http.get(url.clone());
        let envelope: ListingDetailEnvelope = self.send("GET", request, &url).await?;
        Ok(envelope.listing)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|err| ClientError::Parse(format!("Failed to decode response: {err}")));
    }
    let body = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), "API request failed");
    Err(ClientError::from_body(status.as_u16(), &body))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        api::handlers::auth::{AuthConfig, AuthState},
        store::MemoryStore,
    };
    use secrecy::SecretString;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    /// Serves the real router on an ephemeral port and returns a client for it.
    pub(crate) async fn serve() -> anyhow::Result<ApiClient> {
        let store = Arc::new(MemoryStore::new());
        let auth = Arc::new(AuthState::new(
            AuthConfig::new(SecretString::from(
                "client-test-secret-client-test-secret".to_string(),
            ))
            .with_bcrypt_cost(4),
        ));
        let app = crate::api::app(store, auth, &[])?;
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app.into_make_service()).await;
        });
        Ok(ApiClient::new(&format!("http://{addr}"))?)
    }

    #[test]
    fn endpoint_keeps_base_path() -> anyhow::Result<()> {
        let client = ApiClient::new("http://localhost:8000/market/")?;
        let url = client.endpoint(&["api", "games", "dota-2"])?;
        assert_eq!(url.as_str(), "http://localhost:8000/market/api/games/dota-2");

        let client = ApiClient::new("http://localhost:8000")?;
        let url = client.endpoint(&["api", "games", "a b"])?;
        assert_eq!(url.as_str(), "http://localhost:8000/api/games/a%20b");
        Ok(())
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(ClientError::Config(_))
        ));
        assert!(matches!(
            ApiClient::new("mailto:team@bazaar.dev"),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn listing_params_only_send_set_fields() -> anyhow::Result<()> {
        let params = ListingParams {
            page: Some(2),
            delivery_type: Some("INSTANT".to_string()),
            ..ListingParams::default()
        };
        let value = serde_json::to_value(&params)?;
        assert_eq!(value, json!({"page": 2, "deliveryType": "INSTANT"}));
        Ok(())
    }

    #[tokio::test]
    async fn auth_round_trip_against_router() -> anyhow::Result<()> {
        let client = serve().await?;

        let user = client.register("alice", "alice@x.com", "Secret1").await?;
        assert_eq!(user.username, "alice");

        let err = client
            .register("alice2", "alice@x.com", "Secret1")
            .await
            .err()
            .map(|err| (err.status(), err.to_string()));
        assert_eq!(err, Some((Some(409), "Email already exists".to_string())));

        let login = client.login("alice@x.com", "Secret1").await?;
        assert_eq!(login.user.id, user.id);

        let me = client.me(&login.token).await?;
        assert_eq!(me.id, user.id);

        let err = client.me("garbage").await.err();
        assert!(err.is_some_and(|err| err.is_unauthorized()));
        Ok(())
    }

    #[tokio::test]
    async fn catalog_reads_against_router() -> anyhow::Result<()> {
        let client = serve().await?;
        assert!(client.games().await?.is_empty());

        let err = client.game("missing").await.err();
        assert_eq!(err.and_then(|err| err.status()), Some(404));

        let err = client
            .listings(
                "missing",
                "items",
                &ListingParams {
                    limit: Some(0),
                    ..ListingParams::default()
                },
            )
            .await
            .err()
            .map(|err| err.to_string());
        assert_eq!(err.as_deref(), Some("Limit must be a positive integer"));
        Ok(())
    }
}

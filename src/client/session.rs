//! Client session state.
//!
//! A [`Session`] owns the in-memory identity and mirrors it to a
//! [`SessionStorage`]. The token and the verified user are always stored or
//! cleared together: a token is never kept without a verified user, nor a
//! user without a token.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{ApiClient, ClientError, QueryCache, SessionStorage, StoredSession};
use crate::api::handlers::auth::types::{LoginResponse, UserResponse};

/// The two auth calls a session depends on.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError>;
    async fn me(&self, token: &str) -> Result<UserResponse, ClientError>;
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        ApiClient::login(self, email, password).await
    }

    async fn me(&self, token: &str) -> Result<UserResponse, ClientError> {
        ApiClient::me(self, token).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    /// Startup verification has not settled yet.
    Verifying,
    Anonymous,
    Authenticated(UserResponse),
}

#[derive(Default)]
struct State {
    token: Option<String>,
    user: Option<UserResponse>,
    settled: bool,
}

pub struct Session {
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn SessionStorage>,
    cache: QueryCache,
    state: RwLock<State>,
}

impl Session {
    pub fn new(api: Arc<dyn AuthApi>, storage: Arc<dyn SessionStorage>, cache: QueryCache) -> Self {
        Self {
            api,
            storage,
            cache,
            state: RwLock::new(State::default()),
        }
    }

    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub async fn phase(&self) -> SessionPhase {
        let state = self.state.read().await;
        match (&state.user, state.settled) {
            (Some(user), _) if state.token.is_some() => SessionPhase::Authenticated(user.clone()),
            (_, false) => SessionPhase::Verifying,
            _ => SessionPhase::Anonymous,
        }
    }

    pub async fn token(&self) -> Option<String> {
        let state = self.state.read().await;
        state.user.as_ref().and(state.token.clone())
    }

    pub async fn user(&self) -> Option<UserResponse> {
        let state = self.state.read().await;
        state.token.as_ref().and(state.user.clone())
    }

    /// Restores the persisted session.
    ///
    /// A stored token and user are hydrated as is. A token without a user is
    /// verified against the API: success hydrates, any failure clears the
    /// storage. A user without a token is cleared.
    ///
    /// # Errors
    /// Returns an error only if the storage cannot be read or written.
    pub async fn bootstrap(&self) -> Result<SessionPhase, ClientError> {
        if self.user().await.is_some() {
            self.state.write().await.settled = true;
            return Ok(self.phase().await);
        }

        let stored = self.storage.load().await?;
        match stored {
            StoredSession {
                token: Some(token),
                user: Some(user),
            } => {
                debug!(user_id = %user.id, "Session restored from storage");
                self.hydrate(token, user).await;
            }
            StoredSession {
                token: Some(token),
                user: None,
            } => match self.api.me(&token).await {
                Ok(user) => {
                    info!(user_id = %user.id, "Stored token verified");
                    self.storage
                        .save(&StoredSession {
                            token: Some(token.clone()),
                            user: Some(user.clone()),
                        })
                        .await?;
                    self.hydrate(token, user).await;
                }
                Err(err) => {
                    warn!("Stored token rejected, clearing session: {err}");
                    self.reset().await?;
                }
            },
            StoredSession {
                token: None,
                user: Some(_),
            } => {
                debug!("Stored user without token, clearing session");
                self.reset().await?;
            }
            StoredSession {
                token: None,
                user: None,
            } => {
                self.state.write().await.settled = true;
            }
        }
        Ok(self.phase().await)
    }

    /// Logs in and persists the new identity.
    ///
    /// # Errors
    /// Returns the API error (e.g. `Invalid email or password`); the current
    /// session is left untouched in that case.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserResponse, ClientError> {
        let LoginResponse { token, user, .. } = self.api.login(email, password).await?;
        self.storage
            .save(&StoredSession {
                token: Some(token.clone()),
                user: Some(user.clone()),
            })
            .await?;
        self.hydrate(token, user.clone()).await;
        self.cache.invalidate_scope("auth").await;
        info!(user_id = %user.id, "Logged in");
        Ok(user)
    }

    /// Clears memory, storage and every cached query.
    ///
    /// # Errors
    /// Returns an error if the storage cannot be cleared; memory and cache are
    /// cleared regardless.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self.reset().await;
        self.cache.clear().await;
        info!("Logged out");
        result
    }

    async fn hydrate(&self, token: String, user: UserResponse) {
        let mut state = self.state.write().await;
        state.token = Some(token);
        state.user = Some(user);
        state.settled = true;
    }

    async fn reset(&self) -> Result<(), ClientError> {
        {
            let mut state = self.state.write().await;
            state.token = None;
            state.user = None;
            state.settled = true;
        }
        self.storage.clear().await
    }
}

//! Signed bearer tokens (HS256 JWT).

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{Role, User};

/// Claims embedded in every session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Sign(jsonwebtoken::errors::Error),
    #[error("token rejected: {0}")]
    Invalid(jsonwebtoken::errors::Error),
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_seconds: i64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &SecretString, ttl_seconds: i64) -> Self {
        let key = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validation,
            ttl_seconds,
        }
    }

    /// Issues a token for `user` valid for the configured lifetime.
    ///
    /// # Errors
    /// Returns [`TokenError::Sign`] if encoding fails.
    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        self.issue_at(user, Utc::now().timestamp())
    }

    pub(crate) fn issue_at(&self, user: &User, issued_at: i64) -> Result<String, TokenError> {
        let claims = Claims {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: issued_at,
            exp: issued_at.saturating_add(self.ttl_seconds),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Sign)
    }

    /// Verifies signature and expiry.
    ///
    /// # Errors
    /// Every failure (malformed, expired, wrong key) is [`TokenError::Invalid`].
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password_hash: String::new(),
            role: Role::Moderator,
            verified: false,
            balance: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn issued_token_verifies_to_same_identity() {
        let service = TokenService::new(&secret("test-secret-key-that-is-at-least-32-chars"), 3600);
        let user = user();
        let token = service.issue(&user).unwrap();
        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.role, Role::Moderator);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn claims_use_camel_case_names() {
        let service = TokenService::new(&secret("test-secret-key-that-is-at-least-32-chars"), 60);
        let token = service.issue(&user()).unwrap();
        let payload = token.split('.').nth(1).unwrap();
        assert!(!payload.is_empty());
        let claims = service.verify(&token).unwrap();
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("userId").is_some());
        assert_eq!(json["role"], "MODERATOR");
    }

    #[test]
    fn oversized_lifetime_saturates_instead_of_wrapping() {
        let service =
            TokenService::new(&secret("test-secret-key-that-is-at-least-32-chars"), i64::MAX);
        let token = service.issue(&user()).unwrap();
        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.exp, i64::MAX);
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = TokenService::new(&secret("test-secret-key-that-is-at-least-32-chars"), 60);
        let issued_at = Utc::now().timestamp() - 3600;
        let token = service.issue_at(&user(), issued_at).unwrap();
        assert!(matches!(service.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let ours = TokenService::new(&secret("test-secret-key-that-is-at-least-32-chars"), 60);
        let theirs = TokenService::new(&secret("another-secret-key-that-is-32-chars-long"), 60);
        let token = theirs.issue(&user()).unwrap();
        assert!(ours.verify(&token).is_err());
        assert!(ours.verify("not.a.token").is_err());
    }
}

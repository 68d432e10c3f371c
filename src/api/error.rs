//! Error type shared by every API handler.
//!
//! All failures render as `{"success": false, "error": <message>}`. Internal
//! faults are logged server-side and surface only as a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::store::{StoreError, UniqueKey};

pub const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Body of every non-2xx response.
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Wraps an unexpected fault; the detail is only ever logged.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::Internal(detail) => {
                error!("Internal error: {detail}");
                INTERNAL_MESSAGE.to_string()
            }
            other => other.to_string(),
        };
        (
            status,
            Json(ErrorBody {
                success: false,
                error: message,
            }),
        )
            .into_response()
    }
}

impl From<StoreError> for ApiError {
    /// Unique violations that slipped past a handler pre-check keep the pre-check's message.
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(UniqueKey::Email) => Self::Conflict("Email already exists"),
            StoreError::Duplicate(UniqueKey::Username) => Self::Conflict("Username already exists"),
            StoreError::Duplicate(UniqueKey::GameSlug) => Self::Conflict("Game slug already exists"),
            StoreError::Duplicate(UniqueKey::CategorySlug) => {
                Self::Conflict("Category slug already exists for this game")
            }
            other => Self::internal(other),
        }
    }
}

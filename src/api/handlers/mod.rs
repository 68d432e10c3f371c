//! API handlers and helpers shared between them.

pub mod auth;
pub mod categories;
pub mod games;
pub mod health;
pub mod listings;
pub mod root;
#[cfg(test)]
pub(crate) mod testing;
pub(crate) mod validate;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    api::error::ApiError,
    store::{MarketStore, Removal},
};

/// Store handle injected into every handler via `Extension`.
pub type SharedStore = Arc<dyn MarketStore>;

/// Parses a path id; anything that is not a UUID cannot name a record, so it is a `404`.
pub(crate) fn parse_id(raw: &str, not_found: &'static str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(not_found))
}

/// Outcome of a delete-or-deactivate request.
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct RemovalResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivated: Option<bool>,
}

impl RemovalResponse {
    /// Builds the response for `entity` ("Game", "Category", "Listing") and
    /// the reason a soft delete happened.
    pub(crate) fn new(removal: Removal, entity: &str, soft_reason: &str) -> Self {
        match removal {
            Removal::Deleted => Self {
                success: true,
                message: format!("{entity} deleted successfully"),
                deleted: Some(true),
                deactivated: None,
            },
            Removal::Deactivated => Self {
                success: true,
                message: format!("{entity} deactivated ({soft_reason})"),
                deleted: None,
                deactivated: Some(true),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_maps_garbage_to_not_found() {
        assert!(parse_id("7a1f2a9e-3e0c-4d7e-9a55-0f6f1c1d2b3a", "Game not found").is_ok());
        assert!(matches!(
            parse_id("nope", "Game not found"),
            Err(ApiError::NotFound("Game not found"))
        ));
    }

    #[test]
    fn removal_messages() {
        let soft = RemovalResponse::new(Removal::Deactivated, "Listing", "had pending orders");
        assert_eq!(soft.message, "Listing deactivated (had pending orders)");
        assert_eq!(soft.deactivated, Some(true));
        assert!(soft.deleted.is_none());

        let hard = RemovalResponse::new(Removal::Deleted, "Game", "had active listings");
        assert_eq!(hard.message, "Game deleted successfully");
        assert_eq!(hard.deleted, Some(true));
    }
}

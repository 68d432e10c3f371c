//! # Bazaar (game item marketplace)
//!
//! `bazaar` is the REST backend of a two-sided marketplace where sellers list
//! in-game items, currency and services under a game and one of its categories.
//!
//! ## Catalog
//!
//! Games own categories; listings belong to one seller, one game and one
//! category of that game. Slugs are unique per scope (globally for games,
//! per game for categories) and match `[a-z0-9-]`. Public reads only show
//! `active` records, and listings additionally must not be `hidden`.
//!
//! Deleting a game or category that still has active listings deactivates it
//! instead; deleting a listing with open orders (pending, paid, delivered)
//! does the same.
//!
//! ## Authentication
//!
//! Passwords are hashed with bcrypt. Login issues an HS256 JWT carrying the
//! user id, email and role; every protected request re-loads the user so
//! role changes and deletions take effect immediately. Any token failure,
//! including a deleted user, is the same `401`.
//!
//! ## Client
//!
//! [`client`] holds the frontend-side session state: a typed HTTP client,
//! persisted session storage, a query cache, a debouncer for search input and
//! the protected-route gate.

pub mod api;
pub mod cli;
pub mod client;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(GIT_COMMIT_HASH.len() >= 7);
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}

//! Registration, login and bearer-token session verification.

pub mod login;
pub mod me;
mod password;
pub mod principal;
pub mod register;
pub mod state;
pub mod token;
pub mod types;

pub use principal::{require_auth, require_catalog_admin, require_role, AuthUser};
pub use state::{AuthConfig, AuthState};
pub use token::{Claims, TokenError, TokenService};

#[cfg(test)]
mod tests;

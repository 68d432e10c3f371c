//! Frontend-side session state for marketplace clients.
//!
//! [`Session`] is an explicit state container: build one at startup, call
//! [`Session::bootstrap`] once, and hand it to whatever renders routes. It
//! owns the [`QueryCache`] so logging out drops every cached response tied
//! to the previous identity.

mod api;
mod cache;
mod debounce;
mod error;
mod guard;
mod session;
mod storage;

pub use api::{ApiClient, ListingParams};
pub use cache::{QueryCache, QueryKey, DEFAULT_STALE_AFTER, LISTINGS_STALE_AFTER};
pub use debounce::{Debouncer, DEFAULT_DELAY};
pub use error::ClientError;
pub use guard::{GateDecision, RouteGate, LANDING_PATH, LOGIN_PATH};
pub use session::{AuthApi, Session, SessionPhase};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, StoredSession, DEFAULT_FILE_NAME};

//! Marketplace persistence.
//!
//! Handlers talk to storage through [`MarketStore`]. [`PgStore`] is the
//! production implementation; [`MemoryStore`] keeps the same contract in
//! process and backs the test-suite.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use models::*;
pub use postgres::PgStore;

/// Unique keys the store enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey {
    Email,
    Username,
    GameSlug,
    CategorySlug,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0:?}")]
    Duplicate(UniqueKey),
    #[error("stored row is invalid: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Relational store collaborator.
///
/// Lookups return `Ok(None)` for missing rows. Methods documented as
/// "active" apply the visibility predicate themselves so callers cannot
/// forget it.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Cheap round-trip used by the health endpoint.
    async fn ping(&self) -> StoreResult<()>;

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    /// Inserts a user with role `USER`, `verified = false` and a zero balance.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    /// Active games ordered by `order_index`, then `name`.
    async fn active_games(&self) -> StoreResult<Vec<GameSummary>>;
    async fn game_by_id(&self, id: Uuid) -> StoreResult<Option<Game>>;
    /// Active game by slug.
    async fn active_game_by_slug(&self, slug: &str) -> StoreResult<Option<Game>>;
    /// Number of active listings for a game.
    async fn game_listings_count(&self, game_id: Uuid) -> StoreResult<i64>;
    async fn insert_game(&self, game: NewGame) -> StoreResult<Game>;
    async fn update_game(&self, id: Uuid, changes: GameChanges) -> StoreResult<Option<Game>>;
    /// Deactivates the game when active listings reference it, deletes it otherwise.
    async fn remove_game(&self, id: Uuid) -> StoreResult<Option<Removal>>;

    /// Active categories of a game ordered by name.
    async fn active_categories(&self, game_id: Uuid) -> StoreResult<Vec<CategorySummary>>;
    async fn category_by_id(&self, id: Uuid) -> StoreResult<Option<Category>>;
    /// Active category of a game by slug.
    async fn active_category_by_slug(
        &self,
        game_id: Uuid,
        slug: &str,
    ) -> StoreResult<Option<Category>>;
    async fn insert_category(&self, category: NewCategory) -> StoreResult<Category>;
    async fn update_category(
        &self,
        id: Uuid,
        changes: CategoryChanges,
    ) -> StoreResult<Option<Category>>;
    /// Deactivates the category when active listings reference it, deletes it otherwise.
    async fn remove_category(&self, id: Uuid) -> StoreResult<Option<Removal>>;

    async fn count_listings(&self, filter: &ListingFilter) -> StoreResult<i64>;
    async fn listing_page(
        &self,
        filter: &ListingFilter,
        sort: ListingSort,
        page: PageRequest,
    ) -> StoreResult<Vec<ListingCard>>;
    /// Listing by id regardless of visibility.
    async fn listing_by_id(&self, id: Uuid) -> StoreResult<Option<Listing>>;
    /// Visible listing (`active && !hidden`) with its related records.
    async fn listing_detail(&self, id: Uuid) -> StoreResult<Option<ListingDetail>>;
    async fn insert_listing(&self, listing: NewListing) -> StoreResult<Listing>;
    async fn update_listing(
        &self,
        id: Uuid,
        changes: ListingChanges,
    ) -> StoreResult<Option<Listing>>;
    /// Deactivates the listing when open orders reference it, deletes it otherwise.
    async fn remove_listing(&self, id: Uuid) -> StoreResult<Option<Removal>>;

    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order>;
}

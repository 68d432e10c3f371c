//! Marketplace records and the shapes exchanged with the store.
//!
//! Decimal columns (`balance`, `price`, `commission_rate`) are surfaced as
//! `f64`; the store keeps them as fixed-point numerics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
    Moderator,
    Support,
}

impl Role {
    /// Canonical value stored in the `users.role` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
            Self::Moderator => "MODERATOR",
            Self::Support => "SUPPORT",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "USER" => Some(Self::User),
            "ADMIN" => Some(Self::Admin),
            "MODERATOR" => Some(Self::Moderator),
            "SUPPORT" => Some(Self::Support),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryType {
    Instant,
    #[default]
    Manual,
}

impl DeliveryType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Instant => "INSTANT",
            Self::Manual => "MANUAL",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "INSTANT" => Some(Self::Instant),
            "MANUAL" => Some(Self::Manual),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockType {
    #[default]
    Limited,
    Unlimited,
}

impl StockType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Limited => "LIMITED",
            Self::Unlimited => "UNLIMITED",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "LIMITED" => Some(Self::Limited),
            "UNLIMITED" => Some(Self::Unlimited),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Delivered,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Statuses that still hold a claim on the listing they reference.
    pub const OPEN: [Self; 3] = [Self::Pending, Self::Paid, Self::Delivered];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Delivered => "DELIVERED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
        }
    }

    #[must_use]
    pub fn is_open(self) -> bool {
        Self::OPEN.contains(&self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub verified: bool,
    pub balance: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub platform_types: Vec<String>,
    pub order_index: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGame {
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub platform_types: Vec<String>,
    pub order_index: i32,
}

#[derive(Debug, Clone, Default)]
pub struct GameChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub image_url: Option<String>,
    pub platform_types: Option<Vec<String>>,
    pub order_index: Option<i32>,
    pub active: Option<bool>,
}

/// Active game with the counts shown on the catalog front page.
#[derive(Debug, Clone)]
pub struct GameSummary {
    pub game: Game,
    pub categories_count: i64,
    pub listings_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub game_id: Uuid,
    pub name: String,
    pub slug: String,
    pub commission_rate: f64,
    pub fields_config: Option<Value>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub game_id: Uuid,
    pub name: String,
    pub slug: String,
    pub commission_rate: f64,
    pub fields_config: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub commission_rate: Option<f64>,
    pub fields_config: Option<Value>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct CategorySummary {
    pub category: Category,
    pub listings_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub game_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub delivery_type: DeliveryType,
    pub stock_type: StockType,
    pub quantity: Option<i32>,
    pub images: Vec<String>,
    pub custom_fields: Option<Value>,
    pub active: bool,
    pub hidden: bool,
    pub boosted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewListing {
    pub seller_id: Uuid,
    pub game_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub delivery_type: DeliveryType,
    pub stock_type: StockType,
    pub quantity: Option<i32>,
    pub images: Vec<String>,
    pub custom_fields: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct ListingChanges {
    pub title: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub delivery_type: Option<DeliveryType>,
    pub stock_type: Option<StockType>,
    pub quantity: Option<i32>,
    pub images: Option<Vec<String>>,
    pub custom_fields: Option<Value>,
    pub active: Option<bool>,
    pub hidden: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub listing_id: Option<Uuid>,
    pub buyer_id: Uuid,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub listing_id: Uuid,
    pub buyer_id: Uuid,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingSort {
    PriceAsc,
    PriceDesc,
    #[default]
    Newest,
    Oldest,
}

impl ListingSort {
    pub const VALUES: [&'static str; 4] = ["price_asc", "price_desc", "newest", "oldest"];

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "price_asc" => Some(Self::PriceAsc),
            "price_desc" => Some(Self::PriceDesc),
            "newest" => Some(Self::Newest),
            "oldest" => Some(Self::Oldest),
            _ => None,
        }
    }
}

/// Predicate shared by the page fetch and the count of a listing query.
///
/// Both queries must be built from the same value so the pagination totals
/// describe the page that was returned.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingFilter {
    pub game_id: Uuid,
    pub category_id: Uuid,
    pub delivery_type: Option<DeliveryType>,
    pub stock_type: Option<StockType>,
    pub search: Option<String>,
}

impl ListingFilter {
    /// Evaluates the filter against a listing; always requires `active && !hidden`.
    #[must_use]
    pub fn matches(&self, listing: &Listing) -> bool {
        if !listing.active || listing.hidden {
            return false;
        }
        if listing.game_id != self.game_id || listing.category_id != self.category_id {
            return false;
        }
        if self
            .delivery_type
            .is_some_and(|delivery| delivery != listing.delivery_type)
        {
            return false;
        }
        if self.stock_type.is_some_and(|stock| stock != listing.stock_type) {
            return false;
        }
        match self.search.as_deref() {
            Some(needle) => {
                let needle = needle.to_lowercase();
                listing.title.to_lowercase().contains(&needle)
                    || listing.description.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub skip: i64,
    pub take: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SellerSummary {
    pub id: Uuid,
    pub username: String,
    pub member_since: DateTime<Utc>,
}

/// One row of a listing page: the listing plus its seller and completed-order count.
#[derive(Debug, Clone)]
pub struct ListingCard {
    pub listing: Listing,
    pub seller: SellerSummary,
    pub completed_orders: i64,
}

/// Everything shown on a listing detail page.
#[derive(Debug, Clone)]
pub struct ListingDetail {
    pub listing: Listing,
    pub game: Game,
    pub category: Category,
    pub seller: SellerSummary,
    pub seller_active_listings: i64,
    pub completed_orders: i64,
}

/// Outcome of the delete-or-deactivate policy applied to referenced records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Deleted,
    Deactivated,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(title: &str, description: &str) -> Listing {
        let now = Utc::now();
        Listing {
            id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            game_id: Uuid::nil(),
            category_id: Uuid::nil(),
            title: title.to_string(),
            price: 5.0,
            description: description.to_string(),
            delivery_type: DeliveryType::Instant,
            stock_type: StockType::Unlimited,
            quantity: None,
            images: Vec::new(),
            custom_fields: None,
            active: true,
            hidden: false,
            boosted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn filter() -> ListingFilter {
        ListingFilter {
            game_id: Uuid::nil(),
            category_id: Uuid::nil(),
            delivery_type: None,
            stock_type: None,
            search: None,
        }
    }

    #[test]
    fn role_round_trips_through_column_value() {
        for role in [Role::User, Role::Admin, Role::Moderator, Role::Support] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn open_order_statuses() {
        assert!(OrderStatus::Pending.is_open());
        assert!(OrderStatus::Paid.is_open());
        assert!(OrderStatus::Delivered.is_open());
        assert!(!OrderStatus::Completed.is_open());
        assert!(!OrderStatus::Cancelled.is_open());
    }

    #[test]
    fn filter_search_is_case_insensitive_over_title_and_description() {
        let mut by_title = filter();
        by_title.search = Some("GOLD".to_string());
        assert!(by_title.matches(&listing("1000 gold coins", "fast")));
        assert!(by_title.matches(&listing("coins", "pure Gold")));
        assert!(!by_title.matches(&listing("coins", "silver")));
    }

    #[test]
    fn filter_excludes_hidden_and_inactive() {
        let mut hidden = listing("a", "b");
        hidden.hidden = true;
        let mut inactive = listing("a", "b");
        inactive.active = false;
        assert!(!filter().matches(&hidden));
        assert!(!filter().matches(&inactive));
    }

    #[test]
    fn filter_applies_enum_equality() {
        let mut only_manual = filter();
        only_manual.delivery_type = Some(DeliveryType::Manual);
        assert!(!only_manual.matches(&listing("a", "b")));

        let mut only_unlimited = filter();
        only_unlimited.stock_type = Some(StockType::Unlimited);
        assert!(only_unlimited.matches(&listing("a", "b")));
    }

    #[test]
    fn sort_parses_known_values_only() {
        assert_eq!(ListingSort::parse("price_asc"), Some(ListingSort::PriceAsc));
        assert_eq!(ListingSort::parse("oldest"), Some(ListingSort::Oldest));
        assert_eq!(ListingSort::parse("cheapest"), None);
        assert_eq!(ListingSort::default(), ListingSort::Newest);
    }
}

//! Listing payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use super::query::Pagination;
use crate::{
    api::handlers::games::GameRef,
    store::{Category, DeliveryType, Listing, SellerSummary, StockType},
};

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<&Category> for CategoryRef {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithCommission {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub commission_rate: f64,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SellerResponse {
    pub id: Uuid,
    pub username: String,
    pub member_since: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_listings: Option<i64>,
}

impl SellerResponse {
    pub(crate) fn new(seller: SellerSummary, total_listings: Option<i64>) -> Self {
        Self {
            id: seller.id,
            username: seller.username,
            member_since: seller.member_since,
            total_listings,
        }
    }
}

/// One entry of a listing page.
#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListingCardResponse {
    pub id: Uuid,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub delivery_type: DeliveryType,
    pub stock_type: StockType,
    pub quantity: Option<i32>,
    pub images: Vec<String>,
    #[schema(value_type = Option<Object>)]
    pub custom_fields: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub seller: SellerResponse,
    pub completed_orders: i64,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ListingPage {
    pub success: bool,
    pub game: GameRef,
    pub category: CategoryRef,
    pub listings: Vec<ListingCardResponse>,
    pub pagination: Pagination,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListingDetailResponse {
    pub id: Uuid,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub delivery_type: DeliveryType,
    pub stock_type: StockType,
    pub quantity: Option<i32>,
    pub images: Vec<String>,
    #[schema(value_type = Option<Object>)]
    pub custom_fields: Option<Value>,
    pub boosted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub game: GameRef,
    pub category: CategoryWithCommission,
    pub seller: SellerResponse,
    pub completed_orders: i64,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ListingDetailEnvelope {
    pub success: bool,
    pub listing: ListingDetailResponse,
}

/// Listing as returned to its owner after a write.
#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    pub id: Uuid,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub delivery_type: DeliveryType,
    pub stock_type: StockType,
    pub quantity: Option<i32>,
    pub images: Vec<String>,
    #[schema(value_type = Option<Object>)]
    pub custom_fields: Option<Value>,
    pub active: bool,
    pub hidden: bool,
    pub created_at: DateTime<Utc>,
    pub game: GameRef,
    pub category: CategoryRef,
}

impl ListingResponse {
    pub(crate) fn new(listing: Listing, game: GameRef, category: CategoryRef) -> Self {
        Self {
            id: listing.id,
            title: listing.title,
            price: listing.price,
            description: listing.description,
            delivery_type: listing.delivery_type,
            stock_type: listing.stock_type,
            quantity: listing.quantity,
            images: listing.images,
            custom_fields: listing.custom_fields,
            active: listing.active,
            hidden: listing.hidden,
            created_at: listing.created_at,
            game,
            category,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ListingEnvelope {
    pub success: bool,
    pub listing: ListingResponse,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateListingRequest {
    pub game_id: Option<String>,
    pub category_id: Option<String>,
    pub title: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub delivery_type: Option<String>,
    pub stock_type: Option<String>,
    pub quantity: Option<f64>,
    pub images: Option<Vec<String>>,
    #[schema(value_type = Option<Object>)]
    pub custom_fields: Option<Value>,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateListingRequest {
    pub title: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub delivery_type: Option<String>,
    pub stock_type: Option<String>,
    pub quantity: Option<f64>,
    pub images: Option<Vec<String>>,
    #[schema(value_type = Option<Object>)]
    pub custom_fields: Option<Value>,
    pub active: Option<bool>,
    pub hidden: Option<bool>,
}

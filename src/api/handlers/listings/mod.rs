//! Listing catalog queries and seller-owned listing management.
//!
//! Reads are public and only ever see `active && !hidden` listings. Writes
//! require a bearer token; updates and deletes are restricted to the seller
//! that owns the listing, with the existence check running first so a
//! missing listing is `404` for everyone.

pub mod query;
pub mod types;


use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use self::{
    query::{ListingQuery, ListingsQuery, Pagination, DELIVERY_TYPES, STOCK_TYPES},
    types::{
        CategoryRef, CategoryWithCommission, CreateListingRequest, ListingCardResponse,
        ListingDetailEnvelope, ListingDetailResponse, ListingEnvelope, ListingPage,
        ListingResponse, SellerResponse, UpdateListingRequest,
    },
};
use super::{
    auth::{require_auth, AuthState, AuthUser},
    categories::CATEGORY_NOT_FOUND,
    games::{GameRef, GAME_NOT_FOUND},
    parse_id, validate, RemovalResponse, SharedStore,
};
use crate::{
    api::error::{ApiError, ErrorBody},
    store::{DeliveryType, Listing, ListingChanges, ListingFilter, NewListing, StockType},
};

pub const LISTING_NOT_FOUND: &str = "Listing not found";
pub const MAX_PRICE: f64 = 999_999.99;
pub const MIN_PRICE: f64 = 0.01;
pub const MAX_IMAGES: usize = 10;

/// Validated create payload; ids are resolved against the store afterwards.
pub(crate) struct ListingDraft {
    pub game_id: String,
    pub category_id: String,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub delivery_type: DeliveryType,
    pub stock_type: StockType,
    pub quantity: Option<i32>,
    pub images: Vec<String>,
    pub custom_fields: Option<Value>,
}

fn images(values: &[String], too_many: &str) -> Result<(), ApiError> {
    if values.len() > MAX_IMAGES {
        return validate::fail(too_many);
    }
    if values.iter().any(|url| !validate::is_url(url)) {
        return validate::fail("Invalid url");
    }
    Ok(())
}

fn delivery_type(value: &str) -> Result<DeliveryType, ApiError> {
    validate::one_of(value, &DELIVERY_TYPES, DeliveryType::parse)
}

fn stock_type(value: &str) -> Result<StockType, ApiError> {
    validate::one_of(value, &STOCK_TYPES, StockType::parse)
}

pub(crate) fn validate_new_listing(request: CreateListingRequest) -> Result<ListingDraft, ApiError> {
    let game_id = validate::required(request.game_id)?;
    if game_id.is_empty() {
        return validate::fail("Game ID is required");
    }
    let category_id = validate::required(request.category_id)?;
    if category_id.is_empty() {
        return validate::fail("Category ID is required");
    }
    let title = validate::required(request.title)?;
    validate::length(
        &title,
        1,
        200,
        "Title is required",
        "Title must be less than 200 characters",
    )?;
    let price = validate::required(request.price)?;
    if price < MIN_PRICE {
        return validate::fail("Price must be at least 0.01");
    }
    if price > MAX_PRICE {
        return validate::fail("Price too high");
    }
    validate::cents(price)?;
    let description = validate::required(request.description)?;
    validate::length(
        &description,
        1,
        5000,
        "Description is required",
        "Description too long",
    )?;
    let delivery_type = request
        .delivery_type
        .as_deref()
        .map(delivery_type)
        .transpose()?
        .unwrap_or_default();
    let stock_type = request
        .stock_type
        .as_deref()
        .map(stock_type)
        .transpose()?
        .unwrap_or_default();
    let quantity = request
        .quantity
        .map(validate::non_negative_int)
        .transpose()?;
    let image_urls = request.images.unwrap_or_default();
    images(&image_urls, "Maximum 10 images allowed")?;

    Ok(ListingDraft {
        game_id,
        category_id,
        title,
        price,
        description,
        delivery_type,
        stock_type,
        quantity,
        images: image_urls,
        custom_fields: request.custom_fields,
    })
}

pub(crate) fn validate_listing_changes(
    request: UpdateListingRequest,
) -> Result<ListingChanges, ApiError> {
    if let Some(title) = request.title.as_deref() {
        validate::length(
            title,
            1,
            200,
            "String must contain at least 1 character(s)",
            "String must contain at most 200 character(s)",
        )?;
    }
    if let Some(price) = request.price {
        validate::min_number(price, MIN_PRICE)?;
        validate::max_number(price, MAX_PRICE)?;
        validate::cents(price)?;
    }
    if let Some(description) = request.description.as_deref() {
        validate::length(
            description,
            1,
            5000,
            "String must contain at least 1 character(s)",
            "String must contain at most 5000 character(s)",
        )?;
    }
    let delivery_type = request
        .delivery_type
        .as_deref()
        .map(delivery_type)
        .transpose()?;
    let stock_type = request.stock_type.as_deref().map(stock_type).transpose()?;
    let quantity = request
        .quantity
        .map(validate::non_negative_int)
        .transpose()?;
    if let Some(urls) = request.images.as_deref() {
        images(urls, "Array must contain at most 10 element(s)")?;
    }

    Ok(ListingChanges {
        title: request.title,
        price: request.price,
        description: request.description,
        delivery_type,
        stock_type,
        quantity,
        images: request.images,
        custom_fields: request.custom_fields,
        active: request.active,
        hidden: request.hidden,
    })
}

/// Loads a listing for a seller-only write: `404` when absent, `403` for non-owners.
async fn owned_listing(
    store: &SharedStore,
    raw_id: &str,
    user: &AuthUser,
    forbidden: &'static str,
) -> Result<Listing, ApiError> {
    let id = parse_id(raw_id, LISTING_NOT_FOUND)?;
    let listing = store
        .listing_by_id(id)
        .await?
        .ok_or(ApiError::NotFound(LISTING_NOT_FOUND))?;
    if listing.seller_id != user.id() {
        debug!(listing_id = %id, user_id = %user.id(), "Listing write rejected: not the owner");
        return Err(ApiError::Forbidden(forbidden));
    }
    Ok(listing)
}

async fn listing_refs(
    store: &SharedStore,
    listing: &Listing,
) -> Result<(GameRef, CategoryRef), ApiError> {
    let (game, category) = tokio::try_join!(
        store.game_by_id(listing.game_id),
        store.category_by_id(listing.category_id)
    )?;
    match (game, category) {
        (Some(game), Some(category)) => Ok((GameRef::from(&game), CategoryRef::from(&category))),
        _ => Err(ApiError::internal(format!(
            "listing {} references a missing game or category",
            listing.id
        ))),
    }
}

#[utoipa::path(
    get,
    path = "/api/games/{slug}/{category_slug}/listings",
    params(
        ("slug" = String, Path, description = "Game slug"),
        ("category_slug" = String, Path, description = "Category slug"),
        ListingsQuery
    ),
    responses(
        (status = 200, description = "One page of visible listings", body = ListingPage),
        (status = 400, description = "Invalid query parameters", body = ErrorBody),
        (status = 404, description = "Game or category not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    ),
    tag = "listings"
)]
pub async fn list_listings(
    Path((slug, category_slug)): Path<(String, String)>,
    query: Result<Query<ListingsQuery>, QueryRejection>,
    store: Extension<SharedStore>,
) -> Result<impl IntoResponse, ApiError> {
    let raw = query.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
    let query = ListingQuery::parse(raw.0)?;

    let game = store
        .active_game_by_slug(&slug)
        .await?
        .ok_or(ApiError::NotFound(GAME_NOT_FOUND))?;
    let category = store
        .active_category_by_slug(game.id, &category_slug)
        .await?
        .ok_or(ApiError::NotFound(CATEGORY_NOT_FOUND))?;

    let filter = ListingFilter {
        game_id: game.id,
        category_id: category.id,
        delivery_type: query.delivery_type,
        stock_type: query.stock_type,
        search: query.search.clone(),
    };
    // Count and page share one filter value so the totals describe the page.
    let (total, cards) = tokio::try_join!(
        store.count_listings(&filter),
        store.listing_page(&filter, query.sort, query.page_request())
    )?;

    Ok(Json(ListingPage {
        success: true,
        game: GameRef::from(&game),
        category: CategoryRef::from(&category),
        listings: cards
            .into_iter()
            .map(|card| ListingCardResponse {
                id: card.listing.id,
                title: card.listing.title,
                price: card.listing.price,
                description: card.listing.description,
                delivery_type: card.listing.delivery_type,
                stock_type: card.listing.stock_type,
                quantity: card.listing.quantity,
                images: card.listing.images,
                custom_fields: card.listing.custom_fields,
                created_at: card.listing.created_at,
                seller: SellerResponse::new(card.seller, None),
                completed_orders: card.completed_orders,
            })
            .collect(),
        pagination: Pagination::new(query.page, query.limit, total),
    }))
}

#[utoipa::path(
    get,
    path = "/api/listings/{id}",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Visible listing with seller and category details", body = ListingDetailEnvelope),
        (status = 404, description = "Listing not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    ),
    tag = "listings"
)]
pub async fn get_listing(
    Path(id): Path<String>,
    store: Extension<SharedStore>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, LISTING_NOT_FOUND)?;
    let detail = store
        .listing_detail(id)
        .await?
        .ok_or(ApiError::NotFound(LISTING_NOT_FOUND))?;
    let listing = detail.listing;

    Ok(Json(ListingDetailEnvelope {
        success: true,
        listing: ListingDetailResponse {
            id: listing.id,
            title: listing.title,
            price: listing.price,
            description: listing.description,
            delivery_type: listing.delivery_type,
            stock_type: listing.stock_type,
            quantity: listing.quantity,
            images: listing.images,
            custom_fields: listing.custom_fields,
            boosted_at: listing.boosted_at,
            created_at: listing.created_at,
            game: GameRef::from(&detail.game),
            category: CategoryWithCommission {
                id: detail.category.id,
                name: detail.category.name,
                slug: detail.category.slug,
                commission_rate: detail.category.commission_rate,
            },
            seller: SellerResponse::new(detail.seller, Some(detail.seller_active_listings)),
            completed_orders: detail.completed_orders,
        },
    }))
}

#[utoipa::path(
    post,
    path = "/api/listings",
    request_body = CreateListingRequest,
    responses(
        (status = 201, description = "Listing created", body = ListingEnvelope),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "Game or category not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "listings"
)]
pub async fn create_listing(
    headers: HeaderMap,
    store: Extension<SharedStore>,
    auth: Extension<Arc<AuthState>>,
    payload: Result<Json<CreateListingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let seller = require_auth(&headers, &**store, &auth).await?;
    let draft = validate_new_listing(validate::body(payload)?)?;

    let game_id = parse_id(&draft.game_id, GAME_NOT_FOUND)?;
    let game = store
        .game_by_id(game_id)
        .await?
        .filter(|game| game.active)
        .ok_or(ApiError::NotFound(GAME_NOT_FOUND))?;
    let category_id = parse_id(&draft.category_id, CATEGORY_NOT_FOUND)?;
    let category = store
        .category_by_id(category_id)
        .await?
        .filter(|category| category.game_id == game.id && category.active)
        .ok_or(ApiError::NotFound(CATEGORY_NOT_FOUND))?;

    let listing = store
        .insert_listing(NewListing {
            seller_id: seller.id(),
            game_id: game.id,
            category_id: category.id,
            title: draft.title,
            price: draft.price,
            description: draft.description,
            delivery_type: draft.delivery_type,
            stock_type: draft.stock_type,
            quantity: draft.quantity,
            images: draft.images,
            custom_fields: draft.custom_fields,
        })
        .await?;
    info!(listing_id = %listing.id, seller_id = %seller.id(), "Listing created");

    Ok((
        StatusCode::CREATED,
        Json(ListingEnvelope {
            success: true,
            listing: ListingResponse::new(
                listing,
                GameRef::from(&game),
                CategoryRef::from(&category),
            ),
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/listings/{id}",
    params(("id" = Uuid, Path, description = "Listing id")),
    request_body = UpdateListingRequest,
    responses(
        (status = 200, description = "Listing updated", body = ListingEnvelope),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Not the listing owner", body = ErrorBody),
        (status = 404, description = "Listing not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "listings"
)]
pub async fn update_listing(
    Path(id): Path<String>,
    headers: HeaderMap,
    store: Extension<SharedStore>,
    auth: Extension<Arc<AuthState>>,
    payload: Result<Json<UpdateListingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let seller = require_auth(&headers, &**store, &auth).await?;
    let changes = validate_listing_changes(validate::body(payload)?)?;
    let listing =
        owned_listing(&store, &id, &seller, "You can only update your own listings").await?;

    let listing = store
        .update_listing(listing.id, changes)
        .await?
        .ok_or(ApiError::NotFound(LISTING_NOT_FOUND))?;
    let (game, category) = listing_refs(&store, &listing).await?;
    info!(listing_id = %listing.id, seller_id = %seller.id(), "Listing updated");

    Ok(Json(ListingEnvelope {
        success: true,
        listing: ListingResponse::new(listing, game, category),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/listings/{id}",
    params(("id" = Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing deleted, or deactivated when orders are still open", body = RemovalResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Not the listing owner", body = ErrorBody),
        (status = 404, description = "Listing not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "listings"
)]
pub async fn delete_listing(
    Path(id): Path<String>,
    headers: HeaderMap,
    store: Extension<SharedStore>,
    auth: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let seller = require_auth(&headers, &**store, &auth).await?;
    let listing =
        owned_listing(&store, &id, &seller, "You can only delete your own listings").await?;

    let removal = store
        .remove_listing(listing.id)
        .await?
        .ok_or(ApiError::NotFound(LISTING_NOT_FOUND))?;
    info!(listing_id = %listing.id, seller_id = %seller.id(), ?removal, "Listing removed");

    Ok(Json(RemovalResponse::new(
        removal,
        "Listing",
        "had pending orders",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateListingRequest {
        CreateListingRequest {
            game_id: Some(Uuid::new_v4().to_string()),
            category_id: Some(Uuid::new_v4().to_string()),
            title: Some("1000 gold".to_string()),
            price: Some(9.99),
            description: Some("Fast delivery".to_string()),
            ..CreateListingRequest::default()
        }
    }

    fn message(result: Result<impl std::fmt::Debug, ApiError>) -> String {
        match result {
            Err(ApiError::Validation(message)) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn create_defaults() {
        let draft = validate_new_listing(valid_request()).unwrap();
        assert_eq!(draft.delivery_type, DeliveryType::Manual);
        assert_eq!(draft.stock_type, StockType::Limited);
        assert!(draft.images.is_empty());
        assert_eq!(draft.quantity, None);
    }

    #[test]
    fn price_bounds() {
        let mut request = valid_request();
        request.price = Some(0.0);
        assert_eq!(
            message(validate_new_listing(request).map(|d| d.price)),
            "Price must be at least 0.01"
        );

        let mut request = valid_request();
        request.price = Some(1_000_000.0);
        assert_eq!(
            message(validate_new_listing(request).map(|d| d.price)),
            "Price too high"
        );

        let mut request = valid_request();
        request.price = Some(MAX_PRICE);
        assert!(validate_new_listing(request).is_ok());
    }

    #[test]
    fn image_rules() {
        let mut request = valid_request();
        request.images = Some(vec!["https://cdn.example.com/a.png".to_string(); 11]);
        assert_eq!(
            message(validate_new_listing(request).map(|d| d.price)),
            "Maximum 10 images allowed"
        );

        let mut request = valid_request();
        request.images = Some(vec!["not a url".to_string()]);
        assert_eq!(
            message(validate_new_listing(request).map(|d| d.price)),
            "Invalid url"
        );
    }

    #[test]
    fn empty_ids_have_named_messages() {
        let mut request = valid_request();
        request.game_id = Some(String::new());
        assert_eq!(
            message(validate_new_listing(request).map(|d| d.price)),
            "Game ID is required"
        );
    }

    #[test]
    fn update_checks_only_present_fields() {
        let changes = validate_listing_changes(UpdateListingRequest {
            hidden: Some(true),
            ..UpdateListingRequest::default()
        })
        .unwrap();
        assert_eq!(changes.hidden, Some(true));
        assert!(changes.title.is_none());

        let err = validate_listing_changes(UpdateListingRequest {
            quantity: Some(2.5),
            ..UpdateListingRequest::default()
        });
        assert_eq!(message(err.map(|c| c.quantity)), "Expected integer, received float");
    }
}

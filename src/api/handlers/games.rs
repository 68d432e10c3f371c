//! Public game catalog and game administration.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    auth::{require_catalog_admin, AuthState},
    parse_id, validate, RemovalResponse, SharedStore,
};
use crate::{
    api::error::{ApiError, ErrorBody},
    store::{Game, GameChanges, NewGame},
};

pub const GAME_NOT_FOUND: &str = "Game not found";
const GAME_SLUG_TAKEN: &str = "Game slug already exists";

/// Minimal game reference embedded in category and listing payloads.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct GameRef {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<&Game> for GameRef {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id,
            name: game.name.clone(),
            slug: game.slug.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GameListItem {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub platform_types: Vec<String>,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub categories_count: i64,
    pub listings_count: i64,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct GameList {
    pub success: bool,
    pub games: Vec<GameListItem>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GameCategory {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub commission_rate: f64,
    #[schema(value_type = Option<Object>)]
    pub fields_config: Option<Value>,
    pub listings_count: i64,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GameDetail {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub platform_types: Vec<String>,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub listings_count: i64,
    pub categories: Vec<GameCategory>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct GameDetailEnvelope {
    pub success: bool,
    pub game: GameDetail,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GameResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub platform_types: Vec<String>,
    pub order_index: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Game> for GameResponse {
    fn from(game: Game) -> Self {
        Self {
            id: game.id,
            name: game.name,
            slug: game.slug,
            image_url: game.image_url,
            platform_types: game.platform_types,
            order_index: game.order_index,
            active: game.active,
            created_at: game.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct GameEnvelope {
    pub success: bool,
    pub game: GameResponse,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateGameRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub image_url: Option<String>,
    pub platform_types: Option<Vec<String>>,
    pub order_index: Option<f64>,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateGameRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub image_url: Option<String>,
    pub platform_types: Option<Vec<String>>,
    pub order_index: Option<f64>,
    pub active: Option<bool>,
}

fn image_url(value: &str) -> Result<(), ApiError> {
    if validate::is_url(value) {
        Ok(())
    } else {
        validate::fail("Invalid image URL")
    }
}

fn platform_types(values: &[String]) -> Result<(), ApiError> {
    if values.is_empty() {
        validate::fail("At least one platform type is required")
    } else {
        Ok(())
    }
}

pub(crate) fn validate_new_game(request: CreateGameRequest) -> Result<NewGame, ApiError> {
    let name = validate::required(request.name)?;
    validate::name(&name, "Game")?;
    let slug = validate::required(request.slug)?;
    validate::slug(&slug, "Game")?;
    if let Some(url) = request.image_url.as_deref() {
        image_url(url)?;
    }
    let platforms = validate::required(request.platform_types)?;
    platform_types(&platforms)?;
    let order_index = request
        .order_index
        .map(validate::non_negative_int)
        .transpose()?
        .unwrap_or(0);

    Ok(NewGame {
        name,
        slug,
        image_url: request.image_url,
        platform_types: platforms,
        order_index,
    })
}

pub(crate) fn validate_game_changes(request: UpdateGameRequest) -> Result<GameChanges, ApiError> {
    if let Some(name) = request.name.as_deref() {
        validate::name(name, "Game")?;
    }
    if let Some(slug) = request.slug.as_deref() {
        validate::slug(slug, "Game")?;
    }
    if let Some(url) = request.image_url.as_deref() {
        image_url(url)?;
    }
    if let Some(platforms) = request.platform_types.as_deref() {
        platform_types(platforms)?;
    }
    let order_index = request
        .order_index
        .map(validate::non_negative_int)
        .transpose()?;

    Ok(GameChanges {
        name: request.name,
        slug: request.slug,
        image_url: request.image_url,
        platform_types: request.platform_types,
        order_index,
        active: request.active,
    })
}

#[utoipa::path(
    get,
    path = "/api/games",
    responses(
        (status = 200, description = "Active games in display order", body = GameList),
        (status = 500, description = "Internal server error", body = ErrorBody),
    ),
    tag = "games"
)]
pub async fn list_games(store: Extension<SharedStore>) -> Result<impl IntoResponse, ApiError> {
    let games = store.active_games().await?;
    Ok(Json(GameList {
        success: true,
        games: games
            .into_iter()
            .map(|summary| GameListItem {
                id: summary.game.id,
                name: summary.game.name,
                slug: summary.game.slug,
                image_url: summary.game.image_url,
                platform_types: summary.game.platform_types,
                order_index: summary.game.order_index,
                created_at: summary.game.created_at,
                categories_count: summary.categories_count,
                listings_count: summary.listings_count,
            })
            .collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/games/{slug}",
    params(("slug" = String, Path, description = "Game slug")),
    responses(
        (status = 200, description = "Game with its active categories", body = GameDetailEnvelope),
        (status = 404, description = "Game not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    ),
    tag = "games"
)]
pub async fn get_game(
    Path(slug): Path<String>,
    store: Extension<SharedStore>,
) -> Result<impl IntoResponse, ApiError> {
    let game = store
        .active_game_by_slug(&slug)
        .await?
        .ok_or(ApiError::NotFound(GAME_NOT_FOUND))?;
    let (listings_count, categories) = tokio::try_join!(
        store.game_listings_count(game.id),
        store.active_categories(game.id)
    )?;

    Ok(Json(GameDetailEnvelope {
        success: true,
        game: GameDetail {
            id: game.id,
            name: game.name,
            slug: game.slug,
            image_url: game.image_url,
            platform_types: game.platform_types,
            order_index: game.order_index,
            created_at: game.created_at,
            listings_count,
            categories: categories
                .into_iter()
                .map(|summary| GameCategory {
                    id: summary.category.id,
                    name: summary.category.name,
                    slug: summary.category.slug,
                    commission_rate: summary.category.commission_rate,
                    fields_config: summary.category.fields_config,
                    listings_count: summary.listings_count,
                })
                .collect(),
        },
    }))
}

#[utoipa::path(
    post,
    path = "/api/games/admin",
    request_body = CreateGameRequest,
    responses(
        (status = 201, description = "Game created", body = GameEnvelope),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Admin access required", body = ErrorBody),
        (status = 409, description = "Game slug already exists", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "games"
)]
pub async fn create_game(
    headers: HeaderMap,
    store: Extension<SharedStore>,
    auth: Extension<Arc<AuthState>>,
    payload: Result<Json<CreateGameRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = require_catalog_admin(&headers, &**store, &auth).await?;
    let new_game = validate_new_game(validate::body(payload)?)?;

    if store.active_game_by_slug(&new_game.slug).await?.is_some() {
        return Err(ApiError::Conflict(GAME_SLUG_TAKEN));
    }
    // Inactive games still hold their slug; the store's unique key catches those.
    let game = store.insert_game(new_game).await?;
    info!(game_id = %game.id, admin_id = %admin.id(), "Game created");

    Ok((
        StatusCode::CREATED,
        Json(GameEnvelope {
            success: true,
            game: game.into(),
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/games/admin/{id}",
    params(("id" = Uuid, Path, description = "Game id")),
    request_body = UpdateGameRequest,
    responses(
        (status = 200, description = "Game updated", body = GameEnvelope),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Admin access required", body = ErrorBody),
        (status = 404, description = "Game not found", body = ErrorBody),
        (status = 409, description = "Game slug already exists", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "games"
)]
pub async fn update_game(
    Path(id): Path<String>,
    headers: HeaderMap,
    store: Extension<SharedStore>,
    auth: Extension<Arc<AuthState>>,
    payload: Result<Json<UpdateGameRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = require_catalog_admin(&headers, &**store, &auth).await?;
    let changes = validate_game_changes(validate::body(payload)?)?;
    let id = parse_id(&id, GAME_NOT_FOUND)?;

    let game = store
        .update_game(id, changes)
        .await?
        .ok_or(ApiError::NotFound(GAME_NOT_FOUND))?;
    info!(game_id = %game.id, admin_id = %admin.id(), "Game updated");

    Ok(Json(GameEnvelope {
        success: true,
        game: game.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/games/admin/{id}",
    params(("id" = Uuid, Path, description = "Game id")),
    responses(
        (status = 200, description = "Game deleted, or deactivated when it still has active listings", body = RemovalResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Admin access required", body = ErrorBody),
        (status = 404, description = "Game not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "games"
)]
pub async fn delete_game(
    Path(id): Path<String>,
    headers: HeaderMap,
    store: Extension<SharedStore>,
    auth: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = require_catalog_admin(&headers, &**store, &auth).await?;
    let id = parse_id(&id, GAME_NOT_FOUND)?;

    let removal = store
        .remove_game(id)
        .await?
        .ok_or(ApiError::NotFound(GAME_NOT_FOUND))?;
    info!(game_id = %id, admin_id = %admin.id(), ?removal, "Game removed");

    Ok(Json(RemovalResponse::new(
        removal,
        "Game",
        "had active listings",
    )))
}

//! Category listing per game and category administration.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    auth::{require_catalog_admin, AuthState},
    games::{GameRef, GAME_NOT_FOUND},
    parse_id, validate, RemovalResponse, SharedStore,
};
use crate::{
    api::error::{ApiError, ErrorBody},
    store::{Category, CategoryChanges, Game, NewCategory, Removal},
};

pub const CATEGORY_NOT_FOUND: &str = "Category not found";
const DEFAULT_COMMISSION_RATE: f64 = 10.0;

#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CategoryListItem {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub commission_rate: f64,
    #[schema(value_type = Option<Object>)]
    pub fields_config: Option<Value>,
    pub active: bool,
    pub listings_count: i64,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct CategoryList {
    pub success: bool,
    pub game: GameRef,
    pub categories: Vec<CategoryListItem>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: Uuid,
    pub game_id: Uuid,
    pub name: String,
    pub slug: String,
    pub commission_rate: f64,
    #[schema(value_type = Option<Object>)]
    pub fields_config: Option<Value>,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<GameRef>,
}

impl CategoryResponse {
    fn new(category: Category, game: Option<&Game>) -> Self {
        Self {
            id: category.id,
            game_id: category.game_id,
            name: category.name,
            slug: category.slug,
            commission_rate: category.commission_rate,
            fields_config: category.fields_config,
            active: category.active,
            game: game.map(GameRef::from),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct CategoryEnvelope {
    pub success: bool,
    pub category: CategoryResponse,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct CategoryRemovalResponse {
    #[serde(flatten)]
    pub outcome: RemovalResponse,
    pub category: CategoryResponse,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub commission_rate: Option<f64>,
    #[schema(value_type = Option<Object>)]
    pub fields_config: Option<Value>,
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub commission_rate: Option<f64>,
    #[schema(value_type = Option<Object>)]
    pub fields_config: Option<Value>,
    pub active: Option<bool>,
}

fn commission_rate(value: f64) -> Result<f64, ApiError> {
    validate::min_number(value, 0.0)?;
    validate::max_number(value, 100.0)?;
    Ok(value)
}

pub(crate) struct CategoryDraft {
    pub name: String,
    pub slug: String,
    pub commission_rate: f64,
    pub fields_config: Option<Value>,
}

pub(crate) fn validate_new_category(
    request: CreateCategoryRequest,
) -> Result<CategoryDraft, ApiError> {
    let name = validate::required(request.name)?;
    validate::name(&name, "Category")?;
    let slug = validate::required(request.slug)?;
    validate::slug(&slug, "Category")?;
    let commission_rate = request
        .commission_rate
        .map(commission_rate)
        .transpose()?
        .unwrap_or(DEFAULT_COMMISSION_RATE);
    Ok(CategoryDraft {
        name,
        slug,
        commission_rate,
        fields_config: request.fields_config,
    })
}

pub(crate) fn validate_category_changes(
    request: UpdateCategoryRequest,
) -> Result<CategoryChanges, ApiError> {
    if let Some(name) = request.name.as_deref() {
        validate::name(name, "Category")?;
    }
    if let Some(slug) = request.slug.as_deref() {
        validate::slug(slug, "Category")?;
    }
    let commission_rate = request.commission_rate.map(commission_rate).transpose()?;
    Ok(CategoryChanges {
        name: request.name,
        slug: request.slug,
        commission_rate,
        fields_config: request.fields_config,
        active: request.active,
    })
}

#[utoipa::path(
    get,
    path = "/api/games/{slug}/categories",
    params(("slug" = String, Path, description = "Game slug")),
    responses(
        (status = 200, description = "Active categories of the game", body = CategoryList),
        (status = 404, description = "Game not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    ),
    tag = "categories"
)]
pub async fn list_categories(
    Path(slug): Path<String>,
    store: Extension<SharedStore>,
) -> Result<impl IntoResponse, ApiError> {
    let game = store
        .active_game_by_slug(&slug)
        .await?
        .ok_or(ApiError::NotFound(GAME_NOT_FOUND))?;
    let categories = store.active_categories(game.id).await?;

    Ok(Json(CategoryList {
        success: true,
        game: GameRef::from(&game),
        categories: categories
            .into_iter()
            .map(|summary| CategoryListItem {
                id: summary.category.id,
                name: summary.category.name,
                slug: summary.category.slug,
                commission_rate: summary.category.commission_rate,
                fields_config: summary.category.fields_config,
                active: summary.category.active,
                listings_count: summary.listings_count,
            })
            .collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/games/admin/{id}/categories",
    params(("id" = Uuid, Path, description = "Game id")),
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryEnvelope),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Admin access required", body = ErrorBody),
        (status = 404, description = "Game not found", body = ErrorBody),
        (status = 409, description = "Category slug already exists for this game", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "categories"
)]
pub async fn create_category(
    Path(game_id): Path<String>,
    headers: HeaderMap,
    store: Extension<SharedStore>,
    auth: Extension<Arc<AuthState>>,
    payload: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = require_catalog_admin(&headers, &**store, &auth).await?;
    let draft = validate_new_category(validate::body(payload)?)?;
    let game_id = parse_id(&game_id, GAME_NOT_FOUND)?;

    let game = store
        .game_by_id(game_id)
        .await?
        .ok_or(ApiError::NotFound(GAME_NOT_FOUND))?;
    let category = store
        .insert_category(NewCategory {
            game_id: game.id,
            name: draft.name,
            slug: draft.slug,
            commission_rate: draft.commission_rate,
            fields_config: draft.fields_config,
        })
        .await?;
    info!(category_id = %category.id, game_id = %game.id, admin_id = %admin.id(), "Category created");

    Ok((
        StatusCode::CREATED,
        Json(CategoryEnvelope {
            success: true,
            category: CategoryResponse::new(category, None),
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/categories/admin/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryEnvelope),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Admin access required", body = ErrorBody),
        (status = 404, description = "Category not found", body = ErrorBody),
        (status = 409, description = "Category slug already exists for this game", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "categories"
)]
pub async fn update_category(
    Path(id): Path<String>,
    headers: HeaderMap,
    store: Extension<SharedStore>,
    auth: Extension<Arc<AuthState>>,
    payload: Result<Json<UpdateCategoryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = require_catalog_admin(&headers, &**store, &auth).await?;
    let changes = validate_category_changes(validate::body(payload)?)?;
    let id = parse_id(&id, CATEGORY_NOT_FOUND)?;

    let category = store
        .update_category(id, changes)
        .await?
        .ok_or(ApiError::NotFound(CATEGORY_NOT_FOUND))?;
    let game = store.game_by_id(category.game_id).await?;
    info!(category_id = %category.id, admin_id = %admin.id(), "Category updated");

    Ok(Json(CategoryEnvelope {
        success: true,
        category: CategoryResponse::new(category, game.as_ref()),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/categories/admin/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deleted, or deactivated when it still has active listings", body = CategoryRemovalResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Admin access required", body = ErrorBody),
        (status = 404, description = "Category not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "categories"
)]
pub async fn delete_category(
    Path(id): Path<String>,
    headers: HeaderMap,
    store: Extension<SharedStore>,
    auth: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = require_catalog_admin(&headers, &**store, &auth).await?;
    let id = parse_id(&id, CATEGORY_NOT_FOUND)?;

    let mut category = store
        .category_by_id(id)
        .await?
        .ok_or(ApiError::NotFound(CATEGORY_NOT_FOUND))?;
    let game = store.game_by_id(category.game_id).await?;
    let removal = store
        .remove_category(id)
        .await?
        .ok_or(ApiError::NotFound(CATEGORY_NOT_FOUND))?;
    if removal == Removal::Deactivated {
        category.active = false;
    }
    info!(category_id = %id, admin_id = %admin.id(), ?removal, "Category removed");

    Ok(Json(CategoryRemovalResponse {
        outcome: RemovalResponse::new(removal, "Category", "had active listings"),
        category: CategoryResponse::new(category, game.as_ref()),
    }))
}

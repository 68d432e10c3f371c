//! Postgres implementation of [`MarketStore`].

use async_trait::async_trait;
use sqlx::{
    postgres::{PgPool, PgRow},
    Postgres, QueryBuilder, Row,
};
use tracing::{debug, info_span, Instrument, Span};
use uuid::Uuid;

use super::{
    Category, CategoryChanges, CategorySummary, DeliveryType, Game, GameChanges, GameSummary,
    Listing, ListingCard, ListingChanges, ListingDetail, ListingFilter, ListingSort, MarketStore,
    NewCategory, NewGame, NewListing, NewOrder, NewUser, Order, OrderStatus, PageRequest, Removal,
    Role, SellerSummary, StockType, StoreError, StoreResult, UniqueKey, User,
};

pub const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

const USER_COLUMNS: &str = "id, username, email, password_hash, role, verified, \
     balance::float8 AS balance, created_at, updated_at";

const GAME_COLUMNS: &str =
    "id, name, slug, image_url, platform_types, order_index, active, created_at, updated_at";

const CATEGORY_COLUMNS: &str = "id, game_id, name, slug, commission_rate::float8 AS commission_rate, \
     fields_config, active, created_at, updated_at";

const LISTING_COLUMNS: &str = "l.id, l.seller_id, l.game_id, l.category_id, l.title, \
     l.price::float8 AS price, l.description, l.delivery_type, l.stock_type, l.quantity, \
     l.images, l.custom_fields, l.active, l.hidden, l.boosted_at, l.created_at, l.updated_at";

const COMPLETED_ORDERS: &str = "(SELECT COUNT(*) FROM orders o \
     WHERE o.listing_id = l.id AND o.status = 'COMPLETED') AS completed_orders";

fn query_span(operation: &str, statement: &str) -> Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies `sql/schema.sql` one statement at a time.
    ///
    /// # Errors
    /// Returns the first statement failure.
    pub async fn migrate(&self) -> StoreResult<()> {
        for (index, statement) in split_sql_statements(SCHEMA_SQL).iter().enumerate() {
            debug!("applying schema statement {}", index + 1);
            sqlx::query(statement)
                .execute(&self.pool)
                .instrument(query_span("DDL", statement))
                .await?;
        }
        Ok(())
    }

    async fn fetch_user(&self, column: &str, value: &str) -> StoreResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }
}

/// Splits a schema file into executable statements, skipping psql `\ir` includes.
pub(crate) fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with(r"\ir ") || trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

fn unique_key(err: &sqlx::Error) -> Option<UniqueKey> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    if db_err.code().as_deref() != Some("23505") {
        return None;
    }
    match db_err.constraint() {
        Some("users_email_key") => Some(UniqueKey::Email),
        Some("users_username_key") => Some(UniqueKey::Username),
        Some("games_slug_key") => Some(UniqueKey::GameSlug),
        Some("categories_game_slug_key") => Some(UniqueKey::CategorySlug),
        _ => None,
    }
}

fn map_write_error(err: sqlx::Error) -> StoreError {
    match unique_key(&err) {
        Some(key) => StoreError::Duplicate(key),
        None => StoreError::Database(err),
    }
}

fn parse_column<T>(row: &PgRow, column: &str, parse: fn(&str) -> Option<T>) -> StoreResult<T> {
    let raw: String = row.try_get(column)?;
    parse(&raw).ok_or_else(|| StoreError::Corrupt(format!("unexpected {column} value {raw:?}")))
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: parse_column(row, "role", Role::parse)?,
        verified: row.try_get("verified")?,
        balance: row.try_get("balance")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn game_from_row(row: &PgRow) -> StoreResult<Game> {
    Ok(Game {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        image_url: row.try_get("image_url")?,
        platform_types: row.try_get("platform_types")?,
        order_index: row.try_get("order_index")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn category_from_row(row: &PgRow) -> StoreResult<Category> {
    Ok(Category {
        id: row.try_get("id")?,
        game_id: row.try_get("game_id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        commission_rate: row.try_get("commission_rate")?,
        fields_config: row.try_get("fields_config")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn listing_from_row(row: &PgRow) -> StoreResult<Listing> {
    Ok(Listing {
        id: row.try_get("id")?,
        seller_id: row.try_get("seller_id")?,
        game_id: row.try_get("game_id")?,
        category_id: row.try_get("category_id")?,
        title: row.try_get("title")?,
        price: row.try_get("price")?,
        description: row.try_get("description")?,
        delivery_type: parse_column(row, "delivery_type", DeliveryType::parse)?,
        stock_type: parse_column(row, "stock_type", StockType::parse)?,
        quantity: row.try_get("quantity")?,
        images: row.try_get("images")?,
        custom_fields: row.try_get("custom_fields")?,
        active: row.try_get("active")?,
        hidden: row.try_get("hidden")?,
        boosted_at: row.try_get("boosted_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn seller_from_row(row: &PgRow) -> StoreResult<SellerSummary> {
    Ok(SellerSummary {
        id: row.try_get("seller_id")?,
        username: row.try_get("seller_username")?,
        member_since: row.try_get("seller_created_at")?,
    })
}

/// Escapes `LIKE` metacharacters so the search term matches literally.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn push_listing_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ListingFilter) {
    builder.push(" WHERE l.active = TRUE AND l.hidden = FALSE AND l.game_id = ");
    builder.push_bind(filter.game_id);
    builder.push(" AND l.category_id = ");
    builder.push_bind(filter.category_id);
    if let Some(delivery_type) = filter.delivery_type {
        builder.push(" AND l.delivery_type = ");
        builder.push_bind(delivery_type.as_str());
    }
    if let Some(stock_type) = filter.stock_type {
        builder.push(" AND l.stock_type = ");
        builder.push_bind(stock_type.as_str());
    }
    if let Some(search) = filter.search.as_deref() {
        let pattern = like_pattern(search);
        builder.push(" AND (l.title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR l.description ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

const fn order_clause(sort: ListingSort) -> &'static str {
    match sort {
        ListingSort::PriceAsc => " ORDER BY l.price ASC, l.created_at DESC, l.seq DESC",
        ListingSort::PriceDesc => " ORDER BY l.price DESC, l.created_at DESC, l.seq DESC",
        ListingSort::Newest => " ORDER BY l.created_at DESC, l.seq DESC",
        ListingSort::Oldest => " ORDER BY l.created_at ASC, l.seq ASC",
    }
}

#[async_trait]
impl MarketStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        let query = "SELECT 1";
        sqlx::query(query)
            .execute(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?;
        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.fetch_user("email", email).await
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.fetch_user("username", username).await
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let query = format!(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", &query))
            .await
            .map_err(map_write_error)?;
        user_from_row(&row)
    }

    async fn active_games(&self) -> StoreResult<Vec<GameSummary>> {
        let query = format!(
            "SELECT {GAME_COLUMNS}, \
             (SELECT COUNT(*) FROM categories c WHERE c.game_id = g.id AND c.active) AS categories_count, \
             (SELECT COUNT(*) FROM listings l WHERE l.game_id = g.id AND l.active) AS listings_count \
             FROM games g WHERE g.active = TRUE ORDER BY g.order_index ASC, g.name ASC"
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await?;
        rows.iter()
            .map(|row| {
                Ok(GameSummary {
                    game: game_from_row(row)?,
                    categories_count: row.try_get("categories_count")?,
                    listings_count: row.try_get("listings_count")?,
                })
            })
            .collect()
    }

    async fn game_by_id(&self, id: Uuid) -> StoreResult<Option<Game>> {
        let query = format!("SELECT {GAME_COLUMNS} FROM games WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await?;
        row.as_ref().map(game_from_row).transpose()
    }

    async fn active_game_by_slug(&self, slug: &str) -> StoreResult<Option<Game>> {
        let query = format!("SELECT {GAME_COLUMNS} FROM games WHERE slug = $1 AND active = TRUE");
        let row = sqlx::query(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await?;
        row.as_ref().map(game_from_row).transpose()
    }

    async fn game_listings_count(&self, game_id: Uuid) -> StoreResult<i64> {
        let query = "SELECT COUNT(*) FROM listings WHERE game_id = $1 AND active = TRUE";
        let count: i64 = sqlx::query_scalar(query)
            .bind(game_id)
            .fetch_one(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?;
        Ok(count)
    }

    async fn insert_game(&self, game: NewGame) -> StoreResult<Game> {
        let query = format!(
            "INSERT INTO games (name, slug, image_url, platform_types, order_index) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {GAME_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(&game.name)
            .bind(&game.slug)
            .bind(&game.image_url)
            .bind(&game.platform_types)
            .bind(game.order_index)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", &query))
            .await
            .map_err(map_write_error)?;
        game_from_row(&row)
    }

    async fn update_game(&self, id: Uuid, changes: GameChanges) -> StoreResult<Option<Game>> {
        let query = format!(
            "UPDATE games SET \
             name = COALESCE($2, name), \
             slug = COALESCE($3, slug), \
             image_url = COALESCE($4, image_url), \
             platform_types = COALESCE($5, platform_types), \
             order_index = COALESCE($6, order_index), \
             active = COALESCE($7, active), \
             updated_at = NOW() \
             WHERE id = $1 RETURNING {GAME_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(changes.name)
            .bind(changes.slug)
            .bind(changes.image_url)
            .bind(changes.platform_types)
            .bind(changes.order_index)
            .bind(changes.active)
            .fetch_optional(&self.pool)
            .instrument(query_span("UPDATE", &query))
            .await
            .map_err(map_write_error)?;
        row.as_ref().map(game_from_row).transpose()
    }

    async fn remove_game(&self, id: Uuid) -> StoreResult<Option<Removal>> {
        let mut tx = self.pool.begin().await?;
        let exists = sqlx::query("SELECT id FROM games WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .instrument(query_span("SELECT", "SELECT id FROM games WHERE id = $1 FOR UPDATE"))
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let active_query = "SELECT COUNT(*) FROM listings WHERE game_id = $1 AND active = TRUE";
        let active: i64 = sqlx::query_scalar(active_query)
            .bind(id)
            .fetch_one(&mut *tx)
            .instrument(query_span("SELECT", active_query))
            .await?;

        let (statement, removal) = if active > 0 {
            (
                "UPDATE games SET active = FALSE, updated_at = NOW() WHERE id = $1",
                Removal::Deactivated,
            )
        } else {
            ("DELETE FROM games WHERE id = $1", Removal::Deleted)
        };
        sqlx::query(statement)
            .bind(id)
            .execute(&mut *tx)
            .instrument(query_span(
                if removal == Removal::Deleted { "DELETE" } else { "UPDATE" },
                statement,
            ))
            .await?;
        tx.commit().await?;
        Ok(Some(removal))
    }

    async fn active_categories(&self, game_id: Uuid) -> StoreResult<Vec<CategorySummary>> {
        let query = format!(
            "SELECT {CATEGORY_COLUMNS}, \
             (SELECT COUNT(*) FROM listings l WHERE l.category_id = categories.id AND l.active) \
             AS listings_count \
             FROM categories WHERE game_id = $1 AND active = TRUE ORDER BY name ASC"
        );
        let rows = sqlx::query(&query)
            .bind(game_id)
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await?;
        rows.iter()
            .map(|row| {
                Ok(CategorySummary {
                    category: category_from_row(row)?,
                    listings_count: row.try_get("listings_count")?,
                })
            })
            .collect()
    }

    async fn category_by_id(&self, id: Uuid) -> StoreResult<Option<Category>> {
        let query = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn active_category_by_slug(
        &self,
        game_id: Uuid,
        slug: &str,
    ) -> StoreResult<Option<Category>> {
        let query = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories \
             WHERE game_id = $1 AND slug = $2 AND active = TRUE"
        );
        let row = sqlx::query(&query)
            .bind(game_id)
            .bind(slug)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn insert_category(&self, category: NewCategory) -> StoreResult<Category> {
        let query = format!(
            "INSERT INTO categories (game_id, name, slug, commission_rate, fields_config) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {CATEGORY_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(category.game_id)
            .bind(&category.name)
            .bind(&category.slug)
            .bind(category.commission_rate)
            .bind(&category.fields_config)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", &query))
            .await
            .map_err(map_write_error)?;
        category_from_row(&row)
    }

    async fn update_category(
        &self,
        id: Uuid,
        changes: CategoryChanges,
    ) -> StoreResult<Option<Category>> {
        let query = format!(
            "UPDATE categories SET \
             name = COALESCE($2, name), \
             slug = COALESCE($3, slug), \
             commission_rate = COALESCE($4, commission_rate), \
             fields_config = COALESCE($5, fields_config), \
             active = COALESCE($6, active), \
             updated_at = NOW() \
             WHERE id = $1 RETURNING {CATEGORY_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(changes.name)
            .bind(changes.slug)
            .bind(changes.commission_rate)
            .bind(changes.fields_config)
            .bind(changes.active)
            .fetch_optional(&self.pool)
            .instrument(query_span("UPDATE", &query))
            .await
            .map_err(map_write_error)?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn remove_category(&self, id: Uuid) -> StoreResult<Option<Removal>> {
        let mut tx = self.pool.begin().await?;
        let lock = "SELECT id FROM categories WHERE id = $1 FOR UPDATE";
        let exists = sqlx::query(lock)
            .bind(id)
            .fetch_optional(&mut *tx)
            .instrument(query_span("SELECT", lock))
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let active_query = "SELECT COUNT(*) FROM listings WHERE category_id = $1 AND active = TRUE";
        let active: i64 = sqlx::query_scalar(active_query)
            .bind(id)
            .fetch_one(&mut *tx)
            .instrument(query_span("SELECT", active_query))
            .await?;

        let (statement, operation, removal) = if active > 0 {
            (
                "UPDATE categories SET active = FALSE, updated_at = NOW() WHERE id = $1",
                "UPDATE",
                Removal::Deactivated,
            )
        } else {
            ("DELETE FROM categories WHERE id = $1", "DELETE", Removal::Deleted)
        };
        sqlx::query(statement)
            .bind(id)
            .execute(&mut *tx)
            .instrument(query_span(operation, statement))
            .await?;
        tx.commit().await?;
        Ok(Some(removal))
    }

    async fn count_listings(&self, filter: &ListingFilter) -> StoreResult<i64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM listings l");
        push_listing_filter(&mut builder, filter);
        let span = query_span("SELECT", builder.sql());
        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .instrument(span)
            .await?;
        Ok(count)
    }

    async fn listing_page(
        &self,
        filter: &ListingFilter,
        sort: ListingSort,
        page: PageRequest,
    ) -> StoreResult<Vec<ListingCard>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {LISTING_COLUMNS}, u.username AS seller_username, \
             u.created_at AS seller_created_at, {COMPLETED_ORDERS} \
             FROM listings l JOIN users u ON u.id = l.seller_id"
        ));
        push_listing_filter(&mut builder, filter);
        builder.push(order_clause(sort));
        builder.push(" LIMIT ");
        builder.push_bind(page.take);
        builder.push(" OFFSET ");
        builder.push_bind(page.skip);

        let span = query_span("SELECT", builder.sql());
        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .instrument(span)
            .await?;
        rows.iter()
            .map(|row| {
                Ok(ListingCard {
                    listing: listing_from_row(row)?,
                    seller: seller_from_row(row)?,
                    completed_orders: row.try_get("completed_orders")?,
                })
            })
            .collect()
    }

    async fn listing_by_id(&self, id: Uuid) -> StoreResult<Option<Listing>> {
        let query = format!("SELECT {LISTING_COLUMNS} FROM listings l WHERE l.id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await?;
        row.as_ref().map(listing_from_row).transpose()
    }

    async fn listing_detail(&self, id: Uuid) -> StoreResult<Option<ListingDetail>> {
        let query = format!(
            "SELECT {LISTING_COLUMNS}, u.username AS seller_username, \
             u.created_at AS seller_created_at, {COMPLETED_ORDERS}, \
             (SELECT COUNT(*) FROM listings s WHERE s.seller_id = l.seller_id AND s.active) \
             AS seller_active_listings \
             FROM listings l JOIN users u ON u.id = l.seller_id \
             WHERE l.id = $1 AND l.active = TRUE AND l.hidden = FALSE"
        );
        let Some(row) = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await?
        else {
            return Ok(None);
        };
        let listing = listing_from_row(&row)?;

        let (game, category) = tokio::try_join!(
            self.game_by_id(listing.game_id),
            self.category_by_id(listing.category_id)
        )?;
        let game =
            game.ok_or_else(|| StoreError::Corrupt(format!("listing {id} has no game")))?;
        let category = category
            .ok_or_else(|| StoreError::Corrupt(format!("listing {id} has no category")))?;

        Ok(Some(ListingDetail {
            seller: seller_from_row(&row)?,
            seller_active_listings: row.try_get("seller_active_listings")?,
            completed_orders: row.try_get("completed_orders")?,
            listing,
            game,
            category,
        }))
    }

    async fn insert_listing(&self, listing: NewListing) -> StoreResult<Listing> {
        let query = format!(
            "WITH l AS (INSERT INTO listings (seller_id, game_id, category_id, title, price, \
             description, delivery_type, stock_type, quantity, images, custom_fields) \
             VALUES ($1, $2, $3, $4, $5::numeric, $6, $7, $8, $9, $10, $11) RETURNING *) \
             SELECT {LISTING_COLUMNS} FROM l"
        );
        let row = sqlx::query(&query)
            .bind(listing.seller_id)
            .bind(listing.game_id)
            .bind(listing.category_id)
            .bind(&listing.title)
            .bind(listing.price)
            .bind(&listing.description)
            .bind(listing.delivery_type.as_str())
            .bind(listing.stock_type.as_str())
            .bind(listing.quantity)
            .bind(&listing.images)
            .bind(&listing.custom_fields)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", &query))
            .await
            .map_err(map_write_error)?;
        listing_from_row(&row)
    }

    async fn update_listing(
        &self,
        id: Uuid,
        changes: ListingChanges,
    ) -> StoreResult<Option<Listing>> {
        let query = format!(
            "WITH l AS (UPDATE listings SET \
             title = COALESCE($2, title), \
             price = COALESCE($3::numeric, price), \
             description = COALESCE($4, description), \
             delivery_type = COALESCE($5, delivery_type), \
             stock_type = COALESCE($6, stock_type), \
             quantity = COALESCE($7, quantity), \
             images = COALESCE($8, images), \
             custom_fields = COALESCE($9, custom_fields), \
             active = COALESCE($10, active), \
             hidden = COALESCE($11, hidden), \
             updated_at = NOW() \
             WHERE id = $1 RETURNING *) \
             SELECT {LISTING_COLUMNS} FROM l"
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(changes.title)
            .bind(changes.price)
            .bind(changes.description)
            .bind(changes.delivery_type.map(DeliveryType::as_str))
            .bind(changes.stock_type.map(StockType::as_str))
            .bind(changes.quantity)
            .bind(changes.images)
            .bind(changes.custom_fields)
            .bind(changes.active)
            .bind(changes.hidden)
            .fetch_optional(&self.pool)
            .instrument(query_span("UPDATE", &query))
            .await?;
        row.as_ref().map(listing_from_row).transpose()
    }

    async fn remove_listing(&self, id: Uuid) -> StoreResult<Option<Removal>> {
        let mut tx = self.pool.begin().await?;
        let lock = "SELECT id FROM listings WHERE id = $1 FOR UPDATE";
        let exists = sqlx::query(lock)
            .bind(id)
            .fetch_optional(&mut *tx)
            .instrument(query_span("SELECT", lock))
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let open_query = "SELECT COUNT(*) FROM orders WHERE listing_id = $1 AND status = ANY($2)";
        let open_statuses: Vec<&str> = OrderStatus::OPEN.iter().map(|s| s.as_str()).collect();
        let open: i64 = sqlx::query_scalar(open_query)
            .bind(id)
            .bind(&open_statuses)
            .fetch_one(&mut *tx)
            .instrument(query_span("SELECT", open_query))
            .await?;

        let (statement, operation, removal) = if open > 0 {
            (
                "UPDATE listings SET active = FALSE, updated_at = NOW() WHERE id = $1",
                "UPDATE",
                Removal::Deactivated,
            )
        } else {
            ("DELETE FROM listings WHERE id = $1", "DELETE", Removal::Deleted)
        };
        sqlx::query(statement)
            .bind(id)
            .execute(&mut *tx)
            .instrument(query_span(operation, statement))
            .await?;
        tx.commit().await?;
        Ok(Some(removal))
    }

    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order> {
        let query = "INSERT INTO orders (listing_id, buyer_id, status) VALUES ($1, $2, $3) \
                     RETURNING id, listing_id, buyer_id, status, created_at";
        let row = sqlx::query(query)
            .bind(order.listing_id)
            .bind(order.buyer_id)
            .bind(order.status.as_str())
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", query))
            .await?;
        Ok(Order {
            id: row.try_get("id")?,
            listing_id: row.try_get("listing_id")?,
            buyer_id: row.try_get("buyer_id")?,
            status: order.status,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_splits_into_statements() {
        let statements = split_sql_statements(SCHEMA_SQL);
        assert!(statements.iter().any(|s| s.starts_with("CREATE TABLE IF NOT EXISTS users")));
        assert!(statements.iter().any(|s| s.starts_with("CREATE TABLE IF NOT EXISTS orders")));
        assert!(statements.iter().all(|s| s.ends_with(';')));
        assert!(statements.iter().all(|s| !s.starts_with("--")));
    }

    #[test]
    fn split_keeps_multiline_statements_together() {
        let sql = "-- header\nCREATE TABLE a (\n  id INT\n);\n\\ir other.sql\nSELECT 1;\nSELECT 2";
        let statements = split_sql_statements(sql);
        assert_eq!(
            statements,
            vec![
                "CREATE TABLE a (\n  id INT\n);".to_string(),
                "SELECT 1;".to_string(),
                "SELECT 2".to_string(),
            ]
        );
    }

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("gold"), "%gold%");
        assert_eq!(like_pattern("100%_off"), r"%100\%\_off%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }

    #[test]
    fn order_clause_matches_sort() {
        assert_eq!(
            order_clause(ListingSort::Newest),
            " ORDER BY l.created_at DESC, l.seq DESC"
        );
        assert!(order_clause(ListingSort::PriceDesc).starts_with(" ORDER BY l.price DESC"));
    }

    #[test]
    fn every_order_ends_on_the_insertion_sequence() {
        for sort in [
            ListingSort::PriceAsc,
            ListingSort::PriceDesc,
            ListingSort::Newest,
            ListingSort::Oldest,
        ] {
            let clause = order_clause(sort);
            assert!(
                clause.ends_with(", l.seq DESC") || clause.ends_with(", l.seq ASC"),
                "{clause}"
            );
        }
        assert!(SCHEMA_SQL.contains("ADD COLUMN IF NOT EXISTS seq BIGINT GENERATED ALWAYS AS IDENTITY"));
    }
}

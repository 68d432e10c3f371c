//! In-process [`MarketStore`] with the same uniqueness, visibility and
//! cascade rules as the Postgres schema.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Category, CategoryChanges, CategorySummary, Game, GameChanges, GameSummary, Listing,
    ListingCard, ListingChanges, ListingDetail, ListingFilter, ListingSort, MarketStore,
    NewCategory, NewGame, NewListing, NewOrder, NewUser, Order, OrderStatus, PageRequest, Removal,
    Role, SellerSummary, StoreError, StoreResult, UniqueKey, User,
};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    games: Vec<Game>,
    categories: Vec<Category>,
    listings: Vec<Listing>,
    orders: Vec<Order>,
}

impl Tables {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    fn seller(&self, id: Uuid) -> StoreResult<SellerSummary> {
        let user = self
            .user(id)
            .ok_or_else(|| StoreError::Corrupt(format!("listing seller {id} is missing")))?;
        Ok(SellerSummary {
            id: user.id,
            username: user.username.clone(),
            member_since: user.created_at,
        })
    }

    fn completed_orders(&self, listing_id: Uuid) -> i64 {
        count(
            self.orders.iter().filter(|order| {
                order.listing_id == Some(listing_id) && order.status == OrderStatus::Completed
            }),
        )
    }

    fn active_listings_where(&self, predicate: impl Fn(&Listing) -> bool) -> i64 {
        count(
            self.listings
                .iter()
                .filter(|listing| listing.active && predicate(listing)),
        )
    }

    /// Drops listings matching `predicate` and detaches their orders.
    fn delete_listings_where(&mut self, predicate: impl Fn(&Listing) -> bool) {
        let doomed: Vec<Uuid> = self
            .listings
            .iter()
            .filter(|listing| predicate(listing))
            .map(|listing| listing.id)
            .collect();
        self.listings.retain(|listing| !doomed.contains(&listing.id));
        for order in &mut self.orders {
            if order.listing_id.is_some_and(|id| doomed.contains(&id)) {
                order.listing_id = None;
            }
        }
    }
}

fn count<T>(items: impl Iterator<Item = T>) -> i64 {
    i64::try_from(items.count()).unwrap_or(i64::MAX)
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Changes a user's role; returns `false` when the user does not exist.
    pub async fn set_role(&self, user_id: Uuid, role: Role) -> bool {
        let mut tables = self.tables.write().await;
        match tables.users.iter_mut().find(|user| user.id == user_id) {
            Some(user) => {
                user.role = role;
                user.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Removes a user row outright; returns `false` when nothing was removed.
    pub async fn delete_user(&self, user_id: Uuid) -> bool {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|user| user.id != user_id);
        tables.users.len() != before
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.user(id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|user| user.email == email).cloned())
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|row| row.email == user.email) {
            return Err(StoreError::Duplicate(UniqueKey::Email));
        }
        if tables.users.iter().any(|row| row.username == user.username) {
            return Err(StoreError::Duplicate(UniqueKey::Username));
        }
        let now = Utc::now();
        let row = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: Role::User,
            verified: false,
            balance: 0.0,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(row.clone());
        Ok(row)
    }

    async fn active_games(&self) -> StoreResult<Vec<GameSummary>> {
        let tables = self.tables.read().await;
        let mut games: Vec<&Game> = tables.games.iter().filter(|game| game.active).collect();
        games.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(games
            .into_iter()
            .map(|game| GameSummary {
                categories_count: count(
                    tables
                        .categories
                        .iter()
                        .filter(|category| category.game_id == game.id && category.active),
                ),
                listings_count: tables.active_listings_where(|listing| listing.game_id == game.id),
                game: game.clone(),
            })
            .collect())
    }

    async fn game_by_id(&self, id: Uuid) -> StoreResult<Option<Game>> {
        let tables = self.tables.read().await;
        Ok(tables.games.iter().find(|game| game.id == id).cloned())
    }

    async fn active_game_by_slug(&self, slug: &str) -> StoreResult<Option<Game>> {
        let tables = self.tables.read().await;
        Ok(tables
            .games
            .iter()
            .find(|game| game.slug == slug && game.active)
            .cloned())
    }

    async fn game_listings_count(&self, game_id: Uuid) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables.active_listings_where(|listing| listing.game_id == game_id))
    }

    async fn insert_game(&self, game: NewGame) -> StoreResult<Game> {
        let mut tables = self.tables.write().await;
        if tables.games.iter().any(|row| row.slug == game.slug) {
            return Err(StoreError::Duplicate(UniqueKey::GameSlug));
        }
        let now = Utc::now();
        let row = Game {
            id: Uuid::new_v4(),
            name: game.name,
            slug: game.slug,
            image_url: game.image_url,
            platform_types: game.platform_types,
            order_index: game.order_index,
            active: true,
            created_at: now,
            updated_at: now,
        };
        tables.games.push(row.clone());
        Ok(row)
    }

    async fn update_game(&self, id: Uuid, changes: GameChanges) -> StoreResult<Option<Game>> {
        let mut tables = self.tables.write().await;
        if !tables.games.iter().any(|game| game.id == id) {
            return Ok(None);
        }
        if let Some(slug) = changes.slug.as_deref() {
            if tables.games.iter().any(|row| row.slug == slug && row.id != id) {
                return Err(StoreError::Duplicate(UniqueKey::GameSlug));
            }
        }
        let Some(game) = tables.games.iter_mut().find(|game| game.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            game.name = name;
        }
        if let Some(slug) = changes.slug {
            game.slug = slug;
        }
        if let Some(image_url) = changes.image_url {
            game.image_url = Some(image_url);
        }
        if let Some(platform_types) = changes.platform_types {
            game.platform_types = platform_types;
        }
        if let Some(order_index) = changes.order_index {
            game.order_index = order_index;
        }
        if let Some(active) = changes.active {
            game.active = active;
        }
        game.updated_at = Utc::now();
        Ok(Some(game.clone()))
    }

    async fn remove_game(&self, id: Uuid) -> StoreResult<Option<Removal>> {
        let mut tables = self.tables.write().await;
        if !tables.games.iter().any(|game| game.id == id) {
            return Ok(None);
        }
        if tables.active_listings_where(|listing| listing.game_id == id) > 0 {
            if let Some(game) = tables.games.iter_mut().find(|game| game.id == id) {
                game.active = false;
                game.updated_at = Utc::now();
            }
            return Ok(Some(Removal::Deactivated));
        }
        tables.delete_listings_where(|listing| listing.game_id == id);
        tables.categories.retain(|category| category.game_id != id);
        tables.games.retain(|game| game.id != id);
        Ok(Some(Removal::Deleted))
    }

    async fn active_categories(&self, game_id: Uuid) -> StoreResult<Vec<CategorySummary>> {
        let tables = self.tables.read().await;
        let mut categories: Vec<&Category> = tables
            .categories
            .iter()
            .filter(|category| category.game_id == game_id && category.active)
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories
            .into_iter()
            .map(|category| CategorySummary {
                listings_count: tables
                    .active_listings_where(|listing| listing.category_id == category.id),
                category: category.clone(),
            })
            .collect())
    }

    async fn category_by_id(&self, id: Uuid) -> StoreResult<Option<Category>> {
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .iter()
            .find(|category| category.id == id)
            .cloned())
    }

    async fn active_category_by_slug(
        &self,
        game_id: Uuid,
        slug: &str,
    ) -> StoreResult<Option<Category>> {
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .iter()
            .find(|category| {
                category.game_id == game_id && category.slug == slug && category.active
            })
            .cloned())
    }

    async fn insert_category(&self, category: NewCategory) -> StoreResult<Category> {
        let mut tables = self.tables.write().await;
        if tables
            .categories
            .iter()
            .any(|row| row.game_id == category.game_id && row.slug == category.slug)
        {
            return Err(StoreError::Duplicate(UniqueKey::CategorySlug));
        }
        let now = Utc::now();
        let row = Category {
            id: Uuid::new_v4(),
            game_id: category.game_id,
            name: category.name,
            slug: category.slug,
            commission_rate: category.commission_rate,
            fields_config: category.fields_config,
            active: true,
            created_at: now,
            updated_at: now,
        };
        tables.categories.push(row.clone());
        Ok(row)
    }

    async fn update_category(
        &self,
        id: Uuid,
        changes: CategoryChanges,
    ) -> StoreResult<Option<Category>> {
        let mut tables = self.tables.write().await;
        let Some(game_id) = tables
            .categories
            .iter()
            .find(|category| category.id == id)
            .map(|category| category.game_id)
        else {
            return Ok(None);
        };
        if let Some(slug) = changes.slug.as_deref() {
            if tables
                .categories
                .iter()
                .any(|row| row.game_id == game_id && row.slug == slug && row.id != id)
            {
                return Err(StoreError::Duplicate(UniqueKey::CategorySlug));
            }
        }
        let Some(category) = tables.categories.iter_mut().find(|category| category.id == id)
        else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            category.name = name;
        }
        if let Some(slug) = changes.slug {
            category.slug = slug;
        }
        if let Some(rate) = changes.commission_rate {
            category.commission_rate = rate;
        }
        if let Some(fields_config) = changes.fields_config {
            category.fields_config = Some(fields_config);
        }
        if let Some(active) = changes.active {
            category.active = active;
        }
        category.updated_at = Utc::now();
        Ok(Some(category.clone()))
    }

    async fn remove_category(&self, id: Uuid) -> StoreResult<Option<Removal>> {
        let mut tables = self.tables.write().await;
        if !tables.categories.iter().any(|category| category.id == id) {
            return Ok(None);
        }
        if tables.active_listings_where(|listing| listing.category_id == id) > 0 {
            if let Some(category) = tables.categories.iter_mut().find(|c| c.id == id) {
                category.active = false;
                category.updated_at = Utc::now();
            }
            return Ok(Some(Removal::Deactivated));
        }
        tables.delete_listings_where(|listing| listing.category_id == id);
        tables.categories.retain(|category| category.id != id);
        Ok(Some(Removal::Deleted))
    }

    async fn count_listings(&self, filter: &ListingFilter) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(count(
            tables.listings.iter().filter(|listing| filter.matches(listing)),
        ))
    }

    async fn listing_page(
        &self,
        filter: &ListingFilter,
        sort: ListingSort,
        page: PageRequest,
    ) -> StoreResult<Vec<ListingCard>> {
        let tables = self.tables.read().await;
        // Insertion position breaks timestamp ties so "newest" follows write order.
        let mut matching: Vec<(usize, &Listing)> = tables
            .listings
            .iter()
            .enumerate()
            .filter(|(_, listing)| filter.matches(listing))
            .collect();
        matching.sort_by(|(ia, a), (ib, b)| {
            let newest = b.created_at.cmp(&a.created_at).then_with(|| ib.cmp(ia));
            match sort {
                ListingSort::PriceAsc => a
                    .price
                    .partial_cmp(&b.price)
                    .unwrap_or(Ordering::Equal)
                    .then(newest),
                ListingSort::PriceDesc => b
                    .price
                    .partial_cmp(&a.price)
                    .unwrap_or(Ordering::Equal)
                    .then(newest),
                ListingSort::Newest => newest,
                ListingSort::Oldest => newest.reverse(),
            }
        });

        let skip = usize::try_from(page.skip).unwrap_or(0);
        let take = usize::try_from(page.take).unwrap_or(0);
        matching
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|(_, listing)| {
                Ok(ListingCard {
                    seller: tables.seller(listing.seller_id)?,
                    completed_orders: tables.completed_orders(listing.id),
                    listing: listing.clone(),
                })
            })
            .collect()
    }

    async fn listing_by_id(&self, id: Uuid) -> StoreResult<Option<Listing>> {
        let tables = self.tables.read().await;
        Ok(tables.listings.iter().find(|listing| listing.id == id).cloned())
    }

    async fn listing_detail(&self, id: Uuid) -> StoreResult<Option<ListingDetail>> {
        let tables = self.tables.read().await;
        let Some(listing) = tables
            .listings
            .iter()
            .find(|listing| listing.id == id && listing.active && !listing.hidden)
        else {
            return Ok(None);
        };
        let game = tables
            .games
            .iter()
            .find(|game| game.id == listing.game_id)
            .cloned()
            .ok_or_else(|| StoreError::Corrupt(format!("listing {id} has no game")))?;
        let category = tables
            .categories
            .iter()
            .find(|category| category.id == listing.category_id)
            .cloned()
            .ok_or_else(|| StoreError::Corrupt(format!("listing {id} has no category")))?;
        Ok(Some(ListingDetail {
            seller: tables.seller(listing.seller_id)?,
            seller_active_listings: tables
                .active_listings_where(|other| other.seller_id == listing.seller_id),
            completed_orders: tables.completed_orders(listing.id),
            listing: listing.clone(),
            game,
            category,
        }))
    }

    async fn insert_listing(&self, listing: NewListing) -> StoreResult<Listing> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let row = Listing {
            id: Uuid::new_v4(),
            seller_id: listing.seller_id,
            game_id: listing.game_id,
            category_id: listing.category_id,
            title: listing.title,
            price: listing.price,
            description: listing.description,
            delivery_type: listing.delivery_type,
            stock_type: listing.stock_type,
            quantity: listing.quantity,
            images: listing.images,
            custom_fields: listing.custom_fields,
            active: true,
            hidden: false,
            boosted_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.listings.push(row.clone());
        Ok(row)
    }

    async fn update_listing(
        &self,
        id: Uuid,
        changes: ListingChanges,
    ) -> StoreResult<Option<Listing>> {
        let mut tables = self.tables.write().await;
        let Some(listing) = tables.listings.iter_mut().find(|listing| listing.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            listing.title = title;
        }
        if let Some(price) = changes.price {
            listing.price = price;
        }
        if let Some(description) = changes.description {
            listing.description = description;
        }
        if let Some(delivery_type) = changes.delivery_type {
            listing.delivery_type = delivery_type;
        }
        if let Some(stock_type) = changes.stock_type {
            listing.stock_type = stock_type;
        }
        if let Some(quantity) = changes.quantity {
            listing.quantity = Some(quantity);
        }
        if let Some(images) = changes.images {
            listing.images = images;
        }
        if let Some(custom_fields) = changes.custom_fields {
            listing.custom_fields = Some(custom_fields);
        }
        if let Some(active) = changes.active {
            listing.active = active;
        }
        if let Some(hidden) = changes.hidden {
            listing.hidden = hidden;
        }
        listing.updated_at = Utc::now();
        Ok(Some(listing.clone()))
    }

    async fn remove_listing(&self, id: Uuid) -> StoreResult<Option<Removal>> {
        let mut tables = self.tables.write().await;
        if !tables.listings.iter().any(|listing| listing.id == id) {
            return Ok(None);
        }
        let open_orders = tables
            .orders
            .iter()
            .any(|order| order.listing_id == Some(id) && order.status.is_open());
        if open_orders {
            if let Some(listing) = tables.listings.iter_mut().find(|l| l.id == id) {
                listing.active = false;
                listing.updated_at = Utc::now();
            }
            return Ok(Some(Removal::Deactivated));
        }
        tables.delete_listings_where(|listing| listing.id == id);
        Ok(Some(Removal::Deleted))
    }

    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order> {
        let mut tables = self.tables.write().await;
        if !tables.listings.iter().any(|listing| listing.id == order.listing_id) {
            return Err(StoreError::Corrupt(format!(
                "order references unknown listing {}",
                order.listing_id
            )));
        }
        let row = Order {
            id: Uuid::new_v4(),
            listing_id: Some(order.listing_id),
            buyer_id: order.buyer_id,
            status: order.status,
            created_at: Utc::now(),
        };
        tables.orders.push(row.clone());
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DeliveryType, StockType};

    struct Fixture {
        store: MemoryStore,
        seller: User,
        game: Game,
        category: Category,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let seller = store
            .insert_user(NewUser {
                username: "seller".to_string(),
                email: "seller@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        let game = store
            .insert_game(NewGame {
                name: "Realm".to_string(),
                slug: "realm".to_string(),
                image_url: None,
                platform_types: vec!["PC".to_string()],
                order_index: 0,
            })
            .await
            .unwrap();
        let category = store
            .insert_category(NewCategory {
                game_id: game.id,
                name: "Gold".to_string(),
                slug: "gold".to_string(),
                commission_rate: 10.0,
                fields_config: None,
            })
            .await
            .unwrap();
        Fixture {
            store,
            seller,
            game,
            category,
        }
    }

    fn new_listing(f: &Fixture, title: &str, price: f64) -> NewListing {
        NewListing {
            seller_id: f.seller.id,
            game_id: f.game.id,
            category_id: f.category.id,
            title: title.to_string(),
            price,
            description: "desc".to_string(),
            delivery_type: DeliveryType::Manual,
            stock_type: StockType::Limited,
            quantity: Some(1),
            images: Vec::new(),
            custom_fields: None,
        }
    }

    fn filter(f: &Fixture) -> ListingFilter {
        ListingFilter {
            game_id: f.game.id,
            category_id: f.category.id,
            delivery_type: None,
            stock_type: None,
            search: None,
        }
    }

    #[tokio::test]
    async fn insert_user_rejects_duplicates() {
        let f = fixture().await;
        let err = f
            .store
            .insert_user(NewUser {
                username: "other".to_string(),
                email: "seller@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueKey::Email)));

        let err = f
            .store
            .insert_user(NewUser {
                username: "seller".to_string(),
                email: "other@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueKey::Username)));
    }

    #[tokio::test]
    async fn listing_page_sorts_and_slices() {
        let f = fixture().await;
        for (title, price) in [("a", 3.0), ("b", 1.0), ("c", 2.0)] {
            f.store.insert_listing(new_listing(&f, title, price)).await.unwrap();
        }

        let page = PageRequest { skip: 0, take: 10 };
        let by_price = f
            .store
            .listing_page(&filter(&f), ListingSort::PriceAsc, page)
            .await
            .unwrap();
        let titles: Vec<&str> = by_price.iter().map(|c| c.listing.title.as_str()).collect();
        assert_eq!(titles, ["b", "c", "a"]);

        let newest = f
            .store
            .listing_page(&filter(&f), ListingSort::Newest, PageRequest { skip: 1, take: 1 })
            .await
            .unwrap();
        assert_eq!(newest.len(), 1);
        assert_eq!(newest[0].listing.title, "b");
        assert_eq!(newest[0].seller.username, "seller");
    }

    #[tokio::test]
    async fn remove_listing_deactivates_when_orders_are_open() {
        let f = fixture().await;
        let listing = f.store.insert_listing(new_listing(&f, "x", 1.0)).await.unwrap();
        f.store
            .insert_order(NewOrder {
                listing_id: listing.id,
                buyer_id: Uuid::new_v4(),
                status: OrderStatus::Paid,
            })
            .await
            .unwrap();

        let removal = f.store.remove_listing(listing.id).await.unwrap();
        assert_eq!(removal, Some(Removal::Deactivated));
        assert!(f.store.listing_detail(listing.id).await.unwrap().is_none());
        let row = f.store.listing_by_id(listing.id).await.unwrap().unwrap();
        assert!(!row.active);
    }

    #[tokio::test]
    async fn remove_listing_deletes_and_detaches_closed_orders() {
        let f = fixture().await;
        let listing = f.store.insert_listing(new_listing(&f, "x", 1.0)).await.unwrap();
        f.store
            .insert_order(NewOrder {
                listing_id: listing.id,
                buyer_id: Uuid::new_v4(),
                status: OrderStatus::Completed,
            })
            .await
            .unwrap();

        let removal = f.store.remove_listing(listing.id).await.unwrap();
        assert_eq!(removal, Some(Removal::Deleted));
        assert!(f.store.listing_by_id(listing.id).await.unwrap().is_none());
        let tables = f.store.tables.read().await;
        assert_eq!(tables.orders.len(), 1);
        assert_eq!(tables.orders[0].listing_id, None);
    }

    #[tokio::test]
    async fn remove_game_cascades_when_no_active_listings() {
        let f = fixture().await;
        let listing = f.store.insert_listing(new_listing(&f, "x", 1.0)).await.unwrap();
        assert_eq!(
            f.store.remove_game(f.game.id).await.unwrap(),
            Some(Removal::Deactivated)
        );

        f.store
            .update_listing(
                listing.id,
                ListingChanges {
                    active: Some(false),
                    ..ListingChanges::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(
            f.store.remove_game(f.game.id).await.unwrap(),
            Some(Removal::Deleted)
        );
        assert!(f.store.category_by_id(f.category.id).await.unwrap().is_none());
        assert!(f.store.listing_by_id(listing.id).await.unwrap().is_none());
        assert_eq!(f.store.remove_game(f.game.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn category_slug_is_unique_per_game() {
        let f = fixture().await;
        let err = f
            .store
            .insert_category(NewCategory {
                game_id: f.game.id,
                name: "Gold again".to_string(),
                slug: "gold".to_string(),
                commission_rate: 5.0,
                fields_config: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueKey::CategorySlug)));

        let other = f
            .store
            .insert_game(NewGame {
                name: "Other".to_string(),
                slug: "other".to_string(),
                image_url: None,
                platform_types: vec!["PC".to_string()],
                order_index: 1,
            })
            .await
            .unwrap();
        f.store
            .insert_category(NewCategory {
                game_id: other.id,
                name: "Gold".to_string(),
                slug: "gold".to_string(),
                commission_rate: 5.0,
                fields_config: None,
            })
            .await
            .unwrap();
    }
}

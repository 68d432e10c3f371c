//! Keyed query cache with per-entry freshness and in-flight de-duplication.
//!
//! Concurrent lookups of the same key share one fetch: the first caller runs
//! it, the others wait on the same cell. Failed fetches are not cached.

use std::{
    any::Any,
    collections::HashMap,
    future::Future,
    sync::Arc,
    time::Duration,
};

use tokio::{
    sync::{Mutex, OnceCell},
    time::Instant,
};
use tracing::debug;

use super::ClientError;

/// Freshness window for catalog data (games, categories, listing detail, session).
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(5 * 60);
/// Listing pages change often, so they go stale quickly.
pub const LISTINGS_STALE_AFTER: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    scope: &'static str,
    parts: Vec<String>,
}

impl QueryKey {
    pub fn new<I, S>(scope: &'static str, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scope,
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    /// The verified identity behind the current token.
    #[must_use]
    pub fn me() -> Self {
        Self::new("auth", ["me"])
    }

    #[must_use]
    pub fn games() -> Self {
        Self::new("games", Vec::<String>::new())
    }

    #[must_use]
    pub fn game(slug: &str) -> Self {
        Self::new("games", [slug])
    }

    #[must_use]
    pub fn categories(game_slug: &str) -> Self {
        Self::new("categories", [game_slug])
    }

    /// `filters` is any stable rendering of the page parameters.
    #[must_use]
    pub fn listings(game_slug: &str, category_slug: &str, filters: &str) -> Self {
        Self::new("listings", [game_slug, category_slug, filters])
    }

    #[must_use]
    pub fn listing(id: &str) -> Self {
        Self::new("listing", [id])
    }

    #[must_use]
    pub fn scope(&self) -> &'static str {
        self.scope
    }

    #[must_use]
    pub fn stale_after(&self) -> Duration {
        if self.scope == "listings" {
            LISTINGS_STALE_AFTER
        } else {
            DEFAULT_STALE_AFTER
        }
    }
}

struct Cached {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
}

type Slot = Arc<OnceCell<Cached>>;

#[derive(Clone, Default)]
pub struct QueryCache {
    slots: Arc<Mutex<HashMap<QueryKey, Slot>>>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache").finish_non_exhaustive()
    }
}

impl QueryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key` while it is fresh, otherwise runs
    /// `fetch` (once, even with concurrent callers) and caches the result.
    ///
    /// # Errors
    /// Returns the fetch error; nothing is cached in that case.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<Arc<T>, ClientError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let slot = self.slot(&key).await;
        let cached = slot
            .get_or_try_init(|| async {
                debug!(scope = key.scope(), "Query cache miss");
                let value = fetch().await?;
                Ok::<_, ClientError>(Cached {
                    value: Arc::new(value),
                    fetched_at: Instant::now(),
                })
            })
            .await?;

        match Arc::clone(&cached.value).downcast::<T>() {
            Ok(value) => Ok(value),
            Err(_) => Err(ClientError::Config(format!(
                "query key {key:?} is cached with a different type"
            ))),
        }
    }

    /// Current slot for `key`, replacing it when its value went stale.
    async fn slot(&self, key: &QueryKey) -> Slot {
        let mut slots = self.slots.lock().await;
        let stale_after = key.stale_after();
        let expired = slots.get(key).is_some_and(|slot| {
            slot.get()
                .is_some_and(|cached| cached.fetched_at.elapsed() >= stale_after)
        });
        if expired {
            slots.remove(key);
        }
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// Whether `key` holds a value that has not gone stale.
    pub async fn is_fresh(&self, key: &QueryKey) -> bool {
        let slots = self.slots.lock().await;
        slots.get(key).is_some_and(|slot| {
            slot.get()
                .is_some_and(|cached| cached.fetched_at.elapsed() < key.stale_after())
        })
    }

    pub async fn invalidate(&self, key: &QueryKey) {
        self.slots.lock().await.remove(key);
    }

    /// Drops every entry of one scope, e.g. all listing pages after a write.
    pub async fn invalidate_scope(&self, scope: &str) {
        self.slots.lock().await.retain(|key, _| key.scope != scope);
    }

    pub async fn clear(&self) {
        self.slots.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        let slots = self.slots.lock().await;
        slots.values().filter(|slot| slot.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn counted(counter: &AtomicUsize, value: &str) -> Result<String, ClientError> {
        counter.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(value.to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_fetches_share_one_request() -> anyhow::Result<()> {
        let cache = QueryCache::new();
        let calls = AtomicUsize::new(0);

        let (a, b) = tokio::join!(
            cache.get_or_fetch(QueryKey::games(), || counted(&calls, "first")),
            cache.get_or_fetch(QueryKey::games(), || counted(&calls, "second")),
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*a?, "first");
        assert_eq!(*b?, "first");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn listing_pages_go_stale_first() -> anyhow::Result<()> {
        let cache = QueryCache::new();
        let calls = AtomicUsize::new(0);
        let games = QueryKey::games();
        let page = QueryKey::listings("dota-2", "items", "page=1");

        cache.get_or_fetch(games.clone(), || counted(&calls, "games")).await?;
        cache.get_or_fetch(page.clone(), || counted(&calls, "page")).await?;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(cache.is_fresh(&games).await);
        assert!(!cache.is_fresh(&page).await);

        cache.get_or_fetch(games.clone(), || counted(&calls, "games")).await?;
        cache.get_or_fetch(page.clone(), || counted(&calls, "page")).await?;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        tokio::time::advance(Duration::from_secs(5 * 60)).await;
        cache.get_or_fetch(games, || counted(&calls, "games")).await?;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        Ok(())
    }

    #[tokio::test]
    async fn failures_are_not_cached() -> anyhow::Result<()> {
        let cache = QueryCache::new();
        let key = QueryKey::game("dota-2");

        let failed = cache
            .get_or_fetch(key.clone(), || async {
                Err::<String, _>(ClientError::Timeout)
            })
            .await;
        assert!(matches!(failed, Err(ClientError::Timeout)));
        assert!(cache.is_empty().await);

        let value = cache
            .get_or_fetch(key, || async { Ok("Dota 2".to_string()) })
            .await?;
        assert_eq!(*value, "Dota 2");
        assert_eq!(cache.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn invalidation_by_key_scope_and_all() -> anyhow::Result<()> {
        let cache = QueryCache::new();
        for key in [
            QueryKey::games(),
            QueryKey::listings("dota-2", "items", "page=1"),
            QueryKey::listings("dota-2", "items", "page=2"),
        ] {
            cache.get_or_fetch(key, || async { Ok(1_u32) }).await?;
        }
        assert_eq!(cache.len().await, 3);

        cache.invalidate_scope("listings").await;
        assert_eq!(cache.len().await, 1);

        cache.invalidate(&QueryKey::games()).await;
        assert!(cache.is_empty().await);

        cache.get_or_fetch(QueryKey::games(), || async { Ok(1_u32) }).await?;
        cache.clear().await;
        assert!(cache.is_empty().await);
        Ok(())
    }
}

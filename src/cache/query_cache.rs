use futures::future::{BoxFuture, FutureExt, Shared};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};

use super::keys::{CacheGroup, QueryKey};
use crate::error::{CoreError, CoreResult};

type Value = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, CoreResult<Value>>>;

#[derive(Default)]
struct CacheEntry {
    value: Option<Value>,
    fetched_at: Option<Instant>,
    /// Set by `invalidate`; the next `get` refetches regardless of age
    invalidated: bool,
    /// Value was written by `mutate_optimistic`, not by a fetch
    optimistic: bool,
    last_error: Option<CoreError>,
    in_flight: Option<SharedFetch>,
    /// Bumped on invalidation so an older fetch cannot overwrite newer state
    generation: u64,
    fetches: u64,
}

impl CacheEntry {
    fn is_fresh(&self, stale_after: Duration) -> bool {
        match (&self.value, self.fetched_at) {
            (Some(_), Some(at)) => !self.invalidated && !self.optimistic && at.elapsed() < stale_after,
            _ => false,
        }
    }
}

/// Value handed back by the cache
#[derive(Debug)]
pub struct Cached<V> {
    pub value: Arc<V>,
    /// `true` when the latest fetch failed and this is the previous value
    pub stale: bool,
    /// Cause of the failed refresh, if any
    pub error: Option<CoreError>,
}

impl<V> Clone for Cached<V> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            stale: self.stale,
            error: self.error.clone(),
        }
    }
}

/// Read-through cache with request coalescing
///
/// At most one fetch per key is in flight. Fetches run as their own tasks,
/// so a caller dropping its `get` does not cancel the fetch and the result
/// still lands in the cache.
#[derive(Clone, Default)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<QueryKey, CacheEntry>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value of `key`, fetching it if missing, stale or invalidated
    ///
    /// A failed fetch returns the previous value flagged stale. Without a
    /// previous value the error is returned.
    pub async fn get<V, F, Fut>(&self, key: QueryKey, stale_after: Duration, fetcher: F) -> CoreResult<Cached<V>>
    where
        V: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = CoreResult<V>> + Send + 'static,
    {
        let fetch = {
            let mut entries = self.entries.write().await;
            let entry = entries.entry(key).or_default();

            if entry.is_fresh(stale_after) {
                if let Some(value) = &entry.value {
                    trace!("Cache hit {}", key);
                    return Ok(Cached {
                        value: downcast(&key, value.clone())?,
                        stale: false,
                        error: None,
                    });
                }
            }

            if let Some(fetch) = entry.in_flight.clone() {
                trace!("Joining in-flight fetch {}", key);
                fetch
            } else {
                let fetch = self.spawn_fetch(key, entry.generation, fetcher());
                entry.in_flight = Some(fetch.clone());
                entry.fetches += 1;
                fetch
            }
        };

        match fetch.await {
            Ok(value) => Ok(Cached {
                value: downcast(&key, value)?,
                stale: false,
                error: None,
            }),
            Err(error) => {
                let entries = self.entries.read().await;
                match entries.get(&key).and_then(|e| e.value.clone()) {
                    Some(previous) => {
                        warn!("⚠️ Refresh of {} failed, serving stale value: {}", key, error);
                        Ok(Cached {
                            value: downcast(&key, previous)?,
                            stale: true,
                            error: Some(error),
                        })
                    }
                    None => Err(error),
                }
            }
        }
    }

    fn spawn_fetch<V, Fut>(&self, key: QueryKey, generation: u64, fut: Fut) -> SharedFetch
    where
        V: Send + Sync + 'static,
        Fut: Future<Output = CoreResult<V>> + Send + 'static,
    {
        let entries = self.entries.clone();
        let cleanup = self.entries.clone();
        debug!("Fetching {}", key);

        let task = tokio::spawn(async move {
            let result = fut.await.map(|v| Arc::new(v) as Value);

            let mut entries = entries.write().await;
            if let Some(entry) = entries.get_mut(&key) {
                // Invalidated while in flight: the entry belongs to a newer fetch now
                if entry.generation == generation {
                    entry.in_flight = None;
                    match &result {
                        Ok(value) => {
                            entry.value = Some(value.clone());
                            entry.fetched_at = Some(Instant::now());
                            entry.invalidated = false;
                            entry.optimistic = false;
                            entry.last_error = None;
                        }
                        Err(error) => entry.last_error = Some(error.clone()),
                    }
                }
            }
            result
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    // The task died before releasing the key
                    let mut entries = cleanup.write().await;
                    if let Some(entry) = entries.get_mut(&key) {
                        if entry.generation == generation {
                            entry.in_flight = None;
                        }
                    }
                    warn!("⚠️ Fetch of {} aborted: {}", key, e);
                    Err(CoreError::unavailable(format!("fetch task aborted: {}", e)))
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Force the next `get` of `key` to refetch
    pub async fn invalidate_key(&self, key: &QueryKey) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(entry) => {
                invalidate_entry(entry);
                true
            }
            None => false,
        }
    }

    /// Invalidate every key in `group`, returning how many were hit
    pub async fn invalidate_group(&self, group: &CacheGroup) -> usize {
        let mut entries = self.entries.write().await;
        let mut count = 0;
        for (key, entry) in entries.iter_mut() {
            if key.in_group(group) {
                invalidate_entry(entry);
                count += 1;
            }
        }
        debug!("Invalidated {} keys in {:?}", count, group);
        count
    }

    pub async fn invalidate_groups(&self, groups: &[CacheGroup]) -> usize {
        let mut count = 0;
        for group in groups {
            count += self.invalidate_group(group).await;
        }
        count
    }

    /// Write a value ahead of confirmation
    ///
    /// Visible through `peek` right away. The next `get` still refetches and
    /// falls back to this value if that fetch fails.
    pub async fn mutate_optimistic<V: Send + Sync + 'static>(&self, key: QueryKey, value: V) {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(key).or_default();
        entry.value = Some(Arc::new(value));
        entry.optimistic = true;
        entry.generation += 1;
        entry.in_flight = None;
    }

    /// Current value without fetching
    pub async fn peek<V: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Cached<V>> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        let value = entry.value.clone()?.downcast::<V>().ok()?;
        Some(Cached {
            value,
            stale: entry.invalidated || entry.optimistic || entry.last_error.is_some(),
            error: entry.last_error.clone(),
        })
    }

    pub async fn is_fetching(&self, key: &QueryKey) -> bool {
        let entries = self.entries.read().await;
        entries.get(key).is_some_and(|e| e.in_flight.is_some())
    }

    /// Fetches started for `key` since it was first requested
    pub async fn fetch_count(&self, key: &QueryKey) -> u64 {
        let entries = self.entries.read().await;
        entries.get(key).map_or(0, |e| e.fetches)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

fn invalidate_entry(entry: &mut CacheEntry) {
    entry.invalidated = true;
    entry.generation += 1;
    entry.in_flight = None;
}

fn downcast<V: Send + Sync + 'static>(key: &QueryKey, value: Value) -> CoreResult<Arc<V>> {
    value
        .downcast::<V>()
        .map_err(|_| CoreError::configuration(format!("cache key {} holds a different value type", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::keys::Metric;
    use crate::chain::mock::MockTransport;
    use crate::chain::ChainReader;
    use crate::registry::ContractHandle;
    use alloy_primitives::Address;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const WINDOW: Duration = Duration::from_secs(30);

    fn key() -> QueryKey {
        QueryKey::new(Metric::ProtocolStats, 250)
    }

    fn counting(counter: &Arc<AtomicUsize>, value: u64) -> impl FnOnce() -> BoxFuture<'static, CoreResult<u64>> {
        let counter = counter.clone();
        move || {
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(value)
            }
            .boxed()
        }
    }

    fn failing(counter: &Arc<AtomicUsize>) -> impl FnOnce() -> BoxFuture<'static, CoreResult<u64>> {
        let counter = counter.clone();
        move || {
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(CoreError::unavailable("rpc down"))
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_second_get_within_window_hits_cache() {
        let cache = QueryCache::new();
        let fetches = Arc::new(AtomicUsize::new(0));

        let first = cache.get(key(), WINDOW, counting(&fetches, 7)).await.unwrap();
        let second = cache.get(key(), WINDOW, counting(&fetches, 8)).await.unwrap();

        assert_eq!(*first.value, 7);
        assert_eq!(*second.value, 7);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_gets_share_one_fetch() {
        let cache = QueryCache::new();
        let fetches = Arc::new(AtomicUsize::new(0));

        let slow = |counter: Arc<AtomicUsize>| {
            move || {
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok::<_, CoreError>(42u64)
                }
                .boxed()
            }
        };

        let (a, b, c) = tokio::join!(
            cache.get(key(), WINDOW, slow(fetches.clone())),
            cache.get(key(), WINDOW, slow(fetches.clone())),
            cache.get(key(), WINDOW, slow(fetches.clone())),
        );

        assert_eq!(*a.unwrap().value, 42);
        assert_eq!(*b.unwrap().value, 42);
        assert_eq!(*c.unwrap().value, 42);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(cache.fetch_count(&key()).await, 1);
    }

    #[tokio::test]
    async fn test_invalidate_triggers_exactly_one_refetch() {
        let cache = QueryCache::new();
        let fetches = Arc::new(AtomicUsize::new(0));

        cache.get(key(), WINDOW, counting(&fetches, 1)).await.unwrap();
        assert!(cache.invalidate_key(&key()).await);

        let refreshed = cache.get(key(), WINDOW, counting(&fetches, 2)).await.unwrap();
        cache.get(key(), WINDOW, counting(&fetches, 3)).await.unwrap();

        assert_eq!(*refreshed.value, 2);
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stale_entry_refetches() {
        let cache = QueryCache::new();
        let fetches = Arc::new(AtomicUsize::new(0));

        cache.get(key(), Duration::ZERO, counting(&fetches, 1)).await.unwrap();
        let second = cache.get(key(), Duration::ZERO, counting(&fetches, 2)).await.unwrap();

        assert_eq!(*second.value, 2);
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_serves_previous_value() {
        let cache = QueryCache::new();
        let fetches = Arc::new(AtomicUsize::new(0));

        cache.get(key(), WINDOW, counting(&fetches, 5)).await.unwrap();
        cache.invalidate_key(&key()).await;

        let served = cache.get(key(), WINDOW, failing(&fetches)).await.unwrap();
        assert_eq!(*served.value, 5);
        assert!(served.stale);
        assert!(matches!(served.error, Some(CoreError::ChainUnavailable(_))));

        // Not poisoned: the next get retries
        let recovered = cache.get(key(), WINDOW, counting(&fetches, 6)).await.unwrap();
        assert_eq!(*recovered.value, 6);
        assert!(!recovered.stale);
        assert_eq!(fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failure_without_previous_value_is_error() {
        let cache = QueryCache::new();
        let fetches = Arc::new(AtomicUsize::new(0));

        let result = cache.get::<u64, _, _>(key(), WINDOW, failing(&fetches)).await;
        assert!(matches!(result, Err(CoreError::ChainUnavailable(_))));
    }

    #[tokio::test]
    async fn test_abandoned_fetch_still_populates() {
        let cache = QueryCache::new();
        let fetches = Arc::new(AtomicUsize::new(0));
        let counter = fetches.clone();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(5),
            cache.get(key(), WINDOW, move || {
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(40)).await;
                    Ok::<_, CoreError>(99u64)
                }
                .boxed()
            }),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(80)).await;

        let peeked = cache.peek::<u64>(&key()).await.unwrap();
        assert_eq!(*peeked.value, 99);
        let served = cache.get(key(), WINDOW, counting(&fetches, 0)).await.unwrap();
        assert_eq!(*served.value, 99);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_during_flight_discards_old_result() {
        let cache = QueryCache::new();
        let fetches = Arc::new(AtomicUsize::new(0));
        let counter = fetches.clone();

        let slow = cache.get(key(), WINDOW, move || {
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(30)).await;
                Ok::<_, CoreError>(1u64)
            }
            .boxed()
        });
        let invalidate_then_get = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            cache.invalidate_key(&key()).await;
            cache.get(key(), WINDOW, counting(&fetches, 2)).await
        };

        let (old, new) = tokio::join!(slow, invalidate_then_get);
        assert_eq!(*old.unwrap().value, 1);
        assert_eq!(*new.unwrap().value, 2);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*cache.peek::<u64>(&key()).await.unwrap().value, 2);
    }

    #[tokio::test]
    async fn test_group_invalidation_hits_only_members() {
        let cache = QueryCache::new();
        let fetches = Arc::new(AtomicUsize::new(0));
        let alice = Address::repeat_byte(0xA1);
        let bob = Address::repeat_byte(0xB0);

        let alice_wallet = QueryKey::new(Metric::RewardInWallet, 250).with_account(Some(alice));
        let bob_wallet = QueryKey::new(Metric::RewardInWallet, 250).with_account(Some(bob));
        cache.get(alice_wallet, WINDOW, counting(&fetches, 1)).await.unwrap();
        cache.get(bob_wallet, WINDOW, counting(&fetches, 1)).await.unwrap();
        cache.get(key(), WINDOW, counting(&fetches, 1)).await.unwrap();

        let hit = cache.invalidate_group(&CacheGroup::WalletBalance(alice)).await;
        assert_eq!(hit, 1);

        cache.get(alice_wallet, WINDOW, counting(&fetches, 1)).await.unwrap();
        cache.get(bob_wallet, WINDOW, counting(&fetches, 1)).await.unwrap();
        cache.get(key(), WINDOW, counting(&fetches, 1)).await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_optimistic_value_is_visible_then_confirmed() {
        let cache = QueryCache::new();
        let fetches = Arc::new(AtomicUsize::new(0));

        cache.get(key(), WINDOW, counting(&fetches, 10)).await.unwrap();
        cache.mutate_optimistic(key(), 0u64).await;

        let peeked = cache.peek::<u64>(&key()).await.unwrap();
        assert_eq!(*peeked.value, 0);
        assert!(peeked.stale);

        let confirmed = cache.get(key(), WINDOW, counting(&fetches, 1)).await.unwrap();
        assert_eq!(*confirmed.value, 1);
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_type_mismatch_is_configuration_error() {
        let cache = QueryCache::new();
        let fetches = Arc::new(AtomicUsize::new(0));
        cache.get(key(), WINDOW, counting(&fetches, 1)).await.unwrap();

        let result = cache
            .get::<String, _, _>(key(), WINDOW, || async { Ok("x".to_string()) }.boxed())
            .await;
        assert!(matches!(result, Err(CoreError::Configuration(_))));
    }

    async fn exploding() -> CoreResult<u64> {
        panic!("fetcher exploded")
    }

    #[tokio::test]
    async fn test_panicking_fetch_does_not_poison_key() {
        let cache = QueryCache::new();
        let fetches = Arc::new(AtomicUsize::new(0));

        assert!(cache.get(key(), WINDOW, exploding).await.is_err());
        assert!(!cache.is_fetching(&key()).await);

        let recovered = cache.get(key(), WINDOW, counting(&fetches, 9)).await.unwrap();
        assert_eq!(*recovered.value, 9);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hung_read_does_not_block_other_keys() {
        let mock = Arc::new(MockTransport::new());
        mock.set_call_delay(Duration::from_secs(30));
        let reader = ChainReader::new(mock.clone());
        let cache = QueryCache::new();
        let hung = QueryKey::new(Metric::RewardTokenStats, 250);

        let background = cache.clone();
        tokio::spawn(async move {
            background
                .get(hung, WINDOW, move || async move {
                    reader.total_supply(&ContractHandle::erc20(Address::repeat_byte(0x01))).await
                })
                .await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cache.is_fetching(&hung).await);

        let fetches = Arc::new(AtomicUsize::new(0));
        let other = tokio::time::timeout(Duration::from_millis(100), cache.get(key(), WINDOW, counting(&fetches, 7)))
            .await
            .expect("unrelated key waited on the hung read")
            .unwrap();

        assert_eq!(*other.value, 7);
        assert!(cache.is_fetching(&hung).await);
        assert_eq!(mock.call_count(), 1);
    }
}

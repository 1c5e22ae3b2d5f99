//! Time-boxed memoization of fetched rate maps.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};

use crate::{RateMap, RateSource};

/// Clock abstraction so TTL expiry is testable deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The wall clock used outside of tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Clone, Debug)]
struct CacheEntry {
    rates: RateMap,
    fetched_at: DateTime<Utc>,
}

/// Memoizes rate maps per source cache key for a fixed TTL.
///
/// An entry older than the TTL is treated as absent and triggers a refetch;
/// stale data is never served. Concurrent misses on the same key may both
/// fetch and both store; last write wins, which is acceptable because rate
/// maps are idempotent snapshots.
pub struct RateCache {
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<&'static str, CacheEntry>>,
}

impl RateCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self::with_clock(ttl_secs, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: TimeDelta::seconds(ttl_secs.min(i64::MAX as u64) as i64),
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached map under `key`, or resolves `fetch` and stores
    /// its result.
    ///
    /// `fetch` is only polled on a miss (or an expired entry).
    pub async fn remember<Fut>(&self, key: &'static str, fetch: Fut) -> RateMap
    where
        Fut: Future<Output = RateMap>,
    {
        if let Some(hit) = self.lookup(key) {
            return hit;
        }

        let rates = fetch.await;
        self.store(key, rates.clone());
        rates
    }

    /// Memoized wrapper around [`RateSource::fetch_rates`].
    pub async fn get_rates(&self, source: &RateSource) -> RateMap {
        self.remember(source.format().cache_key(), source.fetch_rates())
            .await
    }

    /// Evicts every entry, forcing the next lookup to refetch.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Evicts only the entry under `key`; other sources stay cached.
    pub fn clear_key(&self, key: &str) {
        self.lock().remove(key);
    }

    fn lookup(&self, key: &str) -> Option<RateMap> {
        let entries = self.lock();
        let entry = entries.get(key)?;
        let age = self.clock.now() - entry.fetched_at;
        (age < self.ttl).then(|| entry.rates.clone())
    }

    fn store(&self, key: &'static str, rates: RateMap) {
        let fetched_at = self.clock.now();
        self.lock().insert(key, CacheEntry { rates, fetched_at });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<&'static str, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

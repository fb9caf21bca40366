//! Bounded per-year cache with in-flight request coalescing.
//!
//! When multiple callers ask for the same year simultaneously, only one
//! underlying read runs; every other caller subscribes to the same
//! broadcast result. Loads for different years run concurrently and never
//! serialize against each other or against cache hits.
//!
//! The cache is bounded: when an insertion pushes it past capacity, the
//! entry with the numerically smallest year is evicted. Eviction is by
//! year key, not recency of access; see DESIGN.md for why that choice is
//! kept.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use epi_map_corpus_models::YearTable;
use tokio::sync::{Mutex, broadcast};

use crate::{LoadError, YearSource};

/// Default bound on the number of cached years.
pub const DEFAULT_CACHE_CAPACITY: usize = 20;

/// Counters for observing coalescing effectiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Total `load` calls.
    pub total_requests: u64,
    /// Calls answered from the cache without I/O.
    pub cache_hits: u64,
    /// Calls that joined an already in-flight load.
    pub coalesced_requests: u64,
    /// Calls that started a new underlying load.
    pub new_loads: u64,
    /// Entries evicted to enforce the capacity bound.
    pub evictions: u64,
}

type LoadResult = Result<Arc<YearTable>, LoadError>;

/// Mutable cache state; owned by one mutex so lookups, insertions, and
/// evictions never race.
#[derive(Default)]
struct CacheInner {
    cached: BTreeMap<i32, Arc<YearTable>>,
    in_flight: HashMap<i32, broadcast::Sender<LoadResult>>,
    /// Year of the most recent request; completions for older requests do
    /// not advance the last-loaded snapshot.
    newest_request: Option<i32>,
    last_loaded: Option<i32>,
    stats: CacheStats,
}

/// What a `load` call turned out to be, decided under one lock hold.
enum Role {
    Hit(Arc<YearTable>),
    Join(broadcast::Receiver<LoadResult>),
    Lead(broadcast::Sender<LoadResult>),
}

/// Bounded, coalescing cache of per-year record tables.
pub struct YearCache {
    capacity: usize,
    inner: Arc<Mutex<CacheInner>>,
}

impl YearCache {
    /// Creates a cache bounded to `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Arc::new(Mutex::new(CacheInner::default())),
        }
    }

    /// Returns the records for `year`, reading through `source` at most
    /// once per distinct year regardless of caller concurrency.
    ///
    /// The underlying read runs on a spawned task, so a caller that loses
    /// interest and drops its future does not abort the load for the
    /// other awaiters (or prevent the result from being cached).
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the year cannot be loaded; the same error
    /// is delivered to every awaiter of that load and nothing is cached.
    pub async fn load(&self, year: i32, source: Arc<dyn YearSource>) -> LoadResult {
        let role = {
            let mut guard = self.inner.lock().await;
            let inner = &mut *guard;
            inner.stats.total_requests += 1;
            inner.newest_request = Some(year);

            if let Some(table) = inner.cached.get(&year) {
                inner.stats.cache_hits += 1;
                inner.last_loaded = Some(year);
                Role::Hit(Arc::clone(table))
            } else if let Some(tx) = inner.in_flight.get(&year) {
                inner.stats.coalesced_requests += 1;
                Role::Join(tx.subscribe())
            } else {
                let (tx, _rx) = broadcast::channel(1);
                inner.in_flight.insert(year, tx.clone());
                inner.stats.new_loads += 1;
                Role::Lead(tx)
            }
        };

        match role {
            Role::Hit(table) => Ok(table),
            Role::Join(mut rx) => match rx.recv().await {
                Ok(result) => result,
                Err(_) => Err(LoadError::Interrupted),
            },
            Role::Lead(tx) => {
                let mut rx = tx.subscribe();
                let inner = Arc::clone(&self.inner);
                let capacity = self.capacity;

                tokio::spawn(async move {
                    let result = source
                        .fetch_year(year)
                        .await
                        .map(Arc::new)
                        .map_err(LoadError::from);

                    let mut guard = inner.lock().await;
                    guard.in_flight.remove(&year);

                    if let Ok(table) = &result {
                        guard.cached.insert(year, Arc::clone(table));
                        if guard.cached.len() > capacity {
                            if let Some((evicted, _)) = guard.cached.pop_first() {
                                guard.stats.evictions += 1;
                                log::debug!("Evicted year {evicted} from cache");
                            }
                        }
                        if guard.newest_request == Some(year) {
                            guard.last_loaded = Some(year);
                        } else {
                            log::debug!(
                                "Load for year {year} superseded; keeping last-loaded snapshot"
                            );
                        }
                    }
                    drop(guard);

                    // Ignore send errors: every awaiter may have gone away.
                    let _ = tx.send(result);
                });

                match rx.recv().await {
                    Ok(result) => result,
                    Err(_) => Err(LoadError::Interrupted),
                }
            }
        }
    }

    /// Whether `year` is currently cached.
    pub async fn contains(&self, year: i32) -> bool {
        self.inner.lock().await.cached.contains_key(&year)
    }

    /// Currently cached years, ascending.
    pub async fn cached_years(&self) -> Vec<i32> {
        self.inner.lock().await.cached.keys().copied().collect()
    }

    /// Number of cached years.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.cached.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.cached.is_empty()
    }

    /// Best-effort snapshot of the most recently served year.
    pub async fn last_loaded_year(&self) -> Option<i32> {
        self.inner.lock().await.last_loaded
    }

    /// Snapshot of the coalescing counters.
    pub async fn stats(&self) -> CacheStats {
        self.inner.lock().await.stats
    }
}

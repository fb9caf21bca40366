//! The data store: one-time static load plus the per-year cache.
//!
//! Replaces the shared-singleton loader of the original application with an
//! explicit instance: construct one [`DataStore`] per corpus directory and
//! hand it (behind an [`Arc`]) to whatever consumes it.

use std::path::PathBuf;
use std::sync::Arc;

use epi_map_corpus::{CorpusDir, bins, case_counts, centroids, countries, timeline, totals,
    vaccination};
use epi_map_corpus_models::{StaticTables, YearTable};
use tokio::sync::{Mutex, RwLock, broadcast};

use crate::source::FsYearSource;
use crate::year_cache::DEFAULT_CACHE_CAPACITY;
use crate::{CacheStats, LoadError, YearCache, YearSource};

/// The static tables once loaded, shared between the store and the year
/// source (which resolves entity names through the country table).
pub(crate) type SharedStatics = Arc<RwLock<Option<Arc<StaticTables>>>>;

type StaticResult = Result<Arc<StaticTables>, LoadError>;

/// Owns every dataset: the immutable static tables after a one-time
/// parallel load, and the bounded coalescing cache of per-year records.
pub struct DataStore {
    dir: CorpusDir,
    statics: SharedStatics,
    static_in_flight: Arc<Mutex<Option<broadcast::Sender<StaticResult>>>>,
    load_error: Arc<Mutex<Option<LoadError>>>,
    cache: YearCache,
    source: Arc<dyn YearSource>,
}

impl DataStore {
    /// Creates a store over the corpus rooted at `root` with the default
    /// cache bound.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_capacity(root, DEFAULT_CACHE_CAPACITY)
    }

    /// Creates a store with an explicit per-year cache bound.
    #[must_use]
    pub fn with_capacity(root: impl Into<PathBuf>, capacity: usize) -> Self {
        let dir = CorpusDir::new(root);
        let statics: SharedStatics = Arc::new(RwLock::new(None));
        let source: Arc<dyn YearSource> =
            Arc::new(FsYearSource::new(dir.clone(), Arc::clone(&statics)));

        Self {
            dir,
            statics,
            static_in_flight: Arc::new(Mutex::new(None)),
            load_error: Arc::new(Mutex::new(None)),
            cache: YearCache::new(capacity),
            source,
        }
    }

    /// Loads every static dataset. Idempotent and concurrency-safe: the
    /// first caller fans the datasets out in parallel, concurrent callers
    /// join that same operation, and once the load has succeeded further
    /// calls return the loaded tables immediately.
    ///
    /// # Errors
    ///
    /// Returns the first dataset error. A failed load clears the in-flight
    /// handle so a later call can retry, and records the error for
    /// [`load_error`](Self::load_error).
    pub async fn load_static(&self) -> StaticResult {
        if let Some(tables) = self.statics.read().await.as_ref() {
            return Ok(Arc::clone(tables));
        }

        enum Role {
            Join(broadcast::Receiver<StaticResult>),
            Lead(broadcast::Sender<StaticResult>),
        }

        let role = {
            let mut in_flight = self.static_in_flight.lock().await;
            // A load may have completed while we waited for the handle.
            if let Some(tables) = self.statics.read().await.as_ref() {
                return Ok(Arc::clone(tables));
            }
            if let Some(tx) = in_flight.as_ref() {
                Role::Join(tx.subscribe())
            } else {
                let (tx, _rx) = broadcast::channel(1);
                *in_flight = Some(tx.clone());
                Role::Lead(tx)
            }
        };

        match role {
            Role::Join(mut rx) => match rx.recv().await {
                Ok(result) => result,
                Err(_) => Err(LoadError::Interrupted),
            },
            Role::Lead(tx) => {
                let mut rx = tx.subscribe();
                let dir = self.dir.clone();
                let statics = Arc::clone(&self.statics);
                let in_flight = Arc::clone(&self.static_in_flight);
                let error_slot = Arc::clone(&self.load_error);

                tokio::spawn(async move {
                    let result = run_static_load(&dir).await;
                    match &result {
                        Ok(tables) => {
                            *statics.write().await = Some(Arc::clone(tables));
                            *error_slot.lock().await = None;
                        }
                        Err(err) => {
                            log::error!("Static data load failed: {err}");
                            *error_slot.lock().await = Some(err.clone());
                        }
                    }
                    *in_flight.lock().await = None;
                    let _ = tx.send(result);
                });

                match rx.recv().await {
                    Ok(result) => result,
                    Err(_) => Err(LoadError::Interrupted),
                }
            }
        }
    }

    /// Whether the one-time static load has completed successfully.
    pub async fn is_loaded(&self) -> bool {
        self.statics.read().await.is_some()
    }

    /// The loaded static tables, if the static load has completed.
    pub async fn statics(&self) -> Option<Arc<StaticTables>> {
        self.statics.read().await.as_ref().map(Arc::clone)
    }

    /// The error recorded by the most recent failed static load, if any.
    pub async fn load_error(&self) -> Option<LoadError> {
        self.load_error.lock().await.clone()
    }

    /// Returns the records for one year through the coalescing cache.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the year's file cannot be read or decoded.
    pub async fn year(&self, year: i32) -> Result<Arc<YearTable>, LoadError> {
        self.cache.load(year, Arc::clone(&self.source)).await
    }

    /// The per-year cache (bounds, contents, and counters).
    #[must_use]
    pub const fn cache(&self) -> &YearCache {
        &self.cache
    }

    /// Best-effort snapshot of the most recently served year.
    pub async fn last_loaded_year(&self) -> Option<i32> {
        self.cache.last_loaded_year().await
    }

    /// Snapshot of the per-year cache counters.
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}

/// Fans out every static dataset load.
///
/// Bins, countries, centroids, case counts, global totals, vaccination, and
/// timeline load in parallel; the regional series loads afterwards because
/// its raw-fallback path joins immunization rates from the resolved global
/// series. Optional datasets (case counts, vaccination, regional) degrade
/// to empty tables instead of failing the load.
async fn run_static_load(dir: &CorpusDir) -> StaticResult {
    let (bins, countries, centroids, case_counts, global_totals, vaccination, timeline) =
        tokio::try_join!(
            bins::load(dir),
            countries::load(dir),
            centroids::load(dir),
            optional(case_counts::load(dir), case_counts::FILE),
            totals::load_global(dir),
            optional(vaccination::load(dir), vaccination::FILE),
            timeline::load(dir),
        )
        .map_err(LoadError::from)?;

    let regional = match totals::load_regional(dir, &global_totals).await {
        Ok(records) => records,
        Err(err) => {
            log::warn!("Regional series unavailable ({err}); continuing with empty table");
            Vec::new()
        }
    };

    log::info!(
        "Static data load complete: {} bins, {} countries, {} centroids, {} global totals, {} regional entries",
        bins.len(),
        countries.len(),
        centroids.len(),
        global_totals.len(),
        regional.len(),
    );

    Ok(Arc::new(StaticTables {
        bins,
        countries,
        centroids,
        case_counts,
        global_totals,
        regional,
        vaccination,
        timeline,
    }))
}

/// Degrades an optional dataset load to its empty table, logging why.
async fn optional<T: Default>(
    load: impl Future<Output = Result<T, epi_map_corpus::CorpusError>>,
    name: &str,
) -> Result<T, epi_map_corpus::CorpusError> {
    match load.await {
        Ok(table) => Ok(table),
        Err(err) => {
            log::warn!("Optional dataset {name} unavailable ({err}); continuing with empty table");
            Ok(T::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn write_corpus(root: &Path) {
        std::fs::write(
            root.join("bins.csv"),
            "level,edge_max,height,color\n0,,0.0,#f7fbff\n1,100,0.03,#c6dbef\n2,1000,0.06,#6baed6\n3,10000,0.09,#3182bd\n4,,0.12,#08519c\n",
        )
        .unwrap();
        std::fs::write(
            root.join("countries.csv"),
            "code,name\nUSA,United States\nBRA,Brazil\nIND,India\n",
        )
        .unwrap();
        std::fs::write(
            root.join("centroids.json"),
            r#"{"USA": [0.25, 0.4], "BRA": [0.33, 0.62], "IND": [0.7, 0.45]}"#,
        )
        .unwrap();
        std::fs::write(
            root.join("global_totals.csv"),
            "Entity,Year,cases,immunization_rate_pct,funding\nWorld,1990,350000,75,\nWorld,1991,320000,78,500000\n",
        )
        .unwrap();
        std::fs::write(
            root.join("regional_totals.csv"),
            "Year,cases,Entity,Code,immunization_rate_pct\n1990,350000,World,WORLD,75\n1990,120000,Africa,AFRICA,60\n",
        )
        .unwrap();
        std::fs::write(
            root.join("vaccination_coverage.csv"),
            "Entity,Code,Year,coverage_pct\nUnited States,USA,1990,93\n",
        )
        .unwrap();
        std::fs::write(
            root.join("timeline.json"),
            r#"{"1990": {"category": "milestone", "headline": "h", "subtext": "s"}}"#,
        )
        .unwrap();
        std::fs::write(root.join("case_counts.json"), r#"{"1990": {"USA": 42}}"#).unwrap();
        std::fs::write(root.join("year_1990.csv"), "Code,Bin\nUSA,2\nBRA,3\n").unwrap();
        std::fs::write(root.join("year_1991.csv"), "Code,Bin\nUSA,1\n").unwrap();
    }

    #[tokio::test]
    async fn loads_all_static_datasets() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());

        let store = DataStore::new(dir.path());
        let tables = store.load_static().await.unwrap();

        assert!(store.is_loaded().await);
        assert_eq!(tables.bins.len(), 5);
        assert_eq!(tables.countries.len(), 3);
        assert_eq!(tables.centroids.len(), 3);
        assert_eq!(tables.global_totals.len(), 2);
        assert_eq!(tables.regional.len(), 2);
        assert_eq!(tables.case_count("USA", 1990), Some(42));
        assert_eq!(tables.vaccination_rate("USA", 1990), Some(93.0));
        assert_eq!(tables.timeline[&1990].category, "milestone");
    }

    #[tokio::test]
    async fn concurrent_and_repeat_calls_share_one_load() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());

        let store = Arc::new(DataStore::new(dir.path()));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.load_static().await }));
        }
        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }

        // Every caller observes the same table instance.
        for tables in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], tables));
        }

        // A sequential call after completion is a no-op returning the same
        // instance.
        let again = store.load_static().await.unwrap();
        assert!(Arc::ptr_eq(&results[0], &again));
    }

    #[tokio::test]
    async fn missing_required_dataset_fails_then_allows_retry() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        std::fs::remove_file(dir.path().join("bins.csv")).unwrap();

        let store = DataStore::new(dir.path());
        let err = store.load_static().await.unwrap_err();
        assert!(matches!(
            err.as_corpus(),
            Some(epi_map_corpus::CorpusError::FileNotFound(name)) if name == "bins.csv"
        ));
        assert!(!store.is_loaded().await);
        assert!(store.load_error().await.is_some());

        // Restoring the file makes a retry succeed.
        write_corpus(dir.path());
        store.load_static().await.unwrap();
        assert!(store.is_loaded().await);
        assert!(store.load_error().await.is_none());
    }

    #[tokio::test]
    async fn optional_datasets_degrade_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        std::fs::remove_file(dir.path().join("case_counts.json")).unwrap();
        std::fs::remove_file(dir.path().join("vaccination_coverage.csv")).unwrap();
        std::fs::remove_file(dir.path().join("regional_totals.csv")).unwrap();

        let store = DataStore::new(dir.path());
        let tables = store.load_static().await.unwrap();

        assert!(tables.case_counts.is_empty());
        assert!(tables.vaccination.is_empty());
        assert!(tables.regional.is_empty());
    }

    #[tokio::test]
    async fn regional_raw_fallback_joins_global_rates() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        std::fs::remove_file(dir.path().join("regional_totals.csv")).unwrap();
        std::fs::write(
            dir.path().join("cases_by_region.csv"),
            "Entity,Code,Year,cases\nUnited States,USA,1990,5000\nAfrica,,1990,120000\nWorld,,1991,320000\n",
        )
        .unwrap();

        let store = DataStore::new(dir.path());
        let tables = store.load_static().await.unwrap();

        assert_eq!(tables.regional.len(), 2);
        let africa = &tables.regional[0];
        assert_eq!(africa.code, "AFRICA");
        assert!((africa.immunization_rate_pct - 75.0).abs() < f64::EPSILON);
        let world = &tables.regional[1];
        assert_eq!(world.code, "WORLD");
        assert!((world.immunization_rate_pct - 78.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn year_loads_resolve_entities_after_static_load() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());

        let store = DataStore::new(dir.path());
        store.load_static().await.unwrap();

        let table = store.year(1990).await.unwrap();
        assert_eq!(table.get("USA").unwrap().entity, "United States");
        assert_eq!(table.get("USA").unwrap().value, 0);
        assert_eq!(table.get("BRA").unwrap().bin, 3);
        assert_eq!(store.last_loaded_year().await, Some(1990));
    }

    #[tokio::test]
    async fn missing_year_file_surfaces_only_to_that_caller() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());

        let store = DataStore::new(dir.path());
        store.load_static().await.unwrap();

        store.year(1990).await.unwrap();
        let err = store.year(1900).await.unwrap_err();
        assert!(matches!(
            err.as_corpus(),
            Some(epi_map_corpus::CorpusError::FileNotFound(_))
        ));

        // The failure leaves the cache and other years untouched.
        assert_eq!(store.cache().cached_years().await, vec![1990]);
        store.year(1991).await.unwrap();
        assert_eq!(store.cache().cached_years().await, vec![1990, 1991]);
    }

    /// A completed load is final: breaking the corpus afterwards changes
    /// nothing because the fan-out never reruns.
    #[tokio::test]
    async fn successful_load_is_never_rerun() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());

        let store = DataStore::new(dir.path());
        let first = store.load_static().await.unwrap();

        // Corrupt the corpus; a rerun fan-out would now fail.
        std::fs::remove_file(dir.path().join("bins.csv")).unwrap();
        let second = store.load_static().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}

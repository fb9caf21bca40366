//! Debounced year selection.
//!
//! The presentation layer drives a year slider far faster than per-year
//! files should be read. [`YearSelector`] accepts every selection
//! immediately on a watch channel (so subscribed views can react to the
//! "year changed" signal right away) but waits out a short debounce window
//! before committing a cache load, so scrubbing across twenty years costs
//! one read, not twenty.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::DataStore;

/// Default pause before a selected year is committed to a load.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(150);

/// Debounced "current year" channel over a [`DataStore`].
pub struct YearSelector {
    tx: watch::Sender<i32>,
}

impl YearSelector {
    /// Creates a selector seeded with `initial_year`, committing loads
    /// through `store` after the default debounce window.
    #[must_use]
    pub fn new(store: Arc<DataStore>, initial_year: i32) -> Self {
        Self::with_debounce(store, initial_year, DEFAULT_DEBOUNCE)
    }

    /// Creates a selector with an explicit debounce window.
    #[must_use]
    pub fn with_debounce(store: Arc<DataStore>, initial_year: i32, debounce: Duration) -> Self {
        let (tx, rx) = watch::channel(initial_year);
        tokio::spawn(run(store, rx, debounce));
        Self { tx }
    }

    /// Selects a year. Re-selecting the current year is a no-op.
    pub fn select(&self, year: i32) {
        self.tx.send_if_modified(|current| {
            if *current == year {
                false
            } else {
                *current = year;
                true
            }
        });
    }

    /// Subscribes to year changes. The receiver observes every selection,
    /// not just the debounced commits.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<i32> {
        self.tx.subscribe()
    }

    /// The currently selected year.
    #[must_use]
    pub fn current(&self) -> i32 {
        *self.tx.borrow()
    }
}

/// Watches the channel and commits the newest selection once it has been
/// stable for the debounce window. Exits when the selector is dropped.
async fn run(store: Arc<DataStore>, mut rx: watch::Receiver<i32>, debounce: Duration) {
    while rx.changed().await.is_ok() {
        loop {
            tokio::time::sleep(debounce).await;
            if rx.has_changed().unwrap_or(false) {
                rx.borrow_and_update();
            } else {
                break;
            }
        }

        let year = *rx.borrow_and_update();
        match store.year(year).await {
            Ok(table) => log::debug!("Committed year {year} ({} records)", table.len()),
            Err(err) => log::warn!("Failed to load year {year}: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_years(root: &std::path::Path, years: std::ops::Range<i32>) {
        std::fs::write(root.join("countries.csv"), "code,name\nUSA,United States\n").unwrap();
        for year in years {
            std::fs::write(
                root.join(format!("year_{year}.csv")),
                "Code,Bin\nUSA,2\n",
            )
            .unwrap();
        }
    }

    /// All selections happen synchronously before the debounce task can
    /// run at all (current-thread runtime, no await points between sends),
    /// so exactly one load is committed: the newest year.
    #[tokio::test]
    async fn rapid_selections_commit_once() {
        let dir = tempfile::tempdir().unwrap();
        write_years(dir.path(), 1980..1990);

        let store = Arc::new(DataStore::new(dir.path()));
        let selector =
            YearSelector::with_debounce(Arc::clone(&store), 1980, Duration::from_millis(50));

        for year in 1981..1989 {
            selector.select(year);
        }
        assert_eq!(selector.current(), 1988);

        // Let the debounce window elapse and the committed load finish.
        tokio::time::sleep(Duration::from_millis(400)).await;

        let stats = store.cache_stats().await;
        assert_eq!(stats.new_loads, 1);
        assert!(store.cache().contains(1988).await);
        assert_eq!(store.last_loaded_year().await, Some(1988));
    }

    #[tokio::test]
    async fn separated_selections_each_commit() {
        let dir = tempfile::tempdir().unwrap();
        write_years(dir.path(), 1980..1990);

        let store = Arc::new(DataStore::new(dir.path()));
        let selector =
            YearSelector::with_debounce(Arc::clone(&store), 1980, Duration::from_millis(20));

        selector.select(1985);
        tokio::time::sleep(Duration::from_millis(200)).await;
        selector.select(1986);
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(store.cache().contains(1985).await);
        assert!(store.cache().contains(1986).await);
        assert_eq!(store.cache_stats().await.new_loads, 2);
    }

    #[tokio::test]
    async fn reselecting_current_year_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        write_years(dir.path(), 1980..1982);

        let store = Arc::new(DataStore::new(dir.path()));
        let selector =
            YearSelector::with_debounce(Arc::clone(&store), 1980, Duration::from_millis(20));

        selector.select(1980);
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(store.cache_stats().await.total_requests, 0);
    }

    #[tokio::test]
    async fn subscribers_observe_every_selection() {
        let dir = tempfile::tempdir().unwrap();
        write_years(dir.path(), 1980..1990);

        let store = Arc::new(DataStore::new(dir.path()));
        let selector = YearSelector::new(store, 1980);
        let mut rx = selector.subscribe();

        selector.select(1983);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 1983);

        selector.select(1984);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 1984);
    }
}

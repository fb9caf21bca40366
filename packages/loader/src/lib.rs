#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dataset loading, request coalescing, and caching.
//!
//! [`DataStore`] owns the one-time parallel load of every static dataset
//! and the bounded per-year cache. Concurrent callers never trigger
//! duplicate reads: the static load shares a single in-flight operation,
//! and per-year requests coalesce onto one load per distinct year.
//! [`YearSelector`] debounces rapid year selections (slider scrubbing)
//! into individual committed loads and exposes the "year changed" channel
//! the presentation layer subscribes to.

mod selector;
mod source;
mod store;
mod year_cache;

use std::sync::Arc;

use epi_map_corpus::CorpusError;

pub use selector::{DEFAULT_DEBOUNCE, YearSelector};
pub use source::YearSource;
pub use store::DataStore;
pub use year_cache::{CacheStats, DEFAULT_CACHE_CAPACITY, YearCache};

/// Errors surfaced to loader callers.
///
/// Cloneable so one failed load can be delivered to every coalesced
/// awaiter; the underlying corpus error is shared behind an [`Arc`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    /// Corpus read or parse failure.
    #[error("{0}")]
    Corpus(Arc<CorpusError>),

    /// The owning load task went away before broadcasting a result.
    #[error("load interrupted before completing")]
    Interrupted,
}

impl From<CorpusError> for LoadError {
    fn from(err: CorpusError) -> Self {
        Self::Corpus(Arc::new(err))
    }
}

impl LoadError {
    /// The underlying corpus error, if this is a corpus failure.
    #[must_use]
    pub fn as_corpus(&self) -> Option<&CorpusError> {
        match self {
            Self::Corpus(err) => Some(err),
            Self::Interrupted => None,
        }
    }
}

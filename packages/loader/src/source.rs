//! The per-year record source seam.
//!
//! The cache loads through [`YearSource`] rather than touching the
//! filesystem directly, so tests can substitute counting or failing
//! sources and verify the coalescing protocol.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use epi_map_corpus::{CorpusDir, CorpusError, years};
use epi_map_corpus_models::YearTable;

use crate::store::SharedStatics;

/// Provides the record set for a single year.
#[async_trait]
pub trait YearSource: Send + Sync {
    /// Reads and parses the records for `year`.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError`] if the year's data cannot be read or
    /// decoded.
    async fn fetch_year(&self, year: i32) -> Result<YearTable, CorpusError>;
}

/// Filesystem-backed source reading `year_<YEAR>.csv` from a corpus
/// directory.
///
/// Entity names for two-column rows resolve through the loaded country
/// table; before the static load completes, resolution falls back to the
/// raw country codes.
pub(crate) struct FsYearSource {
    dir: CorpusDir,
    statics: SharedStatics,
}

impl FsYearSource {
    /// Creates a source over `dir`, resolving entity names through the
    /// shared static tables once they are loaded.
    pub(crate) fn new(dir: CorpusDir, statics: SharedStatics) -> Self {
        Self { dir, statics }
    }
}

#[async_trait]
impl YearSource for FsYearSource {
    async fn fetch_year(&self, year: i32) -> Result<YearTable, CorpusError> {
        let tables = self.statics.read().await.as_ref().map(Arc::clone);
        match tables {
            Some(tables) => years::load(&self.dir, year, &tables.countries).await,
            None => years::load(&self.dir, year, &HashMap::new()).await,
        }
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Corpus file resolution and record parsers.
//!
//! Each dataset module pairs a pure parser (raw text in, typed table out)
//! with an async loader that resolves the file through [`CorpusDir`].
//! Malformed individual rows are skipped, never fatal; whole-file problems
//! (missing file, non-UTF-8 content, unparseable JSON root) surface as
//! [`CorpusError`].

pub mod bins;
pub mod case_counts;
pub mod centroids;
pub mod countries;
pub mod timeline;
pub mod totals;
pub mod vaccination;
pub mod years;

use std::path::{Path, PathBuf};

/// Errors that can occur while locating or parsing corpus files.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    /// The dataset file was not found in the data subdirectory or the
    /// corpus root.
    #[error("could not find file: {0}")]
    FileNotFound(String),

    /// The file's bytes are not valid UTF-8.
    #[error("could not decode {0} as UTF-8")]
    Decode(String),

    /// The file decoded but its overall structure is wrong (e.g. a JSON
    /// dataset whose root is not an object).
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    /// File read failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Name of the subdirectory tried before the corpus root when resolving a
/// dataset file.
const DATA_SUBDIR: &str = "data";

/// A corpus directory on disk.
///
/// Dataset files resolve by trying `<root>/data/<name>` first, then
/// `<root>/<name>`.
#[derive(Debug, Clone)]
pub struct CorpusDir {
    root: PathBuf,
}

impl CorpusDir {
    /// Creates a handle for the corpus rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The corpus root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a dataset file name to an existing path, if any.
    async fn resolve(&self, name: &str) -> Option<PathBuf> {
        let in_subdir = self.root.join(DATA_SUBDIR).join(name);
        if tokio::fs::try_exists(&in_subdir).await.unwrap_or(false) {
            return Some(in_subdir);
        }
        let in_root = self.root.join(name);
        if tokio::fs::try_exists(&in_root).await.unwrap_or(false) {
            return Some(in_root);
        }
        None
    }

    /// Reads a dataset file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError::FileNotFound`] if the name resolves nowhere,
    /// [`CorpusError::Decode`] if the content is not UTF-8, or
    /// [`CorpusError::Io`] if the read itself fails.
    pub async fn read(&self, name: &str) -> Result<String, CorpusError> {
        let path = self
            .resolve(name)
            .await
            .ok_or_else(|| CorpusError::FileNotFound(name.to_string()))?;

        log::debug!("Reading {}", path.display());
        let bytes = tokio::fs::read(&path).await?;
        String::from_utf8(bytes).map_err(|_| CorpusError::Decode(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prefers_data_subdirectory_over_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data").join("bins.csv"), "subdir").unwrap();
        std::fs::write(dir.path().join("bins.csv"), "root").unwrap();

        let corpus = CorpusDir::new(dir.path());
        assert_eq!(corpus.read("bins.csv").await.unwrap(), "subdir");
    }

    #[tokio::test]
    async fn falls_back_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bins.csv"), "root").unwrap();

        let corpus = CorpusDir::new(dir.path());
        assert_eq!(corpus.read("bins.csv").await.unwrap(), "root");
    }

    #[tokio::test]
    async fn missing_file_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = CorpusDir::new(dir.path());

        let err = corpus.read("bins.csv").await.unwrap_err();
        assert!(matches!(err, CorpusError::FileNotFound(name) if name == "bins.csv"));
    }

    #[tokio::test]
    async fn non_utf8_content_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bins.csv"), [0xFF, 0xFE, 0x00]).unwrap();

        let corpus = CorpusDir::new(dir.path());
        let err = corpus.read("bins.csv").await.unwrap_err();
        assert!(matches!(err, CorpusError::Decode(name) if name == "bins.csv"));
    }
}

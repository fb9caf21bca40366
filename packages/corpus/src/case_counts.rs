//! Authoritative per-country case counts (`case_counts.json`).
//!
//! A JSON object keyed by year string; each value maps country code to an
//! integer count. This dataset is optional — the per-year bin files carry
//! only a coarse value, and this lookup overrides it where present.

use epi_map_corpus_models::CaseCountTable;

use crate::{CorpusDir, CorpusError};

/// Dataset file name.
pub const FILE: &str = "case_counts.json";

/// Parses the case-count lookup from JSON text.
///
/// # Errors
///
/// Returns [`CorpusError`] if the text is not valid JSON or the root is
/// not an object. Individual malformed entries are skipped.
pub fn parse(text: &str) -> Result<CaseCountTable, CorpusError> {
    let root: serde_json::Value = serde_json::from_str(text)?;
    let object = root.as_object().ok_or_else(|| {
        CorpusError::InvalidFormat("case counts root is not an object".to_string())
    })?;

    let mut table = CaseCountTable::new();

    for (key, value) in object {
        let Ok(year) = key.trim().parse::<i32>() else {
            continue;
        };
        let Some(by_code) = value.as_object() else {
            continue;
        };

        let entry = table.entry(year).or_default();
        for (code, count) in by_code {
            let Some(count) = count.as_u64() else {
                continue;
            };
            entry.insert(code.clone(), count);
        }
    }

    Ok(table)
}

/// Loads and parses the case-count lookup.
///
/// # Errors
///
/// Returns [`CorpusError`] if the file is missing, cannot be decoded, or
/// is not a JSON object. Callers treat this dataset as optional and degrade
/// to an empty table.
pub async fn load(dir: &CorpusDir) -> Result<CaseCountTable, CorpusError> {
    let text = dir.read(FILE).await?;
    let table = parse(&text)?;
    let entries: usize = table.values().map(std::collections::HashMap::len).sum();
    log::info!("Loaded {entries} case counts across {} years", table.len());
    Ok(table)
}

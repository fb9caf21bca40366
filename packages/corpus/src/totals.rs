//! Global and regional totals series.
//!
//! The global series (`global_totals.csv`) carries one row per year:
//! `_, year, cases, immunization_rate, funding` with the funding column
//! frequently empty. The regional series has two source shapes: a
//! purpose-built export (`regional_totals.csv`) with
//! `year, cases, entity, code, immunization_rate` rows, and a raw fallback
//! (`cases_by_region.csv`) with `entity, code, year, cases` rows in which
//! only empty-code rows are regional aggregates. The fallback path derives
//! immunization rates from the already-resolved global series, which is why
//! regional loading is sequenced after the global series.

use std::collections::BTreeMap;

use epi_map_corpus_models::region::region_code;
use epi_map_corpus_models::{GlobalTotals, RegionalRecord};

use crate::{CorpusDir, CorpusError};

/// Global series file name.
pub const GLOBAL_FILE: &str = "global_totals.csv";

/// Purpose-built regional series file name.
pub const REGIONAL_FILE: &str = "regional_totals.csv";

/// Raw regional fallback file name.
pub const REGIONAL_RAW_FILE: &str = "cases_by_region.csv";

/// Parses the global totals series. Malformed rows are skipped; duplicate
/// years overwrite so the last row wins. The result is sorted by year.
#[must_use]
pub fn parse_global(text: &str) -> Vec<GlobalTotals> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut by_year: BTreeMap<i32, GlobalTotals> = BTreeMap::new();

    for result in reader.records() {
        let Ok(record) = result else { continue };
        if record.len() < 4 {
            continue;
        }

        let Ok(year) = record[1].trim().parse::<i32>() else {
            continue;
        };
        let Ok(estimated_cases) = record[2].trim().parse::<f64>() else {
            continue;
        };
        let Ok(immunization_rate_pct) = record[3].trim().parse::<f64>() else {
            continue;
        };

        let funding = record
            .get(4)
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .and_then(|f| f.parse::<f64>().ok());

        by_year.insert(
            year,
            GlobalTotals {
                year,
                estimated_cases,
                immunization_rate_pct,
                funding,
            },
        );
    }

    by_year.into_values().collect()
}

/// Parses the purpose-built regional series. Malformed rows are skipped.
#[must_use]
pub fn parse_regional(text: &str) -> Vec<RegionalRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();

    for result in reader.records() {
        let Ok(record) = result else { continue };
        if record.len() < 5 {
            continue;
        }

        let Ok(year) = record[0].trim().parse::<i32>() else {
            continue;
        };
        let Ok(cases) = record[1].trim().parse::<f64>() else {
            continue;
        };
        let entity = record[2].trim();
        let code = record[3].trim();
        if code.is_empty() {
            continue;
        }
        let Ok(immunization_rate_pct) = record[4].trim().parse::<f64>() else {
            continue;
        };

        records.push(RegionalRecord {
            id: format!("{code}_{year}"),
            entity: entity.to_string(),
            code: code.to_string(),
            year,
            cases,
            immunization_rate_pct,
        });
    }

    records
}

/// Parses regional aggregates out of the raw per-country export.
///
/// Only rows with an empty country code are regional aggregates (including
/// the literal `World` entity, canonicalized to the fixed world code).
/// Immunization rates are looked up from the already-loaded global series
/// by year, defaulting to 0 when the year is not covered.
#[must_use]
pub fn parse_regional_raw(text: &str, globals: &[GlobalTotals]) -> Vec<RegionalRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();

    for result in reader.records() {
        let Ok(record) = result else { continue };
        if record.len() < 4 {
            continue;
        }

        // Rows with a country code are per-country data, not aggregates.
        if !record[1].trim().is_empty() {
            continue;
        }

        let entity = record[0].trim();
        if entity.is_empty() {
            continue;
        }
        let Ok(year) = record[2].trim().parse::<i32>() else {
            continue;
        };
        let Ok(cases) = record[3].trim().parse::<f64>() else {
            continue;
        };

        let code = region_code(entity);
        let immunization_rate_pct = globals
            .iter()
            .find(|t| t.year == year)
            .map_or(0.0, |t| t.immunization_rate_pct);

        records.push(RegionalRecord {
            id: format!("{code}_{year}"),
            entity: entity.to_string(),
            code,
            year,
            cases,
            immunization_rate_pct,
        });
    }

    records
}

/// Loads and parses the global totals series.
///
/// # Errors
///
/// Returns [`CorpusError`] if the file is missing or cannot be decoded.
pub async fn load_global(dir: &CorpusDir) -> Result<Vec<GlobalTotals>, CorpusError> {
    let text = dir.read(GLOBAL_FILE).await?;
    let totals = parse_global(&text);
    log::info!("Loaded {} global totals entries", totals.len());
    Ok(totals)
}

/// Loads the regional series, preferring the purpose-built export and
/// falling back to the raw per-country file.
///
/// Must run after the global series has resolved: the fallback path joins
/// immunization rates from it.
///
/// # Errors
///
/// Returns [`CorpusError`] if neither regional file can be loaded.
pub async fn load_regional(
    dir: &CorpusDir,
    globals: &[GlobalTotals],
) -> Result<Vec<RegionalRecord>, CorpusError> {
    match dir.read(REGIONAL_FILE).await {
        Ok(text) => {
            let records = parse_regional(&text);
            log::info!("Loaded {} regional entries", records.len());
            Ok(records)
        }
        Err(CorpusError::FileNotFound(_)) => {
            log::debug!("{REGIONAL_FILE} not present, trying raw fallback");
            let text = dir.read(REGIONAL_RAW_FILE).await?;
            let records = parse_regional_raw(&text, globals);
            log::info!("Loaded {} regional entries from raw fallback", records.len());
            Ok(records)
        }
        Err(e) => Err(e),
    }
}

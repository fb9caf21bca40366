//! Severity bin definitions (`bins.csv`).
//!
//! Rows are `level, edge_max, height, color_hex` with a header row. The
//! parsed table is sorted by level so a record's bin index can be used as a
//! dense 0-based lookup.

use epi_map_corpus_models::{Bin, Rgba};

use crate::{CorpusDir, CorpusError};

/// Dataset file name.
pub const FILE: &str = "bins.csv";

/// Parses the bin table from CSV text. Malformed rows are skipped.
#[must_use]
pub fn parse(text: &str) -> Vec<Bin> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut bins: Vec<Bin> = Vec::new();

    for result in reader.records() {
        let Ok(record) = result else { continue };
        if record.len() < 4 {
            continue;
        }

        let Ok(level) = record[0].trim().parse::<u32>() else {
            continue;
        };
        let Ok(height) = record[2].trim().parse::<f32>() else {
            continue;
        };

        let edge_field = record[1].trim();
        let edge_max = if edge_field.is_empty() {
            None
        } else {
            edge_field.parse::<u64>().ok()
        };

        let color = Rgba::from_hex(&record[3]).unwrap_or(Rgba::GRAY);

        bins.push(Bin {
            level,
            edge_max,
            height,
            color,
        });
    }

    // Sort by level so bin indices are dense and 0-based.
    bins.sort_by_key(|bin| bin.level);
    bins
}

/// Loads and parses the bin table.
///
/// # Errors
///
/// Returns [`CorpusError`] if the file is missing or cannot be decoded.
pub async fn load(dir: &CorpusDir) -> Result<Vec<Bin>, CorpusError> {
    let text = dir.read(FILE).await?;
    let bins = parse(&text);
    log::info!("Loaded {} severity bins", bins.len());
    Ok(bins)
}

//! Country metadata (`countries.csv`).
//!
//! Rows are `code, name` with a header row. Duplicate codes overwrite so
//! the last row wins.

use std::collections::HashMap;

use epi_map_corpus_models::Country;

use crate::{CorpusDir, CorpusError};

/// Dataset file name.
pub const FILE: &str = "countries.csv";

/// Parses the country table from CSV text. Malformed rows are skipped.
#[must_use]
pub fn parse(text: &str) -> HashMap<String, Country> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut countries = HashMap::new();

    for result in reader.records() {
        let Ok(record) = result else { continue };
        if record.len() < 2 {
            continue;
        }

        let code = record[0].trim();
        let name = record[1].trim();
        if code.is_empty() || name.is_empty() {
            continue;
        }

        countries.insert(
            code.to_string(),
            Country {
                code: code.to_string(),
                name: name.to_string(),
            },
        );
    }

    countries
}

/// Loads and parses the country table.
///
/// # Errors
///
/// Returns [`CorpusError`] if the file is missing or cannot be decoded.
pub async fn load(dir: &CorpusDir) -> Result<HashMap<String, Country>, CorpusError> {
    let text = dir.read(FILE).await?;
    let countries = parse(&text);
    log::info!("Loaded {} countries", countries.len());
    Ok(countries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_code_name_pairs() {
        let countries = parse("code,name\nUSA,United States\nBRA,Brazil\n");
        assert_eq!(countries.len(), 2);
        assert_eq!(countries["USA"].name, "United States");
        assert_eq!(countries["BRA"].code, "BRA");
    }

    #[test]
    fn duplicate_codes_last_write_wins() {
        let countries = parse("code,name\nUSA,First\nUSA,Second\n");
        assert_eq!(countries.len(), 1);
        assert_eq!(countries["USA"].name, "Second");
    }

    #[test]
    fn skips_short_and_empty_rows() {
        let countries = parse("code,name\nUSA\n\nBRA,Brazil\n");
        assert_eq!(countries.len(), 1);
        assert!(countries.contains_key("BRA"));
    }
}

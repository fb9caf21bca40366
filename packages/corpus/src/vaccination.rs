//! Country-specific vaccination coverage (`vaccination_coverage.csv`).
//!
//! Rows are `_, code, year, rate` with a header row. Only true per-country
//! rows are kept: rows with an empty code or an aggregate pseudo-code are
//! skipped, since aggregate coverage comes from the global series.

use epi_map_corpus_models::VaccinationTable;

use crate::{CorpusDir, CorpusError};

/// Dataset file name.
pub const FILE: &str = "vaccination_coverage.csv";

/// Marker prefix for aggregate pseudo-codes in the source export.
const AGGREGATE_PREFIX: &str = "OWID_";

/// Parses the vaccination coverage table. Malformed rows are skipped.
#[must_use]
pub fn parse(text: &str) -> VaccinationTable {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut table = VaccinationTable::new();

    for result in reader.records() {
        let Ok(record) = result else { continue };
        if record.len() < 4 {
            continue;
        }

        let code = record[1].trim();
        if code.is_empty() || code.starts_with(AGGREGATE_PREFIX) {
            continue;
        }
        let Ok(year) = record[2].trim().parse::<i32>() else {
            continue;
        };
        let Ok(rate) = record[3].trim().parse::<f64>() else {
            continue;
        };

        table.entry(year).or_default().insert(code.to_string(), rate);
    }

    table
}

/// Loads and parses the vaccination coverage table.
///
/// # Errors
///
/// Returns [`CorpusError`] if the file is missing or cannot be decoded.
pub async fn load(dir: &CorpusDir) -> Result<VaccinationTable, CorpusError> {
    let text = dir.read(FILE).await?;
    let table = parse(&text);
    let entries: usize = table.values().map(std::collections::HashMap::len).sum();
    log::info!(
        "Loaded {entries} vaccination coverage entries across {} years",
        table.len()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Entity,Code,Year,coverage_pct\n\
                          United States,USA,1990,93\n\
                          World,OWID_WRL,1990,75\n\
                          Somewhere,,1990,50\n\
                          Brazil,BRA,1991,88\n";

    #[test]
    fn keeps_only_per_country_rows() {
        let table = parse(SAMPLE);
        assert_eq!(table.len(), 2);
        assert!((table[&1990]["USA"] - 93.0).abs() < f64::EPSILON);
        assert!(!table[&1990].contains_key("OWID_WRL"));
        assert_eq!(table[&1990].len(), 1);
    }

    #[test]
    fn groups_by_year() {
        let table = parse(SAMPLE);
        assert!((table[&1991]["BRA"] - 88.0).abs() < f64::EPSILON);
    }

    #[test]
    fn skips_unparseable_rates() {
        let table = parse("Entity,Code,Year,coverage_pct\nX,USA,1990,high\n");
        assert!(table.is_empty());
    }
}

//! Per-year country records (`year_<YEAR>.csv`).
//!
//! Two historical row shapes exist: the 2000-2002 exports carry
//! `code, entity, value, bin` while later exports carry only `code, bin`.
//! Each row is detected by width, captured as a tagged [`YearRow`], and
//! resolved into a canonical [`YearRecord`] immediately so downstream code
//! never branches on row shape again.

use std::collections::HashMap;

use epi_map_corpus_models::{Country, YearRecord, YearTable};

use crate::{CorpusDir, CorpusError};

/// File name for a given year.
#[must_use]
pub fn file_name(year: i32) -> String {
    format!("year_{year}.csv")
}

/// A raw year-file row in one of the two historical shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearRow {
    /// `code, entity, value, bin`.
    Four {
        /// Country code.
        code: String,
        /// Entity display name carried by the row itself.
        entity: String,
        /// Coarse case value.
        value: u64,
        /// Severity bin index.
        bin: u32,
    },
    /// `code, bin`.
    Two {
        /// Country code.
        code: String,
        /// Severity bin index.
        bin: u32,
    },
}

impl YearRow {
    /// Detects the row shape by width. Returns `None` for rows that fit
    /// neither shape.
    fn from_record(record: &csv::StringRecord) -> Option<Self> {
        if record.len() >= 4 {
            let code = record[0].trim();
            if code.is_empty() {
                return None;
            }
            let bin = record[3].trim().parse::<u32>().ok()?;
            Some(Self::Four {
                code: code.to_string(),
                entity: record[1].trim().to_string(),
                value: record[2].trim().parse::<u64>().unwrap_or(0),
                bin,
            })
        } else if record.len() >= 2 {
            let code = record[0].trim();
            if code.is_empty() {
                return None;
            }
            let bin = record[1].trim().parse::<u32>().ok()?;
            Some(Self::Two {
                code: code.to_string(),
                bin,
            })
        } else {
            None
        }
    }

    /// Resolves this row into the canonical record shape.
    ///
    /// Two-column rows resolve `entity` through the country table (falling
    /// back to the raw code) and default `value` to 0 — the authoritative
    /// count comes from the case-count dataset, not this column.
    #[must_use]
    pub fn resolve(self, countries: &HashMap<String, Country>) -> YearRecord {
        match self {
            Self::Four {
                code,
                entity,
                value,
                bin,
            } => YearRecord {
                code,
                entity,
                value,
                bin,
            },
            Self::Two { code, bin } => {
                let entity = countries
                    .get(&code)
                    .map_or_else(|| code.clone(), |c| c.name.clone());
                YearRecord {
                    code,
                    entity,
                    value: 0,
                    bin,
                }
            }
        }
    }
}

/// Parses one year file into a [`YearTable`]. Malformed rows are skipped.
#[must_use]
pub fn parse(text: &str, year: i32, countries: &HashMap<String, Country>) -> YearTable {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = HashMap::new();

    for result in reader.records() {
        let Ok(record) = result else { continue };
        let Some(row) = YearRow::from_record(&record) else {
            continue;
        };
        let resolved = row.resolve(countries);
        records.insert(resolved.code.clone(), resolved);
    }

    YearTable { year, records }
}

/// Loads and parses the records for one year.
///
/// # Errors
///
/// Returns [`CorpusError`] if the year file is missing or cannot be
/// decoded.
pub async fn load(
    dir: &CorpusDir,
    year: i32,
    countries: &HashMap<String, Country>,
) -> Result<YearTable, CorpusError> {
    let text = dir.read(&file_name(year)).await?;
    let table = parse(&text, year, countries);
    log::info!("Loaded {} records for year {year}", table.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn country_table() -> HashMap<String, Country> {
        let mut countries = HashMap::new();
        countries.insert(
            "USA".to_string(),
            Country {
                code: "USA".to_string(),
                name: "United States".to_string(),
            },
        );
        countries
    }

    #[test]
    fn four_column_row_keeps_value_and_entity() {
        let table = parse(
            "Code,Entity,Value,Bin\nUSA,United States,12,3\n",
            2001,
            &country_table(),
        );
        let usa = table.get("USA").unwrap();
        assert_eq!(usa.entity, "United States");
        assert_eq!(usa.value, 12);
        assert_eq!(usa.bin, 3);
    }

    #[test]
    fn two_column_row_resolves_entity_and_defaults_value() {
        let table = parse("Code,Bin\nUSA,3\n", 2005, &country_table());
        let usa = table.get("USA").unwrap();
        assert_eq!(usa.entity, "United States");
        assert_eq!(usa.value, 0);
        assert_eq!(usa.bin, 3);
    }

    #[test]
    fn both_shapes_normalize_to_the_same_bin() {
        let countries = country_table();
        let four = parse("Code,Entity,Value,Bin\nUSA,United States,12,3\n", 2001, &countries);
        let two = parse("Code,Bin\nUSA,3\n", 2005, &countries);
        assert_eq!(four.get("USA").unwrap().bin, two.get("USA").unwrap().bin);
    }

    #[test]
    fn unknown_code_falls_back_to_raw_code() {
        let table = parse("Code,Bin\nXYZ,1\n", 2005, &country_table());
        assert_eq!(table.get("XYZ").unwrap().entity, "XYZ");
    }

    #[test]
    fn unparseable_bin_skips_row() {
        let table = parse("Code,Bin\nUSA,notabin\nBRA,2\n", 2005, &country_table());
        assert_eq!(table.len(), 1);
        assert!(table.get("BRA").is_some());
    }

    #[test]
    fn unparseable_value_defaults_to_zero() {
        let table = parse(
            "Code,Entity,Value,Bin\nUSA,United States,oops,3\n",
            2001,
            &country_table(),
        );
        assert_eq!(table.get("USA").unwrap().value, 0);
    }

    #[test]
    fn duplicate_codes_last_write_wins() {
        let table = parse("Code,Bin\nUSA,1\nUSA,4\n", 2005, &country_table());
        assert_eq!(table.get("USA").unwrap().bin, 4);
    }
}

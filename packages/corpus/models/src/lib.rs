#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record types for the epidemiological corpus.
//!
//! This crate defines the canonical shapes every dataset normalizes into:
//! case-count severity bins, country metadata, map centroids, per-year
//! country records, global and regional time series, and narrative timeline
//! entries. Parsers in `epi_map_corpus` produce these types; the loader and
//! query layers never see raw file rows.

pub mod region;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// An RGBA color parsed from a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    /// Red channel, 0-255.
    pub r: u8,
    /// Green channel, 0-255.
    pub g: u8,
    /// Blue channel, 0-255.
    pub b: u8,
    /// Alpha channel, 0-255 (255 for 6-digit hex).
    pub a: u8,
}

impl Rgba {
    /// Neutral fallback used when a bin row carries an unparseable color.
    pub const GRAY: Self = Self {
        r: 0x80,
        g: 0x80,
        b: 0x80,
        a: 0xFF,
    };

    /// Parses a 6- or 8-digit hex color, with or without a leading `#`.
    ///
    /// Returns `None` for any other length or for non-hex digits.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');

        let channel = |i: usize| -> Option<u8> {
            u8::from_str_radix(digits.get(i..i + 2)?, 16).ok()
        };

        match digits.len() {
            6 => Some(Self {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
                a: 0xFF,
            }),
            8 => Some(Self {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
                a: channel(6)?,
            }),
            _ => None,
        }
    }
}

/// One case-count severity tier.
///
/// Bins form a dense `0..N` ordering after the parser sorts by level; bin 0
/// means no or negligible cases. A per-year record's `bin` field indexes
/// into the sorted bin table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bin {
    /// Ordinal severity level (0 = no/negligible cases).
    pub level: u32,
    /// Upper edge of the case-count range, `None` for the open-ended top bin
    /// and for bin 0.
    pub edge_max: Option<u64>,
    /// Bar height used by the renderer.
    pub height: f32,
    /// Display color.
    pub color: Rgba,
}

/// ISO/OWID country code mapped to a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    /// Country code; the join key for all per-country data.
    pub code: String,
    /// Human-readable name.
    pub name: String,
}

/// Normalized map position of a country on an equirectangular projection.
///
/// Both components are in `[0, 1]`. Countries without a known position are
/// absent from the centroid table and excluded from spatial rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    /// Normalized longitude position.
    pub x: f32,
    /// Normalized latitude position.
    pub y: f32,
}

/// One country's state in one year.
///
/// Both historical row shapes (four-column and two-column) normalize into
/// this type; downstream code never branches on row shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRecord {
    /// Country code.
    pub code: String,
    /// Display entity name (resolved via the country table for two-column
    /// rows, falling back to the raw code).
    pub entity: String,
    /// Coarse case value carried by four-column rows. Two-column rows
    /// default to 0; authoritative counts live in the case-count dataset.
    pub value: u64,
    /// Severity bin index into the sorted bin table.
    pub bin: u32,
}

/// World or regional totals for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalTotals {
    /// Calendar year.
    pub year: i32,
    /// Estimated cases for the year.
    pub estimated_cases: f64,
    /// Immunization coverage, percent.
    pub immunization_rate_pct: f64,
    /// Funding for the year; absent when the source field is empty.
    pub funding: Option<f64>,
}

/// Aggregate series entry for a named region and year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionalRecord {
    /// Stable identifier, `"<CODE>_<YEAR>"`.
    pub id: String,
    /// Region display name (e.g. "North America").
    pub entity: String,
    /// Canonical region code (uppercase, underscores for spaces).
    pub code: String,
    /// Calendar year.
    pub year: i32,
    /// Estimated cases for the region and year.
    pub cases: f64,
    /// Immunization coverage, percent.
    pub immunization_rate_pct: f64,
}

/// Narrative annotation for a year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    /// Calendar year the entry annotates.
    pub year: i32,
    /// Entry category (e.g. "milestone", "outbreak").
    pub category: String,
    /// Short headline.
    pub headline: String,
    /// Supporting detail text.
    pub subtext: String,
}

impl TimelineEntry {
    /// Generic entry synthesized for years the timeline file does not cover.
    #[must_use]
    pub fn synthesized(year: i32) -> Self {
        Self {
            year,
            category: "progress".to_string(),
            headline: "Eradication efforts continue".to_string(),
            subtext: "Vaccination campaigns and surveillance continue worldwide."
                .to_string(),
        }
    }
}

/// Per-country case counts keyed by year, then country code.
pub type CaseCountTable = BTreeMap<i32, HashMap<String, u64>>;

/// Country-specific vaccination coverage keyed by year, then country code.
pub type VaccinationTable = BTreeMap<i32, HashMap<String, f64>>;

/// All records for a single year, keyed by country code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearTable {
    /// The year these records describe.
    pub year: i32,
    /// Per-country records.
    pub records: HashMap<String, YearRecord>,
}

impl YearTable {
    /// Looks up the record for a country code.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&YearRecord> {
        self.records.get(code)
    }

    /// Number of country records in this year.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether this year has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The merged static state: every dataset that is not loaded per-year.
///
/// Built once by the static loader and shared immutably afterwards.
#[derive(Debug, Clone, Default)]
pub struct StaticTables {
    /// Severity bins sorted by level (dense 0-based index).
    pub bins: Vec<Bin>,
    /// Country code → metadata.
    pub countries: HashMap<String, Country>,
    /// Country code → normalized map position.
    pub centroids: HashMap<String, Centroid>,
    /// Authoritative per-country case counts (optional dataset; may be
    /// empty).
    pub case_counts: CaseCountTable,
    /// World totals series, sorted by year ascending.
    pub global_totals: Vec<GlobalTotals>,
    /// Regional aggregate series.
    pub regional: Vec<RegionalRecord>,
    /// Country-specific vaccination coverage (optional dataset; may be
    /// empty).
    pub vaccination: VaccinationTable,
    /// Narrative timeline entries, at most one per year.
    pub timeline: BTreeMap<i32, TimelineEntry>,
}

impl StaticTables {
    /// Returns the bin definition for a record's bin index.
    #[must_use]
    pub fn bin(&self, level: u32) -> Option<&Bin> {
        self.bins.get(level as usize)
    }

    /// Display name for a country code.
    #[must_use]
    pub fn country_name(&self, code: &str) -> Option<&str> {
        self.countries.get(code).map(|c| c.name.as_str())
    }

    /// Authoritative case count for a country and year, if the case-count
    /// dataset covers it.
    #[must_use]
    pub fn case_count(&self, code: &str, year: i32) -> Option<u64> {
        self.case_counts.get(&year)?.get(code).copied()
    }

    /// Country-specific vaccination coverage for a year, if known.
    #[must_use]
    pub fn vaccination_rate(&self, code: &str, year: i32) -> Option<f64> {
        self.vaccination.get(&year)?.get(code).copied()
    }

    /// World totals entry for a year.
    #[must_use]
    pub fn global_for_year(&self, year: i32) -> Option<&GlobalTotals> {
        self.global_totals.iter().find(|t| t.year == year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_six_digit_hex() {
        let c = Rgba::from_hex("ff8000").unwrap();
        assert_eq!((c.r, c.g, c.b, c.a), (0xFF, 0x80, 0x00, 0xFF));
    }

    #[test]
    fn parses_eight_digit_hex_with_hash() {
        let c = Rgba::from_hex("#11223344").unwrap();
        assert_eq!((c.r, c.g, c.b, c.a), (0x11, 0x22, 0x33, 0x44));
    }

    #[test]
    fn rejects_bad_hex() {
        assert!(Rgba::from_hex("fff").is_none());
        assert!(Rgba::from_hex("zzzzzz").is_none());
        assert!(Rgba::from_hex("").is_none());
    }

    #[test]
    fn synthesized_timeline_entry_carries_year() {
        let entry = TimelineEntry::synthesized(1993);
        assert_eq!(entry.year, 1993);
        assert!(!entry.headline.is_empty());
        assert!(!entry.subtext.is_empty());
    }

    #[test]
    fn static_tables_lookups() {
        let mut tables = StaticTables::default();
        tables.bins.push(Bin {
            level: 0,
            edge_max: None,
            height: 0.0,
            color: Rgba::GRAY,
        });
        tables.countries.insert(
            "USA".to_string(),
            Country {
                code: "USA".to_string(),
                name: "United States".to_string(),
            },
        );
        tables
            .case_counts
            .entry(1990)
            .or_default()
            .insert("USA".to_string(), 42);

        assert_eq!(tables.bin(0).unwrap().level, 0);
        assert!(tables.bin(1).is_none());
        assert_eq!(tables.country_name("USA"), Some("United States"));
        assert_eq!(tables.case_count("USA", 1990), Some(42));
        assert_eq!(tables.case_count("USA", 1991), None);
        assert_eq!(tables.vaccination_rate("USA", 1990), None);
    }
}

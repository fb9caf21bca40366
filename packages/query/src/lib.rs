#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Derived read-only views over the loaded corpus.
//!
//! Every operation joins the static tables with the per-year cache and
//! resolves missing data through documented fallbacks: authoritative case
//! counts fall back to the coarse per-year value, country vaccination
//! coverage falls back to the global rate, and uncovered timeline years get
//! a synthesized entry. A country, region, or year with no data yields an
//! empty or zero result, never an error.

use std::sync::Arc;

use epi_map_corpus_models::region::{AGGREGATE_CODES, region_code};
use epi_map_corpus_models::{GlobalTotals, StaticTables, TimelineEntry};
use epi_map_loader::DataStore;

/// The country (or surviving region row) with the most cases in a year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryCases {
    /// Country code.
    pub code: String,
    /// Display name (country table, falling back to the record's entity).
    pub name: String,
    /// Case count used for the comparison.
    pub cases: u64,
}

/// Read-only query surface over a [`DataStore`].
///
/// Queries call into the per-year cache when a year's records are needed
/// but never perform eviction or coalescing themselves.
pub struct Queries {
    store: Arc<DataStore>,
}

impl Queries {
    /// Creates the query surface for `store`.
    #[must_use]
    pub const fn new(store: Arc<DataStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<DataStore> {
        &self.store
    }

    /// Static tables snapshot; empty until the static load completes.
    async fn statics(&self) -> Arc<StaticTables> {
        self.store.statics().await.unwrap_or_default()
    }

    /// Authoritative case count for a country and year.
    ///
    /// Prefers the case-count dataset; falls back to the coarse `value`
    /// carried by the year record, and to 0 when neither covers the pair.
    pub async fn actual_cases(&self, code: &str, year: i32) -> u64 {
        let statics = self.statics().await;
        if let Some(count) = statics.case_count(code, year) {
            return count;
        }

        match self.store.year(year).await {
            Ok(table) => table.get(code).map_or(0, |record| record.value),
            Err(err) => {
                log::debug!("No year data for {year} ({err}); treating {code} as zero cases");
                0
            }
        }
    }

    /// Country-specific vaccination coverage, if the corpus has it.
    ///
    /// Callers fall back to the global rate themselves (see
    /// [`country_series`](Self::country_series) for the canonical
    /// fallback).
    pub async fn vaccination_rate(&self, code: &str, year: i32) -> Option<f64> {
        self.statics().await.vaccination_rate(code, year)
    }

    /// The totals series for a named region, year ascending.
    ///
    /// The name is canonicalized structurally (uppercase, spaces to
    /// underscores, `"World"` to the fixed world code) and matched against
    /// the regional table. Funding is absent in regional data.
    pub async fn region_series(&self, region_name: &str) -> Vec<GlobalTotals> {
        let statics = self.statics().await;
        let code = region_code(region_name);

        let mut series: Vec<GlobalTotals> = statics
            .regional
            .iter()
            .filter(|record| record.code == code)
            .map(|record| GlobalTotals {
                year: record.year,
                estimated_cases: record.cases,
                immunization_rate_pct: record.immunization_rate_pct,
                funding: None,
            })
            .collect();
        series.sort_by_key(|totals| totals.year);
        series
    }

    /// A totals-shaped series for one country, year ascending.
    ///
    /// One entry per case-count year covering the country; the rate is the
    /// country-specific coverage when known, else the global rate for that
    /// year, else 0.
    pub async fn country_series(&self, code: &str) -> Vec<GlobalTotals> {
        let statics = self.statics().await;

        let mut series = Vec::new();
        for (&year, by_code) in &statics.case_counts {
            let Some(&count) = by_code.get(code) else {
                continue;
            };
            let rate = statics
                .vaccination_rate(code, year)
                .or_else(|| {
                    statics
                        .global_for_year(year)
                        .map(|totals| totals.immunization_rate_pct)
                })
                .unwrap_or(0.0);

            #[allow(clippy::cast_precision_loss)]
            series.push(GlobalTotals {
                year,
                estimated_cases: count as f64,
                immunization_rate_pct: rate,
                funding: None,
            });
        }
        series
    }

    /// The country with the most cases in a year, after excluding the
    /// given aggregate pseudo-codes.
    ///
    /// Case counts join from the case-count dataset, falling back to the
    /// record's coarse value. Ties resolve to the lexicographically
    /// smallest code, so the result is deterministic for a fixed input.
    pub async fn highest_country_or_region(
        &self,
        year: i32,
        exclude: &[&str],
    ) -> Option<CountryCases> {
        let statics = self.statics().await;
        let table = self.store.year(year).await.ok()?;

        let mut codes: Vec<&String> = table.records.keys().collect();
        codes.sort();

        let mut best: Option<CountryCases> = None;
        for code in codes {
            if exclude.contains(&code.as_str()) {
                continue;
            }
            let record = &table.records[code];
            let cases = statics.case_count(code, year).unwrap_or(record.value);

            if best.as_ref().is_none_or(|current| cases > current.cases) {
                best = Some(CountryCases {
                    code: code.clone(),
                    name: statics
                        .country_name(code)
                        .unwrap_or(&record.entity)
                        .to_string(),
                    cases,
                });
            }
        }
        best
    }

    /// The world totals series, year ascending.
    pub async fn global_series(&self) -> Vec<GlobalTotals> {
        self.statics().await.global_totals.clone()
    }

    /// Total cases across countries for a year, aggregate pseudo-codes
    /// excluded. Returns 0 when the year has no data.
    pub async fn global_cases(&self, year: i32) -> u64 {
        let statics = self.statics().await;
        let Ok(table) = self.store.year(year).await else {
            return 0;
        };

        table
            .records
            .values()
            .filter(|record| !AGGREGATE_CODES.contains(&record.code.as_str()))
            .map(|record| statics.case_count(&record.code, year).unwrap_or(record.value))
            .sum()
    }

    /// The narrative entry for a year, synthesized when the timeline does
    /// not cover it.
    pub async fn timeline_entry(&self, year: i32) -> TimelineEntry {
        self.statics()
            .await
            .timeline
            .get(&year)
            .cloned()
            .unwrap_or_else(|| TimelineEntry::synthesized(year))
    }

    /// Display name for a country code, falling back to the code itself.
    pub async fn country_name(&self, code: &str) -> String {
        self.statics()
            .await
            .country_name(code)
            .unwrap_or(code)
            .to_string()
    }
}

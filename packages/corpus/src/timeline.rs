//! Narrative timeline entries (`timeline.json`).
//!
//! A JSON object keyed by year string; each value is an object with
//! `category`, `headline`, and `subtext` keys. Non-conforming entries are
//! skipped. At most one entry exists per year; years the file does not
//! cover get a synthesized generic entry at query time.

use std::collections::BTreeMap;

use epi_map_corpus_models::TimelineEntry;

use crate::{CorpusDir, CorpusError};

/// Dataset file name.
pub const FILE: &str = "timeline.json";

/// Parses the timeline from JSON text.
///
/// # Errors
///
/// Returns [`CorpusError`] if the text is not valid JSON or the root is
/// not an object. Individual non-conforming entries are skipped.
pub fn parse(text: &str) -> Result<BTreeMap<i32, TimelineEntry>, CorpusError> {
    let root: serde_json::Value = serde_json::from_str(text)?;
    let object = root
        .as_object()
        .ok_or_else(|| CorpusError::InvalidFormat("timeline root is not an object".to_string()))?;

    let mut timeline = BTreeMap::new();

    for (key, value) in object {
        let Ok(year) = key.trim().parse::<i32>() else {
            log::debug!("Skipping timeline entry with non-year key {key:?}");
            continue;
        };
        let (Some(category), Some(headline), Some(subtext)) = (
            value.get("category").and_then(serde_json::Value::as_str),
            value.get("headline").and_then(serde_json::Value::as_str),
            value.get("subtext").and_then(serde_json::Value::as_str),
        ) else {
            log::debug!("Skipping non-conforming timeline entry for {year}");
            continue;
        };

        timeline.insert(
            year,
            TimelineEntry {
                year,
                category: category.to_string(),
                headline: headline.to_string(),
                subtext: subtext.to_string(),
            },
        );
    }

    Ok(timeline)
}

/// Loads and parses the timeline.
///
/// # Errors
///
/// Returns [`CorpusError`] if the file is missing, cannot be decoded, or
/// is not a JSON object.
pub async fn load(dir: &CorpusDir) -> Result<BTreeMap<i32, TimelineEntry>, CorpusError> {
    let text = dir.read(FILE).await?;
    let timeline = parse(&text)?;
    log::info!("Loaded {} timeline entries", timeline.len());
    Ok(timeline)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "1988": {
            "category": "milestone",
            "headline": "Global eradication initiative launched",
            "subtext": "WHO, UNICEF, Rotary, and CDC unite behind a global campaign."
        },
        "1994": {
            "category": "certification",
            "headline": "Americas certified free of wild transmission",
            "subtext": "The first WHO region to achieve certification."
        }
    }"#;

    #[test]
    fn parses_entries_keyed_by_year() {
        let timeline = parse(SAMPLE).unwrap();
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[&1988].category, "milestone");
        assert_eq!(timeline[&1994].year, 1994);
    }

    #[test]
    fn skips_non_conforming_entries() {
        let timeline = parse(
            r#"{
                "1990": {"category": "a", "headline": "b"},
                "notayear": {"category": "a", "headline": "b", "subtext": "c"},
                "1991": {"category": "a", "headline": "b", "subtext": "c"}
            }"#,
        )
        .unwrap();
        assert_eq!(timeline.len(), 1);
        assert!(timeline.contains_key(&1991));
    }

    #[test]
    fn non_object_root_is_invalid_format() {
        assert!(matches!(
            parse("\"just a string\""),
            Err(CorpusError::InvalidFormat(_))
        ));
    }
}

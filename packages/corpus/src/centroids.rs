//! Country centroid positions (`centroids.json`).
//!
//! A JSON object mapping country code to a two-element `[x, y]` array of
//! normalized map coordinates. Pairs with fewer than two components are
//! dropped.

use std::collections::HashMap;

use epi_map_corpus_models::Centroid;

use crate::{CorpusDir, CorpusError};

/// Dataset file name.
pub const FILE: &str = "centroids.json";

/// Parses the centroid table from JSON text.
///
/// # Errors
///
/// Returns [`CorpusError`] if the text is not valid JSON or the root is
/// not an object. Individual malformed entries are skipped.
pub fn parse(text: &str) -> Result<HashMap<String, Centroid>, CorpusError> {
    let root: serde_json::Value = serde_json::from_str(text)?;
    let object = root
        .as_object()
        .ok_or_else(|| CorpusError::InvalidFormat("centroids root is not an object".to_string()))?;

    let mut centroids = HashMap::new();

    for (code, value) in object {
        let Some(pair) = value.as_array() else {
            continue;
        };
        if pair.len() < 2 {
            continue;
        }
        let (Some(x), Some(y)) = (pair[0].as_f64(), pair[1].as_f64()) else {
            continue;
        };

        #[allow(clippy::cast_possible_truncation)]
        centroids.insert(
            code.clone(),
            Centroid {
                x: x as f32,
                y: y as f32,
            },
        );
    }

    Ok(centroids)
}

/// Loads and parses the centroid table.
///
/// # Errors
///
/// Returns [`CorpusError`] if the file is missing, cannot be decoded, or is
/// not a JSON object.
pub async fn load(dir: &CorpusDir) -> Result<HashMap<String, Centroid>, CorpusError> {
    let text = dir.read(FILE).await?;
    let centroids = parse(&text)?;
    log::info!("Loaded {} centroids", centroids.len());
    Ok(centroids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_element_pairs() {
        let centroids = parse(r#"{"USA": [0.25, 0.4], "BRA": [0.33, 0.62]}"#).unwrap();
        assert_eq!(centroids.len(), 2);
        let usa = centroids["USA"];
        assert!((usa.x - 0.25).abs() < f32::EPSILON);
        assert!((usa.y - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn drops_short_and_malformed_pairs() {
        let centroids =
            parse(r#"{"AAA": [0.5], "BBB": "nope", "CCC": [0.1, 0.2, 0.3]}"#).unwrap();
        assert_eq!(centroids.len(), 1);
        assert!(centroids.contains_key("CCC"));
    }

    #[test]
    fn non_object_root_is_invalid_format() {
        assert!(matches!(
            parse("[1, 2, 3]"),
            Err(CorpusError::InvalidFormat(_))
        ));
    }

    #[test]
    fn bad_json_is_json_error() {
        assert!(matches!(parse("{not json"), Err(CorpusError::Json(_))));
    }
}

//! Per-sample scoring.
//!
//! [`score`] turns one model completion and one ground-truth literal into a
//! [`ScoreRecord`]. It never fails: every problem is folded into an invalid
//! record with an explanation, so one bad sample cannot stop a run.

use crate::geo::{Coordinate, GroundTruth, LocationGuess, haversine};
use crate::literal::{self, LiteralValue};
use crate::parser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Why a sample could not be scored.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    /// The ground-truth literal could not be parsed.
    #[error("Failed to parse target: {text}")]
    TargetParse { text: String, reason: String },

    /// No coordinates could be recovered from the model output.
    #[error("Failed to extract valid coordinates from model output: {output}")]
    Extraction { output: String },

    /// Distance or accuracy computation failed.
    #[error("Error calculating score: {message}\nModel output: {output}")]
    Computation { message: String, output: String },
}

/// The scored outcome of a single sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Great-circle error in km, `+inf` when the sample could not be scored.
    #[serde(with = "finite_or_null")]
    pub distance_km: f64,
    /// `None` unless both predicted and target country are non-empty.
    pub country_correct: Option<bool>,
    /// `None` unless both predicted and target city are non-empty.
    pub city_correct: Option<bool>,
    pub predicted: Option<LocationGuess>,
    /// `None` when the target literal or its coordinates were unreadable.
    pub target: Option<GroundTruth>,
    pub valid: bool,
    pub explanation: String,
}

impl ScoreRecord {
    /// An unscored record carrying the error as its explanation.
    pub fn invalid(error: &ScoreError, target: Option<GroundTruth>) -> Self {
        Self {
            distance_km: f64::INFINITY,
            country_correct: None,
            city_correct: None,
            predicted: None,
            target,
            valid: false,
            explanation: error.to_string(),
        }
    }

    /// Short answer line for reports, e.g. `lat: 1, long: 2, Paris, France`.
    pub fn answer(&self) -> Option<String> {
        self.predicted.as_ref().map(LocationGuess::summary)
    }
}

/// Score one model completion against a ground-truth literal.
pub fn score(raw_model_output: &str, target_text: &str) -> ScoreRecord {
    let fields = match literal::parse_mapping(target_text) {
        Ok(fields) => fields,
        Err(e) => {
            let err = ScoreError::TargetParse {
                text: target_text.to_string(),
                reason: e.to_string(),
            };
            debug!(reason = %e, "target literal rejected");
            return ScoreRecord::invalid(&err, None);
        }
    };

    let Some(predicted) = parser::parse(raw_model_output) else {
        let err = ScoreError::Extraction {
            output: raw_model_output.to_string(),
        };
        return ScoreRecord::invalid(&err, ground_truth_from_fields(&fields).ok());
    };

    match compare(&predicted, &fields) {
        Ok((target, distance_km)) => ScoreRecord {
            distance_km,
            country_correct: names_match(&predicted.country, &target.country),
            city_correct: names_match(&predicted.city, &target.city),
            predicted: Some(predicted),
            target: Some(target),
            valid: true,
            explanation: raw_model_output.to_string(),
        },
        Err(message) => {
            let err = ScoreError::Computation {
                message,
                output: raw_model_output.to_string(),
            };
            ScoreRecord::invalid(&err, None)
        }
    }
}

fn compare(
    predicted: &LocationGuess,
    fields: &BTreeMap<String, LiteralValue>,
) -> Result<(GroundTruth, f64), String> {
    let target = ground_truth_from_fields(fields)?;
    let distance = haversine(target.coordinate, predicted.coordinate);
    if !distance.is_finite() {
        return Err(format!("non-finite distance {}", distance));
    }
    Ok((target, distance))
}

/// Build ground truth from a parsed target literal.
///
/// `lat` and `long` are required; missing `city`/`country` become empty.
pub fn ground_truth_from_fields(
    fields: &BTreeMap<String, LiteralValue>,
) -> Result<GroundTruth, String> {
    let coord = |key: &str| -> Result<f64, String> {
        let value = fields
            .get(key)
            .ok_or_else(|| format!("target is missing '{}'", key))?;
        value
            .as_f64()
            .ok_or_else(|| format!("target '{}' is not numeric: {}", key, value))
    };
    let coordinate = Coordinate::new(coord("lat")?, coord("long")?).map_err(|e| e.to_string())?;

    let name = |key: &str| {
        fields
            .get(key)
            .and_then(LiteralValue::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };

    Ok(GroundTruth::new(coordinate, name("city"), name("country")))
}

/// Case-insensitive comparison, only attempted when both sides are present.
fn names_match(predicted: &str, target: &str) -> Option<bool> {
    let (predicted, target) = (predicted.trim(), target.trim());
    if predicted.is_empty() || target.is_empty() {
        return None;
    }
    Some(predicted.to_lowercase() == target.to_lowercase())
}

/// Serde adapter writing non-finite floats as `null` and reading `null` back
/// as `+inf`, so infinite distances survive JSON.
pub(crate) mod finite_or_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARIS_TARGET: &str =
        "{'lat': 48.8566, 'long': 2.3522, 'city': 'Paris', 'country': 'France'}";

    #[test]
    fn test_score_end_to_end() {
        let output = r#"{"lat": 48.85, "long": 2.35, "city": "Paris", "country": "France"}"#;
        let record = score(output, PARIS_TARGET);

        assert!(record.valid);
        assert!(record.distance_km < 1.0);
        assert_eq!(record.country_correct, Some(true));
        assert_eq!(record.city_correct, Some(true));
        assert_eq!(record.explanation, output);
        assert_eq!(record.target.as_ref().unwrap().city, "Paris");
        assert!(record.answer().unwrap().starts_with("lat: 48.85, long: 2.35"));
    }

    #[test]
    fn test_case_insensitive_names() {
        let output = r#"{"lat": 48.0, "long": 2.0, "city": "PARIS", "country": "france"}"#;
        let record = score(output, PARIS_TARGET);
        assert_eq!(record.country_correct, Some(true));
        assert_eq!(record.city_correct, Some(true));
    }

    #[test]
    fn test_wrong_names() {
        let output = r#"{"lat": 50.85, "long": 4.35, "city": "Brussels", "country": "Belgium"}"#;
        let record = score(output, PARIS_TARGET);
        assert!(record.valid);
        assert!(record.distance_km > 200.0);
        assert_eq!(record.country_correct, Some(false));
        assert_eq!(record.city_correct, Some(false));
    }

    #[test]
    fn test_missing_names_are_not_evaluated() {
        let output = "lat: 48.9, long: 2.4, country: France";
        let record = score(output, PARIS_TARGET);
        assert!(record.valid);
        assert_eq!(record.country_correct, Some(true));
        assert_eq!(record.city_correct, None);

        let record = score(
            r#"{"lat": 48.9, "long": 2.4, "city": "Paris", "country": "France"}"#,
            "{'lat': 48.8566, 'long': 2.3522, 'city': '', 'country': 'France'}",
        );
        assert_eq!(record.city_correct, None);
    }

    #[test]
    fn test_unparseable_target() {
        let record = score(r#"{"lat": 1.0, "long": 2.0}"#, "definitely not a dict");
        assert!(!record.valid);
        assert!(record.distance_km.is_infinite());
        assert!(record.predicted.is_none());
        assert!(record.target.is_none());
        assert_eq!(record.explanation, "Failed to parse target: definitely not a dict");
    }

    #[test]
    fn test_extraction_failure() {
        let output = "I cannot determine the location.";
        let record = score(output, PARIS_TARGET);
        assert!(!record.valid);
        assert!(record.distance_km.is_infinite());
        assert!(record.predicted.is_none());
        assert_eq!(record.country_correct, None);
        assert!(record.explanation.contains(output));
        assert!(record.explanation.starts_with("Failed to extract valid coordinates"));
    }

    #[test]
    fn test_computation_failure_on_bad_target_coordinates() {
        let output = r#"{"lat": 1.0, "long": 2.0}"#;
        let record = score(output, "{'lat': 'somewhere', 'long': 2.0, 'city': 'X', 'country': 'Y'}");
        assert!(!record.valid);
        assert!(record.distance_km.is_infinite());
        assert!(record.explanation.starts_with("Error calculating score: "));
        assert!(record.explanation.ends_with(&format!("Model output: {}", output)));

        let record = score(output, "{'lat': 1.0, 'city': 'X', 'country': 'Y'}");
        assert!(!record.valid);
        assert!(record.explanation.contains("missing 'long'"));
    }

    #[test]
    fn test_failures_do_not_leak_between_samples() {
        let good = r#"{"lat": 48.85, "long": 2.35, "city": "Paris", "country": "France"}"#;
        let records: Vec<_> = [("garbage", PARIS_TARGET), (good, "{"), (good, PARIS_TARGET)]
            .iter()
            .map(|(output, target)| score(output, target))
            .collect();
        assert_eq!(
            records.iter().map(|r| r.valid).collect::<Vec<_>>(),
            vec![false, false, true]
        );
    }

    #[test]
    fn test_infinite_distance_survives_json() {
        let record = score("nothing here", PARIS_TARGET);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"distance_km\":null"));

        let back: ScoreRecord = serde_json::from_str(&json).unwrap();
        assert!(back.distance_km.is_infinite());
        assert_eq!(back.explanation, record.explanation);
    }
}

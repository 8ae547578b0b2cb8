//! Extraction of a location guess from free-form model output.
//!
//! Models are asked to answer with a JSON object, but they do not always
//! comply. Extraction therefore runs in two stages:
//!
//! 1. **Structured**: the first `{...}` block in the text is decoded as JSON
//!    and must carry both `lat` and `long`.
//! 2. **Pattern fallback**: if the structured stage does not produce a
//!    guess, `lat: <num>` / `long: <num>` style fragments are pulled out of
//!    the narrative, together with optional `city:` and `country:` names.

use crate::geo::{Coordinate, LocationGuess};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

/// First brace-delimited block, non-greedy, spanning newlines.
static JSON_OBJECT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*?\}").expect("JSON object regex should compile"));

static LAT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\blat(?:itude)?["']?\s*:?\s*([-+]?\d+(?:\.\d+)?)"#)
        .expect("latitude regex should compile")
});

static LONG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\blong(?:itude)?["']?\s*:?\s*([-+]?\d+(?:\.\d+)?)"#)
        .expect("longitude regex should compile")
});

static COUNTRY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bcountry["']?\s*:\s*["']?([\p{L} ]+)"#)
        .expect("country regex should compile")
});

static CITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bcity["']?\s*:\s*["']?([\p{L} ]+)"#).expect("city regex should compile")
});

/// Outcome of the structured (JSON) extraction stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredOutcome {
    /// A JSON object with usable `lat` and `long`.
    Found(LocationGuess),
    /// No brace block, or a decoded object without both `lat` and `long`.
    NoMatch,
    /// A brace block was found but could not be decoded or validated.
    Invalid(String),
}

/// Extract a location guess from raw model output.
///
/// Returns `None` when neither stage recovers both a latitude and a
/// longitude.
pub fn parse(text: &str) -> Option<LocationGuess> {
    match parse_structured(text) {
        StructuredOutcome::Found(guess) => return Some(guess),
        StructuredOutcome::NoMatch => {
            debug!("no JSON answer with lat/long, trying pattern fallback");
        }
        StructuredOutcome::Invalid(reason) => {
            debug!(%reason, "JSON answer rejected, trying pattern fallback");
        }
    }
    parse_fallback(text)
}

/// Structured stage: decode the first `{...}` block as a JSON object.
pub fn parse_structured(text: &str) -> StructuredOutcome {
    let Some(block) = JSON_OBJECT_PATTERN.find(text) else {
        return StructuredOutcome::NoMatch;
    };

    let object = match serde_json::from_str::<Value>(block.as_str()) {
        Ok(Value::Object(map)) => map,
        Ok(other) => return StructuredOutcome::Invalid(format!("expected an object, got {}", other)),
        Err(e) => return StructuredOutcome::Invalid(e.to_string()),
    };

    let (Some(lat), Some(long)) = (object.get("lat"), object.get("long")) else {
        return StructuredOutcome::NoMatch;
    };

    let coordinate = match (json_to_f64(lat), json_to_f64(long)) {
        (Some(lat), Some(lon)) => match Coordinate::new(lat, lon) {
            Ok(c) => c,
            Err(e) => return StructuredOutcome::Invalid(e.to_string()),
        },
        _ => {
            return StructuredOutcome::Invalid(format!(
                "non-numeric coordinates: lat={}, long={}",
                lat, long
            ));
        }
    };

    StructuredOutcome::Found(LocationGuess::new(
        coordinate,
        json_to_name(object.get("city")),
        json_to_name(object.get("country")),
    ))
}

/// Pattern stage: scan narrative text for `lat`/`long` fragments.
pub fn parse_fallback(text: &str) -> Option<LocationGuess> {
    let lat = capture_number(&LAT_PATTERN, text)?;
    let lon = capture_number(&LONG_PATTERN, text)?;

    let coordinate = match Coordinate::new(lat, lon) {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "pattern fallback found out-of-range coordinates");
            return None;
        }
    };

    Some(LocationGuess::new(
        coordinate,
        capture_name(&CITY_PATTERN, text),
        capture_name(&COUNTRY_PATTERN, text),
    ))
}

/// Numbers and numeric strings are both accepted.
fn json_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_to_name(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}

fn capture_number(pattern: &Regex, text: &str) -> Option<f64> {
    pattern.captures(text)?.get(1)?.as_str().parse().ok()
}

fn capture_name(pattern: &Regex, text: &str) -> String {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

//! Geographic value types and great-circle distance.

use crate::error::{GeoBenchError, Result};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GeoBenchError::InvalidCoordinate(format!(
                "latitude {} is outside [-90, 90]",
                lat
            )));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(GeoBenchError::InvalidCoordinate(format!(
                "longitude {} is outside [-180, 180]",
                lon
            )));
        }
        Ok(Self { lat, lon })
    }

    /// Great-circle distance to another coordinate, in kilometers.
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        haversine(*self, *other)
    }
}

/// A location guess: coordinates plus optional city and country names.
///
/// Empty strings mean "not provided".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationGuess {
    pub coordinate: Coordinate,
    pub city: String,
    pub country: String,
}

/// Ground truth shares the shape of a guess.
pub type GroundTruth = LocationGuess;

impl LocationGuess {
    pub fn new(coordinate: Coordinate, city: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            coordinate,
            city: city.into(),
            country: country.into(),
        }
    }

    /// One-line rendering used in reports.
    pub fn summary(&self) -> String {
        fn or_unknown(s: &str) -> &str {
            if s.is_empty() { "Unknown" } else { s }
        }
        format!(
            "lat: {}, long: {}, {}, {}",
            self.coordinate.lat,
            self.coordinate.lon,
            or_unknown(&self.city),
            or_unknown(&self.country)
        )
    }
}

/// Haversine great-circle distance in kilometers.
///
/// The radicand is clamped to `[0, 1]` so that rounding on antipodal or
/// identical points never produces NaN.
pub fn haversine(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let delta_phi = (b.lat - a.lat).to_radians();
    let delta_lambda = (b.lon - a.lon).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

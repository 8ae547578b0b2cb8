//! Dataset-level metrics over per-sample score records.
//!
//! Each metric is an independent pass over the full record slice. Distance
//! metrics ignore unscored samples and report `+inf` when nothing could be
//! scored; accuracy metrics report `0.0` when no comparison was attempted.

use crate::scorer::{ScoreRecord, finite_or_null};
use serde::{Deserialize, Serialize};

/// A named metric function.
pub type MetricFn = fn(&[ScoreRecord]) -> f64;

/// Registered metrics, in reporting order.
pub const METRICS: [(&str, MetricFn); 4] = [
    ("mean_distance", mean_distance),
    ("median_distance", median_distance),
    ("country_accuracy", country_accuracy),
    ("city_accuracy", city_accuracy),
];

/// Summary statistics for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    #[serde(with = "finite_or_null")]
    pub mean_distance_km: f64,
    #[serde(with = "finite_or_null")]
    pub median_distance_km: f64,
    pub country_accuracy: f64,
    pub city_accuracy: f64,
}

impl MetricsSummary {
    /// Compute every metric from scratch.
    pub fn from_records(records: &[ScoreRecord]) -> Self {
        Self {
            mean_distance_km: mean_distance(records),
            median_distance_km: median_distance(records),
            country_accuracy: country_accuracy(records),
            city_accuracy: city_accuracy(records),
        }
    }
}

fn finite_distances(records: &[ScoreRecord]) -> Vec<f64> {
    records
        .iter()
        .map(|r| r.distance_km)
        .filter(|d| d.is_finite())
        .collect()
}

/// Mean error in km over scored samples.
pub fn mean_distance(records: &[ScoreRecord]) -> f64 {
    let distances = finite_distances(records);
    if distances.is_empty() {
        return f64::INFINITY;
    }
    distances.iter().sum::<f64>() / distances.len() as f64
}

/// Median error in km over scored samples.
pub fn median_distance(records: &[ScoreRecord]) -> f64 {
    let mut distances = finite_distances(records);
    if distances.is_empty() {
        return f64::INFINITY;
    }
    distances.sort_by(f64::total_cmp);

    let n = distances.len();
    if n % 2 == 0 {
        (distances[n / 2 - 1] + distances[n / 2]) / 2.0
    } else {
        distances[n / 2]
    }
}

fn accuracy(records: &[ScoreRecord], field: impl Fn(&ScoreRecord) -> Option<bool>) -> f64 {
    let (correct, attempted) = records
        .iter()
        .filter_map(field)
        .fold((0usize, 0usize), |(c, t), hit| (c + hit as usize, t + 1));
    if attempted == 0 {
        return 0.0;
    }
    correct as f64 / attempted as f64
}

/// Share of attempted country comparisons that matched.
pub fn country_accuracy(records: &[ScoreRecord]) -> f64 {
    accuracy(records, |r| r.country_correct)
}

/// Share of attempted city comparisons that matched.
pub fn city_accuracy(records: &[ScoreRecord]) -> f64 {
    accuracy(records, |r| r.city_correct)
}

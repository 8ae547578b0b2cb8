//! Dataset loading for the geolocation benchmark.
//!
//! A dataset is a CSV file plus a directory of images. Expected columns:
//!
//! ```text
//! filename,lat,lng,city_name,country,population_class
//! paris_01.jpg,48.8566,2.3522,Paris,France,large
//! ```
//!
//! `population_class` is optional. Each row becomes a [`Sample`] whose target
//! is rendered as a mapping literal for the scorer. A row with unusable
//! coordinates is still kept; its target carries the raw text and fails
//! scoring for that sample alone.

use crate::error::{GeoBenchError, Result};
use crate::geo::{Coordinate, GroundTruth};
use crate::literal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Extra per-sample information carried into reports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleMetadata {
    pub filename: String,
    pub population_class: Option<String>,
}

/// One image and its ground-truth location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    /// Unique identifier (the image filename).
    pub id: String,
    /// Full path to the image.
    pub image_path: PathBuf,
    /// Ground truth as a mapping literal.
    pub target: String,
    pub metadata: SampleMetadata,
}

/// A collection of samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Dataset name.
    pub name: String,
    /// Dataset samples.
    pub samples: Vec<Sample>,
}

impl Dataset {
    /// Create a new empty dataset.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            samples: Vec::new(),
        }
    }

    /// Add a sample to the dataset.
    pub fn add_sample(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Number of samples in the dataset.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    filename: String,
    #[serde(default)]
    lat: String,
    #[serde(default)]
    lng: String,
    #[serde(default)]
    city_name: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    population_class: Option<String>,
}

/// Load the geolocation dataset.
///
/// `limit` keeps only the first `limit` rows of the CSV. It is applied
/// before rows with missing images are dropped, so the result may hold
/// fewer than `limit` samples. `Some(0)` means no limit.
///
/// Records the CSV reader cannot decode are skipped with a warning.
pub fn load_geolocation_dataset(
    csv_path: &Path,
    images_dir: &Path,
    limit: Option<usize>,
) -> Result<Dataset> {
    if !csv_path.is_file() {
        return Err(GeoBenchError::DatasetNotFound(csv_path.to_path_buf()));
    }
    if !images_dir.is_dir() {
        return Err(GeoBenchError::InvalidImageDir(images_dir.to_path_buf()));
    }

    let name = csv_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("geolocation")
        .to_string();
    let mut dataset = Dataset::new(&name);

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(csv_path)?;

    let limit = limit.filter(|&n| n > 0).unwrap_or(usize::MAX);
    let mut skipped = 0usize;
    for (idx, row) in reader.deserialize::<CsvRow>().take(limit).enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!(line, error = %e, "unreadable dataset row, skipping");
                skipped += 1;
                continue;
            }
        };

        let image_path = images_dir.join(&row.filename);
        if !image_path.exists() {
            warn!(path = %image_path.display(), "image not found, skipping sample");
            skipped += 1;
            continue;
        }

        let city = row.city_name.unwrap_or_default();
        let country = row.country.unwrap_or_default();
        let target = match parse_coordinate(&row.lat, &row.lng) {
            Ok(coordinate) => {
                literal::to_python_repr(&GroundTruth::new(coordinate, city, country))
            }
            Err(reason) => {
                warn!(line, %reason, "invalid ground truth, sample will not be scored");
                literal::raw_fields_repr(&row.lat, &row.lng, &city, &country)
            }
        };

        dataset.add_sample(Sample {
            id: row.filename.clone(),
            image_path,
            target,
            metadata: SampleMetadata {
                filename: row.filename,
                population_class: row.population_class,
            },
        });
    }

    info!(
        dataset = %dataset.name,
        samples = dataset.len(),
        skipped,
        "loaded dataset"
    );
    Ok(dataset)
}

fn parse_coordinate(lat: &str, lng: &str) -> std::result::Result<Coordinate, String> {
    let number = |text: &str| {
        text.parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", text))
    };
    Coordinate::new(number(lat)?, number(lng)?).map_err(|e| e.to_string())
}

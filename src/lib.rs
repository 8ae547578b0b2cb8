//! Geolocation Bench - scoring harness for single-image geolocation.
//!
//! A vision-capable model is shown a photograph and asked where it was
//! taken. This crate turns the model's free-form answer into coordinates,
//! measures the great-circle error against ground truth, checks the city
//! and country, and aggregates everything into dataset-level metrics.
//!
//! # Quick Start
//!
//! ```no_run
//! use geolocation_bench::{
//!     benchmark::{Benchmark, BenchmarkConfig},
//!     config::Config,
//!     dataset::load_geolocation_dataset,
//!     persistence::save_report,
//! };
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     config.validate()?;
//!
//!     let dataset = load_geolocation_dataset(
//!         Path::new("data/coordinates.csv"),
//!         Path::new("data/imgs"),
//!         Some(5),
//!     )?;
//!
//!     let benchmark = Benchmark::new(config.llm, BenchmarkConfig::default());
//!     let report = benchmark.run(&dataset).await;
//!     report.print_summary();
//!
//!     save_report(&report, Path::new("logs/report.json"))?;
//!     Ok(())
//! }
//! ```
//!
//! Scoring on its own needs no network:
//!
//! ```
//! use geolocation_bench::{metrics::MetricsSummary, scorer::score};
//!
//! let target = "{'lat': 48.8566, 'long': 2.3522, 'city': 'Paris', 'country': 'France'}";
//! let record = score(r#"{"lat": 48.85, "long": 2.35, "city": "Paris", "country": "France"}"#, target);
//! assert!(record.valid && record.distance_km < 1.0);
//!
//! let summary = MetricsSummary::from_records(&[record]);
//! assert_eq!(summary.country_accuracy, 1.0);
//! ```
//!
//! # Architecture
//!
//! - **parser**: extracts a guess from model output (JSON first, patterns second)
//! - **geo**: coordinates and haversine distance
//! - **scorer**: one completion + one target literal into a `ScoreRecord`
//! - **metrics**: mean/median distance, country/city accuracy
//! - **dataset**, **llm**, **benchmark**, **persistence**, **tools**: harness I/O

pub mod benchmark;
pub mod config;
pub mod dataset;
pub mod error;
pub mod geo;
pub mod literal;
pub mod llm;
pub mod metrics;
pub mod parser;
pub mod persistence;
pub mod scorer;
pub mod tools;

// Re-export commonly used types
pub use benchmark::{Benchmark, BenchmarkConfig, EvalReport};
pub use config::Config;
pub use dataset::{Dataset, Sample, load_geolocation_dataset};
pub use error::{GeoBenchError, Result};
pub use geo::{Coordinate, GroundTruth, LocationGuess, haversine};
pub use llm::LlmClient;
pub use metrics::MetricsSummary;
pub use persistence::{load_report, save_report};
pub use scorer::{ScoreError, ScoreRecord, score};

//! Benchmark runner: ask the model about every sample, score, aggregate.

use crate::config::LlmConfig;
use crate::dataset::{Dataset, Sample};
use crate::error::Result;
use crate::llm::LlmClient;
use crate::metrics::{METRICS, MetricsSummary};
use crate::scorer::{self, ScoreRecord};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::warn;

/// Anything that can turn an image into a raw model answer.
#[allow(async_fn_in_trait)]
pub trait Geolocator {
    async fn locate(&self, image_path: &Path) -> Result<String>;
}

impl Geolocator for LlmClient {
    async fn locate(&self, image_path: &Path) -> Result<String> {
        LlmClient::locate(self, image_path).await
    }
}

/// Configuration for the benchmark.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Model requests in flight at once.
    pub concurrency: usize,
    /// Verbose output.
    pub verbose: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            verbose: false,
        }
    }
}

/// Result for a single sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleResult {
    pub sample_id: String,
    pub population_class: Option<String>,
    /// Raw model answer.
    pub completion: Option<String>,
    /// Score, absent when the model call itself failed.
    pub record: Option<ScoreRecord>,
    /// Model call error, if any.
    pub error: Option<String>,
    pub time_ms: u64,
}

/// Aggregated benchmark results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    pub dataset_name: String,
    pub model: String,
    /// Samples attempted.
    pub total_samples: usize,
    /// Samples whose record is valid.
    pub valid_samples: usize,
    /// Samples whose model call failed.
    pub failed_calls: usize,
    pub metrics: MetricsSummary,
    pub sample_results: Vec<SampleResult>,
    /// Total benchmark time (seconds).
    pub total_time_secs: f64,
}

impl EvalReport {
    /// Create an empty report.
    pub fn new(dataset_name: &str, model: &str) -> Self {
        Self {
            dataset_name: dataset_name.to_string(),
            model: model.to_string(),
            total_samples: 0,
            valid_samples: 0,
            failed_calls: 0,
            metrics: MetricsSummary::from_records(&[]),
            sample_results: Vec::new(),
            total_time_secs: 0.0,
        }
    }

    /// Score records of all samples that reached the scorer.
    pub fn records(&self) -> Vec<ScoreRecord> {
        self.sample_results
            .iter()
            .filter_map(|r| r.record.clone())
            .collect()
    }

    /// Recalculate counts and metrics from the sample results.
    pub fn calculate_summary(&mut self) {
        let records = self.records();
        self.total_samples = self.sample_results.len();
        self.valid_samples = records.iter().filter(|r| r.valid).count();
        self.failed_calls = self
            .sample_results
            .iter()
            .filter(|r| r.error.is_some())
            .count();
        self.metrics = MetricsSummary::from_records(&records);
    }

    /// Print summary to stdout.
    pub fn print_summary(&self) {
        let records = self.records();

        println!("\n========== Geolocation Results ==========");
        println!("Dataset: {}", self.dataset_name);
        println!("Model:   {}", self.model);
        println!("Samples: {}", self.total_samples);
        println!("-----------------------------------------");
        println!(
            "Scored:        {} ({:.1}%)",
            self.valid_samples,
            if self.total_samples > 0 {
                self.valid_samples as f64 / self.total_samples as f64 * 100.0
            } else {
                0.0
            }
        );
        println!("Unscored:      {}", records.len() - self.valid_samples);
        println!("Failed calls:  {}", self.failed_calls);
        println!("-----------------------------------------");
        for (name, metric) in METRICS {
            let value = metric(&records);
            if name.ends_with("accuracy") {
                println!("{:<17} {:.2}%", name, value * 100.0);
            } else if value.is_finite() {
                println!("{:<17} {:.1} km", name, value);
            } else {
                println!("{:<17} n/a", name);
            }
        }
        println!("-----------------------------------------");
        println!("Total time: {:.1}s", self.total_time_secs);
        println!("=========================================\n");
    }
}

/// Benchmark runner.
pub struct Benchmark<G = LlmClient> {
    config: BenchmarkConfig,
    locator: G,
    model: String,
}

impl Benchmark<LlmClient> {
    /// Create a runner that queries the configured LLM.
    pub fn new(llm_config: LlmConfig, config: BenchmarkConfig) -> Self {
        let model = llm_config.model.clone();
        Self::with_locator(LlmClient::new(llm_config), model, config)
    }
}

impl<G: Geolocator> Benchmark<G> {
    /// Create a runner around any [`Geolocator`].
    pub fn with_locator(locator: G, model: impl Into<String>, config: BenchmarkConfig) -> Self {
        Self {
            config,
            locator,
            model: model.into(),
        }
    }

    /// Run the benchmark on a dataset.
    ///
    /// Requests run concurrently, results keep dataset order. A failing
    /// sample is recorded and the run continues.
    pub async fn run(&self, dataset: &Dataset) -> EvalReport {
        let start_time = Instant::now();
        let mut report = EvalReport::new(&dataset.name, &self.model);
        let total = dataset.len();

        println!("Running benchmark on {} samples...", total);

        report.sample_results = stream::iter(dataset.samples.iter().enumerate())
            .map(|(idx, sample)| self.process_sample(idx, total, sample))
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        if !self.config.verbose {
            println!(); // Newline after dots
        }

        report.total_time_secs = start_time.elapsed().as_secs_f64();
        report.calculate_summary();
        report
    }

    /// Query the model for one sample and score its answer.
    async fn process_sample(&self, idx: usize, total: usize, sample: &Sample) -> SampleResult {
        let start = Instant::now();
        let mut result = SampleResult {
            sample_id: sample.id.clone(),
            population_class: sample.metadata.population_class.clone(),
            completion: None,
            record: None,
            error: None,
            time_ms: 0,
        };

        match self.locator.locate(&sample.image_path).await {
            Ok(completion) => {
                let record = scorer::score(&completion, &sample.target);
                if self.config.verbose {
                    println!(
                        "[{}/{}] {}: {}",
                        idx + 1,
                        total,
                        sample.id,
                        if record.valid {
                            format!("{:.1} km", record.distance_km)
                        } else {
                            "unscored".to_string()
                        }
                    );
                }
                result.completion = Some(completion);
                result.record = Some(record);
            }
            Err(e) => {
                warn!(sample = %sample.id, error = %e, "model call failed");
                result.error = Some(e.to_string());
            }
        }

        if !self.config.verbose {
            print!(".");
            std::io::stdout().flush().ok();
        }

        result.time_ms = start.elapsed().as_millis() as u64;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::SampleMetadata;
    use crate::error::GeoBenchError;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// Answers keyed by image file name.
    struct CannedLocator {
        answers: HashMap<String, String>,
    }

    impl Geolocator for CannedLocator {
        async fn locate(&self, image_path: &Path) -> Result<String> {
            let name = image_path.file_name().unwrap().to_str().unwrap();
            self.answers
                .get(name)
                .cloned()
                .ok_or_else(|| GeoBenchError::LlmApi(format!("no answer for {}", name)))
        }
    }

    fn sample(id: &str, target: &str) -> Sample {
        Sample {
            id: id.to_string(),
            image_path: PathBuf::from("imgs").join(id),
            target: target.to_string(),
            metadata: SampleMetadata {
                filename: id.to_string(),
                population_class: None,
            },
        }
    }

    fn dataset() -> Dataset {
        let mut dataset = Dataset::new("fixture");
        dataset.add_sample(sample(
            "paris.jpg",
            "{'lat': 48.8566, 'long': 2.3522, 'city': 'Paris', 'country': 'France'}",
        ));
        dataset.add_sample(sample(
            "nyc.jpg",
            "{'lat': 40.7128, 'long': -74.006, 'city': 'New York', 'country': 'United States'}",
        ));
        dataset.add_sample(sample(
            "blank.jpg",
            "{'lat': 0.0, 'long': 0.0, 'city': 'Nowhere', 'country': 'Ocean'}",
        ));
        dataset.add_sample(sample(
            "offline.jpg",
            "{'lat': 1.0, 'long': 1.0, 'city': 'X', 'country': 'Y'}",
        ));
        dataset
    }

    fn locator() -> CannedLocator {
        let answers = [
            (
                "paris.jpg",
                r#"Looks like Haussmann buildings. {"lat": 48.85, "long": 2.35, "city": "Paris", "country": "France"}"#,
            ),
            (
                "nyc.jpg",
                "Yellow cabs everywhere: lat: 40.75, long: -73.99, city: Boston, country: United States",
            ),
            ("blank.jpg", "I cannot determine the location."),
        ];
        CannedLocator {
            answers: answers
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_benchmark_config_default() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.concurrency, 4);
        assert!(!config.verbose);
    }

    #[test]
    fn test_run_scores_and_aggregates() {
        let benchmark = Benchmark::with_locator(locator(), "canned", BenchmarkConfig::default());
        let report = tokio_test::block_on(benchmark.run(&dataset()));

        assert_eq!(report.total_samples, 4);
        assert_eq!(report.valid_samples, 2);
        assert_eq!(report.failed_calls, 1);

        let ids: Vec<_> = report.sample_results.iter().map(|r| r.sample_id.as_str()).collect();
        assert_eq!(ids, vec!["paris.jpg", "nyc.jpg", "blank.jpg", "offline.jpg"]);

        let offline = &report.sample_results[3];
        assert!(offline.record.is_none());
        assert!(offline.error.as_deref().unwrap().contains("no answer"));

        let blank = report.sample_results[2].record.as_ref().unwrap();
        assert!(!blank.valid);

        assert!(report.metrics.mean_distance_km.is_finite());
        assert_eq!(report.metrics.country_accuracy, 1.0);
        assert_eq!(report.metrics.city_accuracy, 0.5);
    }

    #[test]
    fn test_run_with_single_worker_matches() {
        let config = BenchmarkConfig {
            concurrency: 0,
            verbose: true,
        };
        let sequential = tokio_test::block_on(
            Benchmark::with_locator(locator(), "canned", config).run(&dataset()),
        );
        let parallel = tokio_test::block_on(
            Benchmark::with_locator(locator(), "canned", BenchmarkConfig::default())
                .run(&dataset()),
        );
        assert_eq!(sequential.metrics, parallel.metrics);
    }

    #[test]
    fn test_empty_report() {
        let mut report = EvalReport::new("empty", "none");
        report.calculate_summary();
        assert_eq!(report.total_samples, 0);
        assert!(report.metrics.mean_distance_km.is_infinite());
        assert_eq!(report.metrics.country_accuracy, 0.0);
    }
}

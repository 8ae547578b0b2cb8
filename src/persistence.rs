//! Persistence layer for saving/loading evaluation reports.
//!
//! Supports both JSON (human-readable) and bincode (efficient binary) formats.

use crate::benchmark::EvalReport;
use crate::error::{GeoBenchError, Result};
use std::fs;
use std::path::Path;

/// Default filename for a saved report.
pub const DEFAULT_REPORT_FILENAME: &str = "geolocation_report.json";

/// Save format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    /// JSON format (human-readable, larger).
    Json,
    /// Bincode format (binary, compact).
    Bincode,
}

impl SaveFormat {
    /// Determine format from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => SaveFormat::Json,
            Some("bin") | Some("bincode") => SaveFormat::Bincode,
            _ => SaveFormat::Json, // Default to JSON
        }
    }
}

/// Save a report to a file.
pub fn save_report(report: &EvalReport, path: &Path) -> Result<()> {
    let format = SaveFormat::from_path(path);
    save_report_with_format(report, path, format)
}

/// Save a report with specific format.
pub fn save_report_with_format(report: &EvalReport, path: &Path, format: SaveFormat) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| GeoBenchError::io(parent, e))?;
        }
    }

    let data = match format {
        SaveFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| GeoBenchError::Serialization(e.to_string()))?
            .into_bytes(),
        SaveFormat::Bincode => {
            let config = bincode::config::standard();
            bincode::serde::encode_to_vec(report, config)
                .map_err(|e| GeoBenchError::Serialization(e.to_string()))?
        }
    };

    fs::write(path, &data).map_err(|e| GeoBenchError::io(path, e))?;

    Ok(())
}

/// Load a report from a file.
pub fn load_report(path: &Path) -> Result<EvalReport> {
    if !path.exists() {
        return Err(GeoBenchError::ReportNotFound(path.to_path_buf()));
    }

    let format = SaveFormat::from_path(path);
    load_report_with_format(path, format)
}

/// Load a report with specific format.
pub fn load_report_with_format(path: &Path, format: SaveFormat) -> Result<EvalReport> {
    let data = fs::read(path).map_err(|e| GeoBenchError::io(path, e))?;

    let report = match format {
        SaveFormat::Json => serde_json::from_slice(&data)
            .map_err(|e| GeoBenchError::Serialization(e.to_string()))?,
        SaveFormat::Bincode => {
            let config = bincode::config::standard();
            let (report, _): (EvalReport, usize) =
                bincode::serde::decode_from_slice(&data, config)
                    .map_err(|e| GeoBenchError::Serialization(e.to_string()))?;
            report
        }
    };

    Ok(report)
}

/// Check if a report file exists at the given path.
pub fn report_exists(path: &Path) -> bool {
    path.exists() && path.is_file()
}

/// Get the size of a report file in bytes.
pub fn report_size(path: &Path) -> Result<u64> {
    let metadata = fs::metadata(path).map_err(|e| GeoBenchError::io(path, e))?;
    Ok(metadata.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::SampleResult;
    use crate::scorer::score;
    use tempfile::TempDir;

    const TARGET: &str = "{'lat': 48.8566, 'long': 2.3522, 'city': 'Paris', 'country': 'France'}";

    fn create_test_report() -> EvalReport {
        let mut report = EvalReport::new("Test Dataset", "test-model");
        let answers = [
            r#"{"lat": 48.85, "long": 2.35, "city": "Paris", "country": "France"}"#,
            "no idea",
        ];
        for (i, answer) in answers.iter().enumerate() {
            report.sample_results.push(SampleResult {
                sample_id: format!("{}.jpg", i),
                population_class: Some("large".to_string()),
                completion: Some(answer.to_string()),
                record: Some(score(answer, TARGET)),
                error: None,
                time_ms: 10,
            });
        }
        report.sample_results.push(SampleResult {
            sample_id: "2.jpg".to_string(),
            population_class: None,
            completion: None,
            record: None,
            error: Some("timeout".to_string()),
            time_ms: 30_000,
        });
        report.calculate_summary();
        report
    }

    fn assert_same(loaded: &EvalReport, original: &EvalReport) {
        assert_eq!(loaded.dataset_name, original.dataset_name);
        assert_eq!(loaded.total_samples, original.total_samples);
        assert_eq!(loaded.valid_samples, original.valid_samples);
        assert!((loaded.metrics.mean_distance_km - original.metrics.mean_distance_km).abs() < 1e-9);
        assert_eq!(loaded.metrics.country_accuracy, original.metrics.country_accuracy);

        let (loaded_records, original_records) = (loaded.records(), original.records());
        assert_eq!(loaded_records.len(), original_records.len());
        for (a, b) in loaded_records.iter().zip(&original_records) {
            assert_eq!(a.valid, b.valid);
            assert_eq!(a.city_correct, b.city_correct);
            assert_eq!(a.explanation, b.explanation);
        }
        assert!(loaded_records[1].distance_km.is_infinite());
        assert_eq!(loaded.sample_results[2].error.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");

        let original = create_test_report();
        save_report(&original, &path).unwrap();

        assert!(report_exists(&path));
        assert_same(&load_report(&path).unwrap(), &original);
    }

    #[test]
    fn test_save_and_load_bincode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("report.bin");

        let original = create_test_report();
        save_report(&original, &path).unwrap();

        assert!(report_exists(&path));
        assert_same(&load_report(&path).unwrap(), &original);
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(SaveFormat::from_path(Path::new("test.json")), SaveFormat::Json);
        assert_eq!(SaveFormat::from_path(Path::new("test.bin")), SaveFormat::Bincode);
        assert_eq!(SaveFormat::from_path(Path::new("test.bincode")), SaveFormat::Bincode);
        assert_eq!(SaveFormat::from_path(Path::new("test")), SaveFormat::Json);
    }

    #[test]
    fn test_load_nonexistent() {
        let result = load_report(Path::new("/nonexistent/report.json"));
        assert!(matches!(result, Err(GeoBenchError::ReportNotFound(_))));
    }

    #[test]
    fn test_json_is_readable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_REPORT_FILENAME);

        save_report(&create_test_report(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Test Dataset"));
        assert!(content.contains("\"distance_km\": null"));
        assert!(report_size(&path).unwrap() > 0);
    }
}

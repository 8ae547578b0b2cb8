//! Geolocation Bench CLI
//!
//! Runs a vision model over a geolocation dataset and scores its guesses.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geolocation_bench::{
    benchmark::{Benchmark, BenchmarkConfig},
    config::Config,
    dataset::load_geolocation_dataset,
    llm::LlmClient,
    persistence::{load_report, report_exists, report_size, save_report},
    scorer::score,
    tools::{StreetViewRequest, StreetViewState, StreetViewTool},
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Geolocation Bench - score a vision model's ability to geolocate photographs
#[derive(Parser)]
#[command(name = "geo-bench")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the benchmark on a dataset
    Run {
        /// Path to the dataset CSV file
        #[arg(long)]
        csv: PathBuf,

        /// Directory containing the benchmark images
        #[arg(long)]
        images: PathBuf,

        /// Only evaluate the first N rows of the CSV
        #[arg(short, long)]
        limit: Option<usize>,

        /// Model requests in flight at once
        #[arg(short, long, default_value_t = 4)]
        concurrency: usize,

        /// Save the report (.json or .bin)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Score a single model response against a target literal
    Score {
        /// Target literal, e.g. "{'lat': 48.8566, 'long': 2.3522, 'city': 'Paris', 'country': 'France'}"
        #[arg(long)]
        target: String,

        /// Model response text
        #[arg(long, conflicts_with = "response_file")]
        response: Option<String>,

        /// File containing the model response
        #[arg(long)]
        response_file: Option<PathBuf>,
    },

    /// Show metrics from a saved report
    Report {
        /// Path to the report file
        path: PathBuf,

        /// Also list every sample
        #[arg(long)]
        samples: bool,
    },

    /// Fetch a Street View image for a location
    StreetView {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        #[arg(long, default_value_t = 0.0)]
        heading: f64,

        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        pitch: f64,

        #[arg(long, default_value_t = 90.0)]
        fov: f64,

        /// Directory for downloaded images
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
    },

    /// Test LLM connection
    Test,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            csv,
            images,
            limit,
            concurrency,
            output,
            verbose,
        } => cmd_run(csv, images, limit, concurrency, output, verbose).await,
        Commands::Score {
            target,
            response,
            response_file,
        } => cmd_score(target, response, response_file),
        Commands::Report { path, samples } => cmd_report(path, samples),
        Commands::StreetView {
            lat,
            lng,
            heading,
            pitch,
            fov,
            output_dir,
        } => {
            let request = StreetViewRequest::new(lat, lng)
                .with_heading(heading)
                .with_pitch(pitch)
                .with_fov(fov);
            cmd_street_view(request, output_dir).await
        }
        Commands::Test => cmd_test().await,
    }
}

async fn cmd_run(
    csv: PathBuf,
    images: PathBuf,
    limit: Option<usize>,
    concurrency: usize,
    output: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    println!("Loading configuration...");
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let dataset = load_geolocation_dataset(&csv, &images, limit).context("Failed to load dataset")?;
    if dataset.is_empty() {
        anyhow::bail!("No samples with images found in '{}'", csv.display());
    }

    println!("Dataset: {} ({} samples)", dataset.name, dataset.len());
    println!("Using model: {}", config.llm.model);

    let benchmark = Benchmark::new(
        config.llm,
        BenchmarkConfig {
            concurrency,
            verbose,
        },
    );
    let report = benchmark.run(&dataset).await;
    report.print_summary();

    if let Some(path) = output {
        save_report(&report, &path).context("Failed to save report")?;
        info!(path = %path.display(), "report saved");
        println!("Report saved to: {}", path.display());
    }

    Ok(())
}

fn cmd_score(target: String, response: Option<String>, response_file: Option<PathBuf>) -> Result<()> {
    let response = match (response, response_file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read response file '{}'", path.display()))?,
        (None, None) => anyhow::bail!("Provide --response or --response-file"),
    };

    let record = score(&response, &target);
    println!(
        "{}",
        serde_json::to_string_pretty(&record).context("Failed to serialize score")?
    );
    Ok(())
}

fn cmd_report(path: PathBuf, samples: bool) -> Result<()> {
    if !report_exists(&path) {
        anyhow::bail!("Report not found at '{}'", path.display());
    }

    let mut report = load_report(&path).context("Failed to load report")?;
    report.calculate_summary();
    report.print_summary();

    if samples {
        for result in &report.sample_results {
            let line = match (&result.record, &result.error) {
                (Some(record), _) if record.valid => format!(
                    "{:.1} km  {}",
                    record.distance_km,
                    record.answer().unwrap_or_default()
                ),
                (Some(record), _) => format!(
                    "unscored  {}",
                    record.explanation.lines().next().unwrap_or_default()
                ),
                (None, Some(error)) => format!("error  {}", error),
                (None, None) => "pending".to_string(),
            };
            println!("{:<32} {}", result.sample_id, line);
        }
    }

    let size = report_size(&path)?;
    println!("Report file: {} ({:.1} KB)", path.display(), size as f64 / 1024.0);
    Ok(())
}

async fn cmd_street_view(request: StreetViewRequest, output_dir: PathBuf) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let tool = StreetViewTool::new(config.street_view.api_key, output_dir);
    let mut state = StreetViewState::default();

    let path = tool
        .fetch(&mut state, request)
        .await
        .context("Street View request failed")?;

    println!("Saved image to: {}", path.display());
    for view in &state.history {
        println!(
            "  {}, {} heading {} ({}) pitch {}",
            view.lat, view.lng, view.heading, view.cardinal_direction, view.pitch
        );
    }
    Ok(())
}

async fn cmd_test() -> Result<()> {
    println!("Testing LLM connection...\n");

    let config = Config::load().context("Failed to load configuration")?;

    println!("Configuration:");
    println!("  API Base:  {}", config.llm.api_base);
    println!("  Model:     {}", config.llm.model);
    println!(
        "  API Key:   {}...",
        config.llm.api_key.chars().take(8).collect::<String>()
    );
    println!();

    if let Err(e) = config.validate() {
        println!("Configuration error: {}", e);
        return Ok(());
    }

    let client = LlmClient::new(config.llm);

    println!("Sending test request...");
    match client.test_connection().await {
        Ok(()) => {
            println!("Connection successful!");
        }
        Err(e) => {
            println!("Connection failed: {}", e);
        }
    }

    Ok(())
}

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use cognilens_core::analytics::analytics_aggregator::AnalyticsAggregator;
use cognilens_core::landmarks::infrastructure::jsonl_landmark_source::JsonlLandmarkSource;
use cognilens_core::pipeline::analyze_stream_use_case::{AnalysisReport, AnalyzeStreamUseCase};
use cognilens_core::pipeline::infrastructure::sequential_pipeline_executor::SequentialPipelineExecutor;
use cognilens_core::pipeline::infrastructure::threaded_pipeline_executor::ThreadedPipelineExecutor;
use cognilens_core::pipeline::pipeline_executor::PipelineExecutor;
use cognilens_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use cognilens_core::pipeline::signal_bank::SignalBank;
use cognilens_core::shared::config::EstimationConfig;
use cognilens_core::shared::constants::{CONFIG_DIR_NAME, CONFIG_FILE_NAME};

/// Estimate drowsiness, attention, stress and confusion from a recorded
/// facial-landmark stream.
#[derive(Parser, Debug)]
#[command(name = "cognilens")]
struct Cli {
    /// Landmark recording in JSON Lines format.
    input: PathBuf,

    /// Write the JSON report to this file instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Detector configuration file (JSON). Defaults to the platform config
    /// directory, then to built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Analytics retention window in seconds (overrides the config file).
    #[arg(long)]
    window_seconds: Option<f64>,

    /// Run each detector on its own thread.
    #[arg(long)]
    threaded: bool,

    /// Log progress every N frames.
    #[arg(long, default_value = "100")]
    progress_every: usize,

    /// Skip malformed lines instead of aborting.
    #[arg(long)]
    skip_invalid: bool,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli, default_config_path())?;
    if cli.print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    let report = analyze(&cli, &config)?;
    write_report(&report, cli.output.as_deref())
}

fn analyze(cli: &Cli, config: &EstimationConfig) -> Result<AnalysisReport, Box<dyn std::error::Error>> {
    let source = JsonlLandmarkSource::open(&cli.input)?;
    let bank = SignalBank::from_config(config)?;
    let executor: Box<dyn PipelineExecutor> = if cli.threaded {
        Box::new(ThreadedPipelineExecutor::new())
    } else {
        Box::new(SequentialPipelineExecutor)
    };

    log::info!("Analyzing {}", cli.input.display());
    let mut use_case = AnalyzeStreamUseCase::new(
        Box::new(source),
        bank,
        AnalyticsAggregator::from_config(&config.analytics),
        executor,
        Box::new(StdoutPipelineLogger::new(cli.progress_every)),
        None,
        None,
    )
    .skip_invalid_frames(cli.skip_invalid);

    use_case.execute()
}

fn write_report(report: &AnalysisReport, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(report)?;
    match output {
        Some(path) => {
            fs::write(path, json).map_err(|e| format!("Cannot write {}: {e}", path.display()))?;
            log::info!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Resolves the configuration: `--config` if given, else `fallback` if it
/// exists, else defaults. Command-line overrides are applied last.
fn build_config(
    cli: &Cli,
    fallback: Option<PathBuf>,
) -> Result<EstimationConfig, Box<dyn std::error::Error>> {
    let mut config = match (&cli.config, fallback) {
        (Some(path), _) => EstimationConfig::load(path)?,
        (None, Some(path)) if path.is_file() => {
            log::info!("Using config {}", path.display());
            EstimationConfig::load(&path)?
        }
        _ => EstimationConfig::default(),
    };

    if let Some(window) = cli.window_seconds {
        config.analytics.window_seconds = window;
    }
    config.validate()?;
    Ok(config)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.print_config && !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if let Some(path) = &cli.config {
        if !path.is_file() {
            return Err(format!("Config file not found: {}", path.display()).into());
        }
    }
    if cli.progress_every == 0 {
        return Err("Progress interval must be at least 1 frame".into());
    }
    if let Some(window) = cli.window_seconds {
        if !window.is_finite() || window <= 0.0 {
            return Err(format!("Window must be a positive number of seconds, got {window}").into());
        }
    }
    Ok(())
}

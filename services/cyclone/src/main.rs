//! Extratropical cyclone tracker.
//!
//! `cyclone track <years>` writes each year's centers and tracks;
//! `cyclone attribute <years> [--redo]` adds their attribution regions.
//! Years run in parallel; Ctrl-C stops every worker after its current
//! time step.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use cyclone_common::{CycloneError, CycloneResult};
use pipeline::{CancelToken, Pipeline};

#[derive(Parser, Debug)]
#[command(name = "cyclone")]
#[command(about = "Find, track and attribute extratropical cyclones in SLP fields")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Tracker configuration file (YAML)
    #[arg(short, long, env = "CYCLONE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Root of the yearly SLP inputs
    #[arg(long, env = "SLP_DATA_DIR", default_value = "data/slp", global = true)]
    slp_data_dir: PathBuf,

    /// Where output files are written
    #[arg(long, env = "OUTPUT_DIR", default_value = "output", global = true)]
    output_dir: PathBuf,

    /// Shared precomputed inputs (topography.json)
    #[arg(long, env = "SHARED_DIR", global = true)]
    shared_dir: Option<PathBuf>,

    /// Years processed at once (default: available cores)
    #[arg(long, env = "CYCLONE_WORKERS", global = true)]
    workers: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find centers and stitch tracks
    Track {
        #[arg(required = true)]
        years: Vec<i32>,
    },
    /// Attribute grids to the centers of tracked years
    Attribute {
        #[arg(required = true)]
        years: Vec<i32>,

        /// Re-process only the stamps in each year's redo list
        #[arg(long)]
        redo: bool,
    },
}

/// The work done for each year.
#[derive(Debug, Clone, Copy)]
enum Stage {
    Track,
    Attribute { redo: bool },
}

impl Command {
    fn split(self) -> (Stage, Vec<i32>) {
        match self {
            Command::Track { years } => (Stage::Track, years),
            Command::Attribute { years, redo } => (Stage::Attribute { redo }, years),
        }
    }
}

fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.json_logs);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::from(2);
        }
    };

    match runtime.block_on(run(args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Run failed");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// `1` for configuration or input errors, `2` for everything else.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|e| e.downcast_ref::<CycloneError>())
        .map_or(2, |e| e.exit_code() as u8)
}

async fn run(args: Args) -> Result<()> {
    let tracker_config = config::load_tracker_config(args.config.as_deref())?;
    let paths = config::prepare_paths(args.slp_data_dir, args.output_dir, args.shared_dir)?;

    let cancel = CancelToken::new();
    let pipeline = Arc::new(Pipeline::new(tracker_config, paths)?.with_cancel(cancel.clone()));

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received interrupt, stopping after the current time step");
            cancel.cancel();
        }
    });

    let workers = args
        .workers
        .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
        .unwrap_or(1)
        .max(1);
    let (stage, years) = args.command.split();
    info!(stage = ?stage, workers, "Starting");

    let limit = Arc::new(Semaphore::new(workers));
    let mut handles = Vec::with_capacity(years.len());
    for year in years {
        let permit = Arc::clone(&limit).acquire_owned().await?;
        let pipeline = Arc::clone(&pipeline);
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            run_year(&pipeline, stage, year)
        });
        handles.push((year, handle));
    }

    let mut failed: Option<(i32, CycloneError)> = None;
    for (year, handle) in handles {
        let outcome = handle
            .await
            .with_context(|| format!("worker for {} stopped unexpectedly", year))?;
        if let Err(e) = outcome {
            error!(year, exit_code = e.exit_code(), error = %e, "Year failed");
            if failed.is_none() {
                failed = Some((year, e));
            }
        }
    }

    match failed {
        Some((year, e)) => Err(anyhow::Error::new(e).context(format!("year {}", year))),
        None => {
            info!("All years complete");
            Ok(())
        }
    }
}

fn run_year(pipeline: &Pipeline, stage: Stage, year: i32) -> CycloneResult<()> {
    match stage {
        Stage::Track => {
            let report = pipeline.track_year(year)?;
            info!(
                year,
                centers = report.centers,
                problematic = report.problematic,
                tracks = report.tracks,
                warnings = report.warnings,
                "Tracked"
            );
        }
        Stage::Attribute { redo } => {
            let report = pipeline.attribute_year(year, redo)?;
            info!(
                year,
                processed = report.processed,
                attributed = report.attributed,
                empty = report.empty,
                storms = report.storms,
                warnings = report.warnings,
                "Attributed"
            );
        }
    }
    Ok(())
}

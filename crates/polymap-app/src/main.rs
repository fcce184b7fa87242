//! The `polymap` binary: build an island mesh and sample it into a heightmap.

mod platform;
mod summary;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use polymap_config::{CliArgs, Config, ConfigError};
use polymap_graph::{GraphError, IslandBuilder};
use polymap_heightmap::{HeightmapError, HeightmapGenerator};
use tracing::{error, info, warn};

use crate::platform::{PlatformDirs, PlatformError};
use crate::summary::HeightmapSummary;

/// How often the main thread reports progress while waiting.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build island mesh: {0}")]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Heightmap(#[from] HeightmapError),
    #[error("run completed without a full heightmap")]
    MissingResults,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("polymap: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> Result<(), AppError> {
    let dirs = match &args.config {
        Some(dir) => PlatformDirs::from_config_dir(dir.clone()),
        None => PlatformDirs::resolve()?,
    };
    dirs.create_all()?;

    let mut config = Config::load_or_create(&dirs.config_dir)?;
    config.apply_cli_overrides(args);
    config.validate()?;

    polymap_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));
    info!(config = %dirs.config_dir.display(), "Polymap starting");

    let build_start = Instant::now();
    let mesh = IslandBuilder::new(config.island.params()).build()?;
    info!(
        triangles = mesh.triangles().len(),
        elapsed_ms = build_start.elapsed().as_millis() as u64,
        "Island mesh ready"
    );

    let generator = match config.heightmap.worker_threads {
        0 => HeightmapGenerator::with_defaults()?,
        n => HeightmapGenerator::new(n)?,
    };

    let run_start = Instant::now();
    generator.start_run(Arc::new(mesh), config.heightmap.settings(), move || {
        info!(
            elapsed_ms = run_start.elapsed().as_millis() as u64,
            "Heightmap callback fired"
        );
    })?;

    while !generator.wait_for_completion(PROGRESS_INTERVAL) {
        info!(
            percent = generator.completion_fraction() * 100.0,
            "Heightmap in progress"
        );
    }

    for fault in generator.take_faults() {
        warn!("Run reported an invariant violation: {fault}");
    }

    let heightmap = generator.heightmap().ok_or(AppError::MissingResults)?;
    let summary = HeightmapSummary::from_heightmap(&heightmap);
    info!("{summary}");
    println!("{summary}");
    Ok(())
}

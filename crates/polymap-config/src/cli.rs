//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use polymap_graph::AnchorMode;
use polymap_heightmap::SelectionMode;

use crate::Config;

/// Selection mode as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliSelectionMode {
    /// Moisture and tags from the enclosing region.
    Polygon,
    /// Blended moisture, region tags.
    Interpolated,
}

/// Anchor mode as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliAnchorMode {
    /// Blend triangle centers.
    Center,
    /// Blend triangle corners.
    Vertex,
}

impl From<CliSelectionMode> for SelectionMode {
    fn from(mode: CliSelectionMode) -> Self {
        match mode {
            CliSelectionMode::Polygon => SelectionMode::UsePolygon,
            CliSelectionMode::Interpolated => SelectionMode::InterpolatedWithRegionBiome,
        }
    }
}

impl From<CliAnchorMode> for AnchorMode {
    fn from(mode: CliAnchorMode) -> Self {
        match mode {
            CliAnchorMode::Center => AnchorMode::TriangleCenter,
            CliAnchorMode::Vertex => AnchorMode::Vertex,
        }
    }
}

/// Polymap command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "polymap", about = "Sample a polygonal island mesh into a heightmap")]
pub struct CliArgs {
    /// Raster side length in cells.
    #[arg(long)]
    pub size: Option<u32>,

    /// Worker threads (0 = automatic).
    #[arg(long)]
    pub workers: Option<usize>,

    /// Island seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// How moisture and tags are chosen per sample.
    #[arg(long, value_enum)]
    pub selection: Option<CliSelectionMode>,

    /// Interpolation basis points.
    #[arg(long, value_enum)]
    pub anchor: Option<CliAnchorMode>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(size) = args.size {
            self.heightmap.size = size;
        }
        if let Some(workers) = args.workers {
            self.heightmap.worker_threads = workers;
        }
        if let Some(seed) = args.seed {
            self.island.seed = seed;
        }
        if let Some(selection) = args.selection {
            self.heightmap.selection_mode = selection.into();
        }
        if let Some(anchor) = args.anchor {
            self.heightmap.anchor_mode = anchor.into();
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

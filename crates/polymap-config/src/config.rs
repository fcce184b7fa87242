//! Configuration structs with defaults and RON persistence.

use std::path::Path;

use polymap_graph::{AnchorMode, IslandParams};
use polymap_heightmap::{HeightmapSettings, SelectionMode};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Raster sampling settings.
    pub heightmap: HeightmapConfig,
    /// Demo island mesh settings.
    pub island: IslandConfig,
    /// Logging settings.
    pub debug: DebugConfig,
}

/// Raster sampling configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeightmapConfig {
    /// Raster side length in cells.
    pub size: u32,
    /// How moisture and tags are chosen per sample.
    pub selection_mode: SelectionMode,
    /// Interpolation basis points.
    pub anchor_mode: AnchorMode,
    /// Worker threads (0 = one less than the CPU count).
    pub worker_threads: usize,
}

/// Island mesh configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IslandConfig {
    /// Side length of the mesh domain.
    pub extent: f32,
    /// Grid cells along each side of the mesh.
    pub cells_per_side: u32,
    /// Seed for jitter and noise.
    pub seed: u64,
    /// Octaves of the elevation noise.
    pub octaves: u32,
    /// Elevation noise frequency in cycles per domain.
    pub frequency: f64,
    /// Normalized sea level.
    pub sea_level: f32,
    /// Corner jitter as a fraction of a grid cell.
    pub jitter: f32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log filter (e.g. "info", "polymap_heightmap=debug").
    pub log_level: String,
    /// Also write JSON logs to the log directory.
    pub log_to_file: bool,
}

impl Default for HeightmapConfig {
    fn default() -> Self {
        let settings = HeightmapSettings::default();
        Self {
            size: settings.size,
            selection_mode: settings.selection_mode,
            anchor_mode: settings.anchor_mode,
            worker_threads: 0,
        }
    }
}

impl Default for IslandConfig {
    fn default() -> Self {
        let params = IslandParams::default();
        Self {
            extent: params.extent,
            cells_per_side: params.cells_per_side,
            seed: params.seed,
            octaves: params.octaves,
            frequency: params.frequency,
            sea_level: params.sea_level,
            jitter: params.jitter,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_to_file: false,
        }
    }
}

impl HeightmapConfig {
    /// The per-run settings handed to the generator.
    pub fn settings(&self) -> HeightmapSettings {
        HeightmapSettings {
            size: self.size,
            selection_mode: self.selection_mode,
            anchor_mode: self.anchor_mode,
        }
    }
}

impl IslandConfig {
    /// Parameters for the island builder.
    pub fn params(&self) -> IslandParams {
        IslandParams {
            extent: self.extent,
            cells_per_side: self.cells_per_side,
            seed: self.seed,
            octaves: self.octaves,
            frequency: self.frequency,
            sea_level: self.sea_level,
            jitter: self.jitter,
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(2)
            .enumerate_arrays(false);
        let serialized = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::Write {
            path: config_path,
            source,
        })
    }

    /// Re-read `config.ron`; returns `Some(new_config)` only if it differs.
    pub fn reload_if_changed(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let reloaded = Self::read(&config_dir.join(CONFIG_FILE))?;
        if &reloaded != self {
            log::info!("Config reloaded with changes");
            Ok(Some(reloaded))
        } else {
            Ok(None)
        }
    }

    /// Reject settings that cannot produce a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heightmap.size == 0 {
            return Err(ConfigError::Invalid {
                field: "heightmap.size",
                reason: "must be positive",
            });
        }
        if !(self.island.extent.is_finite() && self.island.extent > 0.0) {
            return Err(ConfigError::Invalid {
                field: "island.extent",
                reason: "must be a positive number",
            });
        }
        if self.island.cells_per_side == 0 {
            return Err(ConfigError::Invalid {
                field: "island.cells_per_side",
                reason: "must be positive",
            });
        }
        if !(0.0..0.5).contains(&self.island.jitter) {
            return Err(ConfigError::Invalid {
                field: "island.jitter",
                reason: "must be in [0, 0.5)",
            });
        }
        Ok(())
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(ConfigError::Parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let ron_str =
            ron::ser::to_string_pretty(&Config::default(), ron::ser::PrettyConfig::new()).unwrap();
        assert!(ron_str.contains("size: 128"));
        assert!(ron_str.contains("selection_mode: InterpolatedWithRegionBiome"));
        assert!(ron_str.contains("anchor_mode: TriangleCenter"));
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.heightmap.selection_mode = SelectionMode::UsePolygon;
        config.heightmap.anchor_mode = AnchorMode::Vertex;
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let config: Config = ron::from_str("(heightmap: (size: 300))").unwrap();
        assert_eq!(config.heightmap.size, 300);
        assert_eq!(config.heightmap.worker_threads, 0);
        assert_eq!(config.island, IslandConfig::default());
        assert_eq!(config.debug, DebugConfig::default());
    }

    #[test]
    fn test_unknown_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(render_distance: 12)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.heightmap.size = 512;
        config.island.seed = 7;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload_if_changed(dir.path()).unwrap().is_none());

        let mut modified = config.clone();
        modified.heightmap.size = 64;
        modified.save(dir.path()).unwrap();

        let reloaded = config.reload_if_changed(dir.path()).unwrap().unwrap();
        assert_eq!(reloaded.heightmap.size, 64);
    }

    #[test]
    fn test_invalid_ron_produces_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{{not valid}}").unwrap();
        let err = Config::load_or_create(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validate_rejects_zero_size() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());
        config.heightmap.size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "heightmap.size",
                ..
            })
        ));
    }

    #[test]
    fn test_settings_and_params_mirror_sections() {
        let config = Config::default();
        let settings = config.heightmap.settings();
        assert_eq!(settings.size, config.heightmap.size);
        let params = config.island.params();
        assert_eq!(params.cells_per_side, config.island.cells_per_side);
        assert_eq!(params.seed, config.island.seed);
    }
}

//! Raster cells, sample records, and per-run configuration.

use std::collections::BTreeSet;

use glam::Vec2;
use polymap_graph::AnchorMode;
use serde::{Deserialize, Serialize};

/// How a sample's non-elevation attributes are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionMode {
    /// Moisture and tags come straight from the enclosing region.
    UsePolygon,
    /// Moisture is blended; tags still come from the enclosing region.
    #[default]
    InterpolatedWithRegionBiome,
}

/// A cell of the output raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterCoordinate {
    /// Column, in `[0, size)`.
    pub x: u32,
    /// Row, in `[0, size)`.
    pub y: u32,
}

impl RasterCoordinate {
    /// Create a new raster coordinate.
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Row-major index of this cell in a raster of the given side length.
    pub fn index(&self, size: u32) -> usize {
        self.y as usize * size as usize + self.x as usize
    }

    /// Inverse of [`index`](Self::index).
    pub fn from_index(index: usize, size: u32) -> Self {
        let size = size as usize;
        Self {
            x: (index % size) as u32,
            y: (index / size) as u32,
        }
    }

    /// Position of this cell in mesh space.
    pub fn to_mesh(&self, scale: f32) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32) * scale
    }
}

/// The data computed for one raster cell.
///
/// The default value is open water: no elevation, no moisture, no tags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleRecord {
    /// Where the cell was sampled, in mesh space.
    pub position: Vec2,
    /// Interpolated elevation.
    pub elevation: f32,
    /// Moisture according to the run's [`SelectionMode`].
    pub moisture: f32,
    /// Tags of the enclosing region.
    pub tags: BTreeSet<String>,
}

impl SampleRecord {
    /// An open-water sample at the given mesh position.
    pub fn open_water(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Returns `true` if this sample carries no data besides its position.
    pub fn is_open_water(&self) -> bool {
        self.elevation == 0.0 && self.moisture == 0.0 && self.tags.is_empty()
    }
}

/// Caller-supplied settings for a heightmap run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightmapSettings {
    /// Raster side length in cells.
    pub size: u32,
    /// How moisture and tags are chosen.
    pub selection_mode: SelectionMode,
    /// Which basis points the mesh interpolates between.
    pub anchor_mode: AnchorMode,
}

impl Default for HeightmapSettings {
    fn default() -> Self {
        Self {
            size: 128,
            selection_mode: SelectionMode::default(),
            anchor_mode: AnchorMode::default(),
        }
    }
}

/// Read-only configuration shared by every task of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunConfiguration {
    /// Raster side length in cells.
    pub size: u32,
    /// Mesh units per raster cell: `mesh_extent / size`.
    pub scale: f32,
    /// How moisture and tags are chosen.
    pub selection_mode: SelectionMode,
    /// Which basis points the mesh interpolates between.
    pub anchor_mode: AnchorMode,
}

impl RunConfiguration {
    /// Derive the run configuration for a mesh of the given extent.
    ///
    /// `settings.size` must be non-zero.
    pub fn new(settings: &HeightmapSettings, mesh_extent: f32) -> Self {
        Self {
            size: settings.size,
            scale: mesh_extent / settings.size as f32,
            selection_mode: settings.selection_mode,
            anchor_mode: settings.anchor_mode,
        }
    }

    /// Number of cells in the raster.
    pub fn cell_count(&self) -> usize {
        self.size as usize * self.size as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_is_row_major() {
        assert_eq!(RasterCoordinate::new(3, 0).index(4), 3);
        assert_eq!(RasterCoordinate::new(0, 1).index(4), 4);
        assert_eq!(RasterCoordinate::new(3, 3).index(4), 15);
        assert_eq!(RasterCoordinate::from_index(6, 4), RasterCoordinate::new(2, 1));
    }

    #[test]
    fn test_mesh_position_uses_scale() {
        let coord = RasterCoordinate::new(3, 5);
        assert_eq!(coord.to_mesh(2.5), Vec2::new(7.5, 12.5));
    }

    #[test]
    fn test_default_record_is_open_water() {
        let record = SampleRecord::default();
        assert!(record.is_open_water());
        assert_eq!(record.position, Vec2::ZERO);
        assert!(SampleRecord::open_water(Vec2::new(1.0, 2.0)).is_open_water());
    }

    #[test]
    fn test_run_configuration_scale() {
        let settings = HeightmapSettings {
            size: 256,
            ..Default::default()
        };
        let config = RunConfiguration::new(&settings, 1024.0);
        assert_eq!(config.scale, 4.0);
        assert_eq!(config.cell_count(), 65_536);
    }

    #[test]
    fn test_settings_ron_fills_missing_fields() {
        let settings: HeightmapSettings = ron::from_str("(size: 64)").unwrap();
        assert_eq!(settings.size, 64);
        assert_eq!(settings.selection_mode, SelectionMode::InterpolatedWithRegionBiome);
        assert_eq!(settings.anchor_mode, AnchorMode::TriangleCenter);
    }
}

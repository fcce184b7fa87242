//! Aggregate statistics over a finished heightmap.

use std::collections::BTreeMap;
use std::fmt;

use polymap_heightmap::Heightmap;

/// What the tool reports once a run completes.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightmapSummary {
    /// Raster side length.
    pub size: u32,
    /// Number of samples.
    pub cells: usize,
    /// Samples with no enclosing region.
    pub open_water: usize,
    /// Lowest and highest elevation.
    pub elevation_range: Option<(f32, f32)>,
    /// Mean moisture over all samples.
    pub mean_moisture: f32,
    /// Sample count per tag.
    pub tag_counts: BTreeMap<String, usize>,
}

impl HeightmapSummary {
    /// Summarize a heightmap.
    pub fn from_heightmap(heightmap: &Heightmap) -> Self {
        let samples = heightmap.samples();
        let mut tag_counts = BTreeMap::new();
        let mut open_water = 0;
        let mut moisture = 0.0_f64;

        for sample in samples {
            if sample.is_open_water() {
                open_water += 1;
            }
            moisture += sample.moisture as f64;
            for tag in &sample.tags {
                *tag_counts.entry(tag.clone()).or_insert(0) += 1;
            }
        }

        Self {
            size: heightmap.size(),
            cells: samples.len(),
            open_water,
            elevation_range: heightmap.elevation_range(),
            mean_moisture: if samples.is_empty() {
                0.0
            } else {
                (moisture / samples.len() as f64) as f32
            },
            tag_counts,
        }
    }
}

impl fmt::Display for HeightmapSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{0}x{0} heightmap, {1} cells", self.size, self.cells)?;
        if let Some((lo, hi)) = self.elevation_range {
            write!(f, ", elevation {lo:.3}..{hi:.3}")?;
        }
        write!(
            f,
            ", mean moisture {:.3}, {} open water",
            self.mean_moisture, self.open_water
        )?;
        for (tag, count) in &self.tag_counts {
            write!(f, ", {tag}: {count}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use polymap_graph::{AnchorMode, IslandBuilder, IslandParams};
    use polymap_heightmap::{HeightmapGenerator, HeightmapSettings, SelectionMode};

    use super::*;

    fn small_run() -> Heightmap {
        let mesh = IslandBuilder::new(IslandParams {
            extent: 100.0,
            cells_per_side: 10,
            ..Default::default()
        })
        .build()
        .unwrap();
        let generator = HeightmapGenerator::new(2).unwrap();
        generator
            .start_run(
                Arc::new(mesh),
                HeightmapSettings {
                    size: 16,
                    selection_mode: SelectionMode::UsePolygon,
                    anchor_mode: AnchorMode::Vertex,
                },
                || {},
            )
            .unwrap();
        assert!(generator.wait_for_completion(Duration::from_secs(30)));
        generator.heightmap().unwrap()
    }

    #[test]
    fn test_summary_counts_every_cell() {
        let summary = HeightmapSummary::from_heightmap(&small_run());
        assert_eq!(summary.size, 16);
        assert_eq!(summary.cells, 256);
        // Every island corner carries exactly one tag.
        assert_eq!(summary.tag_counts.values().sum::<usize>(), 256);
        assert!(summary.tag_counts.contains_key("ocean"));
        let (lo, hi) = summary.elevation_range.unwrap();
        assert!(lo <= hi);
    }

    #[test]
    fn test_display_mentions_size_and_tags() {
        let summary = HeightmapSummary::from_heightmap(&small_run());
        let text = summary.to_string();
        assert!(text.starts_with("16x16 heightmap, 256 cells"));
        assert!(text.contains("ocean: "));
    }
}

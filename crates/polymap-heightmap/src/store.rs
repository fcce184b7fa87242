//! Lock-free result storage and the finished raster.
//!
//! The store is pre-sized to the cell count of a run. Each task owns exactly
//! one slot, addressed by its row-major index, so concurrent inserts never
//! contend and insertion order does not matter.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::HeightmapError;
use crate::sample::{RasterCoordinate, SampleRecord};

/// One write-once slot per raster cell.
pub struct ResultStore {
    size: u32,
    slots: Box<[OnceLock<SampleRecord>]>,
    filled: AtomicUsize,
}

impl ResultStore {
    /// Create an empty store for a `size × size` raster.
    pub fn new(size: u32) -> Self {
        let len = size as usize * size as usize;
        Self {
            size,
            slots: (0..len).map(|_| OnceLock::new()).collect(),
            filled: AtomicUsize::new(0),
        }
    }

    /// Record the sample for the cell at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`HeightmapError::DuplicateSample`] if the slot was already
    /// written, which means a cell was dispatched twice.
    pub fn insert(&self, index: usize, record: SampleRecord) -> Result<(), HeightmapError> {
        let slot = self
            .slots
            .get(index)
            .ok_or(HeightmapError::SampleOutOfRange {
                index,
                len: self.slots.len(),
            })?;
        slot.set(record)
            .map_err(|_| HeightmapError::DuplicateSample { index })?;
        self.filled.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Raster side length.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of samples recorded so far.
    pub fn len(&self) -> usize {
        self.filled.load(Ordering::Acquire)
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` once every cell holds a sample.
    pub fn is_complete(&self) -> bool {
        !self.slots.is_empty() && self.len() == self.slots.len()
    }

    /// The sample for a cell, if it has been recorded.
    pub fn get(&self, index: usize) -> Option<&SampleRecord> {
        self.slots.get(index).and_then(OnceLock::get)
    }

    /// Copy the samples into a [`Heightmap`] once every cell is recorded.
    pub fn to_heightmap(&self) -> Option<Heightmap> {
        if !self.is_complete() {
            return None;
        }
        let samples = self
            .slots
            .iter()
            .map(|slot| slot.get().cloned())
            .collect::<Option<Vec<_>>>()?;
        Some(Heightmap {
            size: self.size,
            samples,
        })
    }
}

/// A finished raster of samples in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Heightmap {
    size: u32,
    samples: Vec<SampleRecord>,
}

impl Heightmap {
    /// Raster side length.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The sample at `(x, y)`, or `None` outside the raster.
    pub fn sample(&self, x: u32, y: u32) -> Option<&SampleRecord> {
        if x >= self.size || y >= self.size {
            return None;
        }
        self.samples.get(RasterCoordinate::new(x, y).index(self.size))
    }

    /// All samples, indexed by `y * size + x`.
    pub fn samples(&self) -> &[SampleRecord] {
        &self.samples
    }

    /// Iterate over cells and their samples in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (RasterCoordinate, &SampleRecord)> {
        self.samples
            .iter()
            .enumerate()
            .map(|(i, s)| (RasterCoordinate::from_index(i, self.size), s))
    }

    /// Lowest and highest elevation in the raster.
    pub fn elevation_range(&self) -> Option<(f32, f32)> {
        self.samples.iter().map(|s| s.elevation).fold(None, |acc, e| {
            Some(match acc {
                None => (e, e),
                Some((lo, hi)) => (lo.min(e), hi.max(e)),
            })
        })
    }

    /// Consume the raster and return its samples.
    pub fn into_samples(self) -> Vec<SampleRecord> {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(elevation: f32) -> SampleRecord {
        SampleRecord {
            elevation,
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_fills_slots() {
        let store = ResultStore::new(2);
        assert!(store.is_empty());
        for i in 0..4 {
            store.insert(i, record(i as f32)).unwrap();
        }
        assert!(store.is_complete());
        assert_eq!(store.get(3).map(|s| s.elevation), Some(3.0));
    }

    #[test]
    fn test_duplicate_insert_is_detected() {
        let store = ResultStore::new(2);
        store.insert(1, record(1.0)).unwrap();
        let err = store.insert(1, record(2.0)).unwrap_err();
        assert!(matches!(err, HeightmapError::DuplicateSample { index: 1 }));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(1).map(|s| s.elevation), Some(1.0));
    }

    #[test]
    fn test_out_of_range_insert_is_rejected() {
        let store = ResultStore::new(2);
        let err = store.insert(4, record(0.0)).unwrap_err();
        assert!(matches!(
            err,
            HeightmapError::SampleOutOfRange { index: 4, len: 4 }
        ));
    }

    #[test]
    fn test_heightmap_requires_every_cell() {
        let store = ResultStore::new(2);
        store.insert(0, record(1.0)).unwrap();
        assert!(store.to_heightmap().is_none());
        assert!(ResultStore::new(0).to_heightmap().is_none());
    }

    #[test]
    fn test_concurrent_inserts_out_of_order() {
        let store = std::sync::Arc::new(ResultStore::new(16));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in (t..256).step_by(4).rev() {
                        store.insert(i, record(i as f32)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let map = store.to_heightmap().unwrap();
        assert_eq!(map.samples().len(), 256);
        for (coord, sample) in map.iter() {
            assert_eq!(sample.elevation, coord.index(16) as f32);
        }
        assert_eq!(map.elevation_range(), Some((0.0, 255.0)));
        assert_eq!(map.sample(15, 15).map(|s| s.elevation), Some(255.0));
        assert!(map.sample(16, 0).is_none());
    }
}

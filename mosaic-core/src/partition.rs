//! Label map type and the nearest-seed partition seam.

use crate::{pixel_index, CpuBackend, Position, Result};

/// Nearest-seed index for every pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    width: u32,
    height: u32,
    seed_count: usize,
    labels: Vec<u32>,
}

impl LabelMap {
    /// Marker for a pixel with no nearest seed. Never present in a map
    /// returned by a backend.
    pub const UNASSIGNED: u32 = u32::MAX;

    pub(crate) fn new(width: u32, height: u32, seed_count: usize, labels: Vec<u32>) -> Self {
        debug_assert_eq!(labels.len(), width as usize * height as usize);
        Self {
            width,
            height,
            seed_count,
            labels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of seeds the map was computed from
    pub fn seed_count(&self) -> usize {
        self.seed_count
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.labels[pixel_index(x, y, self.width)]
    }

    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// True if every pixel carries a label in `[0, seed_count)`
    pub fn is_complete(&self) -> bool {
        self.labels
            .iter()
            .all(|&l| l != Self::UNASSIGNED && (l as usize) < self.seed_count)
    }

    /// Pixel count per seed
    pub fn areas(&self) -> Vec<u32> {
        let mut areas = vec![0u32; self.seed_count];
        for &label in &self.labels {
            if let Some(a) = areas.get_mut(label as usize) {
                *a += 1;
            }
        }
        areas
    }
}

/// Trait for nearest-seed partition backends
pub trait PartitionBackend {
    /// Label every pixel of a `width` x `height` grid with its nearest seed.
    ///
    /// Distance is squared Euclidean from the integer pixel coordinate; exact
    /// ties go to the lowest seed index.
    fn partition(&self, seeds: &[Position], width: u32, height: u32) -> Result<LabelMap>;
}

/// Partition with the default CPU backend
pub fn partition(seeds: &[Position], width: u32, height: u32) -> Result<LabelMap> {
    CpuBackend::new().partition(seeds, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MosaicError;

    #[test]
    fn test_two_seeds_split_evenly() {
        let seeds = vec![Position::new(2.0, 5.0), Position::new(7.0, 5.0)];
        let map = partition(&seeds, 10, 10).unwrap();
        assert!(map.is_complete());
        assert_eq!(map.areas(), vec![50, 50]);
        assert_eq!(map.get(0, 0), 0);
        assert_eq!(map.get(9, 9), 1);
    }

    #[test]
    fn test_tie_goes_to_lowest_index() {
        // Pixel x = 2 is equidistant from both seeds
        let seeds = vec![Position::new(1.0, 0.0), Position::new(3.0, 0.0)];
        let map = partition(&seeds, 5, 1).unwrap();
        assert_eq!(map.labels(), &[0, 0, 0, 1, 1]);

        let swapped = vec![Position::new(3.0, 0.0), Position::new(1.0, 0.0)];
        let map = partition(&swapped, 5, 1).unwrap();
        assert_eq!(map.labels(), &[1, 1, 0, 0, 0]);
    }

    #[test]
    fn test_duplicate_seed_never_wins() {
        let seeds = vec![Position::new(4.0, 4.0), Position::new(4.0, 4.0)];
        let map = partition(&seeds, 9, 9).unwrap();
        assert_eq!(map.areas(), vec![81, 0]);
    }

    #[test]
    fn test_no_seeds() {
        assert!(matches!(partition(&[], 4, 4), Err(MosaicError::NoSeeds)));
    }

    #[test]
    fn test_incomplete_map_detected() {
        let map = LabelMap::new(2, 1, 1, vec![0, LabelMap::UNASSIGNED]);
        assert!(!map.is_complete());
        assert_eq!(map.areas(), vec![1]);
    }
}

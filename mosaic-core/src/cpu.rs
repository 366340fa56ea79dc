//! CPU nearest-seed partition, optionally Rayon-parallel over rows.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::partition::PartitionBackend;
use crate::{check_dimensions, CancelFlag, LabelMap, MosaicError, Position, Result};

/// How the nearest seed for each pixel is found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NearestSeedSearch {
    /// Uniform bucket grid with expanding ring search
    #[default]
    Grid,
    /// Check every seed for every pixel
    BruteForce,
}

/// CPU backend for label map computation
#[derive(Debug, Clone, Default)]
pub struct CpuBackend {
    pub search: NearestSeedSearch,
    cancel: Option<CancelFlag>,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reference implementation, O(pixels x seeds)
    pub fn brute_force() -> Self {
        Self {
            search: NearestSeedSearch::BruteForce,
            cancel: None,
        }
    }

    pub fn with_search(search: NearestSeedSearch) -> Self {
        Self { search, cancel: None }
    }

    /// Abort between rows once `cancel` is set
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.is_cancelled() => Err(MosaicError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Seeds bucketed by the grid cell containing them.
struct SeedGrid {
    buckets: Vec<Vec<u32>>,
    cols: usize,
    rows: usize,
    cell_w: f64,
    cell_h: f64,
}

impl SeedGrid {
    fn build(seeds: &[Position], width: u32, height: u32) -> Self {
        let side = ((seeds.len() as f64).sqrt().ceil() as usize).max(1);
        let (cols, rows) = (side, side);
        let cell_w = width as f64 / cols as f64;
        let cell_h = height as f64 / rows as f64;

        let mut grid = Self {
            buckets: vec![Vec::new(); cols * rows],
            cols,
            rows,
            cell_w,
            cell_h,
        };
        for (i, seed) in seeds.iter().enumerate() {
            let (gc, gr) = grid.cell_of(seed.x, seed.y);
            grid.buckets[gr * cols + gc].push(i as u32);
        }
        grid
    }

    /// Grid cell for a point; points outside the image clamp to the border cells.
    #[inline]
    fn cell_of(&self, x: f64, y: f64) -> (usize, usize) {
        // float -> usize casts saturate, so negatives land in column/row 0
        let gc = ((x / self.cell_w) as usize).min(self.cols - 1);
        let gr = ((y / self.cell_h) as usize).min(self.rows - 1);
        (gc, gr)
    }

    /// Nearest seed to a pixel by expanding rings of grid cells.
    ///
    /// The search stops only once every unvisited seed is strictly farther
    /// than the best found, so equidistant seeds are always compared and the
    /// lowest index wins, matching the brute-force scan.
    #[inline]
    fn nearest(&self, px: f64, py: f64, seeds: &[Position]) -> u32 {
        let (gc, gr) = self.cell_of(px, py);
        let ox = px - gc as f64 * self.cell_w;
        let oy = py - gr as f64 * self.cell_h;

        let mut min_dist = f64::INFINITY;
        let mut nearest = u32::MAX;

        for r in 0usize.. {
            let r_start = gr.saturating_sub(r);
            let r_end = (gr + r + 1).min(self.rows);
            let c_start = gc.saturating_sub(r);
            let c_end = (gc + r + 1).min(self.cols);

            for ri in r_start..r_end {
                for ci in c_start..c_end {
                    // Interior of the ring was visited at a smaller radius
                    if r > 0 && ri.abs_diff(gr) < r && ci.abs_diff(gc) < r {
                        continue;
                    }
                    for &idx in &self.buckets[ri * self.cols + ci] {
                        let dist = squared_distance(px, py, &seeds[idx as usize]);
                        if dist < min_dist || (dist == min_dist && idx < nearest) {
                            min_dist = dist;
                            nearest = idx;
                        }
                    }
                }
            }

            if r_start == 0 && c_start == 0 && r_end == self.rows && c_end == self.cols {
                break;
            }
            // Slack absorbs rounding in the bucket boundaries so a seed sitting
            // exactly on a grid line still gets compared on a tie.
            let rf = r as f64;
            let slack = 1e-9 * (self.cell_w + self.cell_h);
            let min_unvisited = (ox + rf * self.cell_w)
                .min(self.cell_w * (rf + 1.0) - ox)
                .min(oy + rf * self.cell_h)
                .min(self.cell_h * (rf + 1.0) - oy)
                - slack;
            if min_unvisited > 0.0 && min_dist < min_unvisited * min_unvisited {
                break;
            }
        }

        nearest
    }
}

#[inline]
fn squared_distance(px: f64, py: f64, seed: &Position) -> f64 {
    let dx = px - seed.x;
    let dy = py - seed.y;
    dx * dx + dy * dy
}

/// Linear scan; strict `<` keeps the first of any equidistant seeds.
#[inline]
fn nearest_brute_force(px: f64, py: f64, seeds: &[Position]) -> u32 {
    let mut min_dist = f64::INFINITY;
    let mut nearest = 0u32;
    for (i, seed) in seeds.iter().enumerate() {
        let dist = squared_distance(px, py, seed);
        if dist < min_dist {
            min_dist = dist;
            nearest = i as u32;
        }
    }
    nearest
}

impl PartitionBackend for CpuBackend {
    fn partition(&self, seeds: &[Position], width: u32, height: u32) -> Result<LabelMap> {
        check_dimensions(width, height)?;
        if seeds.is_empty() {
            return Err(MosaicError::NoSeeds);
        }
        if let Some(index) = seeds.iter().position(|s| !s.is_finite()) {
            return Err(MosaicError::InvalidSeed { index });
        }

        let grid = match self.search {
            NearestSeedSearch::Grid => Some(SeedGrid::build(seeds, width, height)),
            NearestSeedSearch::BruteForce => None,
        };
        let grid_ref = grid.as_ref();

        let label_row = |y: u32| -> Result<Vec<u32>> {
            self.check_cancelled()?;
            let py = y as f64;
            Ok((0..width)
                .map(|x| {
                    let px = x as f64;
                    match grid_ref {
                        Some(grid) => grid.nearest(px, py, seeds),
                        None => nearest_brute_force(px, py, seeds),
                    }
                })
                .collect())
        };

        #[cfg(feature = "parallel")]
        let rows: Vec<Vec<u32>> = (0..height)
            .into_par_iter()
            .map(label_row)
            .collect::<Result<_>>()?;
        #[cfg(not(feature = "parallel"))]
        let rows: Vec<Vec<u32>> = (0..height).map(label_row).collect::<Result<_>>()?;

        let labels: Vec<u32> = rows.into_iter().flatten().collect();
        Ok(LabelMap::new(width, height, seeds.len(), labels))
    }
}

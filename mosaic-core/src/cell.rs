//! Cell polygons and average colors from a label map.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    check_dimensions, convex_hull, pixel_index, LabelMap, MosaicError, Position, Result, Rgb,
};

/// Color used for a seed that captured no pixels
const EMPTY_CELL_COLOR: Rgb = [128, 128, 128];

/// One mosaic cell: a convex polygon and its average color.
///
/// Vertices lie on pixel coordinates of the cell's boundary, in hull order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Index of the seed this cell belongs to
    pub seed: usize,
    pub vertices: Vec<Position>,
    pub color: Rgb,
}

impl Cell {
    /// CSS-style fill color, `#rrggbb`
    pub fn fill(&self) -> String {
        let [r, g, b] = self.color;
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Polygon area (shoelace)
    pub fn area(&self) -> f64 {
        let n = self.vertices.len();
        let twice: f64 = (0..n)
            .map(|i| {
                let a = &self.vertices[i];
                let b = &self.vertices[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum();
        twice.abs() / 2.0
    }
}

/// Options for turning labeled regions into polygons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellParams {
    /// When a cell's boundary pixels hull to fewer than 3 vertices (a single
    /// pixel or a one-pixel-wide strip), rebuild the hull from each pixel's
    /// half-pixel footprint, clamped to the image, before giving up on it.
    pub footprint_fallback: bool,
}

impl Default for CellParams {
    fn default() -> Self {
        Self {
            footprint_fallback: true,
        }
    }
}

/// Per-seed accumulators filled in one pass over the label map.
struct SeedStats {
    sums: Vec<[u64; 3]>,
    counts: Vec<u32>,
    boundaries: Vec<Vec<Position>>,
}

/// Boundary pixels sit on the image edge or touch a differently labeled
/// pixel among their 8 neighbors.
fn is_boundary(labels: &LabelMap, x: u32, y: u32) -> bool {
    let (w, h) = (labels.width(), labels.height());
    if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
        return true;
    }
    let label = labels.get(x, y);
    for ny in y - 1..=y + 1 {
        for nx in x - 1..=x + 1 {
            if labels.get(nx, ny) != label {
                return true;
            }
        }
    }
    false
}

fn collect_stats(labels: &LabelMap, image: &image::RgbaImage) -> SeedStats {
    let n = labels.seed_count();
    let mut stats = SeedStats {
        sums: vec![[0; 3]; n],
        counts: vec![0; n],
        boundaries: vec![Vec::new(); n],
    };
    let raw = image.as_raw();
    let width = labels.width();

    for y in 0..labels.height() {
        for x in 0..width {
            let s = labels.get(x, y) as usize;
            if s >= n {
                continue;
            }
            let i = pixel_index(x, y, width) * 4;
            let sum = &mut stats.sums[s];
            sum[0] += raw[i] as u64;
            sum[1] += raw[i + 1] as u64;
            sum[2] += raw[i + 2] as u64;
            stats.counts[s] += 1;
            if is_boundary(labels, x, y) {
                stats.boundaries[s].push(Position::new(x as f64, y as f64));
            }
        }
    }
    stats
}

/// Mean RGB (floor) of a seed's pixels, mid-gray if it has none
fn average_color(sum: &[u64; 3], count: u32) -> Rgb {
    if count == 0 {
        return EMPTY_CELL_COLOR;
    }
    let c = count as u64;
    [(sum[0] / c) as u8, (sum[1] / c) as u8, (sum[2] / c) as u8]
}

/// Hull of the half-pixel squares around each pixel, clamped to the image.
fn footprint_hull(pixels: &[Position], width: u32, height: u32) -> Vec<Position> {
    let (max_x, max_y) = ((width - 1) as f64, (height - 1) as f64);
    let corners: Vec<Position> = pixels
        .iter()
        .flat_map(|p| {
            let (x0, x1) = ((p.x - 0.5).max(0.0), (p.x + 0.5).min(max_x));
            let (y0, y1) = ((p.y - 0.5).max(0.0), (p.y + 0.5).min(max_y));
            [
                Position::new(x0, y0),
                Position::new(x1, y0),
                Position::new(x1, y1),
                Position::new(x0, y1),
            ]
        })
        .collect();
    convex_hull(&corners)
}

/// Extract one cell per seed with a non-degenerate boundary.
///
/// Seeds with no boundary pixels, or whose hull has fewer than 3 vertices,
/// produce no cell. Cells come back in seed order; `Cell::seed` keeps the
/// seed index even when earlier seeds were skipped.
pub fn extract_cells(
    labels: &LabelMap,
    image: &image::RgbaImage,
    params: &CellParams,
) -> Result<Vec<Cell>> {
    let (width, height) = (labels.width(), labels.height());
    check_dimensions(width, height)?;
    if image.dimensions() != (width, height) {
        return Err(MosaicError::DimensionMismatch {
            what: "image",
            width,
            height,
            actual_width: image.width(),
            actual_height: image.height(),
        });
    }

    let stats = collect_stats(labels, image);
    let mut cells = Vec::new();
    let mut degenerate = 0usize;

    for (seed, boundary) in stats.boundaries.iter().enumerate() {
        if boundary.is_empty() {
            continue;
        }
        let mut vertices = convex_hull(boundary);
        if vertices.len() < 3 && params.footprint_fallback {
            vertices = footprint_hull(boundary, width, height);
        }
        if vertices.len() < 3 {
            degenerate += 1;
            continue;
        }
        cells.push(Cell {
            seed,
            vertices,
            color: average_color(&stats.sums[seed], stats.counts[seed]),
        });
    }

    debug!(
        cells = cells.len(),
        degenerate,
        empty = stats.counts.iter().filter(|&&c| c == 0).count(),
        "cells extracted"
    );
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition;

    fn quadrant_image(size: u32) -> image::RgbaImage {
        let half = size / 2;
        image::RgbaImage::from_fn(size, size, |x, y| match (x < half, y < half) {
            (true, true) => image::Rgba([255, 0, 0, 255]),
            (false, true) => image::Rgba([0, 255, 0, 255]),
            (true, false) => image::Rgba([0, 0, 255, 255]),
            (false, false) => image::Rgba([255, 255, 255, 255]),
        })
    }

    #[test]
    fn test_quadrant_cells() {
        let image = quadrant_image(10);
        let seeds = vec![
            Position::new(2.0, 2.0),
            Position::new(7.0, 2.0),
            Position::new(2.0, 7.0),
            Position::new(7.0, 7.0),
        ];
        let labels = partition(&seeds, 10, 10).unwrap();
        let cells = extract_cells(&labels, &image, &CellParams::default()).unwrap();

        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0].color, [255, 0, 0]);
        assert_eq!(cells[1].color, [0, 255, 0]);
        assert_eq!(cells[2].color, [0, 0, 255]);
        assert_eq!(cells[3].color, [255, 255, 255]);
        assert_eq!(
            cells[0].vertices,
            vec![
                Position::new(0.0, 0.0),
                Position::new(4.0, 0.0),
                Position::new(4.0, 4.0),
                Position::new(0.0, 4.0),
            ]
        );
        assert_eq!(cells[3].area(), 16.0);
        assert_eq!(cells[0].fill(), "#ff0000");
    }

    #[test]
    fn test_average_color_floors() {
        // Two pixels: 0 and 255 on red -> 127
        let image =
            image::RgbaImage::from_fn(2, 1, |x, _| image::Rgba([(x * 255) as u8, 10, 11, 0]));
        let labels = partition(&[Position::new(0.0, 0.0)], 2, 1).unwrap();
        let stats = collect_stats(&labels, &image);
        assert_eq!(average_color(&stats.sums[0], stats.counts[0]), [127, 10, 11]);
    }

    #[test]
    fn test_empty_seed_defaults_to_gray() {
        assert_eq!(average_color(&[0, 0, 0], 0), [128, 128, 128]);
    }

    #[test]
    fn test_seed_without_pixels_skipped() {
        let image = quadrant_image(6);
        // Second seed duplicates the first and never wins a pixel
        let seeds = vec![Position::new(3.0, 3.0), Position::new(3.0, 3.0)];
        let labels = partition(&seeds, 6, 6).unwrap();
        let cells = extract_cells(&labels, &image, &CellParams::default()).unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].seed, 0);
    }

    #[test]
    fn test_single_pixel_cells_use_footprint() {
        let image = quadrant_image(2);
        let seeds = vec![
            Position::new(0.0, 0.0),
            Position::new(1.0, 0.0),
            Position::new(0.0, 1.0),
            Position::new(1.0, 1.0),
        ];
        let labels = partition(&seeds, 2, 2).unwrap();

        let cells = extract_cells(&labels, &image, &CellParams::default()).unwrap();
        assert_eq!(cells.len(), 4);
        assert_eq!(
            cells[3].vertices,
            vec![
                Position::new(0.5, 0.5),
                Position::new(1.0, 0.5),
                Position::new(1.0, 1.0),
                Position::new(0.5, 1.0),
            ]
        );

        let strict = CellParams {
            footprint_fallback: false,
        };
        assert!(extract_cells(&labels, &image, &strict).unwrap().is_empty());
    }

    #[test]
    fn test_one_pixel_wide_image_has_no_cells() {
        let image = image::RgbaImage::from_pixel(1, 5, image::Rgba([9, 9, 9, 255]));
        let labels = partition(&[Position::new(0.0, 2.0)], 1, 5).unwrap();
        let cells = extract_cells(&labels, &image, &CellParams::default()).unwrap();
        assert!(cells.is_empty());
    }

    #[test]
    fn test_image_size_mismatch() {
        let image = quadrant_image(4);
        let labels = partition(&[Position::new(0.0, 0.0)], 5, 4).unwrap();
        assert!(matches!(
            extract_cells(&labels, &image, &CellParams::default()),
            Err(MosaicError::DimensionMismatch { .. })
        ));
    }
}

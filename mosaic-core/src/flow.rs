//! Sobel edge-strength field over an RGBA image.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{check_dimensions, pixel_index, Result};

/// Per-pixel gradient and edge strength, row-major.
#[derive(Debug, Clone)]
pub struct FlowField {
    width: u32,
    height: u32,
    gx: Vec<f64>,
    gy: Vec<f64>,
    strength: Vec<f64>,
}

impl FlowField {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        pixel_index(x, y, self.width)
    }

    /// Edge strength `sqrt(gx² + gy²)` at a pixel
    pub fn strength(&self, x: u32, y: u32) -> f64 {
        self.strength[self.index(x, y)]
    }

    /// Horizontal and vertical gradient at a pixel
    pub fn gradient(&self, x: u32, y: u32) -> (f64, f64) {
        let i = self.index(x, y);
        (self.gx[i], self.gy[i])
    }

    /// Gradient direction in radians
    pub fn angle(&self, x: u32, y: u32) -> f64 {
        let (gx, gy) = self.gradient(x, y);
        gy.atan2(gx)
    }

    /// All edge strengths in row-major order
    pub fn strengths(&self) -> &[f64] {
        &self.strength
    }

    pub fn max_strength(&self) -> f64 {
        self.strength.iter().copied().fold(0.0, f64::max)
    }
}

/// Sobel weight for a neighbor offset along one axis.
///
/// `along` is the offset on the axis being differentiated, `across` the
/// offset on the other axis. Cardinal neighbors count double.
#[inline]
fn sobel_weight(along: i64, across: i64) -> i64 {
    match (along, across) {
        (0, _) => 0,
        (d, 0) => 2 * d,
        (d, _) => d,
    }
}

/// Compute gradients for one row. Out-of-bounds neighbors clamp to the edge.
///
/// Kernels run over the integer channel sum `R + G + B`; the division by 3
/// that turns it into a gray level is applied once per gradient, so flat
/// regions come out exactly zero.
fn gradient_row(image: &image::RgbaImage, y: u32) -> Vec<(f64, f64)> {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let raw = image.as_raw();
    let channel_sum = |x: usize, y: usize| -> i64 {
        let i = (y * width + x) * 4;
        raw[i] as i64 + raw[i + 1] as i64 + raw[i + 2] as i64
    };
    let clamp = |v: i64, len: usize| v.clamp(0, len as i64 - 1) as usize;

    (0..width)
        .map(|x| {
            let mut gx = 0i64;
            let mut gy = 0i64;
            for dy in -1..=1i64 {
                for dx in -1..=1i64 {
                    let nx = clamp(x as i64 + dx, width);
                    let ny = clamp(y as i64 + dy, height);
                    let v = channel_sum(nx, ny);
                    gx += v * sobel_weight(dx, dy);
                    gy += v * sobel_weight(dy, dx);
                }
            }
            (gx as f64 / 3.0, gy as f64 / 3.0)
        })
        .collect()
}

/// Compute the edge-strength field of an image.
///
/// Grayscale is the plain mean of R, G and B; alpha is ignored.
pub fn compute_flow_field(image: &image::RgbaImage) -> Result<FlowField> {
    let (width, height) = image.dimensions();
    check_dimensions(width, height)?;

    #[cfg(feature = "parallel")]
    let rows: Vec<Vec<(f64, f64)>> = (0..height)
        .into_par_iter()
        .map(|y| gradient_row(image, y))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Vec<(f64, f64)>> = (0..height).map(|y| gradient_row(image, y)).collect();

    let num_pixels = width as usize * height as usize;
    let mut gx = Vec::with_capacity(num_pixels);
    let mut gy = Vec::with_capacity(num_pixels);
    let mut strength = Vec::with_capacity(num_pixels);
    for (x_grad, y_grad) in rows.into_iter().flatten() {
        gx.push(x_grad);
        gy.push(y_grad);
        strength.push((x_grad * x_grad + y_grad * y_grad).sqrt());
    }

    Ok(FlowField {
        width,
        height,
        gx,
        gy,
        strength,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_image_has_no_edges() {
        let image = image::RgbaImage::from_pixel(16, 9, image::Rgba([90, 30, 200, 255]));
        let flow = compute_flow_field(&image).unwrap();
        assert_eq!(flow.strengths().len(), 16 * 9);
        assert!(flow.strengths().iter().all(|&s| s == 0.0));
        assert_eq!(flow.max_strength(), 0.0);
    }

    #[test]
    fn test_flat_regions_exact_for_any_gray() {
        // Gray levels that are not multiples of 1/3 in binary
        for rgb in [[1, 0, 0], [90, 30, 200], [7, 11, 13], [254, 255, 253]] {
            let pixel = image::Rgba([rgb[0], rgb[1], rgb[2], 255]);
            let image = image::RgbaImage::from_pixel(7, 5, pixel);
            let flow = compute_flow_field(&image).unwrap();
            assert!(flow.strengths().iter().all(|&s| s == 0.0), "{:?}", rgb);
        }

        // Step of one channel unit: gx = 4 / 3 from the 1-2-1 column weights
        let image =
            image::RgbaImage::from_fn(4, 3, |x, _| image::Rgba([(x >= 2) as u8, 0, 0, 255]));
        let flow = compute_flow_field(&image).unwrap();
        assert_eq!(flow.gradient(1, 1), (4.0 / 3.0, 0.0));
        assert_eq!(flow.strength(0, 1), 0.0);
    }

    #[test]
    fn test_vertical_step_edge() {
        // Columns 0-1 black, 2-3 white
        let image = image::RgbaImage::from_fn(4, 3, |x, _| {
            if x < 2 {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        });
        let flow = compute_flow_field(&image).unwrap();

        for y in 0..3 {
            // Left-hand column: neighbors clamp onto black pixels only
            assert_eq!(flow.strength(0, y), 0.0);
            // Column 1 sees the white column on its right with weights 1, 2, 1
            let (gx, gy) = flow.gradient(1, y);
            assert_eq!(gx, 255.0 * 4.0);
            assert_eq!(gy, 0.0);
            assert_eq!(flow.strength(1, y), 1020.0);
            assert_eq!(flow.strength(3, y), 0.0);
        }
        assert_eq!(flow.angle(1, 1), 0.0);
    }

    #[test]
    fn test_horizontal_step_edge_is_symmetric() {
        let image = image::RgbaImage::from_fn(3, 4, |_, y| {
            if y < 2 {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        });
        let flow = compute_flow_field(&image).unwrap();
        let (gx, gy) = flow.gradient(1, 1);
        assert_eq!(gx, 0.0);
        assert_eq!(gy, 1020.0);
    }

    #[test]
    fn test_alpha_is_ignored() {
        let image =
            image::RgbaImage::from_fn(5, 5, |x, _| image::Rgba([10, 10, 10, (x * 50) as u8]));
        let flow = compute_flow_field(&image).unwrap();
        assert!(flow.strengths().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_single_pixel_image() {
        let image = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 0, 0, 255]));
        let flow = compute_flow_field(&image).unwrap();
        assert_eq!(flow.strength(0, 0), 0.0);
    }

    #[test]
    fn test_empty_image_rejected() {
        let image = image::RgbaImage::new(0, 4);
        assert!(compute_flow_field(&image).is_err());
    }
}

//! Input normalization and output rendering for the `mosaic` binary.
//!
//! The core crate stays free of file formats; this crate decodes and fits
//! source images to the target canvas, then draws finished mosaics as PNG
//! rasters or SVG documents.

mod render;

pub use render::{rasterize, to_svg};

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};

/// Centre-crop `img` to the `width:height` aspect, then resize to exactly
/// `width` x `height` with a triangle (bilinear) filter.
///
/// Zero target dimensions yield an empty image; the core rejects those.
pub fn crop_and_resize(img: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    let (src_w, src_h) = (img.width(), img.height());
    if width == 0 || height == 0 || src_w == 0 || src_h == 0 {
        return RgbaImage::new(width, height);
    }

    // Largest window with the target aspect that fits the source
    let (crop_w, crop_h) = if src_w as u64 * height as u64 > src_h as u64 * width as u64 {
        let w = (src_h as u64 * width as u64 / height as u64) as u32;
        (w.max(1), src_h)
    } else {
        let h = (src_w as u64 * height as u64 / width as u64) as u32;
        (src_w, h.max(1))
    };
    let x = (src_w - crop_w) / 2;
    let y = (src_h - crop_h) / 2;

    let cropped = img.crop_imm(x, y, crop_w, crop_h).to_rgba8();
    if cropped.dimensions() == (width, height) {
        return cropped;
    }
    imageops::resize(&cropped, width, height, FilterType::Triangle)
}

//! Flow-guided Voronoi mosaic generation.
//!
//! Turns a raster image into a set of convex polygon cells with averaged
//! colors. Seeds are biased toward high-contrast regions using a Sobel edge
//! field, every pixel is assigned to its nearest seed, and each seed's region
//! is reduced to the convex hull of its boundary pixels.
//!
//! The pipeline is one-shot and stateless:
//!
//! ```text
//! image -> FlowField -> seeds -> LabelMap -> cells
//! ```
//!
//! ```no_run
//! let image = image::RgbaImage::from_pixel(64, 64, image::Rgba([200, 40, 40, 255]));
//! let cells = mosaic_core::generate_mosaic(&image, 150)?;
//! for cell in &cells {
//!     println!("{} {} vertices", cell.fill(), cell.vertices.len());
//! }
//! # Ok::<(), mosaic_core::MosaicError>(())
//! ```

mod cell;
mod cpu;
mod flow;
mod hull;
mod mosaic;
mod outline;
mod partition;
mod seed;

pub use cell::{extract_cells, Cell, CellParams};
pub use cpu::{CpuBackend, NearestSeedSearch};
pub use flow::{compute_flow_field, FlowField};
pub use hull::convex_hull;
pub use mosaic::{
    generate_mosaic, image_from_rgba, CancelFlag, Mosaic, MosaicConfig, MosaicGenerator,
};
pub use outline::{outline_styles, OutlineParams, OutlineStyle};
pub use partition::{partition, LabelMap, PartitionBackend};
pub use seed::{place_seeds, Position, SeedParams, SeedPlacement};

/// RGB color tuple
pub type Rgb = [u8; 3];

/// Error type for mosaic operations
#[derive(Debug, thiserror::Error)]
pub enum MosaicError {
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Pixel buffer has {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("{what} is {actual_width}x{actual_height}, expected {width}x{height}")]
    DimensionMismatch {
        what: &'static str,
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("No seeds provided")]
    NoSeeds,

    #[error("Seed {index} has a non-finite position")]
    InvalidSeed { index: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParams(String),

    #[error("Mosaic generation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, MosaicError>;

/// Row-major offset of pixel `(x, y)`, computed in `usize` so large images
/// do not wrap.
#[inline]
pub(crate) fn pixel_index(x: u32, y: u32, width: u32) -> usize {
    y as usize * width as usize + x as usize
}

/// Reject empty images before any stage runs.
pub(crate) fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(MosaicError::InvalidDimensions { width, height });
    }
    Ok(())
}

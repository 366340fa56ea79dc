//! End-to-end mosaic generation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

use crate::partition::PartitionBackend;
use crate::{
    check_dimensions, compute_flow_field, extract_cells, outline_styles, place_seeds, Cell,
    CellParams, CpuBackend, MosaicError, NearestSeedSearch, OutlineParams, OutlineStyle, Position,
    Result, SeedParams,
};

/// Wrap raw RGBA bytes as an image, checking the buffer matches the size.
pub fn image_from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<image::RgbaImage> {
    check_dimensions(width, height)?;
    let expected = width as usize * height as usize * 4;
    if pixels.len() != expected {
        return Err(MosaicError::BufferLength {
            width,
            height,
            expected,
            actual: pixels.len(),
        });
    }
    image::RgbaImage::from_raw(width, height, pixels)
        .ok_or(MosaicError::InvalidDimensions { width, height })
}

/// Shared flag for aborting a running generation from another thread
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Full generator configuration, loadable from YAML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MosaicConfig {
    /// Seed for the placement RNG
    pub rng_seed: u64,
    pub search: NearestSeedSearch,
    pub seeds: SeedParams,
    pub cells: CellParams,
    /// Compute edge-driven outline styles when set
    pub outline: Option<OutlineParams>,
}

impl MosaicConfig {
    pub fn validate(&self) -> Result<()> {
        self.seeds.validate()?;
        if let Some(outline) = &self.outline {
            outline.validate()?;
        }
        Ok(())
    }
}

/// Result of one generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mosaic {
    pub width: u32,
    pub height: u32,
    /// Seed budget asked for, excluding the fixed border seeds
    pub requested_seeds: usize,
    /// Every placed seed in pipeline order
    pub seeds: Vec<Position>,
    pub cells: Vec<Cell>,
    /// Outline per cell, parallel to `cells`; empty unless outlines were requested
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outlines: Vec<Option<OutlineStyle>>,
    /// Budgeted seeds that found no valid spot
    #[serde(default)]
    pub dropped_seeds: usize,
}

/// Runs the flow field, seed placement, partition and extraction stages.
///
/// Holds only configuration; every call allocates its own buffers, so one
/// generator can serve concurrent calls.
#[derive(Debug, Clone, Default)]
pub struct MosaicGenerator {
    config: MosaicConfig,
    cancel: Option<CancelFlag>,
}

impl MosaicGenerator {
    pub fn new(config: MosaicConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: None,
        })
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn config(&self) -> &MosaicConfig {
        &self.config
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.is_cancelled() => Err(MosaicError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Generate with an RNG seeded from `config.rng_seed`
    pub fn generate(&self, image: &image::RgbaImage, num_seeds: usize) -> Result<Mosaic> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.rng_seed);
        self.generate_with_rng(image, num_seeds, &mut rng)
    }

    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        image: &image::RgbaImage,
        num_seeds: usize,
        rng: &mut R,
    ) -> Result<Mosaic> {
        let (width, height) = image.dimensions();
        check_dimensions(width, height)?;
        let _span = info_span!("mosaic", width, height, num_seeds).entered();
        let start = Instant::now();

        let flow = compute_flow_field(image)?;
        debug!(max_strength = flow.max_strength(), "flow field computed");
        self.check_cancelled()?;

        let placement = place_seeds(&flow, num_seeds, &self.config.seeds, rng)?;
        self.check_cancelled()?;

        let mut backend = CpuBackend::with_search(self.config.search);
        if let Some(cancel) = &self.cancel {
            backend = backend.with_cancel(cancel.clone());
        }
        let labels = backend.partition(&placement.positions, width, height)?;
        debug!(seeds = labels.seed_count(), "label map computed");
        self.check_cancelled()?;

        let cells = extract_cells(&labels, image, &self.config.cells)?;

        let outlines = match &self.config.outline {
            Some(params) => {
                let by_seed = outline_styles(&labels, &flow, params)?;
                cells.iter().map(|c| by_seed[c.seed]).collect()
            }
            None => Vec::new(),
        };

        info!(
            cells = cells.len(),
            seeds = placement.positions.len(),
            dropped = placement.dropped,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "mosaic generated"
        );

        Ok(Mosaic {
            width,
            height,
            requested_seeds: num_seeds,
            dropped_seeds: placement.dropped,
            seeds: placement.positions,
            cells,
            outlines,
        })
    }
}

/// Generate mosaic cells with the default configuration.
///
/// Returns an empty list rather than an error if every cell is degenerate.
pub fn generate_mosaic(image: &image::RgbaImage, num_seeds: usize) -> Result<Vec<Cell>> {
    Ok(MosaicGenerator::default().generate(image, num_seeds)?.cells)
}

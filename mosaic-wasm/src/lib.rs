//! WASM bindings for mosaic-core.
//!
//! Takes RGBA pixel data from a canvas and returns mosaic cells as flat
//! typed arrays for efficient JS interop. The browser side owns drawing.

use mosaic_core::{
    image_from_rgba, Mosaic, MosaicConfig, MosaicError, MosaicGenerator, OutlineParams,
};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn to_js(err: MosaicError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Cells of one generated mosaic.
/// Polygon `i` spans `vertices[2 * vertex_offsets[i] .. 2 * vertex_offsets[i + 1]]`.
#[wasm_bindgen]
pub struct MosaicFrame {
    seed_indices: Vec<u32>,
    vertex_offsets: Vec<u32>,
    vertices_flat: Vec<f64>,
    colors_flat: Vec<u8>,
    outline_grays: Vec<u8>,
    outline_widths: Vec<f64>,
    dropped_seeds: u32,
    width: u32,
    height: u32,
}

#[wasm_bindgen]
impl MosaicFrame {
    /// Index of the seed each cell came from (length = cell_count)
    #[wasm_bindgen(getter)]
    pub fn seed_indices(&self) -> Vec<u32> {
        self.seed_indices.clone()
    }

    /// Vertex start index per cell plus a final end index (length = cell_count + 1)
    #[wasm_bindgen(getter)]
    pub fn vertex_offsets(&self) -> Vec<u32> {
        self.vertex_offsets.clone()
    }

    /// Flat [x0,y0, x1,y1, ...] vertices of every cell, in order
    #[wasm_bindgen(getter)]
    pub fn vertices(&self) -> Vec<f64> {
        self.vertices_flat.clone()
    }

    /// Flat RGB colors per cell (length = cell_count * 3)
    #[wasm_bindgen(getter)]
    pub fn colors(&self) -> Vec<u8> {
        self.colors_flat.clone()
    }

    /// Outline gray per cell; empty unless outlines were requested
    #[wasm_bindgen(getter)]
    pub fn outline_grays(&self) -> Vec<u8> {
        self.outline_grays.clone()
    }

    /// Outline stroke width per cell, 0 where a cell has no outline
    #[wasm_bindgen(getter)]
    pub fn outline_widths(&self) -> Vec<f64> {
        self.outline_widths.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn dropped_seeds(&self) -> u32 {
        self.dropped_seeds
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[wasm_bindgen(getter)]
    pub fn cell_count(&self) -> usize {
        self.seed_indices.len()
    }
}

impl MosaicFrame {
    fn from_mosaic(mosaic: Mosaic) -> Self {
        let mut vertex_offsets = Vec::with_capacity(mosaic.cells.len() + 1);
        let mut vertices_flat = Vec::new();
        vertex_offsets.push(0);
        for cell in &mosaic.cells {
            vertices_flat.extend(cell.vertices.iter().flat_map(|p| [p.x, p.y]));
            vertex_offsets.push((vertices_flat.len() / 2) as u32);
        }
        let colors_flat: Vec<u8> = mosaic.cells.iter().flat_map(|c| c.color).collect();
        let outline_grays = mosaic.outlines.iter().map(|o| o.map_or(0, |s| s.gray)).collect();
        let outline_widths = mosaic
            .outlines
            .iter()
            .map(|o| o.map_or(0.0, |s| s.width))
            .collect();
        Self {
            seed_indices: mosaic.cells.iter().map(|c| c.seed as u32).collect(),
            vertex_offsets,
            vertices_flat,
            colors_flat,
            outline_grays,
            outline_widths,
            dropped_seeds: mosaic.dropped_seeds as u32,
            width: mosaic.width,
            height: mosaic.height,
        }
    }
}

/// One-shot generation from RGBA pixel data.
#[wasm_bindgen]
pub fn generate_mosaic(
    rgba_data: &[u8],
    width: u32,
    height: u32,
    num_seeds: u32,
    seed: u32,
) -> Result<MosaicFrame, JsValue> {
    let mut engine = MosaicEngine::new(rgba_data, width, height)?;
    engine.generate(num_seeds, seed)
}

/// Holds a source image so it can be re-tiled with different seed counts
/// or RNG seeds without copying the pixels across the boundary again.
#[wasm_bindgen]
pub struct MosaicEngine {
    image: image::RgbaImage,
    config: MosaicConfig,
}

#[wasm_bindgen]
impl MosaicEngine {
    /// Create a new engine from RGBA pixel data.
    #[wasm_bindgen(constructor)]
    pub fn new(rgba_data: &[u8], width: u32, height: u32) -> Result<MosaicEngine, JsValue> {
        let image = image_from_rgba(width, height, rgba_data.to_vec()).map_err(to_js)?;
        Ok(Self {
            image,
            config: MosaicConfig::default(),
        })
    }

    /// Replace the source image (e.g. on resize).
    pub fn set_image(&mut self, rgba_data: &[u8], width: u32, height: u32) -> Result<(), JsValue> {
        self.image = image_from_rgba(width, height, rgba_data.to_vec()).map_err(to_js)?;
        Ok(())
    }

    /// Toggle edge-driven outline styles in generated frames.
    pub fn set_outlines(&mut self, enabled: bool) {
        self.config.outline = enabled.then(OutlineParams::default);
    }

    /// Generate a mosaic of the current image.
    pub fn generate(&mut self, num_seeds: u32, seed: u32) -> Result<MosaicFrame, JsValue> {
        self.config.rng_seed = seed as u64;
        let mosaic = MosaicGenerator::new(self.config.clone())
            .and_then(|g| g.generate(&self.image, num_seeds as usize))
            .map_err(to_js)?;
        Ok(MosaicFrame::from_mosaic(mosaic))
    }
}

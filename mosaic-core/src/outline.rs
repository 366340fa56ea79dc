//! Edge-driven outline styling for cells.
//!
//! Cells whose borders run along strong image edges get darker, thicker
//! outlines; cells in flat regions get faint hairlines.

use serde::{Deserialize, Serialize};

use crate::{FlowField, LabelMap, MosaicError, Result};

/// Stroke for one cell outline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlineStyle {
    /// Stroke gray level
    pub gray: u8,
    /// Stroke width in pixels
    pub width: f64,
    /// Mean edge strength along the cell border
    pub edge_strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineParams {
    /// Edge strength that maps to full intensity
    pub saturation: f64,
    pub light_gray: u8,
    pub dark_gray: u8,
    pub thin_width: f64,
    pub thick_width: f64,
}

impl Default for OutlineParams {
    fn default() -> Self {
        Self {
            saturation: 50.0,
            light_gray: 200,
            dark_gray: 20,
            thin_width: 0.3,
            thick_width: 2.5,
        }
    }
}

impl OutlineParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.saturation.is_finite() && self.saturation > 0.0) {
            return Err(MosaicError::InvalidParams(format!(
                "outline saturation must be positive, got {}",
                self.saturation
            )));
        }
        if !(self.thin_width >= 0.0 && self.thick_width >= 0.0) {
            return Err(MosaicError::InvalidParams("outline widths must be non-negative".into()));
        }
        Ok(())
    }

    /// Map a mean edge strength onto a stroke
    pub fn style(&self, edge_strength: f64) -> OutlineStyle {
        let t = (edge_strength / self.saturation).clamp(0.0, 1.0);
        let light = self.light_gray as f64;
        let dark = self.dark_gray as f64;
        OutlineStyle {
            gray: (light + (dark - light) * t).round() as u8,
            width: self.thin_width + (self.thick_width - self.thin_width) * t,
            edge_strength,
        }
    }
}

/// Outline style per seed index, `None` for seeds that own no pixels.
///
/// Only pixels touching a differently labeled neighbor count; the image
/// frame is not an edge here. A seed with pixels but no such border (the
/// only seed in the image) has a mean edge strength of 0 and gets the
/// flat-region hairline.
pub fn outline_styles(
    labels: &LabelMap,
    flow: &FlowField,
    params: &OutlineParams,
) -> Result<Vec<Option<OutlineStyle>>> {
    let (w, h) = (labels.width(), labels.height());
    if (flow.width(), flow.height()) != (w, h) {
        return Err(MosaicError::DimensionMismatch {
            what: "flow field",
            width: w,
            height: h,
            actual_width: flow.width(),
            actual_height: flow.height(),
        });
    }
    params.validate()?;

    let n = labels.seed_count();
    let mut sums = vec![0.0f64; n];
    let mut counts = vec![0u32; n];
    let areas = labels.areas();

    for y in 0..h {
        for x in 0..w {
            let label = labels.get(x, y);
            let s = label as usize;
            if s >= n {
                continue;
            }
            let touches_other = (y.saturating_sub(1)..=(y + 1).min(h - 1)).any(|ny| {
                (x.saturating_sub(1)..=(x + 1).min(w - 1)).any(|nx| labels.get(nx, ny) != label)
            });
            if touches_other {
                sums[s] += flow.strength(x, y);
                counts[s] += 1;
            }
        }
    }

    Ok((0..n)
        .map(|s| {
            let mean = if counts[s] > 0 { sums[s] / counts[s] as f64 } else { 0.0 };
            (areas[s] > 0).then(|| params.style(mean))
        })
        .collect())
}

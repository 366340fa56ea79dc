//! Seed positions and flow-guided seed placement.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{check_dimensions, FlowField, MosaicError, Result};

/// 2D position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared distance to another position
    pub fn dist_sq(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Distance to another position
    pub fn dist(&self, other: &Position) -> f64 {
        self.dist_sq(other).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Tuning for seed placement.
///
/// The defaults reproduce the empirically tuned mosaic look; they carry no
/// derivation and are exposed so alternate tunings can be tried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedParams {
    /// Each image edge is split into this many segments; the interior
    /// division points become fixed seeds.
    pub border_divisions: u32,
    /// Minimum separation is `max(width, height) / min_distance_divisor`.
    pub min_distance_divisor: f64,
    /// Added to every pixel's edge strength when sampling, so flat regions
    /// still get a nonzero chance.
    pub weight_bias: f64,
    /// Fraction of the requested seeds drawn from the edge-weighted
    /// distribution; the rest are uniform.
    pub edge_seed_ratio: f64,
    /// Candidates tried per seed before relaxing or dropping it.
    pub max_attempts: u32,
    /// Edge-weighted seeds past this fraction of their budget get a relaxed
    /// second pass.
    pub edge_relax_after: f64,
    /// Separation multiplier for the relaxed edge-weighted pass.
    pub edge_relax_factor: f64,
    /// Separation multiplier for the relaxed uniform pass.
    pub uniform_relax_factor: f64,
}

impl Default for SeedParams {
    fn default() -> Self {
        Self {
            border_divisions: 8,
            min_distance_divisor: 15.0,
            weight_bias: 1.0,
            edge_seed_ratio: 0.6,
            max_attempts: 30,
            edge_relax_after: 0.5,
            edge_relax_factor: 0.7,
            uniform_relax_factor: 0.6,
        }
    }
}

impl SeedParams {
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, v: f64| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(MosaicError::InvalidParams(format!("{name} must be in [0, 1], got {v}")))
            }
        };
        if self.border_divisions == 0 {
            return Err(MosaicError::InvalidParams("border_divisions must be at least 1".into()));
        }
        if !(self.min_distance_divisor.is_finite() && self.min_distance_divisor > 0.0) {
            return Err(MosaicError::InvalidParams(format!(
                "min_distance_divisor must be positive, got {}",
                self.min_distance_divisor
            )));
        }
        if !(self.weight_bias.is_finite() && self.weight_bias > 0.0) {
            return Err(MosaicError::InvalidParams(format!(
                "weight_bias must be positive, got {}",
                self.weight_bias
            )));
        }
        unit("edge_seed_ratio", self.edge_seed_ratio)?;
        unit("edge_relax_after", self.edge_relax_after)?;
        unit("edge_relax_factor", self.edge_relax_factor)?;
        unit("uniform_relax_factor", self.uniform_relax_factor)?;
        Ok(())
    }

    /// Number of fixed corner and border seeds placed regardless of budget
    pub fn fixed_seed_count(&self) -> usize {
        4 + 4 * (self.border_divisions as usize - 1)
    }
}

/// Ordered seeds plus a tally of how the budget was spent.
///
/// Order is `[corners, border points, edge-weighted, uniform]`; a seed's
/// index in `positions` is its identity for the rest of the pipeline.
#[derive(Debug, Clone)]
pub struct SeedPlacement {
    pub positions: Vec<Position>,
    pub fixed: usize,
    pub edge_weighted: usize,
    pub uniform: usize,
    /// Requested seeds that found no valid spot. Expected under tight
    /// separation; not an error.
    pub dropped: usize,
}

impl SeedPlacement {
    pub fn into_positions(self) -> Vec<Position> {
        self.positions
    }
}

/// Inverse-CDF sampler over pixels weighted by `strength + bias`.
struct WeightedPixelSampler {
    cumulative: Vec<f64>,
    width: u32,
}

impl WeightedPixelSampler {
    fn new(flow: &FlowField, bias: f64) -> Self {
        let mut sum = 0.0;
        let cumulative = flow
            .strengths()
            .iter()
            .map(|s| {
                sum += s + bias;
                sum
            })
            .collect();
        Self {
            cumulative,
            width: flow.width(),
        }
    }

    fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// First pixel whose running weight reaches a uniform draw in `[0, total)`.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        let target = rng.gen::<f64>() * self.total();
        let idx = self.cumulative.partition_point(|&c| c < target);
        if idx >= self.cumulative.len() {
            return None;
        }
        let w = self.width as usize;
        Some(Position::new((idx % w) as f64, (idx / w) as f64))
    }
}

fn is_far_enough(candidate: &Position, seeds: &[Position], min_dist: f64) -> bool {
    let min_dist_sq = min_dist * min_dist;
    seeds.iter().all(|s| candidate.dist_sq(s) >= min_dist_sq)
}

/// Try up to `attempts` candidates; keep the first that clears `min_dist`.
fn try_place<F>(seeds: &mut Vec<Position>, attempts: u32, min_dist: f64, mut candidate: F) -> bool
where
    F: FnMut() -> Option<Position>,
{
    for _ in 0..attempts {
        if let Some(pos) = candidate() {
            if is_far_enough(&pos, seeds, min_dist) {
                seeds.push(pos);
                return true;
            }
        }
    }
    false
}

/// Corners, then interior division points along top, bottom, left, right.
fn fixed_seeds(width: f64, height: f64, divisions: u32) -> Vec<Position> {
    let (right, bottom) = (width - 1.0, height - 1.0);
    let mut seeds = vec![
        Position::new(0.0, 0.0),
        Position::new(right, 0.0),
        Position::new(0.0, bottom),
        Position::new(right, bottom),
    ];
    for i in 1..divisions {
        let t = i as f64 / divisions as f64;
        seeds.push(Position::new(t * right, 0.0));
        seeds.push(Position::new(t * right, bottom));
        seeds.push(Position::new(0.0, t * bottom));
        seeds.push(Position::new(right, t * bottom));
    }
    seeds
}

/// Place seeds biased toward strong edges in `flow`.
///
/// The fixed corner and border seeds are always placed and are not checked
/// against each other. Of the `num_seeds` budget, `edge_seed_ratio` is drawn
/// proportionally to edge strength and the rest uniformly, each subject to a
/// minimum separation from every seed already placed. Seeds that exhaust their
/// attempts (including the relaxed passes) are dropped, so fewer than
/// `fixed + num_seeds` positions may come back.
pub fn place_seeds<R: Rng + ?Sized>(
    flow: &FlowField,
    num_seeds: usize,
    params: &SeedParams,
    rng: &mut R,
) -> Result<SeedPlacement> {
    let (width, height) = (flow.width(), flow.height());
    check_dimensions(width, height)?;
    params.validate()?;

    let (w, h) = (width as f64, height as f64);
    let (max_x, max_y) = (w - 1.0, h - 1.0);
    let mut seeds = fixed_seeds(w, h, params.border_divisions);
    let fixed = seeds.len();

    let min_distance = w.max(h) / params.min_distance_divisor;
    let num_edge_seeds = (num_seeds as f64 * params.edge_seed_ratio).floor() as usize;
    let num_uniform_seeds = num_seeds - num_edge_seeds.min(num_seeds);
    let attempts = params.max_attempts;

    let sampler = WeightedPixelSampler::new(flow, params.weight_bias);
    debug!(
        min_distance,
        total_weight = sampler.total(),
        num_edge_seeds,
        num_uniform_seeds,
        "placing seeds"
    );

    let before_edge = seeds.len();
    for i in 0..num_edge_seeds {
        let placed = try_place(&mut seeds, attempts, min_distance, || sampler.sample(rng));
        if !placed && i as f64 > num_edge_seeds as f64 * params.edge_relax_after {
            try_place(
                &mut seeds,
                attempts,
                min_distance * params.edge_relax_factor,
                || sampler.sample(rng),
            );
        }
    }
    let edge_weighted = seeds.len() - before_edge;

    let before_uniform = seeds.len();
    let (inset_x, inset_y) = ((min_distance, w - min_distance), (min_distance, h - min_distance));
    for _ in 0..num_uniform_seeds {
        let placed = try_place(&mut seeds, attempts, min_distance, || {
            let x = inset_x.0 + rng.gen::<f64>() * (inset_x.1 - inset_x.0);
            let y = inset_y.0 + rng.gen::<f64>() * (inset_y.1 - inset_y.0);
            Some(Position::new(x.clamp(0.0, max_x), y.clamp(0.0, max_y)))
        });
        if !placed {
            try_place(
                &mut seeds,
                attempts,
                min_distance * params.uniform_relax_factor,
                || Some(Position::new(rng.gen::<f64>() * max_x, rng.gen::<f64>() * max_y)),
            );
        }
    }
    let uniform = seeds.len() - before_uniform;

    let dropped = num_seeds - edge_weighted - uniform;
    debug!(fixed, edge_weighted, uniform, dropped, "seeds placed");

    Ok(SeedPlacement {
        positions: seeds,
        fixed,
        edge_weighted,
        uniform,
        dropped,
    })
}

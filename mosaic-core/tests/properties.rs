//! Property-based tests for the mosaic pipeline.
//!
//! Run with: cargo test -p mosaic-core --test properties

use mosaic_core::{
    partition, CpuBackend, MosaicConfig, MosaicGenerator, PartitionBackend, Position,
};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// Small RGBA image with arbitrary pixel data.
fn arb_image() -> impl Strategy<Value = image::RgbaImage> {
    (1u32..24, 1u32..24).prop_flat_map(|(w, h)| {
        prop::collection::vec(any::<u8>(), (w * h * 4) as usize).prop_map(move |pixels| {
            image::RgbaImage::from_raw(w, h, pixels).expect("buffer sized for image")
        })
    })
}

/// Seeds on the integer lattice of a `w` x `h` grid, so exact ties are common.
fn arb_lattice_seeds(w: u32, h: u32) -> impl Strategy<Value = Vec<Position>> {
    prop::collection::vec((0..w, 0..h), 1..30).prop_map(|coords| {
        coords
            .into_iter()
            .map(|(x, y)| Position::new(x as f64, y as f64))
            .collect()
    })
}

fn generate(image: &image::RgbaImage, num_seeds: usize, rng_seed: u64) -> mosaic_core::Mosaic {
    MosaicGenerator::new(MosaicConfig {
        rng_seed,
        ..MosaicConfig::default()
    })
    .expect("default config is valid")
    .generate(image, num_seeds)
    .expect("generation succeeds on a non-empty image")
}

// =============================================================================
// Property Tests: Generation
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Cell count never exceeds the budget plus the fixed border seeds.
    #[test]
    fn cell_count_bounded(image in arb_image(), num_seeds in 0usize..40, rng_seed in any::<u64>()) {
        let mosaic = generate(&image, num_seeds, rng_seed);
        prop_assert!(mosaic.seeds.len() <= num_seeds + 32);
        prop_assert!(mosaic.cells.len() <= mosaic.seeds.len());
    }

    /// Every cell is a real polygon inside the pixel rectangle.
    #[test]
    fn vertices_in_bounds(image in arb_image(), num_seeds in 0usize..40, rng_seed in any::<u64>()) {
        let (w, h) = image.dimensions();
        let mosaic = generate(&image, num_seeds, rng_seed);
        for cell in &mosaic.cells {
            prop_assert!(cell.vertices.len() >= 3);
            for v in &cell.vertices {
                prop_assert!(v.x >= 0.0 && v.x <= (w - 1) as f64);
                prop_assert!(v.y >= 0.0 && v.y <= (h - 1) as f64);
            }
        }
        for s in &mosaic.seeds {
            prop_assert!(s.x >= 0.0 && s.x <= (w - 1) as f64);
            prop_assert!(s.y >= 0.0 && s.y <= (h - 1) as f64);
        }
    }

    /// Average color lies within the per-channel range of the cell's pixels.
    #[test]
    fn color_within_pixel_range(
        image in arb_image(),
        num_seeds in 0usize..30,
        rng_seed in any::<u64>(),
    ) {
        let (w, h) = image.dimensions();
        let mosaic = generate(&image, num_seeds, rng_seed);
        let labels = partition(&mosaic.seeds, w, h).unwrap();

        for cell in &mosaic.cells {
            let mut lo = [u8::MAX; 3];
            let mut hi = [u8::MIN; 3];
            for y in 0..h {
                for x in 0..w {
                    if labels.get(x, y) as usize == cell.seed {
                        let p = image.get_pixel(x, y);
                        for c in 0..3 {
                            lo[c] = lo[c].min(p[c]);
                            hi[c] = hi[c].max(p[c]);
                        }
                    }
                }
            }
            for c in 0..3 {
                prop_assert!(lo[c] <= cell.color[c] && cell.color[c] <= hi[c]);
            }
        }
    }

    /// Same RNG seed, same mosaic.
    #[test]
    fn generation_is_deterministic(
        image in arb_image(),
        num_seeds in 0usize..30,
        rng_seed in any::<u64>(),
    ) {
        let a = generate(&image, num_seeds, rng_seed);
        let b = generate(&image, num_seeds, rng_seed);
        prop_assert_eq!(a.seeds, b.seeds);
        prop_assert_eq!(a.cells, b.cells);
    }
}

// =============================================================================
// Property Tests: Partition
// =============================================================================

proptest! {
    /// Every pixel is labeled with the lowest-index seed at minimum distance.
    #[test]
    fn labels_are_lowest_index_nearest(
        (w, h, seeds) in (1u32..20, 1u32..20)
            .prop_flat_map(|(w, h)| (Just(w), Just(h), arb_lattice_seeds(w, h)))
    ) {
        let labels = partition(&seeds, w, h).unwrap();
        prop_assert!(labels.is_complete());

        for y in 0..h {
            for x in 0..w {
                let p = Position::new(x as f64, y as f64);
                let best = seeds
                    .iter()
                    .map(|s| p.dist_sq(s))
                    .fold(f64::INFINITY, f64::min);
                let expected = seeds.iter().position(|s| p.dist_sq(s) == best).unwrap();
                prop_assert_eq!(labels.get(x, y) as usize, expected);
            }
        }
    }

    /// Grid search matches brute force on arbitrary real-valued seeds.
    #[test]
    fn grid_matches_brute_force(
        (w, h, seeds) in (1u32..40, 1u32..40).prop_flat_map(|(w, h)| {
            let coord = (0.0..w as f64, 0.0..h as f64);
            (Just(w), Just(h), prop::collection::vec(coord, 1..60))
        })
    ) {
        let seeds: Vec<Position> = seeds.into_iter().map(|(x, y)| Position::new(x, y)).collect();
        let grid = CpuBackend::new().partition(&seeds, w, h).unwrap();
        let brute = CpuBackend::brute_force().partition(&seeds, w, h).unwrap();
        prop_assert_eq!(grid, brute);
    }
}

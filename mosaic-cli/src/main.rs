//! Flow-guided mosaic CLI
//!
//! Turns an image into a stained-glass mosaic of convex cells whose borders
//! follow the picture's edges.
//!
//! Run with: `mosaic -i img.jpg -o out.png --svg out.svg -n 300`
//!
//! ## YAML config file
//!
//! ```yaml
//! rng_seed: 7
//! search: grid          # or brute_force
//! seeds:
//!   edge_seed_ratio: 0.6
//!   min_distance_divisor: 15
//! cells:
//!   footprint_fallback: true
//! outline: {}           # enable edge-driven outlines with default styling
//! ```
//!
//! Run with: `mosaic -i img.jpg -o out.png --config mosaic.yaml`
//!
//! ## Graceful interruption
//!
//! Press Ctrl+C to abort a long generation; nothing is written.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mosaic_cli::{crop_and_resize, rasterize, to_svg};
use mosaic_core::{
    CancelFlag, Mosaic, MosaicConfig, MosaicError, MosaicGenerator, NearestSeedSearch,
    OutlineParams,
};

#[derive(Parser, Debug)]
#[command(name = "mosaic")]
#[command(about = "Render flow-guided Voronoi mosaics", long_about = None)]
#[command(arg_required_else_help = true)]
struct Args {
    /// Input image path
    #[arg(short, long)]
    input: PathBuf,

    /// Output PNG path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output SVG path
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write the generated mosaic (seeds and cells) as JSON
    #[arg(long)]
    cells: Option<PathBuf>,

    /// Number of seeds to place beyond the fixed border seeds
    #[arg(short = 'n', long, default_value = "150")]
    seeds: usize,

    /// Random seed for reproducibility (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Canvas width; the input is centre-cropped and resized to fit
    #[arg(long, default_value = "400")]
    width: u32,

    /// Canvas height; the input is centre-cropped and resized to fit
    #[arg(long, default_value = "400")]
    height: u32,

    /// YAML config file for generator parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stroke SVG cells with edge-driven outlines
    #[arg(long)]
    outline: bool,

    /// Use the brute-force nearest-seed scan instead of the spatial grid
    #[arg(long)]
    brute_force: bool,

    /// Log debug detail for each pipeline stage
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(path: &Path) -> anyhow::Result<MosaicConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {:?}", path))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse config file: {:?}", path))
}

/// Merge CLI overrides into the file config (or the defaults).
fn resolve_config(args: &Args) -> anyhow::Result<MosaicConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => MosaicConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.rng_seed = seed;
    }
    if args.brute_force {
        config.search = NearestSeedSearch::BruteForce;
    }
    if args.outline && config.outline.is_none() {
        config.outline = Some(OutlineParams::default());
    }
    Ok(config)
}

fn write_outputs(args: &Args, mosaic: &Mosaic) -> anyhow::Result<()> {
    if let Some(path) = &args.output {
        rasterize(mosaic)
            .save(path)
            .with_context(|| format!("failed to write PNG: {:?}", path))?;
        info!("PNG saved to: {:?}", path);
    }
    if let Some(path) = &args.svg {
        std::fs::write(path, to_svg(mosaic))
            .with_context(|| format!("failed to write SVG: {:?}", path))?;
        info!("SVG saved to: {:?}", path);
    }
    if let Some(path) = &args.cells {
        let json = serde_json::to_string_pretty(mosaic).context("failed to serialize mosaic")?;
        std::fs::write(path, json).with_context(|| format!("failed to write JSON: {:?}", path))?;
        info!("Cells saved to: {:?}", path);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.output.is_none() && args.svg.is_none() && args.cells.is_none() {
        anyhow::bail!("no output requested (use -o/--output, --svg, or --cells)");
    }

    let config = resolve_config(&args)?;

    // Set up SIGINT handler
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel()).context("failed to set Ctrl-C handler")?;
    }

    info!("Loading image: {:?}", args.input);
    let source = image::open(&args.input)
        .with_context(|| format!("failed to open image: {:?}", args.input))?;
    if (source.width(), source.height()) != (args.width, args.height) {
        info!(
            "Fitting {}x{} -> {}x{}",
            source.width(),
            source.height(),
            args.width,
            args.height
        );
    }
    let image = crop_and_resize(&source, args.width, args.height);

    let generator = MosaicGenerator::new(config)
        .context("invalid generator config")?
        .with_cancel(cancel);
    info!(
        "Generating with {} seeds (rng seed: {})",
        args.seeds,
        generator.config().rng_seed
    );

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    progress.set_message("generating mosaic");
    progress.enable_steady_tick(std::time::Duration::from_millis(100));

    let start = Instant::now();
    let mosaic = match generator.generate(&image, args.seeds) {
        Ok(mosaic) => mosaic,
        Err(MosaicError::Cancelled) => {
            progress.abandon_with_message("Interrupted");
            anyhow::bail!("interrupted, no output written");
        }
        Err(e) => {
            progress.abandon_with_message("Failed");
            return Err(e).context("mosaic generation failed");
        }
    };
    progress.finish_with_message(format!("{} cells", mosaic.cells.len()));

    if mosaic.dropped_seeds > 0 {
        warn!(
            "{} of {} seeds found no spot at the minimum separation",
            mosaic.dropped_seeds, args.seeds
        );
    }
    if mosaic.cells.is_empty() {
        warn!("every cell was degenerate; outputs will be blank");
    }

    write_outputs(&args, &mosaic)?;
    info!(
        "Done: {} cells from {} seeds in {:.1}s",
        mosaic.cells.len(),
        mosaic.seeds.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

//! `imagepool` CLI - prepare experiment directories and preview training augmentation.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{stack, ArrayBase, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use imagepool::image::{
    load_train_entry, save_images, LoadConfig, DEFAULT_FINE_SIZE, DEFAULT_LOAD_SIZE,
};
use imagepool::paths::DEFAULT_ROOT;
use imagepool::{Direction, ExperimentPaths, HistoryBuffer};

/// Data utilities for image-to-image GAN training.
#[derive(Parser, Debug)]
#[command(name = "imagepool")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the checkpoint, sample, test and conf directories of an experiment.
    Setup(SetupArgs),

    /// Render a grid of augmented crops for an image pair.
    Preview(PreviewArgs),
}

#[derive(Args, Debug)]
struct SetupArgs {
    /// Experiment name.
    #[arg(value_name = "NAME")]
    name: String,

    /// Directory holding all experiments.
    #[arg(long, default_value = DEFAULT_ROOT, value_name = "DIR")]
    root: PathBuf,

    /// Translation direction, `AtoB` or `BtoA`.
    #[arg(long, default_value = "AtoB", value_name = "DIRECTION")]
    direction: Direction,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    /// Image from domain A.
    #[arg(value_name = "A")]
    image_a: PathBuf,

    /// Image from domain B.
    #[arg(value_name = "B")]
    image_b: PathBuf,

    /// Output grid path.
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Height images are resized to before cropping.
    #[arg(long, default_value_t = DEFAULT_LOAD_SIZE, value_name = "INT")]
    load_size: usize,

    /// Height of the crops.
    #[arg(long, default_value_t = DEFAULT_FINE_SIZE, value_name = "INT")]
    fine_size: usize,

    /// Width of an image as a multiple of its height.
    #[arg(long, default_value_t = 2, value_name = "INT")]
    width_scale: usize,

    /// Number of augmented samples to draw.
    #[arg(short, long, default_value_t = 4, value_name = "INT")]
    samples: usize,

    /// Route samples through a history buffer of this size (0 disables it).
    #[arg(long, default_value_t = 0, value_name = "INT")]
    pool_size: usize,

    /// Random seed for reproducibility.
    #[arg(long, value_name = "INT")]
    seed: Option<u64>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("imagepool={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let outcome = match &cli.command {
        Command::Setup(args) => setup(args),
        Command::Preview(args) => preview(args),
    };

    if let Err(err) = outcome {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn setup(args: &SetupArgs) -> Result<()> {
    let paths = ExperimentPaths::new(&args.root, &args.name, args.direction);

    paths
        .create()
        .with_context(|| format!("Failed to set up experiment {}", args.name))?;

    for dir in paths.all() {
        println!("{}", dir.display());
    }

    Ok(())
}

fn preview(args: &PreviewArgs) -> Result<()> {
    for input in [&args.image_a, &args.image_b] {
        if !input.exists() {
            anyhow::bail!("Input file does not exist: {}", input.display());
        }
    }
    if args.samples == 0 {
        anyhow::bail!("At least one sample is required");
    }

    let config = LoadConfig {
        load_size: args.load_size,
        fine_size: args.fine_size,
        width_scale: args.width_scale,
        ..LoadConfig::default()
    };
    config.validate().context("Invalid load configuration")?;

    let mut rng = args
        .seed
        .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
    let mut pool = HistoryBuffer::with_rng(args.pool_size, StdRng::from_rng(&mut rng));

    tracing::info!("Drawing {} samples with {config:?}", args.samples);

    let pb = ProgressBar::new(u64::try_from(args.samples).unwrap_or(u64::MAX));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Sampling [{bar:40.cyan/blue}] {pos}/{len}")
            .context("Invalid progress template")?
            .progress_chars("#>-"),
    );

    let mut crops_a = Vec::with_capacity(args.samples);
    let mut crops_b = Vec::with_capacity(args.samples);

    for _ in 0..args.samples {
        let entry = load_train_entry(&args.image_a, &args.image_b, &config, &mut rng)
            .context("Failed to load image pair")?;
        let (a, b) = pool.submit(entry).into_parts();
        crops_a.push(a);
        crops_b.push(b);
        pb.inc(1);
    }

    pb.finish_with_message("Sampling complete");

    let views: Vec<_> = crops_a.iter().chain(&crops_b).map(ArrayBase::view).collect();
    let batch = stack(Axis(0), &views).context("Crops differ in shape")?;

    save_images(&batch, (2, args.samples), &args.output).context("Failed to save preview")?;

    println!(
        "Saved {} samples of {} + {} -> {}",
        args.samples,
        args.image_a.display(),
        args.image_b.display(),
        args.output.display()
    );

    Ok(())
}

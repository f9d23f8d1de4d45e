//! galaxy_pixel_benchmark - central-pixel baseline runner
//!
//! Reads the training solutions and both image directories, writes one row of
//! 37 class probabilities per test galaxy.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use galaxy_pixel_benchmark::{BenchmarkConfig, BenchmarkPipeline};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for galaxy_pixel_benchmark
#[derive(Parser, Debug)]
#[command(name = "galaxy_pixel_benchmark")]
#[command(about = "Central-pixel color clustering baseline for Galaxy Zoo")]
#[command(version)]
struct Args {
    /// TOML config file; every key is optional
    #[arg(short, long, env = "GALAXY_CONFIG")]
    config: Option<PathBuf>,

    /// Directory of training images
    #[arg(long, env = "GALAXY_TRAINING_IMAGES")]
    training_images: Option<PathBuf>,

    /// Directory of test images
    #[arg(long, env = "GALAXY_TEST_IMAGES")]
    test_images: Option<PathBuf>,

    /// Training solutions table
    #[arg(long, env = "GALAXY_SOLUTIONS")]
    solutions: Option<PathBuf>,

    /// Prediction table to write
    #[arg(short, long, env = "GALAXY_OUTPUT")]
    output: Option<PathBuf>,

    #[arg(long, env = "GALAXY_HASH_FACTOR")]
    hash_factor: Option<u32>,

    #[arg(long, env = "GALAXY_PATCH_HALF_WIDTH")]
    patch_half_width: Option<u32>,

    /// Number of image sampling workers
    #[arg(short, long, env = "GALAXY_WORKERS")]
    workers: Option<usize>,
}

impl Args {
    fn into_config(self) -> Result<BenchmarkConfig> {
        let mut config = match &self.config {
            Some(path) => BenchmarkConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => BenchmarkConfig::default(),
        };

        if let Some(path) = self.training_images {
            config.training_images = path;
        }
        if let Some(path) = self.test_images {
            config.test_images = path;
        }
        if let Some(path) = self.solutions {
            config.solutions = path;
        }
        if let Some(path) = self.output {
            config.output = path;
        }
        if let Some(hash_factor) = self.hash_factor {
            config.hash_factor = hash_factor;
        }
        if let Some(half_width) = self.patch_half_width {
            config.patch_half_width = half_width;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "galaxy_pixel_benchmark=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Args::parse().into_config()?;
    let pipeline = BenchmarkPipeline::new(config).context("Failed to build pipeline")?;

    let config = pipeline.config();
    info!(
        "Starting galaxy_pixel_benchmark v{} (hash factor {}, patch half-width {})",
        env!("CARGO_PKG_VERSION"),
        config.hash_factor,
        config.patch_half_width
    );
    info!(
        "Training images: {}, test images: {}, output: {}",
        config.training_images.display(),
        config.test_images.display(),
        config.output.display()
    );

    let summary = pipeline.run().await.context("Benchmark run failed")?;

    info!(
        "Done: {} training galaxies in {} clusters, {} predictions ({} without a matching cluster)",
        summary.training_images, summary.clusters, summary.predictions, summary.misses
    );
    Ok(())
}

//! Benchmark configuration
//!
//! Every setting has a default that reproduces the classic central-pixel run
//! from the Galaxy Zoo working directory, so an empty (or absent) config file
//! is valid. A TOML file can override any subset of keys; the binary layers
//! command-line overrides on top of that.

use crate::core_modules::color_hasher::{DEFAULT_HASH_FACTOR, MAX_HASH_FACTOR};
use crate::core_modules::patch_sampler::DEFAULT_PATCH_HALF_WIDTH;
use crate::core_modules::pixel::pixel::ChannelDepth;
use crate::error::{BenchmarkError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchmarkConfig {
    /// Directory holding the training images
    pub training_images: PathBuf,

    /// Directory holding the test images
    pub test_images: PathBuf,

    /// Extension of the image files to pick up, without the dot
    pub image_extension: String,

    /// Training solutions table (GalaxyID plus 37 class columns)
    pub solutions: PathBuf,

    /// Where the prediction table is written
    pub output: PathBuf,

    pub hash_factor: u32,

    /// Half the side of the central sampling window
    pub patch_half_width: u32,

    /// Range the decoder reports channel values in
    pub channel_depth: ChannelDepth,

    /// Number of image sampling workers
    pub workers: usize,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            training_images: PathBuf::from("images_training"),
            test_images: PathBuf::from("images_test"),
            image_extension: "jpg".to_string(),
            solutions: PathBuf::from("solutions_training.csv"),
            output: PathBuf::from("lastrun.csv"),
            hash_factor: DEFAULT_HASH_FACTOR,
            patch_half_width: DEFAULT_PATCH_HALF_WIDTH,
            channel_depth: ChannelDepth::default(),
            workers: num_cpus::get(),
        }
    }
}

impl BenchmarkConfig {
    /// Reads and validates a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|err| BenchmarkError::io(path, err))?;
        let config: BenchmarkConfig = toml::from_str(&contents).map_err(|err| {
            BenchmarkError::Config(format!("failed to parse {}: {}", path.display(), err))
        })?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: BenchmarkConfig = toml::from_str(contents)
            .map_err(|err| BenchmarkError::Config(format!("failed to parse TOML: {}", err)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.hash_factor == 0 || self.hash_factor > MAX_HASH_FACTOR {
            return Err(BenchmarkError::Config(format!(
                "hash_factor must be between 1 and {}, got {}",
                MAX_HASH_FACTOR, self.hash_factor
            )));
        }
        if self.patch_half_width == 0 {
            return Err(BenchmarkError::Config(
                "patch_half_width must be at least 1".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(BenchmarkError::Config("workers must be at least 1".to_string()));
        }
        if self.image_extension.trim_start_matches('.').is_empty() {
            return Err(BenchmarkError::Config(
                "image_extension must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

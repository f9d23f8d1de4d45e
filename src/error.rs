//! Error types for the central-pixel benchmark
//!
//! Every fallible step returns a [`BenchmarkError`]. Helpers never abort the
//! process; the pipeline decides what is fatal. The only variant that is
//! recoverable is [`BenchmarkError::ClusterMiss`], which the prediction
//! assigner resolves with the all-zero fallback vector.

use std::path::PathBuf;
use thiserror::Error;

use crate::core_modules::color_hasher::ClusterKey;

/// Benchmark error type
#[derive(Debug, Error)]
pub enum BenchmarkError {
    /// A file or directory could not be read or written
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An image file could not be opened or decoded
    #[error("Failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A tabular input could not be parsed
    #[error("Parse error in {path} line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Inputs are structurally inconsistent with each other
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// A clustered training image has no row in the solutions table
    #[error("No training labels for galaxy {identifier}")]
    MissingLabels { identifier: String },

    /// The training set produced no clusters at all
    #[error("Created zero galaxy clusters; the training set is empty")]
    NoClusters,

    /// The sampling window does not fit inside the image
    #[error(
        "Patch of half-width {half_width} does not fit inside a {width}x{height} image"
    )]
    PatchOutOfBounds {
        width: u32,
        height: u32,
        half_width: u32,
    },

    /// No training cluster has this key
    #[error("No training cluster for key {key}")]
    ClusterMiss { key: ClusterKey },

    /// The sampler worker pool stopped before answering
    #[error("Sampler pool failure: {0}")]
    WorkerPool(String),
}

impl BenchmarkError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BenchmarkError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        BenchmarkError::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// True for the per-item soft miss; everything else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BenchmarkError::ClusterMiss { .. })
    }
}

/// Result type for benchmark operations
pub type Result<T> = std::result::Result<T, BenchmarkError>;

// THEORY:
// This file is the entry point for the `galaxy_pixel_benchmark` library crate.
// The crate is a baseline for the Galaxy Zoo morphology challenge: every galaxy
// is reduced to the coarse color ratio of its central patch, training galaxies
// with equal ratios are pooled, and each test galaxy receives the mean answers
// of the pool its own ratio falls into.
//
// The public surface is the `BenchmarkPipeline` and its `BenchmarkConfig`. The
// stage types in `core_modules` are exported too so the individual steps can be
// driven (and tested) without touching the filesystem.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;
pub mod utils;

pub use config::BenchmarkConfig;
pub use error::{BenchmarkError, Result};
pub use pipeline::{BenchmarkPipeline, RunSummary};

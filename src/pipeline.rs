// THEORY:
// The `pipeline` module is the top-level API of the benchmark. It wires the core
// stages together in their fixed order:
//
//   training images -> PatchSampler -> ColorHasher -> ClusterBuilder
//                                                   -> LabelAggregator -> model
//   test images     -> PatchSampler -> ColorHasher -> PredictionAssigner(model)
//                                                   -> prediction table
//
// The whole training set is clustered and aggregated before a single test image
// is looked at. This is also the only layer that decides what a failure means:
// a cluster miss becomes the zero vector inside the assigner, and every other
// error ends the run with nothing written.

use crate::config::BenchmarkConfig;
use crate::core_modules::cluster_builder::ClusterBuilder;
use crate::core_modules::color_hasher::ColorHasher;
use crate::core_modules::label_aggregator::{ClusterLabels, LabelAggregator};
use crate::core_modules::label_vector::LabelTable;
use crate::core_modules::patch_sampler::{ColorSample, PatchSampler};
use crate::core_modules::prediction_assigner::{AssignmentStats, PredictionAssigner, PredictionTable};
use crate::error::Result;
use crate::parallel_pipeline::SamplerPool;
use crate::utils::image_helper::image_helper::{FileStemIdentifier, IdentifierSource, list_images};
use crate::utils::solutions_table::{read_solutions, write_predictions};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// What a completed run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub training_images: usize,
    pub clusters: usize,
    pub test_images: usize,
    pub predictions: usize,
    pub misses: usize,
}

pub struct BenchmarkPipeline {
    config: BenchmarkConfig,
    sampler: PatchSampler,
    hasher: ColorHasher,
    identifiers: Arc<dyn IdentifierSource>,
}

impl BenchmarkPipeline {
    pub fn new(config: BenchmarkConfig) -> Result<Self> {
        config.validate()?;
        let sampler = PatchSampler::new(config.patch_half_width)?;
        let hasher = ColorHasher::new(config.hash_factor)?;
        Ok(Self {
            config,
            sampler,
            hasher,
            identifiers: Arc::new(FileStemIdentifier),
        })
    }

    /// Replaces the default file-stem identifier rule.
    pub fn with_identifier_source(mut self, identifiers: Arc<dyn IdentifierSource>) -> Self {
        self.identifiers = identifiers;
        self
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Clusters the training samples and averages each cluster's labels.
    pub fn train(&self, samples: &[ColorSample], labels: &LabelTable) -> Result<ClusterLabels> {
        let mut builder = ClusterBuilder::new(self.hasher);
        builder.extend(samples)?;
        let clusters = builder.build()?;
        info!(
            "Created {} galaxy clusters from {} training galaxies",
            clusters.len(),
            clusters.member_count()
        );

        LabelAggregator::new(labels).aggregate(&clusters)
    }

    pub fn predict(
        &self,
        model: &ClusterLabels,
        samples: &[ColorSample],
    ) -> Result<(PredictionTable, AssignmentStats)> {
        PredictionAssigner::new(self.hasher, model).assign(samples)
    }

    pub async fn sample_directory(&self, pool: &SamplerPool, dir: &Path) -> Result<Vec<ColorSample>> {
        let entries = list_images(dir, &self.config.image_extension, self.identifiers.as_ref())?;
        info!("Found {} images in {}", entries.len(), dir.display());
        pool.sample_all(entries).await
    }

    /// Runs the full benchmark and writes the prediction table.
    pub async fn run(&self) -> Result<RunSummary> {
        let labels = read_solutions(&self.config.solutions)?;

        let pool = SamplerPool::new(self.sampler, self.config.channel_depth, self.config.workers)?;
        info!(
            "Sampling {}x{} central patches with {} workers",
            self.sampler.half_width() * 2,
            self.sampler.half_width() * 2,
            pool.worker_count()
        );

        let sampled = self.train_and_sample_test(&pool, &labels).await;
        let drained = pool.shutdown().await;
        let (training_images, model, test) = sampled?;
        drained?;

        let (predictions, stats) = self.predict(&model, &test)?;
        let written = write_predictions(&self.config.output, labels.header(), &predictions)?;

        Ok(RunSummary {
            training_images,
            clusters: model.len(),
            test_images: test.len(),
            predictions: written,
            misses: stats.misses,
        })
    }

    async fn train_and_sample_test(
        &self,
        pool: &SamplerPool,
        labels: &LabelTable,
    ) -> Result<(usize, ClusterLabels, Vec<ColorSample>)> {
        info!("Processing training images");
        let training = self
            .sample_directory(pool, &self.config.training_images)
            .await?;
        let model = self.train(&training, labels)?;

        info!("Processing test images");
        let test = self.sample_directory(pool, &self.config.test_images).await?;
        Ok((training.len(), model, test))
    }
}

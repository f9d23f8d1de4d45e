// THEORY:
// The `PredictionAssigner` applies the model to the test set. Each test sample
// is hashed by the same `ColorHasher` that built the training clusters, and the
// key is looked up in the aggregated cluster table:
//
// - Hit:  the prediction is the cluster's averaged label vector.
// - Miss: the prediction is the all-zero vector. The model cannot say anything
//         about a color it never saw in training, and that is not an error.
//
// The assigner is also where the run's bookkeeping is enforced: one row per
// test identifier, no identifier twice, and the row count must equal the
// number of samples supplied.

use crate::core_modules::color_hasher::ColorHasher;
use crate::core_modules::label_aggregator::ClusterLabels;
use crate::core_modules::label_vector::LabelVector;
use crate::core_modules::patch_sampler::ColorSample;
use crate::error::{BenchmarkError, Result};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use tracing::{debug, info};

/// Final predictions, one per test galaxy, ordered by identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionTable {
    rows: BTreeMap<String, LabelVector>,
}

impl PredictionTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, identifier: &str) -> Option<&LabelVector> {
        self.rows.get(identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LabelVector)> {
        self.rows.iter().map(|(id, labels)| (id.as_str(), labels))
    }

    /// Adds a row. A second row for the same galaxy is an integrity error.
    pub fn insert(&mut self, identifier: impl Into<String>, labels: LabelVector) -> Result<()> {
        match self.rows.entry(identifier.into()) {
            Entry::Occupied(slot) => Err(BenchmarkError::DataIntegrity(format!(
                "test galaxy {} appears more than once",
                slot.key()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(labels);
                Ok(())
            }
        }
    }
}

/// How many test galaxies matched a training cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignmentStats {
    pub hits: usize,
    pub misses: usize,
}

pub struct PredictionAssigner<'a> {
    hasher: ColorHasher,
    clusters: &'a ClusterLabels,
}

impl<'a> PredictionAssigner<'a> {
    pub fn new(hasher: ColorHasher, clusters: &'a ClusterLabels) -> Self {
        Self { hasher, clusters }
    }

    /// The cluster average for this sample, or `ClusterMiss` if its color is unseen.
    pub fn predict(&self, sample: &ColorSample) -> Result<&'a LabelVector> {
        self.clusters.lookup(self.hasher.key(sample))
    }

    pub fn assign(&self, samples: &[ColorSample]) -> Result<(PredictionTable, AssignmentStats)> {
        let mut table = PredictionTable::default();
        let mut stats = AssignmentStats::default();

        for sample in samples {
            let prediction = match self.predict(sample) {
                Ok(labels) => {
                    stats.hits += 1;
                    labels.clone()
                }
                Err(miss) if miss.is_recoverable() => {
                    debug!("Galaxy {}: {}, predicting zeros", sample.identifier(), miss);
                    stats.misses += 1;
                    LabelVector::zeros()
                }
                Err(err) => return Err(err),
            };

            table.insert(sample.identifier(), prediction)?;
        }

        if table.len() != samples.len() {
            return Err(BenchmarkError::DataIntegrity(format!(
                "lengths don't match: {} predictions for {} test galaxies",
                table.len(),
                samples.len()
            )));
        }

        info!(
            "Assigned {} predictions ({} matched a cluster, {} fell back to zeros)",
            table.len(),
            stats.hits,
            stats.misses
        );
        Ok((table, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::cluster_builder::ClusterBuilder;
    use crate::core_modules::label_aggregator::LabelAggregator;
    use crate::core_modules::label_vector::{LABEL_COUNT, LabelTable};
    use crate::core_modules::pixel::pixel::Pixel;

    fn one_hot(index: usize) -> LabelVector {
        let mut values = [0.0; LABEL_COUNT];
        values[index] = 1.0;
        LabelVector::from(values)
    }

    fn sample(identifier: &str, red: u16, green: u16, blue: u16) -> ColorSample {
        ColorSample::new(identifier, Pixel::new(red, green, blue, 255))
    }

    fn model() -> ClusterLabels {
        let mut builder = ClusterBuilder::new(ColorHasher::default());
        builder
            .extend(&[sample("A", 120, 120, 120), sample("B", 121, 120, 121)])
            .unwrap();
        let clusters = builder.build().unwrap();

        let mut labels = LabelTable::new(Vec::new());
        labels.insert("A", one_hot(0)).unwrap();
        labels.insert("B", one_hot(1)).unwrap();
        LabelAggregator::new(&labels).aggregate(&clusters).unwrap()
    }

    #[test]
    fn matching_color_receives_cluster_average() {
        let model = model();
        let assigner = PredictionAssigner::new(ColorHasher::default(), &model);

        let prediction = assigner.predict(&sample("T1", 90, 90, 90)).unwrap();
        assert_eq!(prediction.values()[0], 0.5);
        assert_eq!(prediction.values()[1], 0.5);
        assert!(prediction.values()[2..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn unseen_color_is_a_miss_not_a_failure() {
        let model = model();
        let assigner = PredictionAssigner::new(ColorHasher::default(), &model);

        assert!(matches!(
            assigner.predict(&sample("T2", 200, 0, 100)),
            Err(BenchmarkError::ClusterMiss { key: 201 })
        ));

        let (table, stats) = assigner
            .assign(&[sample("T1", 90, 90, 90), sample("T2", 200, 0, 100)])
            .unwrap();
        assert_eq!(stats, AssignmentStats { hits: 1, misses: 1 });
        assert_eq!(table.get("T2"), Some(&LabelVector::zeros()));
    }

    #[test]
    fn one_row_per_test_identifier() {
        let model = model();
        let assigner = PredictionAssigner::new(ColorHasher::default(), &model);
        let samples: Vec<ColorSample> = (0..25u16)
            .map(|i| sample(&format!("t{i:03}"), i * 10, 50, 200))
            .collect();

        let (table, stats) = assigner.assign(&samples).unwrap();
        assert_eq!(table.len(), samples.len());
        assert_eq!(stats.hits + stats.misses, samples.len());
        for (_, labels) in table.iter() {
            assert_eq!(labels.values().len(), LABEL_COUNT);
            assert!(labels.is_probability());
        }
    }

    #[test]
    fn duplicate_test_identifier_is_fatal() {
        let model = model();
        let assigner = PredictionAssigner::new(ColorHasher::default(), &model);
        let err = assigner
            .assign(&[sample("T1", 90, 90, 90), sample("T1", 10, 10, 10)])
            .unwrap_err();
        assert!(matches!(err, BenchmarkError::DataIntegrity(_)));
    }

    #[test]
    fn empty_test_set_yields_empty_table() {
        let model = model();
        let assigner = PredictionAssigner::new(ColorHasher::default(), &model);
        let (table, stats) = assigner.assign(&[]).unwrap();
        assert!(table.is_empty());
        assert_eq!(stats, AssignmentStats::default());
    }
}

// THEORY:
// The `LabelAggregator` is the model. It encodes the assumption that galaxies
// with the same normalized central color share similar morphology answers, and
// summarizes each cluster by the elementwise mean of its members' label vectors.
//
// - One member: the result is a copy of that member's vector, bit for bit.
// - Several members: a fresh zero accumulator is summed into position by
//   position and then divided by the member count in floating point.
//
// The label table is only ever borrowed immutably. Accumulating into the first
// member's stored vector would quietly rewrite the training data for every
// later cluster that reads it.

use crate::core_modules::cluster_builder::ClusterSet;
use crate::core_modules::color_hasher::ClusterKey;
use crate::core_modules::label_vector::{LABEL_COUNT, LabelTable, LabelVector};
use crate::error::{BenchmarkError, Result};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Averaged label vector per training cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterLabels {
    averages: BTreeMap<ClusterKey, LabelVector>,
}

impl ClusterLabels {
    /// Looks up a cluster's averaged vector. A miss is the one recoverable error.
    pub fn lookup(&self, key: ClusterKey) -> Result<&LabelVector> {
        self.averages
            .get(&key)
            .ok_or(BenchmarkError::ClusterMiss { key })
    }

    pub fn len(&self) -> usize {
        self.averages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.averages.is_empty()
    }
}

pub struct LabelAggregator<'a> {
    labels: &'a LabelTable,
}

impl<'a> LabelAggregator<'a> {
    pub fn new(labels: &'a LabelTable) -> Self {
        Self { labels }
    }

    fn labels_for(&self, identifier: &str) -> Result<&'a LabelVector> {
        self.labels
            .get(identifier)
            .ok_or_else(|| BenchmarkError::MissingLabels {
                identifier: identifier.to_string(),
            })
    }

    /// Elementwise mean of the members' label vectors.
    pub fn average_members(&self, members: &[String]) -> Result<LabelVector> {
        match members {
            [] => Err(BenchmarkError::DataIntegrity(
                "cannot average an empty cluster".to_string(),
            )),
            [only] => Ok(self.labels_for(only)?.clone()),
            _ => {
                let mut accumulator = [0.0f64; LABEL_COUNT];
                for identifier in members {
                    let labels = self.labels_for(identifier)?;
                    for (sum, value) in accumulator.iter_mut().zip(labels.iter()) {
                        *sum += value;
                    }
                }
                let count = members.len() as f64;
                for sum in accumulator.iter_mut() {
                    *sum /= count;
                }
                Ok(LabelVector::from(accumulator))
            }
        }
    }

    /// Averages every cluster exactly once.
    pub fn aggregate(&self, clusters: &ClusterSet) -> Result<ClusterLabels> {
        let mut averages = BTreeMap::new();
        for (key, members) in clusters.iter() {
            let average = self.average_members(members)?;
            debug!("Cluster {} averaged over {} galaxies", key, members.len());
            averages.insert(key, average);
        }
        info!(
            "Averaged training solutions for {} galaxy clusters",
            averages.len()
        );
        Ok(ClusterLabels { averages })
    }
}

// THEORY:
// The `ClusterBuilder` inverts the training map identifier -> key into
// key -> identifiers. Clusters are formed purely by key equality: there is no
// distance-based merging, no minimum size and no outlier handling. A cluster is
// created by the insertion of its first member, so an empty cluster cannot exist.
//
// Membership is an ordered set. Identifiers are kept sorted within each cluster,
// which makes the result independent of the order samples arrive in (the
// sampler pool finishes images in whatever order the workers happen to run).

use crate::core_modules::color_hasher::{ClusterKey, ColorHasher};
use crate::core_modules::patch_sampler::ColorSample;
use crate::error::{BenchmarkError, Result};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Training galaxies grouped by cluster key. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSet {
    clusters: BTreeMap<ClusterKey, Vec<String>>,
}

impl ClusterSet {
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn members(&self, key: ClusterKey) -> Option<&[String]> {
        self.clusters.get(&key).map(Vec::as_slice)
    }

    /// Clusters in ascending key order, members in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (ClusterKey, &[String])> {
        self.clusters.iter().map(|(key, members)| (*key, members.as_slice()))
    }

    pub fn member_count(&self) -> usize {
        self.clusters.values().map(Vec::len).sum()
    }
}

pub struct ClusterBuilder {
    hasher: ColorHasher,
    clusters: BTreeMap<ClusterKey, BTreeSet<String>>,
    seen: HashSet<String>,
}

impl ClusterBuilder {
    pub fn new(hasher: ColorHasher) -> Self {
        Self {
            hasher,
            clusters: BTreeMap::new(),
            seen: HashSet::new(),
        }
    }

    /// Hashes the sample and files its identifier under the resulting key.
    pub fn insert(&mut self, sample: &ColorSample) -> Result<ClusterKey> {
        let identifier = sample.identifier();
        if !self.seen.insert(identifier.to_string()) {
            return Err(BenchmarkError::DataIntegrity(format!(
                "training galaxy {} was sampled more than once",
                identifier
            )));
        }

        let key = self.hasher.key(sample);
        self.clusters
            .entry(key)
            .or_default()
            .insert(identifier.to_string());
        Ok(key)
    }

    pub fn extend<'a>(&mut self, samples: impl IntoIterator<Item = &'a ColorSample>) -> Result<()> {
        for sample in samples {
            self.insert(sample)?;
        }
        Ok(())
    }

    pub fn build(self) -> Result<ClusterSet> {
        if self.clusters.is_empty() {
            return Err(BenchmarkError::NoClusters);
        }
        let clusters = self
            .clusters
            .into_iter()
            .map(|(key, members)| (key, members.into_iter().collect()))
            .collect();
        Ok(ClusterSet { clusters })
    }
}

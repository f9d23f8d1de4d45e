// THEORY:
// A `LabelVector` is the 37-value morphology answer for one galaxy: the
// probability-like responses to the Galaxy Zoo decision tree, one per class.
// The length is part of the type (`[f64; LABEL_COUNT]`), so a vector of the
// wrong size can only exist as a conversion error, never as a value that
// silently shifts columns in the output file.
//
// `LabelTable` is the parsed training solutions file: the header row (echoed
// verbatim into the prediction file) plus one vector per training galaxy.
// Aggregation only ever borrows it immutably.

use crate::error::{BenchmarkError, Result};
use std::collections::HashMap;

/// Number of morphology classes in a Galaxy Zoo solution row.
pub const LABEL_COUNT: usize = 37;

/// Tolerance used when checking that averaged values stay inside [0, 1].
pub const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// A fixed-length vector of class probabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelVector([f64; LABEL_COUNT]);

impl LabelVector {
    /// The fallback prediction for galaxies whose color was never seen in training.
    pub fn zeros() -> Self {
        LabelVector([0.0; LABEL_COUNT])
    }

    pub fn values(&self) -> &[f64; LABEL_COUNT] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.0.iter()
    }

    /// True when every value is finite and inside [0, 1] within round-off.
    pub fn is_probability(&self) -> bool {
        self.0.iter().all(|v| {
            v.is_finite() && *v >= -PROBABILITY_TOLERANCE && *v <= 1.0 + PROBABILITY_TOLERANCE
        })
    }
}

impl From<[f64; LABEL_COUNT]> for LabelVector {
    fn from(values: [f64; LABEL_COUNT]) -> Self {
        LabelVector(values)
    }
}

impl TryFrom<&[f64]> for LabelVector {
    type Error = BenchmarkError;

    fn try_from(values: &[f64]) -> Result<Self> {
        let array: [f64; LABEL_COUNT] = values.try_into().map_err(|_| {
            BenchmarkError::DataIntegrity(format!(
                "label vector must have {} values, it has {}",
                LABEL_COUNT,
                values.len()
            ))
        })?;
        Ok(LabelVector(array))
    }
}

impl TryFrom<Vec<f64>> for LabelVector {
    type Error = BenchmarkError;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        LabelVector::try_from(values.as_slice())
    }
}

/// Training solutions keyed by galaxy identifier.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    header: Vec<String>,
    rows: HashMap<String, LabelVector>,
}

impl LabelTable {
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: HashMap::new(),
        }
    }

    /// Adds a row. Returns the vector back if the identifier was already present.
    pub fn insert(
        &mut self,
        identifier: impl Into<String>,
        labels: LabelVector,
    ) -> std::result::Result<(), LabelVector> {
        use std::collections::hash_map::Entry;
        match self.rows.entry(identifier.into()) {
            Entry::Occupied(_) => Err(labels),
            Entry::Vacant(slot) => {
                slot.insert(labels);
                Ok(())
            }
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&LabelVector> {
        self.rows.get(identifier)
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

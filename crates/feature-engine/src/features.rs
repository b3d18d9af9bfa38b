//! Feature Vector Assembly

use crate::extractor::ExtractorKind;
use crate::FeatureError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why an extractor fell back to its neutral output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DegradeReason {
    /// No PSD bin carried positive power
    LowEnergy,
    /// A computed feature was NaN or infinite
    NonFinite,
    /// Too few samples to run the method
    InsufficientSamples { available: usize, required: usize },
    /// Decomposition stopped at its iteration cap before reaching tolerance
    NotConverged { iterations: usize },
}

/// Record of an extractor that returned neutral values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionNote {
    pub extractor: ExtractorKind,
    #[serde(flatten)]
    pub reason: DegradeReason,
}

/// Named features computed from one signal record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature values keyed by name (sorted, so column order is stable)
    pub values: BTreeMap<String, f64>,
    /// Extractors that degraded to zeros
    pub notes: Vec<ExtractionNote>,
}

impl FeatureVector {
    /// Create an empty vector
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a complete vector from name/value pairs
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
            notes: Vec::new(),
        }
    }

    /// Neutral vector: every name set to zero, with a note explaining why
    pub fn neutral(names: &[String], extractor: ExtractorKind, reason: DegradeReason) -> Self {
        Self {
            values: names.iter().map(|name| (name.clone(), 0.0)).collect(),
            notes: vec![ExtractionNote { extractor, reason }],
        }
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no features
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up a feature
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Feature names in column order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Whether any extractor degraded
    pub fn is_degraded(&self) -> bool {
        !self.notes.is_empty()
    }

    /// Whether every value is finite
    pub fn all_finite(&self) -> bool {
        self.values.values().all(|v| v.is_finite())
    }

    /// Union with another vector. Overlapping names are rejected and leave
    /// `self` unchanged.
    pub fn merge(&mut self, other: FeatureVector) -> Result<(), FeatureError> {
        if let Some(name) = other.values.keys().find(|k| self.values.contains_key(*k)) {
            return Err(FeatureError::DuplicateFeature(name.clone()));
        }
        self.values.extend(other.values);
        self.notes.extend(other.notes);
        Ok(())
    }
}

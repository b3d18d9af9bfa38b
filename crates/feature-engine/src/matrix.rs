//! Feature matrix assembly
//!
//! Stacks per-record feature vectors into a rectangular matrix with a
//! fixed column order taken from the first accepted row.

use crate::features::FeatureVector;
use crate::FeatureError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Rectangular table of features, one row per record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
    labels: Option<Vec<String>>,
    degraded: Vec<bool>,
}

impl FeatureMatrix {
    /// Build a matrix from unlabeled vectors
    pub fn from_vectors(
        vectors: impl IntoIterator<Item = FeatureVector>,
    ) -> Result<Self, FeatureError> {
        let mut builder = FeatureMatrixBuilder::new();
        for vector in vectors {
            builder.push(vector, None)?;
        }
        builder.build()
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row-major values
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Labels aligned with rows, when every row carried one
    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    /// Per-row degradation flags
    pub fn degraded(&self) -> &[bool] {
        &self.degraded
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// First `n` rows as name/value maps
    pub fn preview(&self, n: usize) -> Vec<BTreeMap<String, f64>> {
        self.rows
            .iter()
            .take(n)
            .map(|row| self.columns.iter().cloned().zip(row.iter().copied()).collect())
            .collect()
    }

    /// Occurrences of each label, empty when unlabeled
    pub fn label_distribution(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for label in self.labels.iter().flatten() {
            *counts.entry(label.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Incremental matrix builder.
///
/// A rejected push leaves the builder as it was.
#[derive(Debug, Default)]
pub struct FeatureMatrixBuilder {
    columns: Option<Vec<String>>,
    rows: Vec<Vec<f64>>,
    labels: Vec<Option<String>>,
    degraded: Vec<bool>,
}

impl FeatureMatrixBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows accepted so far
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if no row has been accepted
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row. The first row fixes the column set; later rows must
    /// carry exactly the same names. Labels must be present on every row
    /// or on none.
    pub fn push(
        &mut self,
        vector: FeatureVector,
        label: Option<String>,
    ) -> Result<(), FeatureError> {
        let names: Vec<String> = vector.values.keys().cloned().collect();
        if let Some(columns) = &self.columns {
            if *columns != names {
                return Err(FeatureError::SchemaMismatch {
                    expected: columns.join(","),
                    found: names.join(","),
                });
            }
        }

        if let Some(first) = self.labels.first() {
            if first.is_some() != label.is_some() {
                return Err(FeatureError::LabelMismatch(format!(
                    "row {} is {} but earlier rows are {}",
                    self.rows.len(),
                    if label.is_some() { "labeled" } else { "unlabeled" },
                    if first.is_some() { "labeled" } else { "unlabeled" },
                )));
            }
        }

        if self.columns.is_none() {
            self.columns = Some(names);
        }
        self.degraded.push(vector.is_degraded());
        self.rows.push(vector.values.into_values().collect());
        self.labels.push(label);
        Ok(())
    }

    /// Finish the matrix. At least one row is required.
    pub fn build(self) -> Result<FeatureMatrix, FeatureError> {
        let columns = self.columns.ok_or(FeatureError::EmptyMatrix)?;
        let labels = self.labels.into_iter().collect::<Option<Vec<String>>>();
        Ok(FeatureMatrix {
            columns,
            rows: self.rows,
            labels,
            degraded: self.degraded,
        })
    }
}

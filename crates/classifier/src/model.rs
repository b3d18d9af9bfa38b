//! Trained model parameters

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1};
use serde::{Deserialize, Serialize};

/// Model family stored in every artifact
pub const MODEL_TYPE: &str = "multinomial_logistic_regression";

/// A fitted softmax classifier together with the schema and scaling it was
/// trained with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    /// Model family
    pub model_type: String,
    /// Class labels, sorted; probability order follows this list
    pub classes: Vec<String>,
    /// Feature columns in training order
    pub feature_columns: Vec<String>,
    /// Per-column training mean
    pub means: Array1<f64>,
    /// Per-column training standard deviation (1 for constant columns)
    pub scales: Array1<f64>,
    /// Weights over standardized features, `n_features × n_classes`
    pub weights: Array2<f64>,
    /// One intercept per class
    pub intercepts: Array1<f64>,
}

impl TrainedModel {
    /// Number of input features
    pub fn n_features(&self) -> usize {
        self.feature_columns.len()
    }

    /// Number of classes
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Whether every parameter array agrees with the schema
    pub fn is_consistent(&self) -> bool {
        let d = self.n_features();
        let c = self.n_classes();
        c >= 2
            && self.means.len() == d
            && self.scales.len() == d
            && self.intercepts.len() == c
            && self.weights.dim() == (d, c)
    }

    /// Centre and scale raw rows
    pub fn standardize(&self, x: ArrayView2<f64>) -> Array2<f64> {
        (&x - &self.means) / &self.scales
    }

    /// Class probabilities for raw rows of `n_features()` values, one row
    /// per input row
    pub fn probabilities(&self, x: ArrayView2<f64>) -> Array2<f64> {
        let mut scores = self.standardize(x).dot(&self.weights) + &self.intercepts;
        for row in scores.rows_mut() {
            softmax(row);
        }
        scores
    }
}

/// In-place softmax, shifted by the maximum logit
pub(crate) fn softmax(mut values: ArrayViewMut1<f64>) {
    let max = values.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
    values.mapv_inplace(|v| (v - max).exp());
    let total = values.sum();
    values /= total;
}

/// Index of the largest value; the first one wins ties
pub(crate) fn argmax(values: ArrayView1<f64>) -> usize {
    let mut best = 0;
    for (i, &v) in values.indexed_iter() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

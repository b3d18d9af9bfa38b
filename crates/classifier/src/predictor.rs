//! Prediction with a persisted model

use crate::model::{argmax, TrainedModel};
use crate::store::ModelStore;
use crate::ModelError;
use feature_engine::FeatureMatrix;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Prediction for one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Most probable class
    pub predicted_label: String,
    /// Probability of every trained class; sums to 1
    pub probabilities: BTreeMap<String, f64>,
}

impl PredictionResult {
    /// Probability of the predicted class
    pub fn confidence(&self) -> f64 {
        self.probabilities
            .get(&self.predicted_label)
            .copied()
            .unwrap_or(0.0)
    }
}

/// Applies a trained model to feature matrices
#[derive(Debug, Clone)]
pub struct Predictor {
    model: TrainedModel,
}

impl Predictor {
    /// Load the artifact at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let model = ModelStore::new(path.as_ref()).load()?;
        info!(
            "Loaded {} with classes {:?} from {}",
            model.model_type,
            model.classes,
            path.as_ref().display()
        );
        Ok(Self { model })
    }

    /// Wrap an in-memory model
    pub fn from_model(model: TrainedModel) -> Self {
        Self { model }
    }

    /// The wrapped model
    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    /// Classes in probability order
    pub fn classes(&self) -> &[String] {
        &self.model.classes
    }

    /// Predict every row of `matrix`. The matrix must carry the columns the
    /// model was trained on, in the same order.
    pub fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<PredictionResult>, ModelError> {
        if matrix.columns() != self.model.feature_columns.as_slice() {
            return Err(ModelError::SchemaMismatch {
                expected: self.model.feature_columns.join(","),
                found: matrix.columns().join(","),
            });
        }

        let x = Array2::from_shape_vec(
            (matrix.n_rows(), matrix.n_columns()),
            matrix.rows().iter().flatten().copied().collect(),
        )
        .map_err(|_| ModelError::FeatureCountMismatch {
            expected: self.model.n_features(),
            actual: matrix.rows().iter().map(Vec::len).max().unwrap_or(0),
        })?;
        let results = self.predict_array(x.view());
        debug!("Predicted {} rows", results.len());
        Ok(results)
    }

    /// Predict a single raw row
    pub fn predict_row(&self, row: &[f64]) -> Result<PredictionResult, ModelError> {
        let mismatch = || ModelError::FeatureCountMismatch {
            expected: self.model.n_features(),
            actual: row.len(),
        };
        if row.len() != self.model.n_features() {
            return Err(mismatch());
        }
        let x = ArrayView2::from_shape((1, row.len()), row).map_err(|_| mismatch())?;
        self.predict_array(x).pop().ok_or(ModelError::EmptyMatrix)
    }

    fn predict_array(&self, x: ArrayView2<f64>) -> Vec<PredictionResult> {
        self.model
            .probabilities(x)
            .rows()
            .into_iter()
            .map(|probabilities| PredictionResult {
                predicted_label: self.model.classes[argmax(probabilities)].clone(),
                probabilities: self
                    .model
                    .classes
                    .iter()
                    .cloned()
                    .zip(probabilities.iter().copied())
                    .collect(),
            })
            .collect()
    }
}

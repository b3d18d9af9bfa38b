//! Model training
//!
//! Multinomial logistic regression fitted by `linfa-logistic` (L-BFGS) on
//! standardized features. The objective is the summed cross-entropy plus
//! `‖W‖² / (2C)`; intercepts are not penalized. Convergence is judged
//! afterwards from the max-abs gradient at the fitted parameters.

use crate::model::{softmax, TrainedModel, MODEL_TYPE};
use crate::store::ModelStore;
use crate::ModelError;
use feature_engine::FeatureMatrix;
use linfa::prelude::*;
use linfa_logistic::MultiLogisticRegression;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Training settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Where the artifact is written
    pub model_path: PathBuf,
    /// Optimizer iteration cap
    pub max_iterations: usize,
    /// Inverse L2 strength `C`
    pub regularization: f64,
    /// Gradient tolerance handed to the optimizer and used to judge convergence
    pub tolerance: f64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("saved_models/sei_model.bin"),
            max_iterations: 1000,
            regularization: 1.0,
            tolerance: 1e-4,
        }
    }
}

/// Training outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingStatus {
    Success,
}

/// Summary of a completed training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingLog {
    pub status: TrainingStatus,
    pub model_path: String,
    pub model_type: String,
    pub training_samples: usize,
    pub classes_found: Vec<String>,
    pub feature_columns: Vec<String>,
    pub max_iterations: usize,
    pub converged: bool,
    pub final_loss: f64,
}

/// Fits and persists classifiers
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainerConfig,
}

/// Column means and standard deviations
fn column_scaling(records: &Array2<f64>) -> Result<(Array1<f64>, Array1<f64>), ModelError> {
    let means = records.mean_axis(Axis(0)).ok_or(ModelError::EmptyMatrix)?;
    let scales = records
        .std_axis(Axis(0), 0.0)
        .mapv(|s| if s > 0.0 && s.is_finite() { s } else { 1.0 });
    Ok((means, scales))
}

impl Trainer {
    /// Create a trainer
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    /// Training settings
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Fit a model on a labeled matrix without touching disk
    pub fn fit(&self, matrix: &FeatureMatrix) -> Result<(TrainedModel, FitSummary), ModelError> {
        let labels = matrix.labels().ok_or(ModelError::MissingLabels)?;
        let rows = matrix.rows();
        if rows.is_empty() {
            return Err(ModelError::EmptyMatrix);
        }
        if labels.len() != rows.len() {
            return Err(ModelError::LabelCountMismatch {
                labels: labels.len(),
                rows: rows.len(),
            });
        }

        let classes: Vec<String> = labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if classes.len() < 2 {
            return Err(ModelError::InsufficientClassDiversity {
                found: classes.len(),
            });
        }

        let columns = matrix.columns();
        for (r, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(ModelError::FeatureCountMismatch {
                    expected: columns.len(),
                    actual: row.len(),
                });
            }
            if let Some(c) = row.iter().position(|v| !v.is_finite()) {
                return Err(ModelError::NonFiniteFeature {
                    row: r,
                    column: columns[c].clone(),
                });
            }
        }

        // Class indices follow the sorted label order, as do linfa's classes
        let targets: Array1<usize> = labels
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or_else(|i| i))
            .collect();
        let records = Array2::from_shape_vec(
            (rows.len(), columns.len()),
            rows.iter().flatten().copied().collect(),
        )
        .map_err(|e| ModelError::Fit(e.to_string()))?;

        let (means, scales) = column_scaling(&records)?;
        let standardized = (&records - &means) / &scales;

        let dataset = Dataset::new(standardized.clone(), targets.clone());
        let fitted = MultiLogisticRegression::default()
            .alpha(1.0 / self.config.regularization)
            .gradient_tolerance(self.config.tolerance)
            .max_iterations(self.config.max_iterations as u64)
            .fit(&dataset)
            .map_err(|e| ModelError::Fit(e.to_string()))?;

        let model = TrainedModel {
            model_type: MODEL_TYPE.to_string(),
            classes,
            feature_columns: columns.to_vec(),
            means,
            scales,
            weights: fitted.params().clone(),
            intercepts: fitted.intercept().clone(),
        };
        if !model.is_consistent() {
            return Err(ModelError::Fit(format!(
                "fitted parameters have shape {:?}, expected ({}, {})",
                model.weights.dim(),
                model.n_features(),
                model.n_classes()
            )));
        }

        let summary = self.assess(&model, &standardized, &targets);
        debug!(
            "L-BFGS fit finished: loss {:.6}, converged {}",
            summary.final_loss, summary.converged
        );
        Ok((model, summary))
    }

    /// Fit a model and write it to the configured path
    pub fn train(&self, matrix: &FeatureMatrix) -> Result<TrainingLog, ModelError> {
        info!(
            "Training on {} samples with {} features",
            matrix.n_rows(),
            matrix.n_columns()
        );
        let (model, summary) = self.fit(matrix)?;

        if !summary.converged {
            warn!(
                "Training did not converge within {} iterations (loss {:.6})",
                self.config.max_iterations, summary.final_loss
            );
        }

        let store = ModelStore::new(&self.config.model_path);
        store.save(&model)?;

        Ok(TrainingLog {
            status: TrainingStatus::Success,
            model_path: store.path().display().to_string(),
            model_type: model.model_type.clone(),
            training_samples: matrix.n_rows(),
            classes_found: model.classes.clone(),
            feature_columns: model.feature_columns.clone(),
            max_iterations: self.config.max_iterations,
            converged: summary.converged,
            final_loss: summary.final_loss,
        })
    }

    /// Objective value and max-abs gradient at the fitted parameters
    fn assess(
        &self,
        model: &TrainedModel,
        standardized: &Array2<f64>,
        targets: &Array1<usize>,
    ) -> FitSummary {
        let inv_c = 1.0 / self.config.regularization;

        let mut residual = standardized.dot(&model.weights) + &model.intercepts;
        for row in residual.rows_mut() {
            softmax(row);
        }

        let mut loss = 0.5 * inv_c * model.weights.mapv(|w| w * w).sum();
        for (mut row, &target) in residual.rows_mut().into_iter().zip(targets) {
            loss -= row[target].max(f64::MIN_POSITIVE).ln();
            row[target] -= 1.0;
        }

        let grad_w = standardized.t().dot(&residual) + &(&model.weights * inv_c);
        let grad_b = residual.sum_axis(Axis(0));
        let max_grad = grad_w
            .iter()
            .chain(grad_b.iter())
            .fold(0.0_f64, |acc, g| acc.max(g.abs()));

        FitSummary {
            converged: max_grad < self.config.tolerance,
            final_loss: loss,
        }
    }
}

/// Optimizer outcome
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitSummary {
    pub converged: bool,
    pub final_loss: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_engine::{FeatureMatrixBuilder, FeatureVector};
    use ndarray::arr2;

    fn matrix(points: &[(f64, f64, &str)]) -> FeatureMatrix {
        let mut builder = FeatureMatrixBuilder::new();
        for &(a, b, label) in points {
            builder
                .push(
                    FeatureVector::from_pairs([("a", a), ("b", b)]),
                    Some(label.to_string()),
                )
                .unwrap();
        }
        builder.build().unwrap()
    }

    fn trainer(dir: &tempfile::TempDir) -> Trainer {
        Trainer::new(TrainerConfig {
            model_path: dir.path().join("model.bin"),
            ..Default::default()
        })
    }

    #[test]
    fn test_separable_classes_fit() {
        let dir = tempfile::tempdir().unwrap();
        let m = matrix(&[
            (0.0, 1.0, "A"),
            (0.2, 1.1, "A"),
            (5.0, 1.0, "B"),
            (5.3, 0.9, "B"),
        ]);
        let (model, summary) = trainer(&dir).fit(&m).unwrap();
        assert_eq!(model.classes, ["A", "B"]);
        assert!(summary.final_loss.is_finite());

        let p = model.probabilities(arr2(&[[0.1, 1.0], [5.1, 1.0]]).view());
        assert!(p[[0, 0]] > 0.5);
        assert!(p[[1, 1]] > 0.5);
    }

    #[test]
    fn test_single_class_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let t = trainer(&dir);
        let err = t.train(&matrix(&[(0.0, 1.0, "A"), (1.0, 2.0, "A")])).unwrap_err();
        assert!(matches!(err, ModelError::InsufficientClassDiversity { found: 1 }));
        assert!(err.is_configuration());
        assert!(!t.config().model_path.exists());
    }

    #[test]
    fn test_unlabeled_matrix_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let unlabeled =
            FeatureMatrix::from_vectors([FeatureVector::from_pairs([("a", 1.0)])]).unwrap();
        assert!(matches!(
            trainer(&dir).train(&unlabeled),
            Err(ModelError::MissingLabels)
        ));
    }

    #[test]
    fn test_train_writes_artifact_and_log() {
        let dir = tempfile::tempdir().unwrap();
        let t = trainer(&dir);
        let log = t
            .train(&matrix(&[(0.0, 0.0, "2"), (1.0, 1.0, "1"), (0.1, 0.0, "2")]))
            .unwrap();
        assert_eq!(log.status, TrainingStatus::Success);
        assert_eq!(log.training_samples, 3);
        assert_eq!(log.classes_found, ["1", "2"]);
        assert_eq!(log.feature_columns, ["a", "b"]);
        assert!(t.config().model_path.is_file());
    }

    #[test]
    fn test_constant_column_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        let (model, _) = trainer(&dir)
            .fit(&matrix(&[(0.0, 3.0, "A"), (1.0, 3.0, "B")]))
            .unwrap();
        assert_eq!(model.scales[1], 1.0);
        assert!(model.weights.iter().all(|w| w.is_finite()));
    }

    #[test]
    fn test_iteration_cap_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let t = Trainer::new(TrainerConfig {
            model_path: dir.path().join("model.bin"),
            max_iterations: 1,
            tolerance: 1e-12,
            ..Default::default()
        });
        let log = t.train(&matrix(&[(0.0, 0.0, "A"), (1.0, 1.0, "B")])).unwrap();
        assert_eq!(log.max_iterations, 1);
        assert!(!log.converged);
        assert!(t.config().model_path.is_file());
    }

    #[test]
    fn test_default_settings_converge() {
        let dir = tempfile::tempdir().unwrap();
        let (model, summary) = trainer(&dir)
            .fit(&matrix(&[
                (0.0, 1.0, "A"),
                (0.4, 1.3, "A"),
                (1.0, 0.2, "B"),
                (1.2, 0.0, "B"),
                (0.6, 0.9, "A"),
            ]))
            .unwrap();
        assert!(summary.converged);
        assert!(summary.final_loss.is_finite() && summary.final_loss > 0.0);
        assert_eq!(model.weights.dim(), (2, 2));
        assert_eq!(model.intercepts.len(), 2);
    }

    #[test]
    fn test_caller_errors_are_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let unlabeled =
            FeatureMatrix::from_vectors([FeatureVector::from_pairs([("a", 1.0)])]).unwrap();
        let err = trainer(&dir).fit(&unlabeled).unwrap_err();
        assert!(err.is_configuration());
        assert!(ModelError::EmptyMatrix.is_configuration());
        assert!(!ModelError::CorruptArtifact("x".into()).is_configuration());
    }
}

//! Emitter Classifier
//!
//! Trains a multinomial logistic regression (`linfa-logistic`) on a
//! labeled feature matrix, persists it as a self-describing artifact, and
//! predicts class probabilities for new matrices.

mod model;
mod predictor;
mod store;
mod trainer;

pub use model::{TrainedModel, MODEL_TYPE};
pub use predictor::{PredictionResult, Predictor};
pub use store::ModelStore;
pub use trainer::{FitSummary, Trainer, TrainerConfig, TrainingLog, TrainingStatus};

use thiserror::Error;

/// Errors while training, persisting or applying a model
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model artifact not found: {0}")]
    ArtifactMissing(String),

    #[error("model artifact is corrupt: {0}")]
    CorruptArtifact(String),

    #[error("model I/O error: {0}")]
    Io(String),

    #[error("feature matrix carries no labels")]
    MissingLabels,

    #[error("feature matrix has no rows")]
    EmptyMatrix,

    #[error("training needs at least 2 distinct labels, found {found}")]
    InsufficientClassDiversity { found: usize },

    #[error("{labels} labels for {rows} rows")]
    LabelCountMismatch { labels: usize, rows: usize },

    #[error("model expects {expected} features, row has {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("feature columns differ from training: expected [{expected}], found [{found}]")]
    SchemaMismatch { expected: String, found: String },

    #[error("feature {column} is not finite in row {row}")]
    NonFiniteFeature { row: usize, column: String },

    #[error("model fitting failed: {0}")]
    Fit(String),
}

impl ModelError {
    /// Whether the failure stems from the caller's inputs rather than the
    /// artifact or the filesystem
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ModelError::MissingLabels
                | ModelError::EmptyMatrix
                | ModelError::InsufficientClassDiversity { .. }
        )
    }
}

impl From<std::io::Error> for ModelError {
    fn from(err: std::io::Error) -> Self {
        ModelError::Io(err.to_string())
    }
}

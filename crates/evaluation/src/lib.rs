//! Prediction Evaluation
//!
//! Compares predicted labels against ground truth.

mod metrics;

pub use metrics::{evaluate, ClassMetrics, EvaluationReport, EvaluationStatus};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons an evaluation could not be computed
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluationError {
    #[error("input mismatch: no predictions or labels to compare")]
    EmptyInput,

    #[error("input mismatch: {predictions} predictions for {labels} labels")]
    LengthMismatch { predictions: usize, labels: usize },
}

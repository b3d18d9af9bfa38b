//! Serializable results of pipeline operations

use crate::error::RecordWarning;
use classifier::TrainingLog;
use evaluation::EvaluationReport;
use feature_engine::ExtractionNote;
use serde::Serialize;
use std::collections::BTreeMap;

/// What was loaded and extracted from one capture
#[derive(Debug, Clone, Serialize)]
pub struct RecordSummary {
    pub path: String,
    pub sample_count: usize,
    pub sample_rate_hz: f64,
    pub is_complex: bool,
    pub label: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub features: BTreeMap<String, f64>,
    pub notes: Vec<ExtractionNote>,
}

/// Outcome of a training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub training: TrainingLog,
    pub records_used: usize,
    pub label_distribution: BTreeMap<String, usize>,
    pub degraded_records: usize,
    pub feature_preview: Vec<BTreeMap<String, f64>>,
    /// Accuracy of the saved model on its own training records
    pub training_evaluation: EvaluationReport,
    pub warnings: Vec<RecordWarning>,
}

/// Prediction for one capture
#[derive(Debug, Clone, Serialize)]
pub struct RecordPrediction {
    pub path: String,
    pub predicted_label: String,
    pub probabilities: BTreeMap<String, f64>,
    /// Whether any extractor fell back to neutral features
    pub degraded: bool,
}

/// Outcome of a prediction run
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub model_path: String,
    pub predictions: Vec<RecordPrediction>,
    pub warnings: Vec<RecordWarning>,
}

/// Outcome of an evaluation run
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationRun {
    pub model_path: String,
    pub evaluation: EvaluationReport,
    pub predictions: Vec<RecordPrediction>,
    pub warnings: Vec<RecordWarning>,
}

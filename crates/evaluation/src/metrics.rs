//! Accuracy and confusion matrix

use crate::EvaluationError;
use classifier::PredictionResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Whether metrics were computed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Success,
    Error(EvaluationError),
}

/// Precision, recall and support for one label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of records whose true label is this one
    pub support: u64,
}

/// Evaluation outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub status: EvaluationStatus,
    /// Fraction of matching labels, 0 on error
    pub accuracy: f64,
    /// Rows are true labels, columns predicted labels, both in `label_order`
    pub confusion_matrix: Option<Vec<Vec<u64>>>,
    /// Sorted union of true and predicted labels
    pub label_order: Vec<String>,
    pub sample_count: usize,
    pub per_class: Vec<ClassMetrics>,
}

impl EvaluationReport {
    fn failed(error: EvaluationError) -> Self {
        warn!("Evaluation skipped: {}", error);
        Self {
            status: EvaluationStatus::Error(error),
            accuracy: 0.0,
            confusion_matrix: None,
            label_order: Vec::new(),
            sample_count: 0,
            per_class: Vec::new(),
        }
    }

    /// Whether metrics were computed
    pub fn is_success(&self) -> bool {
        self.status == EvaluationStatus::Success
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Score predictions against true labels. Never panics: empty or
/// misaligned input produces an error status instead of metrics.
pub fn evaluate(predictions: &[PredictionResult], true_labels: &[String]) -> EvaluationReport {
    if predictions.is_empty() || true_labels.is_empty() {
        return EvaluationReport::failed(EvaluationError::EmptyInput);
    }
    if predictions.len() != true_labels.len() {
        return EvaluationReport::failed(EvaluationError::LengthMismatch {
            predictions: predictions.len(),
            labels: true_labels.len(),
        });
    }

    let label_order: Vec<String> = true_labels
        .iter()
        .chain(predictions.iter().map(|p| &p.predicted_label))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let index = |label: &String| label_order.binary_search(label).unwrap_or_else(|i| i);

    let size = label_order.len();
    let mut matrix = vec![vec![0u64; size]; size];
    let mut correct = 0u64;
    for (prediction, truth) in predictions.iter().zip(true_labels) {
        matrix[index(truth)][index(&prediction.predicted_label)] += 1;
        if prediction.predicted_label == *truth {
            correct += 1;
        }
    }

    let per_class = label_order
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let hits = matrix[i][i];
            let support: u64 = matrix[i].iter().sum();
            let predicted: u64 = matrix.iter().map(|row| row[i]).sum();
            let precision = ratio(hits, predicted);
            let recall = ratio(hits, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics {
                label: label.clone(),
                precision,
                recall,
                f1,
                support,
            }
        })
        .collect();

    let accuracy = ratio(correct, predictions.len() as u64);
    info!(
        "Evaluated {} predictions over {} labels: accuracy {:.4}",
        predictions.len(),
        size,
        accuracy
    );

    EvaluationReport {
        status: EvaluationStatus::Success,
        accuracy,
        confusion_matrix: Some(matrix),
        label_order,
        sample_count: predictions.len(),
        per_class,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn predicted(labels: &[&str]) -> Vec<PredictionResult> {
        labels
            .iter()
            .map(|label| PredictionResult {
                predicted_label: label.to_string(),
                probabilities: BTreeMap::from([(label.to_string(), 1.0)]),
            })
            .collect()
    }

    fn truth(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_accuracy_and_matrix() {
        let report = evaluate(&predicted(&["A", "B", "A"]), &truth(&["A", "A", "A"]));
        assert!(report.is_success());
        assert!((report.accuracy - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.label_order, ["A", "B"]);
        assert_eq!(report.confusion_matrix, Some(vec![vec![2, 1], vec![0, 0]]));
        assert_eq!(report.sample_count, 3);

        let a = &report.per_class[0];
        assert_eq!(a.support, 3);
        assert!((a.precision - 1.0).abs() < 1e-12);
        assert!((a.recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.per_class[1].support, 0);
        assert_eq!(report.per_class[1].precision, 0.0);
    }

    #[test]
    fn test_empty_input_is_error_status() {
        let report = evaluate(&[], &[]);
        assert_eq!(report.status, EvaluationStatus::Error(EvaluationError::EmptyInput));
        assert_eq!(report.accuracy, 0.0);
        assert!(report.confusion_matrix.is_none());
    }

    #[test]
    fn test_length_mismatch_is_error_status() {
        let report = evaluate(&predicted(&["A"]), &truth(&["A", "B"]));
        assert_eq!(
            report.status,
            EvaluationStatus::Error(EvaluationError::LengthMismatch {
                predictions: 1,
                labels: 2
            })
        );
        assert!(report.confusion_matrix.is_none());
    }

    #[test]
    fn test_status_serialization() {
        let ok = serde_json::to_value(EvaluationStatus::Success).unwrap();
        assert_eq!(ok, serde_json::json!("success"));

        let err = serde_json::to_value(EvaluationStatus::Error(EvaluationError::EmptyInput)).unwrap();
        assert_eq!(err, serde_json::json!({"error": {"kind": "empty_input"}}));
    }

    proptest! {
        #[test]
        fn prop_report_invariants(pairs in prop::collection::vec((0u8..4, 0u8..4), 1..40)) {
            let preds: Vec<String> = pairs.iter().map(|(p, _)| format!("E{}", p)).collect();
            let trues: Vec<String> = pairs.iter().map(|(_, t)| format!("E{}", t)).collect();
            let pred_refs: Vec<&str> = preds.iter().map(String::as_str).collect();

            let report = evaluate(&predicted(&pred_refs), &trues);
            prop_assert!((0.0..=1.0).contains(&report.accuracy));

            let union: BTreeSet<&String> = preds.iter().chain(&trues).collect();
            prop_assert_eq!(report.label_order.len(), union.len());

            let matrix = report.confusion_matrix.unwrap();
            let total: u64 = matrix.iter().flatten().sum();
            prop_assert_eq!(total as usize, pairs.len());

            for (i, label) in report.label_order.iter().enumerate() {
                let row_sum: u64 = matrix[i].iter().sum();
                let col_sum: u64 = matrix.iter().map(|row| row[i]).sum();
                prop_assert_eq!(row_sum as usize, trues.iter().filter(|t| *t == label).count());
                prop_assert_eq!(col_sum as usize, preds.iter().filter(|p| *p == label).count());
            }

            let diagonal: u64 = (0..matrix.len()).map(|i| matrix[i][i]).sum();
            prop_assert!((report.accuracy - diagonal as f64 / pairs.len() as f64).abs() < 1e-12);
        }
    }
}

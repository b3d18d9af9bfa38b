//! Batch orchestration
//!
//! Records are processed strictly in input order. A record that fails to
//! load or label is skipped with a warning; the matrix and label list only
//! grow once a record has fully succeeded.

use crate::error::{PipelineError, RecordWarning};
use crate::report::{
    EvaluationRun, PredictionReport, RecordPrediction, RecordSummary, TrainingReport,
};
use crate::settings::{LabelSource, PipelineConfig};
use classifier::{PredictionResult, Predictor, Trainer};
use evaluation::evaluate;
use feature_engine::{extract_features, ExtractorKind, FeatureMatrix, FeatureMatrixBuilder};
use signal_loader::{load_signal_record, SignalRecord};
use std::path::Path;
use tracing::{info, warn};

/// Rows of the feature preview included in training reports
const PREVIEW_ROWS: usize = 5;

/// Records that made it into a matrix
struct Batch {
    matrix: FeatureMatrix,
    paths: Vec<String>,
    warnings: Vec<RecordWarning>,
}

/// End-to-end emitter identification pipeline
#[derive(Debug, Clone)]
pub struct SeiPipeline {
    config: PipelineConfig,
    kinds: Vec<ExtractorKind>,
}

impl SeiPipeline {
    /// Create a pipeline, resolving the configured extraction methods
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let kinds = config.extractor_kinds()?;
        info!(
            "Pipeline ready: methods {:?}, model {}",
            kinds,
            config.model_path.display()
        );
        Ok(Self { config, kinds })
    }

    /// Active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Selected extractors
    pub fn extractors(&self) -> &[ExtractorKind] {
        &self.kinds
    }

    /// Load one capture and report its features
    pub fn inspect(&self, path: impl AsRef<Path>) -> Result<RecordSummary, PipelineError> {
        let path = path.as_ref();
        let record = load_signal_record(path)?;
        let features = extract_features(&record, &self.kinds)?;
        Ok(RecordSummary {
            path: path.display().to_string(),
            sample_count: record.len(),
            sample_rate_hz: record.sample_rate_hz(),
            is_complex: record.samples().is_complex(),
            label: record.label().map(str::to_string),
            metadata: record.metadata().clone(),
            features: features.values,
            notes: features.notes,
        })
    }

    /// Label for a record under the configured label source
    pub fn label_for(&self, path: &Path, record: &SignalRecord) -> Result<String, PipelineError> {
        let missing = |reason: &str| PipelineError::MissingLabel {
            path: path.display().to_string(),
            reason: reason.to_string(),
        };

        match self.config.label_source {
            LabelSource::Record => record
                .label()
                .map(str::to_string)
                .ok_or_else(|| missing("capture has no label")),
            LabelSource::FileName => {
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .ok_or_else(|| missing("file name is not valid UTF-8"))?;
                let prefix = match name.split_once('_') {
                    Some((prefix, _)) => prefix,
                    None => path.file_stem().and_then(|s| s.to_str()).unwrap_or(name),
                };
                if prefix.is_empty() {
                    return Err(missing("file name has an empty label prefix"));
                }
                Ok(prefix.to_string())
            }
        }
    }

    /// Load, label and extract every path, skipping failures
    fn collect<P: AsRef<Path>>(&self, paths: &[P], labeled: bool) -> Result<Batch, PipelineError> {
        let mut builder = FeatureMatrixBuilder::new();
        let mut accepted = Vec::new();
        let mut warnings = Vec::new();

        for path in paths {
            let path = path.as_ref();
            let shown = path.display().to_string();
            match self.process(path, labeled, &mut builder) {
                Ok(()) => accepted.push(shown),
                Err(e) => {
                    warn!("Skipping {}: {}", shown, e);
                    warnings.push(RecordWarning::new(shown, &e));
                }
            }
        }

        if builder.is_empty() {
            return Err(PipelineError::NoUsableRecords {
                attempted: paths.len(),
            });
        }
        info!(
            "Extracted features from {} of {} records",
            accepted.len(),
            paths.len()
        );

        Ok(Batch {
            matrix: builder.build()?,
            paths: accepted,
            warnings,
        })
    }

    fn process(
        &self,
        path: &Path,
        labeled: bool,
        builder: &mut FeatureMatrixBuilder,
    ) -> Result<(), PipelineError> {
        let record = load_signal_record(path)?;
        let label = if labeled {
            Some(self.label_for(path, &record)?)
        } else {
            None
        };
        let features = extract_features(&record, &self.kinds)?;
        builder.push(features, label)?;
        Ok(())
    }

    fn record_predictions(batch: &Batch, results: Vec<PredictionResult>) -> Vec<RecordPrediction> {
        batch
            .paths
            .iter()
            .zip(batch.matrix.degraded())
            .zip(results)
            .map(|((path, &degraded), result)| RecordPrediction {
                path: path.clone(),
                predicted_label: result.predicted_label,
                probabilities: result.probabilities,
                degraded,
            })
            .collect()
    }

    /// Train on labeled captures and write the model artifact
    pub fn train_from_paths<P: AsRef<Path>>(
        &self,
        paths: &[P],
    ) -> Result<TrainingReport, PipelineError> {
        let batch = self.collect(paths, true)?;
        let matrix = &batch.matrix;
        let label_distribution = matrix.label_distribution();
        info!("Label distribution: {:?}", label_distribution);

        let trainer = Trainer::new(self.config.trainer_config());
        let training = trainer.train(matrix)?;

        // Score the saved artifact on its own training data
        let predictor = Predictor::load(&self.config.model_path)?;
        let predictions = predictor.predict(matrix)?;
        let labels = matrix.labels().map(<[String]>::to_vec).unwrap_or_default();
        let training_evaluation = evaluate(&predictions, &labels);
        info!(
            "Training-set accuracy {:.4} over {} records",
            training_evaluation.accuracy,
            matrix.n_rows()
        );

        Ok(TrainingReport {
            training,
            records_used: matrix.n_rows(),
            label_distribution,
            degraded_records: matrix.degraded().iter().filter(|&&d| d).count(),
            feature_preview: matrix.preview(PREVIEW_ROWS),
            training_evaluation,
            warnings: batch.warnings,
        })
    }

    /// Predict captures with the saved model
    pub fn predict_paths<P: AsRef<Path>>(
        &self,
        paths: &[P],
    ) -> Result<PredictionReport, PipelineError> {
        let predictor = Predictor::load(&self.config.model_path)?;
        let batch = self.collect(paths, false)?;
        let results = predictor.predict(&batch.matrix)?;

        Ok(PredictionReport {
            model_path: self.model_path_display(),
            predictions: Self::record_predictions(&batch, results),
            warnings: batch.warnings,
        })
    }

    /// Predict labeled captures and score the predictions
    pub fn evaluate_paths<P: AsRef<Path>>(
        &self,
        paths: &[P],
    ) -> Result<EvaluationRun, PipelineError> {
        let predictor = Predictor::load(&self.config.model_path)?;
        let batch = self.collect(paths, true)?;
        let results = predictor.predict(&batch.matrix)?;
        let labels = batch
            .matrix
            .labels()
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        let evaluation = evaluate(&results, &labels);

        Ok(EvaluationRun {
            model_path: self.model_path_display(),
            evaluation,
            predictions: Self::record_predictions(&batch, results),
            warnings: batch.warnings,
        })
    }

    fn model_path_display(&self) -> String {
        self.config.model_path.display().to_string()
    }
}

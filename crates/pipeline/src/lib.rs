//! Emitter Identification Pipeline
//!
//! Ties capture loading, feature extraction, model training, prediction
//! and evaluation into batch operations driven by a layered configuration.

mod error;
mod logging;
mod orchestrator;
mod report;
mod settings;

pub use error::{ErrorCategory, PipelineError, RecordWarning};
pub use logging::init_logging;
pub use orchestrator::SeiPipeline;
pub use report::{EvaluationRun, PredictionReport, RecordPrediction, RecordSummary, TrainingReport};
pub use settings::{ConfigError, LabelSource, LogFormat, PipelineConfig, TrainingSection};

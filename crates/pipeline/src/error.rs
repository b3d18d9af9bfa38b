//! Pipeline error taxonomy

use crate::settings::ConfigError;
use classifier::ModelError;
use feature_engine::FeatureError;
use serde::{Deserialize, Serialize};
use signal_loader::LoadError;
use thiserror::Error;

/// Broad failure classes reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Load,
    Configuration,
    Model,
}

/// Errors surfaced by pipeline operations
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no label available for {path}: {reason}")]
    MissingLabel { path: String, reason: String },

    #[error("none of the {attempted} inputs produced a usable record")]
    NoUsableRecords { attempted: usize },
}

impl PipelineError {
    /// Classify this failure
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::Load(_) | PipelineError::NoUsableRecords { .. } => ErrorCategory::Load,
            PipelineError::Feature(_)
            | PipelineError::Config(_)
            | PipelineError::MissingLabel { .. } => ErrorCategory::Configuration,
            PipelineError::Model(e) if e.is_configuration() => ErrorCategory::Configuration,
            PipelineError::Model(_) => ErrorCategory::Model,
        }
    }
}

/// A record skipped during a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordWarning {
    pub path: String,
    pub category: ErrorCategory,
    pub message: String,
}

impl RecordWarning {
    pub fn new(path: impl Into<String>, error: &PipelineError) -> Self {
        Self {
            path: path.into(),
            category: error.category(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let load = PipelineError::from(LoadError::EmptySamples);
        assert_eq!(load.category(), ErrorCategory::Load);

        let diversity = PipelineError::from(ModelError::InsufficientClassDiversity { found: 1 });
        assert_eq!(diversity.category(), ErrorCategory::Configuration);

        for caller in [ModelError::MissingLabels, ModelError::EmptyMatrix] {
            assert_eq!(
                PipelineError::from(caller).category(),
                ErrorCategory::Configuration
            );
        }

        let missing = PipelineError::from(ModelError::ArtifactMissing("m.bin".into()));
        assert_eq!(missing.category(), ErrorCategory::Model);

        let method = PipelineError::from(FeatureError::UnknownMethod("x".into()));
        assert_eq!(method.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_warning_keeps_message() {
        let error = PipelineError::from(LoadError::MissingPath("IntraPulse/DATA"));
        let warning = RecordWarning::new("a.json", &error);
        assert_eq!(warning.category, ErrorCategory::Load);
        assert!(warning.message.contains("IntraPulse/DATA"));
    }
}

//! Pipeline configuration
//!
//! Layered as built-in defaults, then an optional TOML file, then `SEI__*`
//! environment variables (`SEI__MODEL_PATH`, `SEI__TRAINING__MAX_ITERATIONS`,
//! `SEI__METHODS=power_spectrum,vmd`).

use classifier::TrainerConfig;
use feature_engine::{parse_methods, ExtractorKind, FeatureError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration could not be read: {0}")]
    Load(String),

    #[error("invalid configuration value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}

/// Where training and evaluation labels come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LabelSource {
    /// The capture's own label dataset
    #[default]
    Record,
    /// The file name prefix before the first `_`
    FileName,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Classifier hyper-parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSection {
    pub max_iterations: usize,
    pub regularization: f64,
    pub tolerance: f64,
}

impl Default for TrainingSection {
    fn default() -> Self {
        let trainer = TrainerConfig::default();
        Self {
            max_iterations: trainer.max_iterations,
            regularization: trainer.regularization,
            tolerance: trainer.tolerance,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Model artifact location
    pub model_path: PathBuf,
    /// Extraction method names
    pub methods: Vec<String>,
    pub label_source: LabelSource,
    pub log_format: LogFormat,
    pub training: TrainingSection,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_path: TrainerConfig::default().model_path,
            methods: vec![ExtractorKind::Spectral.as_str().to_string()],
            label_source: LabelSource::default(),
            log_format: LogFormat::default(),
            training: TrainingSection::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration, reading `path` when given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("SEI")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("methods")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                key: "model_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.training.max_iterations == 0 {
            return Err(ConfigError::Invalid {
                key: "training.max_iterations",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.training.regularization > 0.0) || !self.training.regularization.is_finite() {
            return Err(ConfigError::Invalid {
                key: "training.regularization",
                reason: format!("must be positive, got {}", self.training.regularization),
            });
        }
        if !(self.training.tolerance > 0.0) || !self.training.tolerance.is_finite() {
            return Err(ConfigError::Invalid {
                key: "training.tolerance",
                reason: format!("must be positive, got {}", self.training.tolerance),
            });
        }
        Ok(())
    }

    /// Resolved extractor selection
    pub fn extractor_kinds(&self) -> Result<Vec<ExtractorKind>, FeatureError> {
        parse_methods(&self.methods)
    }

    /// Trainer settings derived from this configuration
    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            model_path: self.model_path.clone(),
            max_iterations: self.training.max_iterations,
            regularization: self.training.regularization,
            tolerance: self.training.tolerance,
        }
    }
}

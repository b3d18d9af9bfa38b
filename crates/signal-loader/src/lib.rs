//! Signal Record Loader
//!
//! Decodes stored pulse captures into canonical [`SignalRecord`]s.

mod container;
mod loader;
mod record;
pub mod synthetic;

pub use container::{CaptureContainer, CaptureFile, ContainerFormat, Dataset, DatasetValues};
pub use loader::{
    load_signal_record, record_from_container, LABEL_PATH, QUADRATURE_PATH, SAMPLES_PATH,
    SAMPLE_RATE_PATH, SAMPLE_RATE_SCALE_HZ,
};
pub use record::{Samples, SignalRecord};

use thiserror::Error;

/// Errors while loading a capture. Every variant means no record was produced.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("load failed: file not found: {0}")]
    FileNotFound(String),

    #[error("load failed: I/O error: {0}")]
    Io(String),

    #[error("load failed: malformed container: {0}")]
    MalformedContainer(String),

    #[error("load failed: required path missing: {0}")]
    MissingPath(&'static str),

    #[error("load failed: dataset {path} is invalid: {reason}")]
    InvalidDataset { path: &'static str, reason: String },

    #[error("load failed: sample row is empty")]
    EmptySamples,

    #[error("load failed: sample {index} is not finite")]
    NonFiniteSample { index: usize },

    #[error("load failed: invalid sample rate: {0}")]
    InvalidSampleRate(String),
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        LoadError::Io(err.to_string())
    }
}

//! Feature Engineering Engine
//!
//! Spectral and decomposition feature extraction from signal records, and
//! assembly of per-record vectors into a feature matrix.

mod decomposition;
mod extractor;
mod features;
mod matrix;
mod spectral;
mod statistics;
pub mod vmd;
mod welch;

pub use decomposition::{DecompositionExtractor, MAX_DECOMPOSITION_SAMPLES};
pub use extractor::{extract_features, parse_methods, Extractor, ExtractorKind};
pub use features::{DegradeReason, ExtractionNote, FeatureVector};
pub use matrix::{FeatureMatrix, FeatureMatrixBuilder};
pub use spectral::{SpectralExtractor, PSD_BANDWIDTH, PSD_CENTROID, PSD_FLATNESS, PSD_KURTOSIS};
pub use statistics::{normalized_entropy, StatisticalFeatures};
pub use welch::{PowerSpectrum, WelchEstimator, WELCH_SEGMENT_LEN};

use thiserror::Error;

/// Feature extraction and assembly errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("no extraction method selected")]
    EmptySelection,

    #[error("unknown extraction method: {0}")]
    UnknownMethod(String),

    #[error("feature produced twice: {0}")]
    DuplicateFeature(String),

    #[error("feature columns differ: expected [{expected}], found [{found}]")]
    SchemaMismatch { expected: String, found: String },

    #[error("inconsistent labels: {0}")]
    LabelMismatch(String),

    #[error("feature matrix has no rows")]
    EmptyMatrix,
}

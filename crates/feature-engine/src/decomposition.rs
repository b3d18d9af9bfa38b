//! Decomposition-statistics extractor
//!
//! Energy and normalized entropy of each VMD mode.

use crate::extractor::{Extractor, ExtractorKind};
use crate::features::{DegradeReason, FeatureVector};
use crate::statistics::normalized_entropy;
use crate::vmd::{decompose, VmdError, VmdParams};
use signal_loader::Samples;
use tracing::{debug, warn};

/// Inputs longer than this are truncated before decomposition
pub const MAX_DECOMPOSITION_SAMPLES: usize = 4096;

/// Per-mode energy and entropy
#[derive(Debug, Clone, Copy, Default)]
pub struct DecompositionExtractor {
    params: VmdParams,
}

impl DecompositionExtractor {
    /// Create an extractor with the standard parameters (K = 5)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor with custom decomposition parameters
    pub fn with_params(params: VmdParams) -> Self {
        Self { params }
    }

    /// Name of the energy feature for 1-based mode `k`
    pub fn energy_name(k: usize) -> String {
        format!("vmd_mode{}_energy", k)
    }

    /// Name of the entropy feature for 1-based mode `k`
    pub fn entropy_name(k: usize) -> String {
        format!("vmd_mode{}_entropy", k)
    }
}

impl Extractor for DecompositionExtractor {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Decomposition
    }

    fn feature_names(&self) -> Vec<String> {
        (1..=self.params.modes)
            .flat_map(|k| [Self::energy_name(k), Self::entropy_name(k)])
            .collect()
    }

    fn extract(&self, samples: &Samples, _sample_rate_hz: f64) -> FeatureVector {
        let mut signal = samples.in_phase();
        if signal.len() > MAX_DECOMPOSITION_SAMPLES {
            debug!(
                "Truncating {} samples to {} for decomposition",
                signal.len(),
                MAX_DECOMPOSITION_SAMPLES
            );
            signal.truncate(MAX_DECOMPOSITION_SAMPLES);
        }

        let decomposition = match decompose(&signal, &self.params) {
            Ok(d) => d,
            Err(e) => {
                warn!("Decomposition failed, returning neutral features: {}", e);
                let reason = match e {
                    VmdError::TooShort {
                        available,
                        required,
                    } => DegradeReason::InsufficientSamples {
                        available,
                        required,
                    },
                    VmdError::NotConverged { iterations } => {
                        DegradeReason::NotConverged { iterations }
                    }
                    VmdError::NonFinite => DegradeReason::NonFinite,
                };
                return FeatureVector::neutral(&self.feature_names(), self.kind(), reason);
            }
        };

        let mut features = FeatureVector::new();
        for (idx, mode) in decomposition.modes.iter().enumerate() {
            let squared: Vec<f64> = mode.iter().map(|x| x * x).collect();
            let energy: f64 = squared.iter().sum();
            features.values.insert(Self::energy_name(idx + 1), energy);
            features
                .values
                .insert(Self::entropy_name(idx + 1), normalized_entropy(&squared));
        }

        if !features.all_finite() {
            return FeatureVector::neutral(
                &self.feature_names(),
                self.kind(),
                DegradeReason::NonFinite,
            );
        }

        features
    }
}

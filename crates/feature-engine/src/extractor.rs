//! Extractor selection and composition

use crate::decomposition::DecompositionExtractor;
use crate::features::FeatureVector;
use crate::spectral::SpectralExtractor;
use crate::FeatureError;
use serde::{Deserialize, Serialize};
use signal_loader::{Samples, SignalRecord};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// A feature extraction method
pub trait Extractor {
    /// Which kind this extractor implements
    fn kind(&self) -> ExtractorKind;

    /// Every name this extractor produces, complete or neutral
    fn feature_names(&self) -> Vec<String>;

    /// Compute features. Never fails: degenerate input yields zeros plus a note.
    fn extract(&self, samples: &Samples, sample_rate_hz: f64) -> FeatureVector;
}

/// The closed set of extraction methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    /// Welch PSD shape statistics
    Spectral,
    /// VMD per-mode energy and entropy
    Decomposition,
}

impl ExtractorKind {
    /// All kinds, in column order
    pub const ALL: [ExtractorKind; 2] = [ExtractorKind::Spectral, ExtractorKind::Decomposition];

    /// Canonical method name
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractorKind::Spectral => "power_spectrum",
            ExtractorKind::Decomposition => "vmd",
        }
    }

    /// Run this kind's extractor with its standard parameters
    pub fn extract(&self, samples: &Samples, sample_rate_hz: f64) -> FeatureVector {
        match self {
            ExtractorKind::Spectral => SpectralExtractor::new().extract(samples, sample_rate_hz),
            ExtractorKind::Decomposition => {
                DecompositionExtractor::new().extract(samples, sample_rate_hz)
            }
        }
    }

    /// Names this kind produces
    pub fn feature_names(&self) -> Vec<String> {
        match self {
            ExtractorKind::Spectral => SpectralExtractor::new().feature_names(),
            ExtractorKind::Decomposition => DecompositionExtractor::new().feature_names(),
        }
    }
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractorKind {
    type Err = FeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "power_spectrum" | "spectral" | "psd" => Ok(ExtractorKind::Spectral),
            "vmd" | "decomposition" => Ok(ExtractorKind::Decomposition),
            other => Err(FeatureError::UnknownMethod(other.to_string())),
        }
    }
}

/// Resolve method names into a sorted, de-duplicated selection.
///
/// An empty list or any unknown name is a configuration error.
pub fn parse_methods<S: AsRef<str>>(names: &[S]) -> Result<Vec<ExtractorKind>, FeatureError> {
    let mut kinds = names
        .iter()
        .map(|name| name.as_ref().parse())
        .collect::<Result<Vec<ExtractorKind>, _>>()?;
    kinds.sort();
    kinds.dedup();
    if kinds.is_empty() {
        return Err(FeatureError::EmptySelection);
    }
    Ok(kinds)
}

/// Run every selected extractor on a record and union their features.
pub fn extract_features(
    record: &SignalRecord,
    kinds: &[ExtractorKind],
) -> Result<FeatureVector, FeatureError> {
    if kinds.is_empty() {
        return Err(FeatureError::EmptySelection);
    }

    let mut selected = kinds.to_vec();
    selected.sort();
    selected.dedup();

    let mut features = FeatureVector::new();
    for kind in selected {
        let part = kind.extract(record.samples(), record.sample_rate_hz());
        debug!(
            "{} produced {} features (degraded: {})",
            kind,
            part.len(),
            part.is_degraded()
        );
        features.merge(part)?;
    }
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn record() -> SignalRecord {
        let samples = (0..2048).map(|i| (i as f64 * 0.3).sin()).collect();
        SignalRecord::new(Samples::Real(samples), 1e6, Some("1".into()), BTreeMap::new()).unwrap()
    }

    #[test]
    fn test_parse_method_names() {
        assert_eq!("power_spectrum".parse::<ExtractorKind>().unwrap(), ExtractorKind::Spectral);
        assert_eq!(" VMD ".parse::<ExtractorKind>().unwrap(), ExtractorKind::Decomposition);
        assert!(matches!(
            "wavelet".parse::<ExtractorKind>(),
            Err(FeatureError::UnknownMethod(name)) if name == "wavelet"
        ));
    }

    #[test]
    fn test_parse_methods_dedups_and_rejects_empty() {
        let kinds = parse_methods(&["vmd", "spectral", "power_spectrum"]).unwrap();
        assert_eq!(kinds, vec![ExtractorKind::Spectral, ExtractorKind::Decomposition]);

        let empty: [&str; 0] = [];
        assert!(matches!(parse_methods(&empty), Err(FeatureError::EmptySelection)));
    }

    #[test]
    fn test_empty_selection_is_error() {
        assert!(matches!(
            extract_features(&record(), &[]),
            Err(FeatureError::EmptySelection)
        ));
    }

    #[test]
    fn test_spectral_only_selection() {
        let features = extract_features(&record(), &[ExtractorKind::Spectral]).unwrap();
        assert_eq!(
            features.names().collect::<Vec<_>>(),
            vec!["psd_bandwidth", "psd_centroid", "psd_flatness", "psd_kurtosis"]
        );
    }

    #[test]
    fn test_both_methods_union_keys() {
        let features = extract_features(
            &record(),
            &[ExtractorKind::Decomposition, ExtractorKind::Spectral, ExtractorKind::Spectral],
        )
        .unwrap();
        assert_eq!(features.len(), 14);
        for kind in ExtractorKind::ALL {
            for name in kind.feature_names() {
                assert!(features.get(&name).is_some(), "missing {}", name);
            }
        }
    }
}

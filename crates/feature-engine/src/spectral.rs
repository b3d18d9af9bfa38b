//! Spectral-statistics extractor
//!
//! Shape statistics of the Welch PSD treated as a distribution over
//! frequency.

use crate::extractor::{Extractor, ExtractorKind};
use crate::features::{DegradeReason, FeatureVector};
use crate::statistics::StatisticalFeatures;
use crate::welch::{PowerSpectrum, WelchEstimator};
use signal_loader::Samples;
use tracing::debug;

/// Additive floor keeping `ln` away from zero in the flatness measure
const FLATNESS_FLOOR: f64 = 1e-12;

pub const PSD_KURTOSIS: &str = "psd_kurtosis";
pub const PSD_CENTROID: &str = "psd_centroid";
pub const PSD_BANDWIDTH: &str = "psd_bandwidth";
pub const PSD_FLATNESS: &str = "psd_flatness";

/// Spectral kurtosis, centroid, bandwidth and flatness
#[derive(Debug, Clone, Copy, Default)]
pub struct SpectralExtractor {
    estimator: WelchEstimator,
}

impl SpectralExtractor {
    /// Create a spectral extractor with the standard Welch segment length
    pub fn new() -> Self {
        Self::default()
    }

    /// Excess kurtosis of the positive PSD bins normalized to unit sum
    fn kurtosis(psd: &PowerSpectrum) -> f64 {
        let positive: Vec<f64> = psd.density.iter().copied().filter(|&p| p > 0.0).collect();
        let total: f64 = positive.iter().sum();
        let normalized: Vec<f64> = positive.iter().map(|p| p / total).collect();
        StatisticalFeatures::compute(&normalized).kurtosis
    }

    /// Power-weighted mean frequency
    fn centroid(psd: &PowerSpectrum, total: f64) -> f64 {
        psd.frequencies
            .iter()
            .zip(&psd.density)
            .map(|(f, p)| f * p)
            .sum::<f64>()
            / total
    }

    /// Power-weighted spread around the centroid
    fn bandwidth(psd: &PowerSpectrum, total: f64, centroid: f64) -> f64 {
        let second_moment = psd
            .frequencies
            .iter()
            .zip(&psd.density)
            .map(|(f, p)| (f - centroid).powi(2) * p)
            .sum::<f64>();
        (second_moment / total).sqrt()
    }

    /// Geometric over arithmetic mean of the PSD
    fn flatness(psd: &PowerSpectrum) -> f64 {
        let n = psd.len() as f64;
        let log_mean = psd
            .density
            .iter()
            .map(|p| (p + FLATNESS_FLOOR).ln())
            .sum::<f64>()
            / n;
        let arithmetic_mean = psd.total() / n;
        log_mean.exp() / arithmetic_mean
    }
}

impl Extractor for SpectralExtractor {
    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Spectral
    }

    fn feature_names(&self) -> Vec<String> {
        [PSD_KURTOSIS, PSD_CENTROID, PSD_BANDWIDTH, PSD_FLATNESS]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn extract(&self, samples: &Samples, sample_rate_hz: f64) -> FeatureVector {
        let psd = self.estimator.estimate(samples, sample_rate_hz);

        if !psd.has_energy() {
            debug!("PSD has no positive bin, returning neutral spectral features");
            return FeatureVector::neutral(
                &self.feature_names(),
                self.kind(),
                DegradeReason::LowEnergy,
            );
        }

        let total = psd.total();
        let centroid = Self::centroid(&psd, total);
        let features = FeatureVector::from_pairs([
            (PSD_KURTOSIS, Self::kurtosis(&psd)),
            (PSD_CENTROID, centroid),
            (PSD_BANDWIDTH, Self::bandwidth(&psd, total, centroid)),
            (PSD_FLATNESS, Self::flatness(&psd)),
        ]);

        if !features.all_finite() {
            debug!("Spectral features not finite, returning neutral vector");
            return FeatureVector::neutral(
                &self.feature_names(),
                self.kind(),
                DegradeReason::NonFinite,
            );
        }

        features
    }
}

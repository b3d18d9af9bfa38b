//! Canonical Signal Record

use crate::LoadError;
use rustfft::num_complex::Complex;
use std::collections::BTreeMap;

/// Raw pulse samples, real-valued or I/Q
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    /// Real-valued samples
    Real(Vec<f64>),
    /// Complex baseband (I + jQ) samples
    Complex(Vec<Complex<f64>>),
}

impl Samples {
    /// Number of samples
    pub fn len(&self) -> usize {
        match self {
            Samples::Real(v) => v.len(),
            Samples::Complex(v) => v.len(),
        }
    }

    /// Check if there are no samples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the samples are complex
    pub fn is_complex(&self) -> bool {
        matches!(self, Samples::Complex(_))
    }

    /// In-phase (real) component of every sample
    pub fn in_phase(&self) -> Vec<f64> {
        match self {
            Samples::Real(v) => v.clone(),
            Samples::Complex(v) => v.iter().map(|c| c.re).collect(),
        }
    }

    /// Samples promoted to complex values
    pub fn to_complex(&self) -> Vec<Complex<f64>> {
        match self {
            Samples::Real(v) => v.iter().map(|&x| Complex::new(x, 0.0)).collect(),
            Samples::Complex(v) => v.clone(),
        }
    }

    /// Index of the first non-finite sample, if any
    fn first_non_finite(&self) -> Option<usize> {
        match self {
            Samples::Real(v) => v.iter().position(|x| !x.is_finite()),
            Samples::Complex(v) => v.iter().position(|c| !c.re.is_finite() || !c.im.is_finite()),
        }
    }
}

/// A loaded capture: samples, sample rate, optional ground truth and provenance.
///
/// Fields are only reachable through accessors so a record cannot change
/// after construction.
#[derive(Debug, Clone)]
pub struct SignalRecord {
    samples: Samples,
    sample_rate_hz: f64,
    label: Option<String>,
    metadata: BTreeMap<String, String>,
}

impl SignalRecord {
    /// Create a record, checking that samples are non-empty and finite and
    /// that the sample rate is positive.
    pub fn new(
        samples: Samples,
        sample_rate_hz: f64,
        label: Option<String>,
        metadata: BTreeMap<String, String>,
    ) -> Result<Self, LoadError> {
        if samples.is_empty() {
            return Err(LoadError::EmptySamples);
        }
        if let Some(index) = samples.first_non_finite() {
            return Err(LoadError::NonFiniteSample { index });
        }
        if !(sample_rate_hz.is_finite() && sample_rate_hz > 0.0) {
            return Err(LoadError::InvalidSampleRate(format!(
                "{} Hz is not a positive rate",
                sample_rate_hz
            )));
        }

        Ok(Self {
            samples,
            sample_rate_hz,
            label,
            metadata,
        })
    }

    /// Sample data
    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    /// Sample rate in hertz
    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    /// Ground-truth label, absent at inference time
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Provenance fields
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a constructed record
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_samples() {
        let result = SignalRecord::new(Samples::Real(vec![]), 1e6, None, BTreeMap::new());
        assert!(matches!(result, Err(LoadError::EmptySamples)));
    }

    #[test]
    fn test_rejects_non_positive_rate() {
        let result = SignalRecord::new(Samples::Real(vec![1.0]), 0.0, None, BTreeMap::new());
        assert!(matches!(result, Err(LoadError::InvalidSampleRate(_))));

        let result = SignalRecord::new(Samples::Real(vec![1.0]), f64::NAN, None, BTreeMap::new());
        assert!(matches!(result, Err(LoadError::InvalidSampleRate(_))));
    }

    #[test]
    fn test_rejects_non_finite_sample() {
        let samples = Samples::Complex(vec![Complex::new(1.0, 0.0), Complex::new(0.0, f64::INFINITY)]);
        let result = SignalRecord::new(samples, 1e6, None, BTreeMap::new());
        assert!(matches!(result, Err(LoadError::NonFiniteSample { index: 1 })));
    }

    #[test]
    fn test_in_phase_of_complex() {
        let samples = Samples::Complex(vec![Complex::new(1.5, -2.0), Complex::new(-0.5, 3.0)]);
        assert_eq!(samples.in_phase(), vec![1.5, -0.5]);
        assert!(samples.is_complex());
    }
}

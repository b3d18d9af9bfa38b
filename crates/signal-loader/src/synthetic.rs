//! Synthetic pulse captures
//!
//! Generates noisy single-tone captures in the standard container layout.
//! Used to exercise the pipeline without real recordings.

use crate::container::{CaptureFile, Dataset};
use crate::loader::{LABEL_PATH, QUADRATURE_PATH, SAMPLES_PATH, SAMPLE_RATE_PATH};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Description of a synthetic tone capture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToneSpec {
    /// Number of samples
    pub length: usize,
    /// Tone frequency as a fraction of the sample rate
    pub tone_fraction: f64,
    /// Tone amplitude
    pub amplitude: f64,
    /// Standard deviation of the additive Gaussian noise
    pub noise_std: f64,
    /// Starting phase (radians)
    pub phase: f64,
    /// Random seed for the noise
    pub seed: u64,
    /// Integer label code written to the capture
    pub label_code: i64,
    /// Sample rate code in MHz
    pub rate_code_mhz: i64,
    /// Write a quadrature component as well
    pub complex: bool,
}

impl Default for ToneSpec {
    fn default() -> Self {
        Self {
            length: 4096,
            tone_fraction: 0.1,
            amplitude: 1.0,
            noise_std: 0.05,
            phase: 0.0,
            seed: 0,
            label_code: 0,
            rate_code_mhz: 500,
            complex: false,
        }
    }
}

/// Standard normal draw (Box-Muller)
fn gaussian(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Build a capture holding the described tone
pub fn tone_capture(spec: &ToneSpec) -> CaptureFile {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let omega = 2.0 * PI * spec.tone_fraction;

    let mut in_phase = Vec::with_capacity(spec.length);
    let mut quadrature = Vec::with_capacity(spec.length);
    for n in 0..spec.length {
        let arg = omega * n as f64 + spec.phase;
        in_phase.push(spec.amplitude * arg.cos() + spec.noise_std * gaussian(&mut rng));
        if spec.complex {
            quadrature.push(spec.amplitude * arg.sin() + spec.noise_std * gaussian(&mut rng));
        }
    }

    let mut capture = CaptureFile::new();
    capture.insert(SAMPLES_PATH, Dataset::float_rows(&[in_phase]));
    if spec.complex {
        capture.insert(QUADRATURE_PATH, Dataset::float_rows(&[quadrature]));
    }
    capture.insert(LABEL_PATH, Dataset::int_scalar(spec.label_code));
    capture.insert(SAMPLE_RATE_PATH, Dataset::int_scalar(spec.rate_code_mhz));
    capture
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record_from_container;
    use std::collections::BTreeMap;

    #[test]
    fn test_tone_capture_is_loadable() {
        let spec = ToneSpec {
            length: 256,
            label_code: 4,
            rate_code_mhz: 20,
            ..Default::default()
        };
        let record = record_from_container(&tone_capture(&spec), BTreeMap::new()).unwrap();
        assert_eq!(record.len(), 256);
        assert_eq!(record.label(), Some("4"));
        assert_eq!(record.sample_rate_hz(), 20.0e6);
    }

    #[test]
    fn test_same_seed_same_capture() {
        let spec = ToneSpec {
            length: 128,
            seed: 42,
            ..Default::default()
        };
        assert_eq!(tone_capture(&spec), tone_capture(&spec));
    }

    #[test]
    fn test_complex_capture_has_quadrature() {
        let spec = ToneSpec {
            length: 64,
            complex: true,
            ..Default::default()
        };
        let capture = tone_capture(&spec);
        assert!(capture.datasets.contains_key(QUADRATURE_PATH));
    }
}

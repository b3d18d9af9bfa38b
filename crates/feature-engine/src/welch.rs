//! Welch Power Spectral Density Estimation

use rustfft::{num_complex::Complex, FftPlanner};
use signal_loader::Samples;

/// Segment length used for PSD estimation
pub const WELCH_SEGMENT_LEN: usize = 1024;

/// Power spectral density estimate
#[derive(Debug, Clone, Default)]
pub struct PowerSpectrum {
    /// Bin frequencies (Hz). Negative for the upper half of a two-sided spectrum.
    pub frequencies: Vec<f64>,
    /// Power density per bin (units²/Hz)
    pub density: Vec<f64>,
}

impl PowerSpectrum {
    /// Number of bins
    pub fn len(&self) -> usize {
        self.density.len()
    }

    /// Check if the spectrum has no bins
    pub fn is_empty(&self) -> bool {
        self.density.is_empty()
    }

    /// Total power over all bins
    pub fn total(&self) -> f64 {
        self.density.iter().sum()
    }

    /// Whether any bin carries strictly positive power
    pub fn has_energy(&self) -> bool {
        self.density.iter().any(|&p| p > 0.0)
    }
}

/// Averaged-periodogram PSD estimator.
///
/// Periodic Hann window, 50 % overlap, per-segment mean removal, density
/// scaling. Real input yields a one-sided spectrum, complex input a
/// two-sided one.
#[derive(Debug, Clone, Copy)]
pub struct WelchEstimator {
    segment_len: usize,
}

impl Default for WelchEstimator {
    fn default() -> Self {
        Self::new(WELCH_SEGMENT_LEN)
    }
}

impl WelchEstimator {
    /// Create an estimator with the given segment length
    pub fn new(segment_len: usize) -> Self {
        Self {
            segment_len: segment_len.max(1),
        }
    }

    /// Periodic Hann window
    fn hann_window(len: usize) -> Vec<f64> {
        if len <= 1 {
            return vec![1.0; len];
        }
        (0..len)
            .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / len as f64).cos())
            .collect()
    }

    /// Estimate the PSD of `samples` taken at `sample_rate_hz`
    pub fn estimate(&self, samples: &Samples, sample_rate_hz: f64) -> PowerSpectrum {
        let signal = samples.to_complex();
        let n = signal.len();
        if n == 0 || !(sample_rate_hz > 0.0) {
            return PowerSpectrum::default();
        }

        // Segments never exceed the signal
        let nperseg = self.segment_len.min(n);
        let noverlap = nperseg / 2;
        let step = nperseg - noverlap;
        let segments = (n - noverlap) / step;

        let window = Self::hann_window(nperseg);
        let window_power: f64 = window.iter().map(|w| w * w).sum();
        let scale = 1.0 / (sample_rate_hz * window_power);

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(nperseg);

        let mut accumulated = vec![0.0; nperseg];
        let mut buffer: Vec<Complex<f64>> = vec![Complex::new(0.0, 0.0); nperseg];

        for s in 0..segments {
            let segment = &signal[s * step..s * step + nperseg];
            let mean = segment.iter().sum::<Complex<f64>>() / nperseg as f64;

            for ((slot, &x), &w) in buffer.iter_mut().zip(segment).zip(&window) {
                *slot = (x - mean) * w;
            }
            fft.process(&mut buffer);

            for (acc, c) in accumulated.iter_mut().zip(&buffer) {
                *acc += c.norm_sqr() * scale;
            }
        }

        for acc in accumulated.iter_mut() {
            *acc /= segments as f64;
        }

        let bin_width = sample_rate_hz / nperseg as f64;

        if samples.is_complex() {
            // Two-sided, FFT bin order
            let frequencies = (0..nperseg)
                .map(|k| {
                    let signed = if k < (nperseg + 1) / 2 {
                        k as f64
                    } else {
                        k as f64 - nperseg as f64
                    };
                    signed * bin_width
                })
                .collect();
            PowerSpectrum {
                frequencies,
                density: accumulated,
            }
        } else {
            // One-sided: fold negative frequencies onto positive bins
            let bins = nperseg / 2 + 1;
            let mut density = accumulated[..bins].to_vec();
            let doubled_end = if nperseg % 2 == 0 { bins - 1 } else { bins };
            for p in density.iter_mut().take(doubled_end).skip(1) {
                *p *= 2.0;
            }
            let frequencies = (0..bins).map(|k| k as f64 * bin_width).collect();
            PowerSpectrum {
                frequencies,
                density,
            }
        }
    }
}

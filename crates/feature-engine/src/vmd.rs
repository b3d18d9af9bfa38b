//! Variational Mode Decomposition
//!
//! Splits a real signal into `K` band-limited modes by alternating Wiener
//! filtering of the residual spectrum around each mode's centre frequency
//! and re-estimating that centre frequency. The signal is mirrored at both
//! ends before transforming to reduce boundary effects.
//!
//! Only the current and previous iterates are kept, so memory is
//! `O(K · N)` regardless of the iteration count.

use rustfft::{num_complex::Complex, FftPlanner};
use thiserror::Error;
use tracing::debug;

/// Decomposition parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VmdParams {
    /// Number of modes
    pub modes: usize,
    /// Bandwidth penalty
    pub alpha: f64,
    /// Dual ascent step (0 disables the reconstruction constraint)
    pub tau: f64,
    /// Relative spectral change below which iteration stops
    pub tolerance: f64,
    /// Iteration cap
    pub max_iterations: usize,
}

impl Default for VmdParams {
    fn default() -> Self {
        Self {
            modes: 5,
            alpha: 2000.0,
            tau: 0.0,
            tolerance: 1e-6,
            max_iterations: 500,
        }
    }
}

/// Decomposition failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VmdError {
    #[error("need at least {required} samples, got {available}")]
    TooShort { available: usize, required: usize },

    #[error("no convergence after {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error("decomposition produced non-finite values")]
    NonFinite,
}

/// Result of a decomposition
#[derive(Debug, Clone)]
pub struct Decomposition {
    /// Time-domain modes, each as long as the (even-length) input
    pub modes: Vec<Vec<f64>>,
    /// Final centre frequencies, as fractions of the sample rate
    pub center_frequencies: Vec<f64>,
    /// Iterations performed
    pub iterations: usize,
}

/// Minimum input length
const MIN_SAMPLES: usize = 4;

/// `x[(i + len/2) % len]`, the half-spectrum rotation used for both
/// fftshift and ifftshift on even lengths
fn rotate_half(x: &[Complex<f64>]) -> Vec<Complex<f64>> {
    let half = x.len() / 2;
    x[half..].iter().chain(&x[..half]).copied().collect()
}

/// Decompose `signal`. Odd-length input drops its last sample.
pub fn decompose(signal: &[f64], params: &VmdParams) -> Result<Decomposition, VmdError> {
    let len = signal.len() - signal.len() % 2;
    if len < MIN_SAMPLES || params.modes == 0 {
        return Err(VmdError::TooShort {
            available: signal.len(),
            required: MIN_SAMPLES,
        });
    }
    let signal = &signal[..len];
    let k_modes = params.modes;

    // Mirror extension: reversed first half, signal, reversed second half
    let half = len / 2;
    let mirrored: Vec<f64> = signal[..half]
        .iter()
        .rev()
        .chain(signal)
        .chain(signal[half..].iter().rev())
        .copied()
        .collect();
    let t_len = mirrored.len();
    let t_half = t_len / 2;

    let freqs: Vec<f64> = (0..t_len)
        .map(|i| i as f64 / t_len as f64 - 0.5)
        .collect();

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(t_len);
    let inverse = planner.plan_fft_inverse(t_len);

    let mut spectrum: Vec<Complex<f64>> = mirrored.iter().map(|&x| Complex::new(x, 0.0)).collect();
    forward.process(&mut spectrum);
    let mut f_hat_plus = rotate_half(&spectrum);
    for bin in f_hat_plus.iter_mut().take(t_half) {
        *bin = Complex::new(0.0, 0.0);
    }

    let signal_energy: f64 = f_hat_plus.iter().map(|c| c.norm_sqr()).sum();
    let reference = signal_energy.max(f64::MIN_POSITIVE);

    let zero = Complex::new(0.0, 0.0);
    let mut u_prev = vec![vec![zero; t_len]; k_modes];
    let mut u_next = vec![vec![zero; t_len]; k_modes];
    let mut omega: Vec<f64> = (0..k_modes).map(|k| 0.5 / k_modes as f64 * k as f64).collect();
    let mut lambda = vec![zero; t_len];
    let mut sum_uk = vec![zero; t_len];

    let mut change = f64::INFINITY;
    let mut iterations = 0;

    while change > params.tolerance && iterations < params.max_iterations.saturating_sub(1) {
        for k in 0..k_modes {
            // Residual of every other mode, updated in place
            let (entering, leaving) = if k == 0 {
                (&u_prev[k_modes - 1], &u_prev[0])
            } else {
                (&u_next[k - 1], &u_prev[k])
            };
            for i in 0..t_len {
                sum_uk[i] = entering[i] + sum_uk[i] - leaving[i];
            }

            let mut weighted = 0.0;
            let mut power = 0.0;
            for i in 0..t_len {
                let gain = 1.0 + params.alpha * (freqs[i] - omega[k]).powi(2);
                let value = (f_hat_plus[i] - sum_uk[i] - lambda[i] / 2.0) / gain;
                u_next[k][i] = value;
                if i >= t_half {
                    let p = value.norm_sqr();
                    weighted += freqs[i] * p;
                    power += p;
                }
            }
            // A silent mode keeps its previous centre
            if power > 0.0 {
                omega[k] = weighted / power;
            }
        }

        if params.tau != 0.0 {
            for i in 0..t_len {
                let total: Complex<f64> = u_next.iter().map(|mode| mode[i]).sum();
                lambda[i] += (total - f_hat_plus[i]) * params.tau;
            }
        }

        iterations += 1;
        let diff: f64 = u_next
            .iter()
            .zip(&u_prev)
            .map(|(a, b)| a.iter().zip(b).map(|(x, y)| (x - y).norm_sqr()).sum::<f64>())
            .sum();
        change = diff / reference;
        std::mem::swap(&mut u_prev, &mut u_next);
    }

    if !change.is_finite() {
        return Err(VmdError::NonFinite);
    }
    if change > params.tolerance {
        debug!(
            "VMD stopped after {} iterations with relative change {:.3e}",
            iterations, change
        );
        return Err(VmdError::NotConverged { iterations });
    }

    // Rebuild the full Hermitian spectrum of each mode and return to time domain
    let start = t_len / 4;
    let mut modes = Vec::with_capacity(k_modes);
    for mode in &u_prev {
        let mut full = vec![zero; t_len];
        full[t_half..].copy_from_slice(&mode[t_half..]);
        for j in 0..t_half {
            full[t_half - j] = mode[t_half + j].conj();
        }
        full[0] = full[t_len - 1].conj();

        let mut buffer = rotate_half(&full);
        inverse.process(&mut buffer);
        let scale = 1.0 / t_len as f64;
        let time: Vec<f64> = buffer[start..start + len].iter().map(|c| c.re * scale).collect();

        if time.iter().any(|v| !v.is_finite()) {
            return Err(VmdError::NonFinite);
        }
        modes.push(time);
    }

    debug!("VMD converged after {} iterations", iterations);
    Ok(Decomposition {
        modes,
        center_frequencies: omega,
        iterations,
    })
}

//! Distribution Statistics

/// Moment statistics of a set of values
#[derive(Debug, Clone, Default)]
pub struct StatisticalFeatures {
    /// Mean value
    pub mean: f64,
    /// Population variance
    pub variance: f64,
    /// Standard deviation
    pub std_dev: f64,
    /// Skewness (asymmetry)
    pub skewness: f64,
    /// Excess kurtosis (tailedness, normal = 0)
    pub kurtosis: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
}

impl StatisticalFeatures {
    /// Compute statistical features from a slice of values
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;

        // Mean
        let mean = values.iter().sum::<f64>() / n;

        // Min/Max
        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let max = values.iter().cloned().fold(f64::MIN, f64::max);

        // Variance and higher moments
        let mut m2 = 0.0;
        let mut m3 = 0.0;
        let mut m4 = 0.0;

        for &v in values {
            let d = v - mean;
            m2 += d * d;
            m3 += d * d * d;
            m4 += d * d * d * d;
        }

        let variance = m2 / n;
        let std_dev = variance.sqrt();

        // Skewness: E[(X-μ)³] / σ³
        let skewness = if std_dev > 0.0 {
            (m3 / n) / (std_dev * std_dev * std_dev)
        } else {
            0.0
        };

        // Kurtosis: E[(X-μ)⁴] / σ⁴ - 3 (excess kurtosis)
        let kurtosis = if variance > 0.0 {
            (m4 / n) / (variance * variance) - 3.0
        } else {
            0.0
        };

        Self {
            mean,
            variance,
            std_dev,
            skewness,
            kurtosis,
            min,
            max,
        }
    }
}

/// Shannon entropy of the distribution `weights / Σweights`, divided by
/// `ln(len)` so the result lies in [0, 1].
///
/// Returns 0 when the total weight is zero or there is a single weight.
pub fn normalized_entropy(weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    if weights.len() < 2 || !(total > 0.0) {
        return 0.0;
    }

    let entropy: f64 = weights
        .iter()
        .filter(|&&w| w > 0.0)
        .map(|&w| {
            let p = w / total;
            -p * p.ln()
        })
        .sum();

    (entropy / (weights.len() as f64).ln()).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_computation() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let stats = StatisticalFeatures::compute(&values);
        assert!((stats.mean - 3.0).abs() < 0.001);
    }

    #[test]
    fn test_std_dev_computation() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let stats = StatisticalFeatures::compute(&values);
        // Std dev should be ~2.0 for this dataset
        assert!((stats.std_dev - 2.0).abs() < 0.1);
    }

    #[test]
    fn test_kurtosis_of_two_point_distribution() {
        // Symmetric two-point distribution has excess kurtosis of -2
        let values = vec![-1.0, 1.0, -1.0, 1.0];
        let stats = StatisticalFeatures::compute(&values);
        assert!((stats.kurtosis + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_values_have_zero_kurtosis() {
        let stats = StatisticalFeatures::compute(&[0.25; 8]);
        assert_eq!(stats.kurtosis, 0.0);
        assert_eq!(stats.skewness, 0.0);
    }

    #[test]
    fn test_empty_values() {
        let values: Vec<f64> = vec![];
        let stats = StatisticalFeatures::compute(&values);
        assert_eq!(stats.mean, 0.0);
    }

    #[test]
    fn test_entropy_bounds() {
        assert!((normalized_entropy(&[1.0, 1.0, 1.0, 1.0]) - 1.0).abs() < 1e-12);
        assert_eq!(normalized_entropy(&[0.0, 5.0, 0.0]), 0.0);
        assert_eq!(normalized_entropy(&[0.0, 0.0]), 0.0);
        assert_eq!(normalized_entropy(&[3.0]), 0.0);

        let h = normalized_entropy(&[1.0, 2.0, 3.0]);
        assert!(h > 0.0 && h < 1.0);
    }
}

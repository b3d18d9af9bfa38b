use feature_engine::vmd::VmdParams;
use feature_engine::{
    DecompositionExtractor, Extractor, SpectralExtractor, PSD_BANDWIDTH, PSD_CENTROID,
    PSD_FLATNESS, PSD_KURTOSIS,
};
use proptest::prelude::*;
use signal_loader::synthetic::{tone_capture, ToneSpec};
use signal_loader::{record_from_container, Samples, SignalRecord};
use std::collections::BTreeMap;

fn signal(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e3f64..1.0e3, len)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_spectral_features_always_finite(samples in signal(1..3000), rate in 1.0e3f64..1.0e9) {
        let features = SpectralExtractor::new().extract(&Samples::Real(samples), rate);
        prop_assert_eq!(features.len(), 4);
        for name in [PSD_KURTOSIS, PSD_CENTROID, PSD_BANDWIDTH, PSD_FLATNESS] {
            let value = features.get(name);
            prop_assert!(value.map_or(false, f64::is_finite), "{} = {:?}", name, value);
        }
    }

    #[test]
    fn prop_spectral_extraction_is_deterministic(samples in signal(16..2048)) {
        let samples = Samples::Real(samples);
        let a = SpectralExtractor::new().extract(&samples, 1e6);
        let b = SpectralExtractor::new().extract(&samples, 1e6);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_centroid_inside_one_sided_band(samples in signal(64..2048), rate in 1.0e3f64..1.0e7) {
        let features = SpectralExtractor::new().extract(&Samples::Real(samples), rate);
        let centroid = features.get(PSD_CENTROID).unwrap_or_default();
        prop_assert!(centroid >= 0.0 && centroid <= rate / 2.0 + 1e-6 * rate);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_decomposition_entropies_bounded(samples in signal(8..256)) {
        let extractor = DecompositionExtractor::with_params(VmdParams {
            tolerance: 1e-3,
            max_iterations: 200,
            ..Default::default()
        });
        let features = extractor.extract(&Samples::Real(samples), 1e6);
        prop_assert_eq!(features.len(), 10);
        for k in 1..=5 {
            let energy = features.get(&DecompositionExtractor::energy_name(k)).unwrap_or(-1.0);
            let entropy = features.get(&DecompositionExtractor::entropy_name(k)).unwrap_or(-1.0);
            prop_assert!(energy >= 0.0 && energy.is_finite());
            prop_assert!((0.0..=1.0 + 1e-9).contains(&entropy));
        }
    }
}

fn tone_record(length: usize, complex: bool) -> SignalRecord {
    let capture = tone_capture(&ToneSpec {
        length,
        complex,
        seed: 11,
        ..Default::default()
    });
    record_from_container(&capture, BTreeMap::new()).unwrap()
}

#[test]
fn default_decomposition_converges_on_tones() {
    let extractor = DecompositionExtractor::new();
    for complex in [false, true] {
        let record = tone_record(4096, complex);
        let features = extractor.extract(record.samples(), record.sample_rate_hz());

        assert!(!features.is_degraded(), "complex={}: {:?}", complex, features.notes);
        assert_eq!(features.len(), 10);
        assert!(features.all_finite());
        let total: f64 = (1..=5)
            .map(|k| features.get(&DecompositionExtractor::energy_name(k)).unwrap())
            .sum();
        assert!(total > 0.0);
        for k in 1..=5 {
            let entropy = features.get(&DecompositionExtractor::entropy_name(k)).unwrap();
            assert!((0.0..=1.0).contains(&entropy), "mode {} entropy {}", k, entropy);
        }
    }
}

#[test]
fn default_decomposition_is_repeatable() {
    let record = tone_record(4096, false);
    let first = DecompositionExtractor::new().extract(record.samples(), record.sample_rate_hz());
    let second = DecompositionExtractor::new().extract(record.samples(), record.sample_rate_hz());
    assert_eq!(first, second);
    for name in first.names() {
        assert_eq!(
            first.get(name).map(f64::to_bits),
            second.get(name).map(f64::to_bits)
        );
    }
}

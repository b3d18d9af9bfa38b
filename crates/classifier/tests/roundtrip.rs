use classifier::{ModelError, Predictor, Trainer, TrainerConfig};
use feature_engine::{FeatureMatrix, FeatureMatrixBuilder, FeatureVector};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn labeled(rows: &[(f64, f64, String)]) -> FeatureMatrix {
    let mut builder = FeatureMatrixBuilder::new();
    for (a, b, label) in rows {
        builder
            .push(
                FeatureVector::from_pairs([("psd_centroid", *a), ("psd_flatness", *b)]),
                Some(label.clone()),
            )
            .unwrap();
    }
    builder.build().unwrap()
}

#[test]
fn trained_model_predicts_training_classes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("models/sei.bin");
    let trainer = Trainer::new(TrainerConfig {
        model_path: path.clone(),
        ..Default::default()
    });

    let rows: Vec<(f64, f64, String)> = (0..10)
        .map(|i| {
            let label = if i % 2 == 0 { "A" } else { "B" };
            let centre = if i % 2 == 0 { 1.0e5 } else { 3.5e5 };
            (centre + i as f64 * 100.0, 0.01, label.to_string())
        })
        .collect();
    let matrix = labeled(&rows);
    let log = trainer.train(&matrix).unwrap();
    assert_eq!(log.classes_found, ["A", "B"]);

    let predictor = Predictor::load(&path).unwrap();
    let predictions = predictor.predict(&matrix).unwrap();
    for (prediction, (_, _, label)) in predictions.iter().zip(&rows) {
        assert_eq!(&prediction.predicted_label, label);
    }
}

#[test]
fn retraining_overwrites_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sei.bin");
    let trainer = Trainer::new(TrainerConfig {
        model_path: path.clone(),
        ..Default::default()
    });

    let first = labeled(&[(0.0, 0.0, "1".into()), (1.0, 1.0, "2".into())]);
    trainer.train(&first).unwrap();
    let second = labeled(&[
        (0.0, 0.0, "7".into()),
        (1.0, 1.0, "8".into()),
        (2.0, 2.0, "9".into()),
    ]);
    trainer.train(&second).unwrap();

    assert_eq!(Predictor::load(&path).unwrap().classes(), ["7", "8", "9"]);
}

#[test]
fn garbage_artifact_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sei.bin");
    std::fs::write(&path, b"SEIMDL").unwrap();
    assert!(matches!(
        Predictor::load(&path),
        Err(ModelError::CorruptArtifact(_))
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_class_set_survives_round_trip(
        rows in prop::collection::vec((-100.0f64..100.0, -1.0f64..1.0, 0u8..4), 2..24)
    ) {
        let rows: Vec<(f64, f64, String)> =
            rows.into_iter().map(|(a, b, c)| (a, b, format!("class{}", c))).collect();
        let distinct: BTreeSet<String> = rows.iter().map(|r| r.2.clone()).collect();
        prop_assume!(distinct.len() >= 2);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sei.bin");
        let trainer = Trainer::new(TrainerConfig {
            model_path: path.clone(),
            max_iterations: 50,
            ..Default::default()
        });
        let matrix = labeled(&rows);
        trainer.train(&matrix).unwrap();

        let predictor = Predictor::load(&path).unwrap();
        let stored: BTreeSet<String> = predictor.classes().iter().cloned().collect();
        prop_assert_eq!(&stored, &distinct);

        for prediction in predictor.predict(&matrix).unwrap() {
            let keys: BTreeSet<String> = prediction.probabilities.keys().cloned().collect();
            prop_assert_eq!(&keys, &distinct);
            let total: f64 = prediction.probabilities.values().sum();
            prop_assert!((total - 1.0).abs() < 1e-9);
        }
    }
}

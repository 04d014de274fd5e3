//! Property tests for adapter invariants
//!
//! Ensures the serving surface holds its contracts for arbitrary numeric
//! data: one output row per input row, idempotent prediction, and exact
//! recovery of noiseless linear relationships.

use proptest::collection::vec;
use proptest::prelude::*;
use servir::frame::Record;
use servir::{AdapterSettings, InputOptions, ModelRegistry, OutputOptions, RegistryConfig};

fn records_xy(points: &[(f32, f32)]) -> Vec<Record> {
    points
        .iter()
        .map(|(a, b)| {
            serde_json::from_value(serde_json::json!({"a": a, "b": b})).expect("valid record")
        })
        .collect()
}

/// Pair each random target with a distinct x value so the regression design
/// is never singular.
fn spread(targets: &[f32]) -> Vec<(f32, f32)> {
    targets.iter().enumerate().map(|(i, &b)| (i as f32, b)).collect()
}

fn records_x(values: &[f32]) -> Vec<Record> {
    values
        .iter()
        .map(|a| serde_json::from_value(serde_json::json!({"a": a})).expect("valid record"))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_one_output_row_per_input_row(
        targets in vec(-100.0f32..100.0, 3..30),
        score in vec(-100.0f32..100.0, 1..20),
    ) {
        let train = spread(&targets);
        let registry = ModelRegistry::from_config(&RegistryConfig::default())
            .expect("default config is valid");
        let mut model = registry
            .instantiate(
                "aprender.linear_model.LinearRegression",
                AdapterSettings::new().with_x(["a"]).with_y("b"),
            )
            .expect("registered model");

        model
            .input(&records_xy(&train), &InputOptions::default())
            .expect("training succeeds");

        let out = model
            .output(&records_x(&score), &OutputOptions::default())
            .expect("prediction succeeds");
        prop_assert_eq!(out.num_rows(), score.len());
        prop_assert_eq!(out.num_columns(), 1);
    }

    #[test]
    fn prop_output_idempotent(
        targets in vec(-50.0f32..50.0, 3..20),
        score in vec(-50.0f32..50.0, 1..10),
    ) {
        let train = spread(&targets);
        let registry = ModelRegistry::from_config(&RegistryConfig::default())
            .expect("default config is valid");
        let mut model = registry
            .instantiate(
                "aprender.linear_model.LinearRegression",
                AdapterSettings::new().with_x(["a"]).with_y("b"),
            )
            .expect("registered model");

        model
            .input(&records_xy(&train), &InputOptions::default())
            .expect("training succeeds");

        let first = model
            .output(&records_x(&score), &OutputOptions::default())
            .expect("prediction succeeds");
        let second = model
            .output(&records_x(&score), &OutputOptions::default())
            .expect("prediction succeeds");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_recovers_noiseless_line(
        slope in -5.0f32..5.0,
        intercept in -5.0f32..5.0,
        probe in -10.0f32..10.0,
    ) {
        let registry = ModelRegistry::from_config(&RegistryConfig::default())
            .expect("default config is valid");
        let mut model = registry
            .instantiate(
                "aprender.linear_model.LinearRegression",
                AdapterSettings::new().with_x(["a"]).with_y("b"),
            )
            .expect("registered model");

        let train: Vec<(f32, f32)> = (0..8)
            .map(|i| {
                let x = i as f32;
                (x, slope * x + intercept)
            })
            .collect();
        model
            .input(&records_xy(&train), &InputOptions::default())
            .expect("training succeeds");

        let out = model
            .output(&records_x(&[probe]), &OutputOptions::default())
            .expect("prediction succeeds");
        let predicted = out.column("b").expect("labeled column").as_slice()[0];
        let expected = slope * probe + intercept;
        prop_assert!(
            (predicted - expected).abs() < 0.1 + 0.01 * expected.abs(),
            "predicted {} for expected {}",
            predicted,
            expected
        );
    }
}

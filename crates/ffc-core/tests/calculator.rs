//! Calculator evaluation against the synthetic dataset

use ffc_core::{Calculator, CalculatorConfig, CalculatorError};
use ffc_datablock::{AdvancedSettings, DataBlockError, Metric, ScenarioParams};
use ffc_pipeline::{NodeKind, NodeParams, RunError, TransformError, TransformRegistry};
use ffc_test_utils::{
    encrypt_array_with, land_use, passthrough_registry, perturbed_params, test_loader,
    test_region, SyntheticProvider, TEST_IV,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn calculator_with(provider: Arc<SyntheticProvider>, registry: TransformRegistry) -> Calculator {
    let config = CalculatorConfig::new()
        .with_region(test_region())
        .with_cache_capacity(4);
    Calculator::new(config, provider, test_loader(), registry).unwrap()
}

fn calculator() -> (Arc<SyntheticProvider>, Calculator) {
    let provider = Arc::new(SyntheticProvider::new());
    let calc = calculator_with(Arc::clone(&provider), passthrough_registry());
    (provider, calc)
}

#[test]
fn evaluate_runs_full_pipeline() {
    let (_, calc) = calculator();
    let block = calc
        .evaluate(perturbed_params(), AdvancedSettings::new("Medium"))
        .unwrap();

    assert_eq!(block.run_params(), Some(&perturbed_params()));
    assert!(block.areas.global_parameters.scenario_id.is_some());
    assert!(block.snapshot_guard().is_some());
}

#[test]
fn baseline_is_loaded_once_per_projection() {
    let (provider, calc) = calculator();
    let settings = AdvancedSettings::new("Medium");

    let first = calc.evaluate(ScenarioParams::default(), settings.clone()).unwrap();
    let second = calc.evaluate(perturbed_params(), settings).unwrap();
    assert_eq!(provider.loads(), 1);

    // evaluations do not leak into each other or into the cache
    let reference = calc.baseline("Medium").unwrap();
    assert!(first.areas.food.quantity.bit_eq(&reference.food.quantity));
    assert!(!second.areas.food.quantity.bit_eq(&reference.food.quantity));

    calc.evaluate(ScenarioParams::default(), AdvancedSettings::new("High"))
        .unwrap();
    assert_eq!(provider.loads(), 2);
    assert_eq!(calc.cache_stats().entry_count, 2);

    calc.invalidate_baselines();
    calc.baseline("Medium").unwrap();
    assert_eq!(provider.loads(), 3);
}

#[test]
fn repeated_evaluations_are_identical() {
    let (_, calc) = calculator();
    let settings = AdvancedSettings::new("High");
    let a = calc.evaluate(perturbed_params(), settings.clone()).unwrap();
    let b = calc.evaluate(perturbed_params(), settings).unwrap();

    for metric in Metric::ALL {
        assert!(a
            .areas
            .food
            .per_year(metric)
            .unwrap()
            .bit_eq(b.areas.food.per_year(metric).unwrap()));
    }
    assert_eq!(
        a.areas.global_parameters.scenario_id,
        b.areas.global_parameters.scenario_id
    );
}

#[test]
fn missing_projection_is_configuration_error() {
    let (provider, calc) = calculator();
    let err = calc
        .evaluate(ScenarioParams::default(), AdvancedSettings::default())
        .unwrap_err();
    assert!(matches!(err, CalculatorError::Configuration(_)));
    assert!(!err.is_retryable());
    assert_eq!(provider.loads(), 0);
}

#[test]
fn unknown_projection_is_not_cached() {
    let (_, calc) = calculator();
    for _ in 0..2 {
        let err = calc
            .evaluate(ScenarioParams::default(), AdvancedSettings::new("Zero"))
            .unwrap_err();
        assert!(matches!(err, CalculatorError::DataBlock(DataBlockError::Configuration(_))));
    }
    assert_eq!(calc.cache_stats().entry_count, 0);
}

#[test]
fn wrong_key_is_fatal_encryption() {
    let bytes = encrypt_array_with(&[9; 32], &TEST_IV, &land_use());
    let provider = Arc::new(SyntheticProvider::new().with_encrypted_land_use(bytes));
    let calc = calculator_with(provider, passthrough_registry());

    let err = calc
        .evaluate(ScenarioParams::default(), AdvancedSettings::new("Medium"))
        .unwrap_err();
    assert!(err.is_fatal_encryption());
    assert!(!err.is_retryable());
}

#[test]
fn node_failure_keeps_partial_block() {
    let mut registry = passthrough_registry();
    registry.register(
        NodeKind::ForestSequestrationModel,
        |_: &mut ffc_datablock::DataBlock, _: &NodeParams| -> Result<(), TransformError> {
            Err(TransformError::failed("sequestration table missing"))
        },
    );
    let calc = calculator_with(Arc::new(SyntheticProvider::new()), registry);

    let err = calc
        .evaluate(perturbed_params(), AdvancedSettings::new("Medium"))
        .unwrap_err();
    assert_eq!(err.node_error().unwrap().kind, NodeKind::ForestSequestrationModel);

    let partial = err.into_partial().unwrap();
    assert!(partial.run_params().is_some());
    assert!(partial.areas.global_parameters.scenario_id.is_none());
}

#[test]
fn prepare_returns_runnable_pipeline() {
    let (_, calc) = calculator();
    let pipeline = calc
        .prepare(ScenarioParams::default(), AdvancedSettings::new("Medium"))
        .unwrap();
    assert!(pipeline.datablock().has_baseline_snapshot());
    assert_eq!(pipeline.nodes().last().unwrap().kind, NodeKind::GenerateScenarioId);

    let block = calc.executor().run(pipeline).unwrap();
    assert!(block.areas.global_parameters.scenario_id.is_some());
}

#[test]
fn builtins_only_registry_fails_on_first_external_node() {
    let calc = calculator_with(
        Arc::new(SyntheticProvider::new()),
        TransformRegistry::with_builtins(),
    );
    let err = calc
        .evaluate(ScenarioParams::default(), AdvancedSettings::new("Medium"))
        .unwrap_err();
    let CalculatorError::Execution(failure) = &err else {
        panic!("expected execution failure, got {err}");
    };
    assert!(matches!(failure.error, RunError::Node(_)));
    assert_eq!(err.node_error().unwrap().index, 0);
}

#[test]
fn invalid_parameters_are_build_errors() {
    let (_, calc) = calculator();
    let mut params = ScenarioParams::default();
    params.methane_inhibitor = f64::NAN;
    let err = calc
        .evaluate(params, AdvancedSettings::new("Medium"))
        .unwrap_err();
    assert!(matches!(err, CalculatorError::Build(_)));
    assert!(err.into_partial().is_none());
}

#[test]
fn config_file_drives_cache_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ffc.toml");
    std::fs::write(
        &path,
        "cache_capacity = 1\n[region]\nlast_year = 2022\n",
    )
    .unwrap();

    let config = CalculatorConfig::from_path(&path).unwrap();
    assert_eq!(config.cache_capacity, 1);
    assert_eq!(config.region, test_region());

    let calc = Calculator::new(
        config,
        Arc::new(SyntheticProvider::new()),
        test_loader(),
        passthrough_registry(),
    )
    .unwrap();
    assert_eq!(calc.region().last_year, 2022);
}

#[test]
fn calculator_is_shared_across_threads() {
    let (provider, calc) = calculator();
    let calc = Arc::new(calc);

    let handles: Vec<_> = (0..4_i32)
        .map(|i| {
            let calc = Arc::clone(&calc);
            std::thread::spawn(move || {
                let mut params = ScenarioParams::default();
                params.ruminant = -10.0 * f64::from(i);
                calc.evaluate(params, AdvancedSettings::new("Medium"))
                    .map(|block| block.areas.global_parameters.scenario_id)
            })
        })
        .collect();

    let ids: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap().unwrap())
        .collect();
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 4);
    assert!(provider.loads() >= 1);
}

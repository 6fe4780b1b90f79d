//! End-to-end compile and run against the synthetic dataset

use ffc_array::labels;
use ffc_datablock::{DataBlockError, Metric, ScenarioParams};
use ffc_pipeline::scenario_id;
use ffc_pipeline::{
    BuildError, Executor, NodeKind, NodeParams, PipelineBuilder, RunError, TransformError,
    TransformRegistry, SCENARIO_ID_KEYS,
};
use ffc_test_utils::{
    initialized_block, passthrough_registry, perturbed_params, snapshotted_block,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn executor(registry: TransformRegistry) -> Executor {
    Executor::new(Arc::new(registry))
}

#[test]
fn zero_perturbation_reproduces_baseline() {
    let before = snapshotted_block();
    let pipeline = PipelineBuilder::build(ScenarioParams::default(), before.clone()).unwrap();
    let after = executor(passthrough_registry()).run(pipeline).unwrap();

    for metric in Metric::ALL {
        assert!(
            after
                .areas
                .food
                .per_year(metric)
                .unwrap()
                .bit_eq(before.areas.food.per_year(metric).unwrap()),
            "{metric}"
        );
    }
    assert!(after.areas.food.quantity.bit_eq(&before.areas.food.quantity));
    assert!(after
        .areas
        .land
        .percentage_land_use
        .bit_eq(&before.areas.land.percentage_land_use));
    assert!(after
        .areas
        .impact
        .emissions_per_year
        .bit_eq(&before.areas.impact.emissions_per_year));
}

#[test]
fn baselines_survive_a_perturbed_run() {
    let block = snapshotted_block();
    let guard = block.snapshot_guard().unwrap();
    let food_before = guard.food().clone();
    let land_before = guard.land().clone();

    let pipeline = PipelineBuilder::build(perturbed_params(), block).unwrap();
    let after = executor(passthrough_registry()).run(pipeline).unwrap();

    assert!(guard.is_intact(&after));
    assert!(after.get("food", "baseline").unwrap().bit_eq(&food_before));
    assert!(after.get("land", "baseline").unwrap().bit_eq(&land_before));

    // live state did move
    let weight = after.areas.food.per_capita(Metric::Weight).unwrap();
    assert!(!weight.bit_eq(&food_before));
}

#[test]
fn baseline_per_year_consistency_holds_after_run() {
    let block = snapshotted_block();
    let population = block.areas.population.baseline_population;
    let pipeline = PipelineBuilder::build(perturbed_params(), block).unwrap();
    let after = executor(passthrough_registry()).run(pipeline).unwrap();

    for metric in Metric::ALL {
        let per_cap = after.areas.food.per_capita(metric).unwrap();
        let per_year = after.areas.food.per_year(metric).unwrap();
        assert!(per_year.approx_eq(&per_cap.scale(population * 365.25), 1e-12));
    }
}

#[test]
fn livestock_nodes_scale_animal_items_only() {
    let mut params = ScenarioParams::default();
    params.stock_density = 10.0;
    params.livestock_yield = 125.0;
    let block = snapshotted_block();
    let before = block.areas.food.quantity.clone();
    let pipeline = PipelineBuilder::build(params, block).unwrap();
    let after = executor(passthrough_registry()).run(pipeline).unwrap();

    let quantity = &after.areas.food.quantity;
    let at = |a: &ffc_array::LabeledArray, item: i64| a.get(&labels([2020, item])).unwrap();
    // bovine: stock density then yield
    assert!((at(quantity, 2731) - at(&before, 2731) * 1.1 * 1.25).abs() < 1e-6);
    // eggs: yield only
    assert!((at(quantity, 2949) - at(&before, 2949) * 1.25).abs() < 1e-6);
    // wheat untouched
    assert_eq!(at(quantity, 2511), at(&before, 2511));

    let ghg = &after.areas.impact.ghg_per_gram;
    let ghg_bovine = ghg.get(&labels([2731, 2020])).unwrap();
    assert!((ghg_bovine - 25.0 / 1.25).abs() < 1e-9);
}

#[test]
fn build_records_run_params_and_timescale() {
    let params = perturbed_params();
    let pipeline = PipelineBuilder::build(params.clone(), snapshotted_block()).unwrap();
    let block = pipeline.datablock();
    assert_eq!(block.run_params(), Some(&params));
    assert_eq!(
        block.areas.global_parameters.timescale,
        Some(block.advanced_settings().n_scale)
    );
}

#[test]
fn build_rejects_already_recorded_params() {
    let pipeline = PipelineBuilder::build(ScenarioParams::default(), snapshotted_block()).unwrap();
    let (_, block) = pipeline.into_parts();
    let err = PipelineBuilder::build(ScenarioParams::default(), block).unwrap_err();
    assert!(matches!(
        err,
        BuildError::DataBlock(DataBlockError::RunParamsAlreadyRecorded)
    ));
}

#[test]
fn invalid_params_fail_at_construction() {
    let mut params = ScenarioParams::default();
    params.livestock_yield = 0.0;
    let err = PipelineBuilder::build(params, snapshotted_block()).unwrap_err();
    assert!(matches!(err, BuildError::NonFinite { .. }));
}

#[test]
fn scenario_id_encodes_fixed_subset() {
    let mut params = ScenarioParams::default();
    params.ruminant = -35.0;
    params.pig_poultry = 10.0;
    params.fish_seafood = 2.5;
    params.dairy = 80.0;

    let pipeline = PipelineBuilder::build(params.clone(), snapshotted_block()).unwrap();
    let after = executor(passthrough_registry()).run(pipeline).unwrap();
    let id = after.areas.global_parameters.scenario_id.clone().unwrap();

    let decoded = scenario_id::decode_params(&id, &SCENARIO_ID_KEYS).unwrap();
    assert_eq!(decoded.ruminant, -35.0);
    assert_eq!(decoded.pig_poultry, 10.0);
    assert_eq!(decoded.fish_seafood, 2.5);
    // not part of the identifier
    assert_eq!(decoded.dairy, 0.0);
}

#[test]
fn run_without_snapshot_is_rejected() {
    let pipeline = PipelineBuilder::build(ScenarioParams::default(), initialized_block()).unwrap();
    let failure = executor(passthrough_registry()).run(pipeline).unwrap_err();
    assert!(matches!(failure.error, RunError::NoBaselineSnapshot));
}

#[test]
fn unregistered_external_kind_stops_first_node() {
    let pipeline = PipelineBuilder::build(perturbed_params(), snapshotted_block()).unwrap();
    let untouched = pipeline.datablock().areas.food.quantity.clone();
    let failure = executor(TransformRegistry::with_builtins())
        .run(pipeline)
        .unwrap_err();

    let node = failure.node_error().unwrap();
    assert_eq!(node.index, 0);
    assert_eq!(node.kind, NodeKind::ProjectFuture);
    assert!(matches!(node.source, TransformError::Unregistered(_)));
    assert!(failure.partial.areas.food.quantity.bit_eq(&untouched));
}

#[test]
fn failing_transform_keeps_partial_state() {
    let mut registry = passthrough_registry();
    registry.register(
        NodeKind::CcsModel,
        |_: &mut ffc_datablock::DataBlock, params: &NodeParams| -> Result<(), TransformError> {
            let daccs = params.number("DACCS")?;
            Err(TransformError::failed(format!("cannot allocate {daccs} t")))
        },
    );

    let mut params = ScenarioParams::default();
    params.stock_density = 20.0;
    params.daccs = 3.0;
    let block = snapshotted_block();
    let before = block.areas.food.quantity.clone();

    let pipeline = PipelineBuilder::build(params, block).unwrap();
    let failure = executor(registry).run(pipeline).unwrap_err();

    let node = failure.node_error().unwrap();
    assert_eq!(node.kind, NodeKind::CcsModel);
    assert_eq!(node.params.number("DACCS").unwrap(), 3e6);
    assert!(failure.to_string().contains("cannot allocate"));

    // livestock nodes ran before the failure, derived nodes did not
    let partial = &failure.partial;
    let bovine = partial.areas.food.quantity.get(&labels([2020, 2731])).unwrap();
    assert!((bovine - before.get(&labels([2020, 2731])).unwrap() * 1.2).abs() < 1e-6);
    assert!(partial.areas.global_parameters.scenario_id.is_none());
}

//! Execution Phase
//!
//! The executor applies a compiled [`Pipeline`] to its DataBlock, one node at
//! a time, in order.
//!
//! # Critical Invariant
//!
//! The executor performs **zero parameter validation**. Everything was
//! checked at construction time. The executor only:
//! - Requires the baseline snapshot before the first node
//! - Applies each node's transform
//! - Checks after each node that the snapshot is still the shared instance

use crate::error::{ExecutionFailure, NodeExecutionError, RunError, TransformError};
use crate::pipeline::Pipeline;
use crate::transform::TransformRegistry;
use ffc_datablock::DataBlock;
use std::sync::Arc;
use std::time::Instant;

/// Sequential pipeline executor
#[derive(Debug, Clone)]
pub struct Executor {
    registry: Arc<TransformRegistry>,
}

impl Executor {
    #[must_use]
    pub fn new(registry: Arc<TransformRegistry>) -> Self {
        Self { registry }
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &TransformRegistry {
        &self.registry
    }

    /// Run a pipeline to completion
    ///
    /// No retries, no skipped nodes. The first failing node stops the run.
    ///
    /// # Errors
    /// Returns [`ExecutionFailure`] holding the DataBlock as the failing node
    /// left it if:
    /// - The baseline snapshot was never taken
    /// - A node's kind has no registered transform
    /// - A transform fails
    /// - A node replaced or dropped a baseline snapshot
    pub fn run(&self, pipeline: Pipeline) -> Result<DataBlock, ExecutionFailure> {
        let start_time = Instant::now();
        let (nodes, mut block) = pipeline.into_parts();

        let Some(guard) = block.snapshot_guard() else {
            tracing::error!("pipeline started without a baseline snapshot");
            return Err(ExecutionFailure::new(RunError::NoBaselineSnapshot, block));
        };

        for (index, node) in nodes.into_iter().enumerate() {
            let span = tracing::debug_span!("node", index, kind = %node.kind);
            let _enter = span.enter();
            tracing::debug!("applying node");

            let result = match self.registry.get(node.kind) {
                Some(transform) => transform.apply(&mut block, &node.params),
                None => Err(TransformError::Unregistered(node.kind)),
            };

            if let Err(source) = result {
                tracing::error!(error = %source, params = %node.params.to_json(), "node failed");
                let error = NodeExecutionError {
                    index,
                    kind: node.kind,
                    params: node.params,
                    source,
                };
                return Err(ExecutionFailure::new(
                    RunError::Node(Box::new(error)),
                    block,
                ));
            }

            if !guard.is_intact(&block) {
                tracing::error!("node invalidated the baseline snapshot");
                return Err(ExecutionFailure::new(
                    RunError::BaselineInvalidated {
                        index,
                        kind: node.kind,
                    },
                    block,
                ));
            }
        }

        tracing::info!(
            elapsed_ms = u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX),
            scenario_id = block.areas.global_parameters.scenario_id.as_deref().unwrap_or(""),
            "pipeline completed"
        );
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeCategory, NodeKind};
    use crate::params::{ItemSelector, NodeParams};
    use ffc_array::{labels, Axis, LabeledArray};
    use ffc_datablock::{
        AdvancedSettings, BaselineData, FoodArea, ImpactArea, LandArea, PopulationArea,
        RegionConfig,
    };
    use std::sync::Mutex;

    fn items(values: Vec<f64>) -> LabeledArray {
        LabeledArray::from_axis(Axis::new("Item", labels([2511, 2731])).unwrap(), values).unwrap()
    }

    fn block() -> DataBlock {
        let quantity = items(vec![4000.0, 900.0])
            .expand_dims(Axis::new("Year", labels([2020])).unwrap())
            .unwrap();
        let mut food = FoodArea::new(
            quantity,
            items(vec![3.4, 2.4]),
            items(vec![0.1, 0.2]),
            items(vec![0.02, 0.15]),
        );
        let mut impact = ImpactArea::new(items(vec![0.6, 25.0]), items(vec![0.1, 4.0]));
        food.derive_metrics(&mut impact, 1_000_000.0).unwrap();
        let grid =
            LabeledArray::from_axis(Axis::new("cell", labels([0, 1])).unwrap(), vec![30.0, 70.0])
                .unwrap();
        let population =
            LabeledArray::from_axis(Axis::new("Year", labels([2020])).unwrap(), vec![1_000_000.0])
                .unwrap();
        let baseline = BaselineData {
            projection: "Medium".to_string(),
            region: RegionConfig::default(),
            population: PopulationArea::new(population, 1_000_000.0),
            food,
            impact,
            land: LandArea::new(grid.clone(), grid.map(|_| 3.0)),
        };
        DataBlock::new(&baseline, AdvancedSettings::new("Medium")).unwrap()
    }

    fn node(kind: NodeKind, params: NodeParams) -> Node {
        Node::new(kind, NodeCategory::Derived, params)
    }

    fn executor(registry: TransformRegistry) -> Executor {
        Executor::new(Arc::new(registry))
    }

    #[test]
    fn requires_snapshot() {
        let pipeline = Pipeline::new(Vec::new(), block());
        let failure = executor(TransformRegistry::new()).run(pipeline).unwrap_err();
        assert!(matches!(failure.error, RunError::NoBaselineSnapshot));
        assert!(failure.node_error().is_none());
    }

    #[test]
    fn applies_nodes_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut registry = TransformRegistry::with_builtins();
        for kind in [NodeKind::LabelNewForest, NodeKind::ComputeEmissions] {
            let order = Arc::clone(&order);
            registry.register(
                kind,
                move |_: &mut DataBlock, _: &NodeParams| -> Result<(), TransformError> {
                    order.lock().unwrap().push(kind);
                    Ok(())
                },
            );
        }

        let mut block = block();
        block.snapshot_baseline().unwrap();
        let nodes = vec![
            node(NodeKind::ComputeEmissions, NodeParams::new()),
            node(NodeKind::LabelNewForest, NodeParams::new()),
            node(NodeKind::ComputeEmissions, NodeParams::new()),
        ];
        executor(registry).run(Pipeline::new(nodes, block)).unwrap();
        assert_eq!(
            *order.lock().unwrap(),
            vec![
                NodeKind::ComputeEmissions,
                NodeKind::LabelNewForest,
                NodeKind::ComputeEmissions
            ]
        );
    }

    #[test]
    fn stops_at_first_failure_with_partial_state() {
        let mut block = block();
        block.snapshot_baseline().unwrap();
        let nodes = vec![
            node(
                NodeKind::ScaleProduction,
                NodeParams::new()
                    .with("scale_factor", 2.0)
                    .with("items", ItemSelector::items([2731])),
            ),
            node(NodeKind::CcsModel, NodeParams::new().with("DACCS", 1e6)),
            node(
                NodeKind::ScaleProduction,
                NodeParams::new()
                    .with("scale_factor", 10.0)
                    .with("items", ItemSelector::items([2731])),
            ),
        ];

        let failure = executor(TransformRegistry::with_builtins())
            .run(Pipeline::new(nodes, block))
            .unwrap_err();
        let node_error = failure.node_error().unwrap();
        assert_eq!(node_error.index, 1);
        assert_eq!(node_error.kind, NodeKind::CcsModel);
        assert_eq!(node_error.params.number("DACCS").unwrap(), 1e6);
        assert!(matches!(
            node_error.source,
            TransformError::Unregistered(NodeKind::CcsModel)
        ));

        // first node applied, third never ran
        let quantity = &failure.partial.areas.food.quantity;
        assert_eq!(quantity.get(&labels([2020, 2731])).unwrap(), 1800.0);
        assert_eq!(quantity.get(&labels([2020, 2511])).unwrap(), 4000.0);
    }

    #[test]
    fn detects_replaced_snapshot() {
        let mut registry = TransformRegistry::new();
        registry.register(
            NodeKind::LabelNewForest,
            |b: &mut DataBlock, _: &NodeParams| -> Result<(), TransformError> {
                let mut fresh = block();
                fresh.snapshot_baseline()?;
                *b = fresh;
                Ok(())
            },
        );

        let mut block = block();
        block.snapshot_baseline().unwrap();
        let nodes = vec![node(NodeKind::LabelNewForest, NodeParams::new())];
        let failure = executor(registry).run(Pipeline::new(nodes, block)).unwrap_err();
        assert!(matches!(
            failure.error,
            RunError::BaselineInvalidated {
                index: 0,
                kind: NodeKind::LabelNewForest
            }
        ));
    }

    #[test]
    fn builtin_scale_impact_uses_complement() {
        let mut block = block();
        block.snapshot_baseline().unwrap();
        let nodes = vec![
            node(
                NodeKind::ScaleImpact,
                NodeParams::new()
                    .with("scale_factor", 0.2)
                    .with("items", ItemSelector::items([2731])),
            ),
            node(NodeKind::ComputeMetrics, NodeParams::new()),
        ];
        let out = executor(TransformRegistry::with_builtins())
            .run(Pipeline::new(nodes, block))
            .unwrap();
        let ghg = &out.areas.impact.ghg_per_gram;
        assert!((ghg.get(&labels([2731])).unwrap() - 20.0).abs() < 1e-12);
        assert_eq!(ghg.get(&labels([2511])).unwrap(), 0.6);
    }
}

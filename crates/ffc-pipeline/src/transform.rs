//! Node transforms
//!
//! A [`Transform`] is the function behind a [`NodeKind`]. The registry maps
//! each kind to its implementation; the four built-in transforms live here,
//! every other kind is supplied by the caller.

use crate::error::TransformError;
use crate::node::{Node, NodeKind};
use crate::params::NodeParams;
use crate::scenario_id;
use ffc_datablock::DataBlock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Food-balance item dimension
pub const ITEM_DIM: &str = "Item";

/// Transform trait
///
/// Implementations read and write only the areas relevant to their purpose
/// and never replace a baseline snapshot.
pub trait Transform: Send + Sync {
    /// Apply the transform in place
    ///
    /// # Errors
    /// Returns [`TransformError`] on any failure; the DataBlock may already
    /// be partially mutated.
    fn apply(&self, block: &mut DataBlock, params: &NodeParams) -> Result<(), TransformError>;
}

impl<F> Transform for F
where
    F: Fn(&mut DataBlock, &NodeParams) -> Result<(), TransformError> + Send + Sync,
{
    fn apply(&self, block: &mut DataBlock, params: &NodeParams) -> Result<(), TransformError> {
        self(block, params)
    }
}

/// Multiply the agricultural emission factor of selected items by
/// `1 − scale_factor`
#[derive(Debug, Clone, Copy, Default)]
pub struct ScaleImpact;

impl Transform for ScaleImpact {
    fn apply(&self, block: &mut DataBlock, params: &NodeParams) -> Result<(), TransformError> {
        let scale_factor = params.number("scale_factor")?;
        let selector = params.selector("items")?;
        let items = {
            let axis = block
                .areas
                .food
                .quantity
                .axis(ITEM_DIM)
                .ok_or_else(|| ffc_array::ArrayError::UnknownDimension(ITEM_DIM.to_string()))?;
            selector.resolve(axis)
        };
        block
            .areas
            .impact
            .ghg_per_gram
            .update_labels(ITEM_DIM, &items, |v| v * (1.0 - scale_factor))?;
        Ok(())
    }
}

/// Multiply the quantity of selected items by `scale_factor`
#[derive(Debug, Clone, Copy, Default)]
pub struct ScaleProduction;

impl Transform for ScaleProduction {
    fn apply(&self, block: &mut DataBlock, params: &NodeParams) -> Result<(), TransformError> {
        let scale_factor = params.number("scale_factor")?;
        let selector = params.selector("items")?;
        let quantity = &mut block.areas.food.quantity;
        let items = quantity
            .axis(ITEM_DIM)
            .map(|axis| selector.resolve(axis))
            .ok_or_else(|| ffc_array::ArrayError::UnknownDimension(ITEM_DIM.to_string()))?;
        quantity.update_labels(ITEM_DIM, &items, |v| v * scale_factor)?;
        Ok(())
    }
}

/// Re-derive per-capita and per-year food metrics from the current quantity
#[derive(Debug, Clone, Copy, Default)]
pub struct ComputeMetrics;

impl Transform for ComputeMetrics {
    fn apply(&self, block: &mut DataBlock, _params: &NodeParams) -> Result<(), TransformError> {
        block.derive_metrics()?;
        Ok(())
    }
}

/// Write the shareable scenario identifier into `global_parameters`
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateScenarioId;

impl Transform for GenerateScenarioId {
    fn apply(&self, block: &mut DataBlock, params: &NodeParams) -> Result<(), TransformError> {
        let keys = params.texts("keys")?;
        let run_params = block.run_params().ok_or(TransformError::MissingRunParams)?;
        let id = scenario_id::encode_params(run_params, keys)?;
        tracing::debug!(scenario_id = %id, "scenario identifier generated");
        block.areas.global_parameters.scenario_id = Some(id);
        Ok(())
    }
}

/// Registry of transforms by node kind
#[derive(Clone, Default)]
pub struct TransformRegistry {
    transforms: HashMap<NodeKind, Arc<dyn Transform>>,
}

impl TransformRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in transforms
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(NodeKind::ScaleImpact, ScaleImpact);
        registry.register(NodeKind::ScaleProduction, ScaleProduction);
        registry.register(NodeKind::ComputeMetrics, ComputeMetrics);
        registry.register(NodeKind::GenerateScenarioId, GenerateScenarioId);
        registry
    }

    /// Register a transform, replacing any previous one for `kind`
    pub fn register(&mut self, kind: NodeKind, transform: impl Transform + 'static) -> &mut Self {
        self.transforms.insert(kind, Arc::new(transform));
        self
    }

    #[must_use]
    pub fn get(&self, kind: NodeKind) -> Option<&Arc<dyn Transform>> {
        self.transforms.get(&kind)
    }

    #[must_use]
    pub fn contains(&self, kind: NodeKind) -> bool {
        self.transforms.contains_key(&kind)
    }

    /// Kinds used by `nodes` with no registered transform, first-use order
    #[must_use]
    pub fn missing(&self, nodes: &[Node]) -> Vec<NodeKind> {
        let mut missing = Vec::new();
        for node in nodes {
            if !self.contains(node.kind) && !missing.contains(&node.kind) {
                missing.push(node.kind);
            }
        }
        missing
    }
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<NodeKind> = self.transforms.keys().copied().collect();
        kinds.sort();
        f.debug_struct("TransformRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeCategory;

    #[test]
    fn builtins_are_registered() {
        let registry = TransformRegistry::with_builtins();
        for kind in NodeKind::ALL {
            assert_eq!(registry.contains(kind), kind.is_builtin(), "{kind}");
        }
    }

    #[test]
    fn closures_register_as_transforms() {
        let mut registry = TransformRegistry::new();
        registry.register(
            NodeKind::CcsModel,
            |_: &mut DataBlock, _: &NodeParams| -> Result<(), TransformError> {
                Err(TransformError::failed("not today"))
            },
        );
        assert!(registry.contains(NodeKind::CcsModel));
        assert!(registry.get(NodeKind::LabelNewForest).is_none());
    }

    #[test]
    fn missing_kinds_in_first_use_order() {
        let registry = TransformRegistry::with_builtins();
        let nodes = vec![
            Node::new(NodeKind::FoodWasteModel, NodeCategory::DemandSide, NodeParams::new()),
            Node::new(NodeKind::ScaleImpact, NodeCategory::LivestockPractice, NodeParams::new()),
            Node::new(NodeKind::CcsModel, NodeCategory::Technology, NodeParams::new()),
            Node::new(NodeKind::FoodWasteModel, NodeCategory::Technology, NodeParams::new()),
        ];
        assert_eq!(
            registry.missing(&nodes),
            vec![NodeKind::FoodWasteModel, NodeKind::CcsModel]
        );
    }

    #[test]
    fn debug_lists_sorted_kinds() {
        let shown = format!("{:?}", TransformRegistry::with_builtins());
        assert!(shown.contains("ScaleImpact"));
        assert!(shown.find("ScaleImpact") < shown.find("GenerateScenarioId"));
    }
}

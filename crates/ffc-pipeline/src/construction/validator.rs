//! Construction Validator
//!
//! Checks the compiled node list before anything runs. Execution performs
//! no parameter validation of its own.

use crate::error::BuildError;
use crate::node::{Node, NodeCategory};
use crate::params::ParamValue;

/// Parameter pairs read element-wise by the transforms
pub const PAIRED_PARAMS: [(&str, &str); 3] = [
    ("scale", "items"),
    ("source", "elasticity"),
    ("land_type", "seq"),
];

/// Construction-time validator for compiled pipelines
#[derive(Debug, Default, Clone, Copy)]
pub struct ConstructionValidator;

impl ConstructionValidator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate every node, in order
    ///
    /// # Errors
    /// Returns the first [`BuildError`] found.
    pub fn validate(&self, nodes: &[Node]) -> Result<(), BuildError> {
        let mut previous: Option<NodeCategory> = None;
        for (index, node) in nodes.iter().enumerate() {
            if let Some(prev) = previous {
                if node.category < prev {
                    return Err(BuildError::CategoryOrder {
                        index,
                        kind: node.kind,
                        category: node.category,
                        previous: prev,
                    });
                }
            }
            previous = Some(node.category);

            Self::validate_values(index, node)?;
            Self::validate_pairs(index, node)?;
        }
        Ok(())
    }

    fn validate_values(index: usize, node: &Node) -> Result<(), BuildError> {
        for (key, value) in node.params.iter() {
            let finite = match value {
                ParamValue::Number(v) => v.is_finite(),
                ParamValue::Numbers(vs) => vs.iter().all(|v| v.is_finite()),
                _ => true,
            };
            if !finite {
                return Err(BuildError::NonFinite {
                    index,
                    kind: node.kind,
                    key: key.to_string(),
                });
            }

            let empty = match value {
                ParamValue::Selector(s) => s.is_empty(),
                ParamValue::Selectors(ss) => ss.iter().any(crate::params::ItemSelector::is_empty),
                _ => false,
            };
            if empty {
                return Err(BuildError::EmptySelector {
                    index,
                    kind: node.kind,
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }

    fn validate_pairs(index: usize, node: &Node) -> Result<(), BuildError> {
        for (left, right) in PAIRED_PARAMS {
            let (Some(l), Some(r)) = (node.params.get(left), node.params.get(right)) else {
                continue;
            };
            // Scalar pairs are broadcast; only lists must agree
            let (Some(left_len), Some(right_len)) = (l.list_len(), r.list_len()) else {
                continue;
            };
            if left_len != right_len {
                return Err(BuildError::LengthMismatch {
                    index,
                    kind: node.kind,
                    left,
                    right,
                    left_len,
                    right_len,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use crate::params::{ItemSelector, NodeParams};

    fn node(kind: NodeKind, category: NodeCategory, params: NodeParams) -> Node {
        Node::new(kind, category, params)
    }

    #[test]
    fn accepts_ordered_well_formed_nodes() {
        let nodes = vec![
            node(
                NodeKind::ItemScalingMultiple,
                NodeCategory::DemandSide,
                NodeParams::new()
                    .with("scale", vec![1.0, 1.1])
                    .with("items", vec![ItemSelector::items([1]), ItemSelector::items([2])])
                    .with("source", vec!["production", "imports"])
                    .with("elasticity", vec![0.5, 0.5]),
            ),
            node(NodeKind::ComputeMetrics, NodeCategory::Derived, NodeParams::new()),
        ];
        assert!(ConstructionValidator::new().validate(&nodes).is_ok());
    }

    #[test]
    fn rejects_non_finite_numbers() {
        let nodes = vec![node(
            NodeKind::ScaleProduction,
            NodeCategory::LivestockPractice,
            NodeParams::new().with("scale_factor", f64::NAN),
        )];
        let err = ConstructionValidator::new().validate(&nodes).unwrap_err();
        assert!(matches!(err, BuildError::NonFinite { ref key, .. } if key == "scale_factor"));

        let nodes = vec![node(
            NodeKind::ForestSequestrationModel,
            NodeCategory::Derived,
            NodeParams::new().with("seq", vec![1.0, f64::INFINITY]),
        )];
        assert!(ConstructionValidator::new().validate(&nodes).is_err());
    }

    #[test]
    fn rejects_mismatched_pairs() {
        let nodes = vec![node(
            NodeKind::ForestSequestrationModel,
            NodeCategory::Derived,
            NodeParams::new()
                .with("land_type", vec!["Arable", "Managed arable"])
                .with("seq", vec![1.0]),
        )];
        let err = ConstructionValidator::new().validate(&nodes).unwrap_err();
        assert!(matches!(
            err,
            BuildError::LengthMismatch { left: "land_type", left_len: 2, right_len: 1, .. }
        ));
    }

    #[test]
    fn scalar_pairs_are_not_length_checked() {
        let nodes = vec![node(
            NodeKind::ShiftProduction,
            NodeCategory::LandManagement,
            NodeParams::new()
                .with("scale", 0.1)
                .with("items", ItemSelector::items([2617])),
        )];
        assert!(ConstructionValidator::new().validate(&nodes).is_ok());
    }

    #[test]
    fn rejects_empty_selectors() {
        let nodes = vec![node(
            NodeKind::ScaleImpact,
            NodeCategory::ArablePractice,
            NodeParams::new().with("items", ItemSelector::items(Vec::new())),
        )];
        let err = ConstructionValidator::new().validate(&nodes).unwrap_err();
        assert!(matches!(err, BuildError::EmptySelector { index: 0, .. }));
    }

    #[test]
    fn rejects_out_of_order_categories() {
        let nodes = vec![
            node(NodeKind::CcsModel, NodeCategory::Technology, NodeParams::new()),
            node(NodeKind::FoodWasteModel, NodeCategory::DemandSide, NodeParams::new()),
        ];
        let err = ConstructionValidator::new().validate(&nodes).unwrap_err();
        assert!(matches!(
            err,
            BuildError::CategoryOrder {
                index: 1,
                category: NodeCategory::DemandSide,
                previous: NodeCategory::Technology,
                ..
            }
        ));
    }
}

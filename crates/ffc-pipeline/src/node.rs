//! Nodes: a transform identity plus fully bound parameters

use crate::params::NodeParams;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of the transform a node applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    ProjectFuture,
    ItemScalingMultiple,
    AlternativeFoodModel,
    FoodWasteModel,
    ProductionLandScale,
    ForestLandModel,
    BeccsFarmLand,
    ShiftProduction,
    PeatlandRestoration,
    ManagedAgriculturalLandCarbon,
    MixedFarmingModel,
    AgroecologyModel,
    ScaleImpact,
    ScaleProduction,
    ExtraUrbanFarming,
    CcsModel,
    LabelNewForest,
    ForestSequestrationModel,
    ComputeEmissions,
    ComputeMetrics,
    GenerateScenarioId,
}

impl NodeKind {
    /// Every kind, in first-use order of the compiled pipeline
    pub const ALL: [NodeKind; 21] = [
        NodeKind::ProjectFuture,
        NodeKind::ItemScalingMultiple,
        NodeKind::AlternativeFoodModel,
        NodeKind::FoodWasteModel,
        NodeKind::ProductionLandScale,
        NodeKind::ForestLandModel,
        NodeKind::BeccsFarmLand,
        NodeKind::ShiftProduction,
        NodeKind::PeatlandRestoration,
        NodeKind::ManagedAgriculturalLandCarbon,
        NodeKind::MixedFarmingModel,
        NodeKind::AgroecologyModel,
        NodeKind::ScaleImpact,
        NodeKind::ScaleProduction,
        NodeKind::ExtraUrbanFarming,
        NodeKind::CcsModel,
        NodeKind::LabelNewForest,
        NodeKind::ForestSequestrationModel,
        NodeKind::ComputeEmissions,
        NodeKind::ComputeMetrics,
        NodeKind::GenerateScenarioId,
    ];

    /// Stable function name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            NodeKind::ProjectFuture => "project_future",
            NodeKind::ItemScalingMultiple => "item_scaling_multiple",
            NodeKind::AlternativeFoodModel => "alternative_food_model",
            NodeKind::FoodWasteModel => "food_waste_model",
            NodeKind::ProductionLandScale => "production_land_scale",
            NodeKind::ForestLandModel => "forest_land_model",
            NodeKind::BeccsFarmLand => "beccs_farm_land",
            NodeKind::ShiftProduction => "shift_production",
            NodeKind::PeatlandRestoration => "peatland_restoration",
            NodeKind::ManagedAgriculturalLandCarbon => "managed_agricultural_land_carbon",
            NodeKind::MixedFarmingModel => "mixed_farming_model",
            NodeKind::AgroecologyModel => "agroecology_model",
            NodeKind::ScaleImpact => "scale_impact",
            NodeKind::ScaleProduction => "scale_production",
            NodeKind::ExtraUrbanFarming => "extra_urban_farming",
            NodeKind::CcsModel => "ccs_model",
            NodeKind::LabelNewForest => "label_new_forest",
            NodeKind::ForestSequestrationModel => "forest_sequestration_model",
            NodeKind::ComputeEmissions => "compute_emissions",
            NodeKind::ComputeMetrics => "compute_metrics",
            NodeKind::GenerateScenarioId => "generate_scenario_id",
        }
    }

    /// True for kinds implemented in this crate
    #[must_use]
    pub const fn is_builtin(self) -> bool {
        matches!(
            self,
            NodeKind::ScaleImpact
                | NodeKind::ScaleProduction
                | NodeKind::ComputeMetrics
                | NodeKind::GenerateScenarioId
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline stage; nodes appear in non-decreasing category order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    DemandSide,
    LandManagement,
    LivestockPractice,
    ArablePractice,
    Technology,
    Derived,
    ScenarioIdentifier,
}

impl fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeCategory::DemandSide => "demand side",
            NodeCategory::LandManagement => "land management",
            NodeCategory::LivestockPractice => "livestock practice",
            NodeCategory::ArablePractice => "arable practice",
            NodeCategory::Technology => "technology",
            NodeCategory::Derived => "derived",
            NodeCategory::ScenarioIdentifier => "scenario identifier",
        };
        f.write_str(name)
    }
}

/// A transform identity plus its bound parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub category: NodeCategory,
    pub params: NodeParams,
}

impl Node {
    #[must_use]
    pub fn new(kind: NodeKind, category: NodeCategory, params: NodeParams) -> Self {
        Self {
            kind,
            category,
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique() {
        let names: HashSet<&str> = NodeKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names.len(), NodeKind::ALL.len());
    }

    #[test]
    fn serde_uses_function_names() {
        for kind in NodeKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn categories_are_ordered() {
        assert!(NodeCategory::DemandSide < NodeCategory::LandManagement);
        assert!(NodeCategory::Derived < NodeCategory::ScenarioIdentifier);
    }
}

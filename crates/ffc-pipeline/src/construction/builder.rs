//! Pipeline Builder
//!
//! Compiles scenario slider positions and advanced settings into the fixed,
//! fully bound node sequence. Compilation is pure; [`PipelineBuilder::build`]
//! additionally records the run parameters and the timescale in the
//! DataBlock it wraps.

use crate::construction::ConstructionValidator;
use crate::error::BuildError;
use crate::node::{Node, NodeCategory, NodeKind};
use crate::params::{ItemSelector, NodeParams, ANIMAL_PRODUCTS, ITEM_GROUP, VEGETAL_PRODUCTS};
use crate::pipeline::Pipeline;
use crate::scenario_id::SCENARIO_ID_KEYS;
use ffc_datablock::{AdvancedSettings, DataBlock, ScenarioParams};

/// Share of lowland peat that can be restored
pub const LOWLAND_PEAT_SHARE: f64 = 0.0475;
/// Share of upland peat that can be restored
pub const UPLAND_PEAT_SHARE: f64 = 0.0273;
/// Land needed per unit of horticulture production relative to its targets
pub const HORTICULTURE_LAND_RATIO: f64 = 0.086_503_018_17;
/// Land needed per unit of pulse production relative to its targets
pub const PULSES_LAND_RATIO: f64 = 0.033_274_924_02;
/// Item code given to alternative meat
pub const ALTERNATIVE_MEAT_ITEM: i64 = 5000;
/// Item code given to alternative dairy
pub const ALTERNATIVE_DAIRY_ITEM: i64 = 5001;
/// Tonnes per megatonne
pub const TONNES_PER_MEGATONNE: f64 = 1e6;

const CEREALS: &str = "Cereals - Excluding Beer";
const VEGETABLES: &str = "Vegetables";
const FRUITS: &str = "Fruits - Excluding Wine";
const PULSES: &str = "Pulses";
const ARABLE: &str = "Arable";
const IMPROVED_GRASSLAND: &str = "Improved grassland";
const SEMI_NATURAL_GRASSLAND: &str = "Semi-natural grassland";
const SOURCES: [&str; 2] = ["production", "imports"];

const HORTICULTURE_ITEMS: [i64; 25] = [
    2617, 2775, 2615, 2532, 2614, 2560, 2619, 2625, 2613, 2620, 2612, 2551, 2563, 2602, 2611,
    2640, 2641, 2618, 2616, 2531, 2534, 2533, 2601, 2605, 2535,
];

const HORTICULTURE_TARGETS: [i64; 49] = [
    2659, 2513, 2546, 2656, 2658, 2657, 2520, 2642, 2633, 2578, 2630, 2559, 2575, 2572, 2745,
    2514, 2582, 2552, 2517, 2516, 2586, 2570, 2580, 2562, 2577, 2576, 2547, 2549, 2574, 2558,
    2581, 2515, 2561, 2579, 2518, 2807, 2571, 2555, 2645, 2542, 2537, 2536, 2541, 2557, 2573,
    2543, 2635, 2511, 2655,
];

const PULSE_TARGET_GROUPS: [&str; 9] = [
    CEREALS,
    VEGETABLES,
    FRUITS,
    "Vegetables Oils",
    "Spices",
    "Starchy Roots",
    "Sugar Crops",
    "Oilcrops",
    "Treenuts",
];

const LIVESTOCK_ITEMS: [i64; 7] = [2731, 2732, 2733, 2735, 2948, 2740, 2743];

const SEQUESTRATION_LAND_TYPES: [&str; 11] = [
    "Broadleaf woodland",
    "Coniferous woodland",
    "New Broadleaf woodland",
    "New Coniferous woodland",
    "Restored upland peat",
    "Restored lowland peat",
    "Managed arable",
    "Managed pasture",
    "Mixed farming",
    "Bioenergy crops (arable)",
    "Bioenergy crops (pasture)",
];

/// Sequestration rate of agroecology land
///
/// Tree-covered share sequesters as a broadleaf/conifer blend; the rest as
/// managed pasture:
/// `tc × (f × bdleaf + (1 − f) × conif) + (1 − tc) × pasture`.
#[must_use]
pub fn agroecology_sequestration(
    tree_coverage: f64,
    broadleaf_fraction: f64,
    bdleaf_seq: f64,
    conif_seq: f64,
    pasture_seq: f64,
) -> f64 {
    tree_coverage * (broadleaf_fraction * bdleaf_seq + (1.0 - broadleaf_fraction) * conif_seq)
        + (1.0 - tree_coverage) * pasture_seq
}

fn percent(value: f64) -> f64 {
    value / 100.0
}

fn grasslands() -> Vec<&'static str> {
    vec![IMPROVED_GRASSLAND, SEMI_NATURAL_GRASSLAND]
}

/// Builder for the scenario node sequence
///
/// Usage:
/// ```rust,ignore
/// let nodes = PipelineBuilder::new(&params, &settings).compile()?;
/// // or, wrapping a snapshotted DataBlock:
/// let pipeline = PipelineBuilder::build(params, datablock)?;
/// ```
pub struct PipelineBuilder<'a> {
    params: &'a ScenarioParams,
    settings: &'a AdvancedSettings,
    category: NodeCategory,
    nodes: Vec<Node>,
}

impl<'a> PipelineBuilder<'a> {
    /// Create a builder over slider positions and settings
    #[must_use]
    pub fn new(params: &'a ScenarioParams, settings: &'a AdvancedSettings) -> Self {
        Self {
            params,
            settings,
            category: NodeCategory::DemandSide,
            nodes: Vec::new(),
        }
    }

    /// Compile the node sequence and validate it
    ///
    /// # Errors
    /// Returns [`BuildError`] if a bound value is not finite, paired lists
    /// differ in length or a selector is empty.
    pub fn compile(mut self) -> Result<Vec<Node>, BuildError> {
        self.demand_side();
        self.land_management();
        self.livestock_practice();
        self.arable_practice();
        self.technology();
        self.derived();
        self.scenario_identifier();

        ConstructionValidator::new().validate(&self.nodes)?;
        tracing::debug!(nodes = self.nodes.len(), "pipeline compiled");
        Ok(self.nodes)
    }

    /// Compile a pipeline over `datablock`
    ///
    /// The node sequence is compiled from the DataBlock's advanced settings.
    /// Only after compilation succeeds are `params` recorded as the run
    /// parameters and the timescale written to `global_parameters`.
    ///
    /// # Errors
    /// Returns [`BuildError`] if compilation fails or run parameters were
    /// already recorded.
    pub fn build(params: ScenarioParams, mut datablock: DataBlock) -> Result<Pipeline, BuildError> {
        let nodes = PipelineBuilder::new(&params, datablock.advanced_settings()).compile()?;
        let timescale = datablock.advanced_settings().n_scale;

        datablock.record_run_params(params)?;
        datablock.areas.global_parameters.timescale = Some(timescale);
        Ok(Pipeline::new(nodes, datablock))
    }

    fn add_node(&mut self, kind: NodeKind, params: NodeParams) {
        self.nodes.push(Node::new(kind, self.category, params));
    }

    fn elasticity(&self) -> Vec<f64> {
        vec![self.settings.elasticity, 1.0 - self.settings.elasticity]
    }

    fn agroecology_seq(&self) -> f64 {
        let s = self.settings;
        agroecology_sequestration(
            s.agroecology_tree_coverage,
            percent(self.params.bdleaf_conif_ratio),
            s.bdleaf_seq_ha_yr,
            s.conif_seq_ha_yr,
            s.managed_pasture_seq_ha_yr,
        )
    }

    fn demand_side(&mut self) {
        self.category = NodeCategory::DemandSide;
        let p = self.params;
        let s = self.settings;

        self.add_node(
            NodeKind::ProjectFuture,
            NodeParams::new().with("yield_change", s.yield_proj),
        );

        let scale = [
            p.ruminant,
            p.pig_poultry,
            p.fish_seafood,
            p.dairy,
            p.eggs,
            p.fruit_veg,
            p.pulses,
        ]
        .iter()
        .map(|v| 1.0 + percent(*v))
        .collect::<Vec<_>>();
        self.add_node(
            NodeKind::ItemScalingMultiple,
            NodeParams::new()
                .with("scale", scale)
                .with(
                    "items",
                    vec![
                        ItemSelector::items([2731, 2732]),
                        ItemSelector::items([2733, 2734]),
                        ItemSelector::group(ITEM_GROUP, ["Fish, Seafood"]),
                        ItemSelector::items([2740, 2743, 2948]),
                        ItemSelector::items([2949]),
                        ItemSelector::group(ITEM_GROUP, [VEGETABLES, FRUITS]),
                        ItemSelector::group(ITEM_GROUP, [PULSES]),
                    ],
                )
                .with("source", SOURCES.to_vec())
                .with("elasticity", self.elasticity())
                .with("scaling_nutrient", s.scaling_nutrient.as_str())
                .with("constant", true)
                .with("non_sel_items", ItemSelector::group(ITEM_GROUP, [CEREALS])),
        );

        self.alternative_food(
            percent(p.meat_alternatives),
            s.labmeat_co2e,
            vec![2731, 2732, 2733, 2734],
            2731,
            ALTERNATIVE_MEAT_ITEM,
            "Alternative meat",
        );
        self.alternative_food(
            percent(p.dairy_alternatives),
            s.dairy_alternatives_co2e,
            vec![2948, 2743, 2740],
            2948,
            ALTERNATIVE_DAIRY_ITEM,
            "Alternative dairy",
        );

        // waste slider is bound as a percentage
        self.add_node(
            NodeKind::FoodWasteModel,
            NodeParams::new()
                .with("waste_scale", p.waste)
                .with("kcal_rda", s.rda_kcal)
                .with("source", SOURCES.to_vec())
                .with("elasticity", self.elasticity()),
        );
    }

    fn alternative_food(
        &mut self,
        cultured_scale: f64,
        co2e: f64,
        baseline_items: Vec<i64>,
        copy_from: i64,
        new_item: i64,
        name: &str,
    ) {
        let params = NodeParams::new()
            .with("cultured_scale", cultured_scale)
            .with("labmeat_co2e", co2e)
            .with("baseline_items", ItemSelector::items(baseline_items))
            .with("replaced_items", ItemSelector::group(ITEM_GROUP, [CEREALS]))
            .with("copy_from", copy_from)
            .with("new_items", new_item)
            .with("new_item_name", name)
            .with("source", SOURCES.to_vec())
            .with("elasticity", self.elasticity());
        self.add_node(NodeKind::AlternativeFoodModel, params);
    }

    fn land_management(&mut self) {
        self.category = NodeCategory::LandManagement;
        let p = self.params;
        let s = self.settings;
        let bdleaf_ratio = percent(p.bdleaf_conif_ratio);

        self.add_node(
            NodeKind::ProductionLandScale,
            NodeParams::new().with("bdleaf_conif_ratio", bdleaf_ratio),
        );
        self.add_node(
            NodeKind::ForestLandModel,
            NodeParams::new()
                .with("forest_fraction", percent(p.foresting_pasture))
                .with("bdleaf_conif_ratio", bdleaf_ratio),
        );

        self.add_node(
            NodeKind::BeccsFarmLand,
            NodeParams::new()
                .with("land_type", vec![ARABLE])
                .with("farm_percentage", percent(p.land_beccs))
                .with("items", ItemSelector::origin(VEGETAL_PRODUCTS))
                .with("new_land_type", "Bioenergy crops (arable)"),
        );
        self.add_node(
            NodeKind::BeccsFarmLand,
            NodeParams::new()
                .with("land_type", grasslands())
                .with("farm_percentage", percent(p.land_beccs_pasture))
                .with("new_land_type", "Bioenergy crops (pasture)")
                .with("items", ItemSelector::origin(ANIMAL_PRODUCTS)),
        );

        self.add_node(
            NodeKind::ShiftProduction,
            NodeParams::new()
                .with("scale", percent(p.horticulture))
                .with("items", ItemSelector::items(HORTICULTURE_ITEMS))
                .with("items_target", ItemSelector::items(HORTICULTURE_TARGETS))
                .with("land_area_ratio", HORTICULTURE_LAND_RATIO),
        );
        self.add_node(
            NodeKind::ShiftProduction,
            NodeParams::new()
                .with("scale", percent(p.pulse_production))
                .with("items", ItemSelector::group(ITEM_GROUP, [PULSES]))
                .with(
                    "items_target",
                    ItemSelector::group(ITEM_GROUP, PULSE_TARGET_GROUPS),
                )
                .with("land_area_ratio", PULSES_LAND_RATIO),
        );

        self.add_node(
            NodeKind::PeatlandRestoration,
            NodeParams::new()
                .with("restore_fraction", LOWLAND_PEAT_SHARE * percent(p.lowland_peatland))
                .with("new_land_type", "Restored lowland peat")
                .with("old_land_type", vec![ARABLE])
                .with("items", ItemSelector::origin(VEGETAL_PRODUCTS)),
        );
        self.add_node(
            NodeKind::PeatlandRestoration,
            NodeParams::new()
                .with("restore_fraction", UPLAND_PEAT_SHARE * percent(p.upland_peatland))
                .with("new_land_type", "Restored upland peat")
                .with("old_land_type", grasslands())
                .with("items", ItemSelector::origin(ANIMAL_PRODUCTS)),
        );

        self.add_node(
            NodeKind::ManagedAgriculturalLandCarbon,
            NodeParams::new()
                .with("fraction", percent(p.pasture_soil_carbon))
                .with("managed_class", "Managed pasture")
                .with("old_class", grasslands()),
        );
        self.add_node(
            NodeKind::ManagedAgriculturalLandCarbon,
            NodeParams::new()
                .with("fraction", percent(p.arable_soil_carbon))
                .with("managed_class", "Managed arable")
                .with("old_class", vec![ARABLE]),
        );

        self.add_node(
            NodeKind::MixedFarmingModel,
            NodeParams::new()
                .with("fraction", percent(p.mixed_farming))
                .with("prod_scale_factor", s.mixed_farming_production_scale)
                .with("items", ItemSelector::origin(VEGETAL_PRODUCTS))
                .with(
                    "secondary_prod_scale_factor",
                    s.mixed_farming_secondary_production_scale,
                )
                .with("secondary_items", ItemSelector::origin(ANIMAL_PRODUCTS)),
        );
    }

    fn scale_impact(&mut self, origin: &str, scale_factor: f64) {
        self.add_node(
            NodeKind::ScaleImpact,
            NodeParams::new()
                .with("items", ItemSelector::origin(origin))
                .with("scale_factor", scale_factor),
        );
    }

    fn livestock_practice(&mut self) {
        self.category = NodeCategory::LivestockPractice;
        let p = self.params;
        let s = self.settings;

        self.add_node(
            NodeKind::AgroecologyModel,
            NodeParams::new()
                .with("land_percentage", percent(p.silvopasture))
                .with("agroecology_class", "Silvopasture")
                .with(
                    "land_type",
                    vec![IMPROVED_GRASSLAND, SEMI_NATURAL_GRASSLAND, "Managed pasture"],
                )
                .with("tree_coverage", s.agroecology_tree_coverage)
                .with("replaced_items", ItemSelector::items([2731, 2732]))
                .with("seq_ha_yr", self.agroecology_seq()),
        );

        self.scale_impact(VEGETAL_PRODUCTS, s.nitrogen_ghg_factor * percent(p.nitrogen));
        self.scale_impact(
            ANIMAL_PRODUCTS,
            s.methane_ghg_factor * percent(p.methane_inhibitor),
        );

        self.add_node(
            NodeKind::ScaleProduction,
            NodeParams::new()
                .with("scale_factor", 1.0 + percent(p.stock_density))
                .with("items", ItemSelector::items(LIVESTOCK_ITEMS)),
        );

        self.scale_impact(
            ANIMAL_PRODUCTS,
            s.manure_ghg_factor * percent(p.manure_management),
        );
        self.scale_impact(
            ANIMAL_PRODUCTS,
            s.breeding_ghg_factor * percent(p.animal_breeding),
        );
        self.scale_impact(
            ANIMAL_PRODUCTS,
            s.fossil_livestock_ghg_factor * percent(p.fossil_livestock),
        );

        // Higher yield lowers emissions per unit by the inverse of the gain
        let yield_ratio = percent(p.livestock_yield);
        self.scale_impact(ANIMAL_PRODUCTS, 1.0 - 1.0 / yield_ratio);
        self.add_node(
            NodeKind::ScaleProduction,
            NodeParams::new()
                .with("scale_factor", yield_ratio)
                .with("items", ItemSelector::origin(ANIMAL_PRODUCTS)),
        );
    }

    fn arable_practice(&mut self) {
        self.category = NodeCategory::ArablePractice;
        let p = self.params;
        let s = self.settings;

        self.add_node(
            NodeKind::AgroecologyModel,
            NodeParams::new()
                .with("land_percentage", percent(p.agroforestry))
                .with("agroecology_class", "Agroforestry")
                .with("land_type", vec![ARABLE, "Managed arable"])
                .with("tree_coverage", s.agroecology_tree_coverage)
                .with("replaced_items", ItemSelector::items([2511]))
                .with("seq_ha_yr", self.agroecology_seq()),
        );

        self.add_node(
            NodeKind::ExtraUrbanFarming,
            NodeParams::new()
                .with("fraction", percent(p.vertical_farming))
                .with("items", ItemSelector::group(ITEM_GROUP, [VEGETABLES, FRUITS])),
        );

        self.scale_impact(
            VEGETAL_PRODUCTS,
            s.fossil_arable_ghg_factor * percent(p.fossil_arable),
        );
    }

    fn technology(&mut self) {
        self.category = NodeCategory::Technology;
        let p = self.params;

        self.add_node(
            NodeKind::CcsModel,
            NodeParams::new()
                .with("waste_BECCS", p.waste_beccs * TONNES_PER_MEGATONNE)
                .with("overseas_BECCS", p.overseas_beccs * TONNES_PER_MEGATONNE)
                .with("DACCS", p.daccs * TONNES_PER_MEGATONNE)
                .with("biochar", p.biochar * TONNES_PER_MEGATONNE),
        );
    }

    fn derived(&mut self) {
        self.category = NodeCategory::Derived;
        let s = self.settings;

        self.add_node(NodeKind::LabelNewForest, NodeParams::new());

        let seq = vec![
            s.bdleaf_seq_ha_yr,
            s.conif_seq_ha_yr,
            s.new_bdleaf_seq_ha_yr,
            s.new_conif_seq_ha_yr,
            s.peatland_seq_ha_yr,
            s.peatland_seq_ha_yr,
            s.managed_arable_seq_ha_yr,
            s.managed_pasture_seq_ha_yr,
            s.mixed_farming_seq_ha_yr,
            s.beccs_crops_arable_seq_ha_yr,
            s.beccs_crops_pasture_seq_ha_yr,
        ];
        self.add_node(
            NodeKind::ForestSequestrationModel,
            NodeParams::new()
                .with("land_type", SEQUESTRATION_LAND_TYPES.to_vec())
                .with("seq", seq),
        );

        self.add_node(NodeKind::ComputeEmissions, NodeParams::new());
        self.add_node(NodeKind::ComputeMetrics, NodeParams::new());
    }

    fn scenario_identifier(&mut self) {
        self.category = NodeCategory::ScenarioIdentifier;
        self.add_node(
            NodeKind::GenerateScenarioId,
            NodeParams::new().with("keys", SCENARIO_ID_KEYS.to_vec()),
        );
    }
}

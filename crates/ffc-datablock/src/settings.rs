//! Settings and scenario parameters
//!
//! - [`AdvancedSettings`]: model coefficients, fixed for one evaluation
//! - [`ScenarioParams`]: slider positions, recorded verbatim as `run_params`
//! - [`RegionConfig`]: which regions, areas and years the baseline covers

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Model coefficients consumed by the scenario compiler
///
/// `pop_proj` (external key `popProj`) is required; every other value has a
/// default. Sequestration rates are tonnes CO2e per hectare per year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedSettings {
    /// Population projection series name, e.g. `Medium`
    #[serde(alias = "popProj")]
    pub pop_proj: String,
    /// Global timescale in years
    pub n_scale: f64,
    /// Yield projection factor
    pub yield_proj: f64,
    /// Share of a demand change met by domestic production
    pub elasticity: f64,
    /// Metric held constant when consumption is rescaled
    pub scaling_nutrient: String,
    /// Emission factor of alternative meat
    pub labmeat_co2e: f64,
    /// Emission factor of alternative dairy
    pub dairy_alternatives_co2e: f64,
    /// Recommended daily energy intake, kCal
    pub rda_kcal: f64,
    pub mixed_farming_production_scale: f64,
    pub mixed_farming_secondary_production_scale: f64,
    /// Tree cover fraction on agroecology land
    pub agroecology_tree_coverage: f64,
    pub bdleaf_seq_ha_yr: f64,
    pub conif_seq_ha_yr: f64,
    pub new_bdleaf_seq_ha_yr: f64,
    pub new_conif_seq_ha_yr: f64,
    pub peatland_seq_ha_yr: f64,
    pub managed_arable_seq_ha_yr: f64,
    pub managed_pasture_seq_ha_yr: f64,
    pub mixed_farming_seq_ha_yr: f64,
    pub beccs_crops_arable_seq_ha_yr: f64,
    pub beccs_crops_pasture_seq_ha_yr: f64,
    pub nitrogen_ghg_factor: f64,
    pub methane_ghg_factor: f64,
    pub manure_ghg_factor: f64,
    pub breeding_ghg_factor: f64,
    pub fossil_livestock_ghg_factor: f64,
    pub fossil_arable_ghg_factor: f64,
}

impl Default for AdvancedSettings {
    /// Defaults without a projection; [`AdvancedSettings::validate`] rejects it
    fn default() -> Self {
        Self {
            pop_proj: String::new(),
            n_scale: 20.0,
            yield_proj: 0.0,
            elasticity: 0.5,
            scaling_nutrient: "kCal/cap/day".to_string(),
            labmeat_co2e: 5.6,
            dairy_alternatives_co2e: 0.7,
            rda_kcal: 2250.0,
            mixed_farming_production_scale: 0.9,
            mixed_farming_secondary_production_scale: 1.1,
            agroecology_tree_coverage: 0.1,
            bdleaf_seq_ha_yr: 3.5,
            conif_seq_ha_yr: 6.5,
            new_bdleaf_seq_ha_yr: 5.0,
            new_conif_seq_ha_yr: 10.0,
            peatland_seq_ha_yr: 2.5,
            managed_arable_seq_ha_yr: 0.3,
            managed_pasture_seq_ha_yr: 0.45,
            mixed_farming_seq_ha_yr: 0.5,
            beccs_crops_arable_seq_ha_yr: 1.5,
            beccs_crops_pasture_seq_ha_yr: 1.0,
            nitrogen_ghg_factor: 0.1,
            methane_ghg_factor: 0.3,
            manure_ghg_factor: 0.1,
            breeding_ghg_factor: 0.1,
            fossil_livestock_ghg_factor: 0.05,
            fossil_arable_ghg_factor: 0.05,
        }
    }
}

impl AdvancedSettings {
    /// Default coefficients for a projection
    #[must_use]
    pub fn new(pop_proj: impl Into<String>) -> Self {
        Self {
            pop_proj: pop_proj.into(),
            ..Self::default()
        }
    }

    /// Check required keys
    ///
    /// # Errors
    /// Returns [`ConfigurationError::MissingSetting`] when `popProj` is absent.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.pop_proj.trim().is_empty() {
            return Err(ConfigurationError::MissingSetting("popProj".to_string()));
        }
        Ok(())
    }

    /// Parse and validate TOML settings
    ///
    /// # Errors
    /// Returns error if the text is invalid or `popProj` is missing.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigurationError> {
        let settings: Self =
            toml::from_str(text).map_err(|e| ConfigurationError::parse("toml", e))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse and validate JSON settings
    ///
    /// # Errors
    /// Returns error if the text is invalid or `popProj` is missing.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigurationError> {
        let settings: Self =
            serde_json::from_str(text).map_err(|e| ConfigurationError::parse("json", e))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a `.toml` or `.json` file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigurationError::io_error(path, e))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_toml_str(&text),
        }
    }
}

macro_rules! scenario_params {
    ($( $(#[$meta:meta])* $field:ident = $key:literal => $default:expr; )*) => {
        /// Scenario slider positions
        ///
        /// Field names follow Rust conventions; the serialized form and
        /// [`ScenarioParams::get`] use the external slider keys.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(default, deny_unknown_fields)]
        pub struct ScenarioParams {
            $(
                $(#[$meta])*
                #[serde(rename = $key)]
                pub $field: f64,
            )*
        }

        impl Default for ScenarioParams {
            fn default() -> Self {
                Self { $( $field: $default, )* }
            }
        }

        impl ScenarioParams {
            /// External keys in declaration order
            pub const KEYS: &'static [&'static str] = &[$($key),*];

            /// Value by external key
            #[must_use]
            pub fn get(&self, key: &str) -> Option<f64> {
                match key {
                    $( $key => Some(self.$field), )*
                    _ => None,
                }
            }

            /// Overwrite a value by external key; false if the key is unknown
            pub fn set(&mut self, key: &str, value: f64) -> bool {
                match key {
                    $( $key => { self.$field = value; true } )*
                    _ => false,
                }
            }
        }
    };
}

scenario_params! {
    /// Ruminant meat consumption change, %
    ruminant = "ruminant" => 0.0;
    pig_poultry = "pig_poultry" => 0.0;
    fish_seafood = "fish_seafood" => 0.0;
    dairy = "dairy" => 0.0;
    eggs = "eggs" => 0.0;
    fruit_veg = "fruit_veg" => 0.0;
    pulses = "pulses" => 0.0;
    meat_alternatives = "meat_alternatives" => 0.0;
    dairy_alternatives = "dairy_alternatives" => 0.0;
    /// Food waste reduction, %
    waste = "waste" => 0.0;
    /// Broadleaf share of new woodland, %
    bdleaf_conif_ratio = "bdleaf_conif_ratio" => 0.0;
    foresting_pasture = "foresting_pasture" => 0.0;
    land_beccs = "land_BECCS" => 0.0;
    land_beccs_pasture = "land_BECCS_pasture" => 0.0;
    horticulture = "horticulture" => 0.0;
    pulse_production = "pulse_production" => 0.0;
    lowland_peatland = "lowland_peatland" => 0.0;
    upland_peatland = "upland_peatland" => 0.0;
    pasture_soil_carbon = "pasture_soil_carbon" => 0.0;
    arable_soil_carbon = "arable_soil_carbon" => 0.0;
    mixed_farming = "mixed_farming" => 0.0;
    silvopasture = "silvopasture" => 0.0;
    nitrogen = "nitrogen" => 0.0;
    methane_inhibitor = "methane_inhibitor" => 0.0;
    stock_density = "stock_density" => 0.0;
    manure_management = "manure_management" => 0.0;
    animal_breeding = "animal_breeding" => 0.0;
    fossil_livestock = "fossil_livestock" => 0.0;
    /// Livestock yield relative to today, %; 100 leaves production unchanged
    livestock_yield = "livestock_yield" => 100.0;
    agroforestry = "agroforestry" => 0.0;
    vertical_farming = "vertical_farming" => 0.0;
    fossil_arable = "fossil_arable" => 0.0;
    /// Megatonnes CO2e per year
    waste_beccs = "waste_BECCS" => 0.0;
    overseas_beccs = "overseas_BECCS" => 0.0;
    daccs = "DACCS" => 0.0;
    biochar = "biochar" => 0.0;
}

impl ScenarioParams {
    /// Parse scenario parameters from JSON
    ///
    /// # Errors
    /// Returns error on invalid JSON or an unknown slider key.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(text).map_err(|e| ConfigurationError::parse("json", e))
    }
}

/// Regions, areas and years covered by the baseline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Population region the scenario is evaluated for (UN M49 code)
    pub focus_region: i64,
    /// Reference region carried alongside, typically the world
    pub world_region: i64,
    /// Food-balance area code
    pub food_area: i64,
    /// Year the consumption and intensity baselines are taken at
    pub base_year: i64,
    pub first_year: i64,
    pub last_year: i64,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            focus_region: 826,
            world_region: 900,
            food_area: 229,
            base_year: 2020,
            first_year: 2020,
            last_year: 2050,
        }
    }
}

impl RegionConfig {
    /// Projection years, inclusive
    #[must_use]
    pub fn years(&self) -> Vec<i64> {
        (self.first_year..=self.last_year).collect()
    }

    /// Check the year range
    ///
    /// # Errors
    /// Returns [`ConfigurationError::InvalidValue`] if the range is empty or
    /// does not contain the base year.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.first_year > self.last_year {
            return Err(ConfigurationError::invalid(
                "first_year",
                format!("{} is after last_year {}", self.first_year, self.last_year),
            ));
        }
        if !(self.first_year..=self.last_year).contains(&self.base_year) {
            return Err(ConfigurationError::invalid(
                "base_year",
                format!(
                    "{} is outside {}..={}",
                    self.base_year, self.first_year, self.last_year
                ),
            ));
        }
        Ok(())
    }

    /// Population regions in selection order
    #[must_use]
    pub fn population_regions(&self) -> Vec<i64> {
        vec![self.focus_region, self.world_region]
    }
}

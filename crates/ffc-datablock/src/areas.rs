//! Domain areas of the DataBlock
//!
//! Each area is a typed struct with named fields for the arrays the core
//! reads, plus an `extra` map for keys written by external transforms. All
//! fields remain reachable by their external key through `get`/`set`.

use crate::error::DataBlockError;
use ffc_array::LabeledArray;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Days per year used by every per-capita conversion
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Grams per thousand tonnes
pub const GRAMS_PER_KILOTONNE: f64 = 1e9;

/// External key of a baseline snapshot entry
pub const BASELINE_KEY: &str = "baseline";

/// Food metrics with per-capita and per-year forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    Weight,
    Energy,
    Proteins,
    Fat,
    Emissions,
}

impl Metric {
    /// All metrics in derivation order
    pub const ALL: [Metric; 5] = [
        Metric::Weight,
        Metric::Energy,
        Metric::Proteins,
        Metric::Fat,
        Metric::Emissions,
    ];

    /// External key of the per-capita daily value
    #[must_use]
    pub const fn per_capita_key(self) -> &'static str {
        match self {
            Metric::Weight => "g/cap/day",
            Metric::Energy => "kCal/cap/day",
            Metric::Proteins => "g_prot/cap/day",
            Metric::Fat => "g_fat/cap/day",
            Metric::Emissions => "g_co2e/cap/day",
        }
    }

    /// External key of the whole-population yearly value
    #[must_use]
    pub const fn per_year_key(self) -> &'static str {
        match self {
            Metric::Weight => "g/year",
            Metric::Energy => "kCal/year",
            Metric::Proteins => "g_prot/year",
            Metric::Fat => "g_fat/year",
            Metric::Emissions => "g_co2e/year",
        }
    }

    fn from_per_capita_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.per_capita_key() == key)
    }

    fn from_per_year_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.per_year_key() == key)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Weight => "Weight",
            Metric::Energy => "Energy",
            Metric::Proteins => "Proteins",
            Metric::Fat => "Fat",
            Metric::Emissions => "Emissions",
        };
        f.write_str(name)
    }
}

/// Food consumption, intensities and derived metrics
#[derive(Debug, Clone, PartialEq)]
pub struct FoodArea {
    /// `1000 T/year`, dims `Year`, `Item`
    pub quantity: LabeledArray,
    /// `kCal/g_food`
    pub kcal_per_gram: LabeledArray,
    /// `g_prot/g_food`
    pub protein_per_gram: LabeledArray,
    /// `g_fat/g_food`
    pub fat_per_gram: LabeledArray,
    pub per_capita: BTreeMap<Metric, LabeledArray>,
    pub per_year: BTreeMap<Metric, LabeledArray>,
    pub extra: BTreeMap<String, LabeledArray>,
    baseline: Option<Arc<LabeledArray>>,
}

impl FoodArea {
    pub const QUANTITY_KEY: &'static str = "1000 T/year";
    pub const KCAL_KEY: &'static str = "kCal/g_food";
    pub const PROTEIN_KEY: &'static str = "g_prot/g_food";
    pub const FAT_KEY: &'static str = "g_fat/g_food";

    /// Area with quantities and intensities; metrics not derived yet
    #[must_use]
    pub fn new(
        quantity: LabeledArray,
        kcal_per_gram: LabeledArray,
        protein_per_gram: LabeledArray,
        fat_per_gram: LabeledArray,
    ) -> Self {
        Self {
            quantity,
            kcal_per_gram,
            protein_per_gram,
            fat_per_gram,
            per_capita: BTreeMap::new(),
            per_year: BTreeMap::new(),
            extra: BTreeMap::new(),
            baseline: None,
        }
    }

    /// Snapshot of `g/cap/day` taken before the first node ran
    #[inline]
    #[must_use]
    pub fn baseline(&self) -> Option<&Arc<LabeledArray>> {
        self.baseline.as_ref()
    }

    pub(crate) fn set_baseline(&mut self, snapshot: Arc<LabeledArray>) {
        self.baseline = Some(snapshot);
    }

    /// Per-capita daily value of a metric
    ///
    /// # Errors
    /// Returns [`DataBlockError::MissingMetric`] before metrics are derived.
    pub fn per_capita(&self, metric: Metric) -> Result<&LabeledArray, DataBlockError> {
        self.per_capita
            .get(&metric)
            .ok_or_else(|| DataBlockError::MissingMetric(metric.per_capita_key().to_string()))
    }

    /// Yearly value of a metric
    ///
    /// # Errors
    /// Returns [`DataBlockError::MissingMetric`] before metrics are derived.
    pub fn per_year(&self, metric: Metric) -> Result<&LabeledArray, DataBlockError> {
        self.per_year
            .get(&metric)
            .ok_or_else(|| DataBlockError::MissingMetric(metric.per_year_key().to_string()))
    }

    fn intensity<'a>(&'a self, metric: Metric, impact: &'a ImpactArea) -> Option<&'a LabeledArray> {
        match metric {
            Metric::Weight => None,
            Metric::Energy => Some(&self.kcal_per_gram),
            Metric::Proteins => Some(&self.protein_per_gram),
            Metric::Fat => Some(&self.fat_per_gram),
            Metric::Emissions => Some(&impact.ghg_per_gram),
        }
    }

    /// Recompute every per-capita and per-year metric from `quantity`
    ///
    /// Per-capita weight comes straight from the current quantity; every
    /// other per-capita value is weight times its intensity, and every yearly
    /// value is its per-capita value times `population × 365.25`. Also
    /// refreshes `impact.g_co2e/year`.
    ///
    /// # Errors
    /// Returns error if an intensity cannot be aligned with the quantity.
    pub fn derive_metrics(
        &mut self,
        impact: &mut ImpactArea,
        population: f64,
    ) -> Result<(), DataBlockError> {
        let weight = self
            .quantity
            .map(|q| q * GRAMS_PER_KILOTONNE / population / DAYS_PER_YEAR);
        let to_year = population * DAYS_PER_YEAR;

        let mut per_capita = BTreeMap::new();
        let mut per_year = BTreeMap::new();
        for metric in Metric::ALL {
            let value = match self.intensity(metric, impact) {
                Some(intensity) => weight.mul(intensity)?,
                None => weight.clone(),
            };
            per_year.insert(metric, value.scale(to_year));
            per_capita.insert(metric, value);
        }

        impact.emissions_per_year = self
            .quantity
            .scale(GRAMS_PER_KILOTONNE)
            .mul(&impact.ghg_per_gram)?;
        self.per_capita = per_capita;
        self.per_year = per_year;
        Ok(())
    }

    /// Array by external key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&LabeledArray> {
        match key {
            Self::QUANTITY_KEY => Some(&self.quantity),
            Self::KCAL_KEY => Some(&self.kcal_per_gram),
            Self::PROTEIN_KEY => Some(&self.protein_per_gram),
            Self::FAT_KEY => Some(&self.fat_per_gram),
            BASELINE_KEY => self.baseline.as_deref(),
            _ => {
                if let Some(m) = Metric::from_per_capita_key(key) {
                    self.per_capita.get(&m)
                } else if let Some(m) = Metric::from_per_year_key(key) {
                    self.per_year.get(&m)
                } else {
                    self.extra.get(key)
                }
            }
        }
    }

    /// Overwrite an array by external key
    ///
    /// # Errors
    /// Returns [`DataBlockError::BaselineReadOnly`] for `baseline`.
    pub fn set(&mut self, key: &str, array: LabeledArray) -> Result<(), DataBlockError> {
        match key {
            Self::QUANTITY_KEY => self.quantity = array,
            Self::KCAL_KEY => self.kcal_per_gram = array,
            Self::PROTEIN_KEY => self.protein_per_gram = array,
            Self::FAT_KEY => self.fat_per_gram = array,
            BASELINE_KEY => return Err(DataBlockError::BaselineReadOnly { area: "food" }),
            _ => {
                if let Some(m) = Metric::from_per_capita_key(key) {
                    self.per_capita.insert(m, array);
                } else if let Some(m) = Metric::from_per_year_key(key) {
                    self.per_year.insert(m, array);
                } else {
                    self.extra.insert(key.to_string(), array);
                }
            }
        }
        Ok(())
    }

    /// External keys currently present
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = [
            Self::QUANTITY_KEY,
            Self::KCAL_KEY,
            Self::PROTEIN_KEY,
            Self::FAT_KEY,
        ]
        .iter()
        .map(|k| (*k).to_string())
        .collect();
        keys.extend(self.per_capita.keys().map(|m| m.per_capita_key().to_string()));
        keys.extend(self.per_year.keys().map(|m| m.per_year_key().to_string()));
        if self.baseline.is_some() {
            keys.push(BASELINE_KEY.to_string());
        }
        keys.extend(self.extra.keys().cloned());
        keys
    }
}

/// Emission factors and totals
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactArea {
    /// `gco2e/gfood`, agricultural emissions per gram of food
    pub ghg_per_gram: LabeledArray,
    /// `gco2e/gfood_land`, land-use emissions per gram of food
    pub land_ghg_per_gram: LabeledArray,
    /// `g_co2e/year`
    pub emissions_per_year: LabeledArray,
    pub extra: BTreeMap<String, LabeledArray>,
}

impl ImpactArea {
    pub const GHG_KEY: &'static str = "gco2e/gfood";
    pub const LAND_GHG_KEY: &'static str = "gco2e/gfood_land";
    pub const EMISSIONS_KEY: &'static str = "g_co2e/year";

    /// Area with emission factors; totals are filled by metric derivation
    #[must_use]
    pub fn new(ghg_per_gram: LabeledArray, land_ghg_per_gram: LabeledArray) -> Self {
        let emissions_per_year = ghg_per_gram.map(|_| f64::NAN);
        Self {
            ghg_per_gram,
            land_ghg_per_gram,
            emissions_per_year,
            extra: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&LabeledArray> {
        match key {
            Self::GHG_KEY => Some(&self.ghg_per_gram),
            Self::LAND_GHG_KEY => Some(&self.land_ghg_per_gram),
            Self::EMISSIONS_KEY => Some(&self.emissions_per_year),
            _ => self.extra.get(key),
        }
    }

    pub fn set(&mut self, key: &str, array: LabeledArray) {
        match key {
            Self::GHG_KEY => self.ghg_per_gram = array,
            Self::LAND_GHG_KEY => self.land_ghg_per_gram = array,
            Self::EMISSIONS_KEY => self.emissions_per_year = array,
            _ => {
                self.extra.insert(key.to_string(), array);
            }
        }
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = [Self::GHG_KEY, Self::LAND_GHG_KEY, Self::EMISSIONS_KEY]
            .iter()
            .map(|k| (*k).to_string())
            .collect();
        keys.extend(self.extra.keys().cloned());
        keys
    }
}

/// Land use shares and classification grid
#[derive(Debug, Clone, PartialEq)]
pub struct LandArea {
    /// Share of each cell under each land use, in percent
    pub percentage_land_use: LabeledArray,
    /// Agricultural land classification grade per cell
    pub dominant_classification: LabeledArray,
    pub extra: BTreeMap<String, LabeledArray>,
    baseline: Option<Arc<LabeledArray>>,
}

impl LandArea {
    pub const USE_KEY: &'static str = "percentage_land_use";
    pub const CLASSIFICATION_KEY: &'static str = "dominant_classification";

    #[must_use]
    pub fn new(percentage_land_use: LabeledArray, dominant_classification: LabeledArray) -> Self {
        Self {
            percentage_land_use,
            dominant_classification,
            extra: BTreeMap::new(),
            baseline: None,
        }
    }

    /// Snapshot of `percentage_land_use` taken before the first node ran
    #[inline]
    #[must_use]
    pub fn baseline(&self) -> Option<&Arc<LabeledArray>> {
        self.baseline.as_ref()
    }

    pub(crate) fn set_baseline(&mut self, snapshot: Arc<LabeledArray>) {
        self.baseline = Some(snapshot);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&LabeledArray> {
        match key {
            Self::USE_KEY => Some(&self.percentage_land_use),
            Self::CLASSIFICATION_KEY => Some(&self.dominant_classification),
            BASELINE_KEY => self.baseline.as_deref(),
            _ => self.extra.get(key),
        }
    }

    /// Overwrite an array by external key
    ///
    /// # Errors
    /// Returns [`DataBlockError::BaselineReadOnly`] for `baseline`.
    pub fn set(&mut self, key: &str, array: LabeledArray) -> Result<(), DataBlockError> {
        match key {
            Self::USE_KEY => self.percentage_land_use = array,
            Self::CLASSIFICATION_KEY => self.dominant_classification = array,
            BASELINE_KEY => return Err(DataBlockError::BaselineReadOnly { area: "land" }),
            _ => {
                self.extra.insert(key.to_string(), array);
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys = vec![Self::USE_KEY.to_string(), Self::CLASSIFICATION_KEY.to_string()];
        if self.baseline.is_some() {
            keys.push(BASELINE_KEY.to_string());
        }
        keys.extend(self.extra.keys().cloned());
        keys
    }
}

/// Population projection for the evaluated regions
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationArea {
    /// People, dims `Region`, `Year`
    pub population: LabeledArray,
    /// Focus-region population at the base year
    pub baseline_population: f64,
    pub extra: BTreeMap<String, LabeledArray>,
}

impl PopulationArea {
    pub const POPULATION_KEY: &'static str = "population";

    #[must_use]
    pub fn new(population: LabeledArray, baseline_population: f64) -> Self {
        Self {
            population,
            baseline_population,
            extra: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&LabeledArray> {
        match key {
            Self::POPULATION_KEY => Some(&self.population),
            _ => self.extra.get(key),
        }
    }

    pub fn set(&mut self, key: &str, array: LabeledArray) {
        if key == Self::POPULATION_KEY {
            self.population = array;
        } else {
            self.extra.insert(key.to_string(), array);
        }
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys = vec![Self::POPULATION_KEY.to_string()];
        keys.extend(self.extra.keys().cloned());
        keys
    }
}

/// Scalars shared across nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalParameters {
    /// Years over which scenario changes are phased in
    pub timescale: Option<f64>,
    /// Shareable identifier of the evaluated scenario
    pub scenario_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffc_array::{labels, Axis};

    fn items(values: Vec<f64>) -> LabeledArray {
        LabeledArray::from_axis(Axis::new("Item", labels([1, 2])).unwrap(), values).unwrap()
    }

    fn food() -> (FoodArea, ImpactArea) {
        let quantity = items(vec![10.0, 20.0])
            .expand_dims(Axis::new("Year", labels([2020])).unwrap())
            .unwrap();
        let food = FoodArea::new(
            quantity,
            items(vec![2.0, 3.0]),
            items(vec![0.1, 0.2]),
            items(vec![0.05, 0.0]),
        );
        let impact = ImpactArea::new(items(vec![4.0, 1.0]), items(vec![0.5, 0.5]));
        (food, impact)
    }

    #[test]
    fn derive_metrics_follows_formulas() {
        let (mut food, mut impact) = food();
        let pop = 1000.0;
        food.derive_metrics(&mut impact, pop).unwrap();

        let weight = food.per_capita(Metric::Weight).unwrap();
        let expected = 10.0 * 1e9 / pop / DAYS_PER_YEAR;
        assert!((weight.values()[0] - expected).abs() < 1e-6);

        let energy = food.per_capita(Metric::Energy).unwrap();
        assert!((energy.values()[1] - weight.values()[1] * 3.0).abs() < 1e-6);

        for metric in Metric::ALL {
            let per_cap = food.per_capita(metric).unwrap();
            let per_year = food.per_year(metric).unwrap();
            assert!(per_year.approx_eq(&per_cap.scale(pop * DAYS_PER_YEAR), 1e-12));
        }

        assert_eq!(impact.emissions_per_year.get(&labels([2020, 1])).unwrap(), 10.0 * 1e9 * 4.0);
    }

    #[test]
    fn metrics_missing_before_derivation() {
        let (food, _) = food();
        let err = food.per_year(Metric::Fat).unwrap_err();
        assert!(matches!(err, DataBlockError::MissingMetric(ref k) if k == "g_fat/year"));
    }

    #[test]
    fn external_keys_round_trip() {
        let (mut food, mut impact) = food();
        food.derive_metrics(&mut impact, 10.0).unwrap();
        assert!(food.get("kCal/cap/day").is_some());
        assert!(food.get("g_co2e/year").is_some());
        assert!(food.get(BASELINE_KEY).is_none());

        food.set("scaled_items", items(vec![1.0, 1.0])).unwrap();
        assert!(food.keys().contains(&"scaled_items".to_string()));
        assert_eq!(food.get("scaled_items"), Some(&items(vec![1.0, 1.0])));
    }

    #[test]
    fn baseline_is_not_settable_by_key() {
        let (mut food, _) = food();
        let err = food.set(BASELINE_KEY, items(vec![0.0, 0.0])).unwrap_err();
        assert!(matches!(err, DataBlockError::BaselineReadOnly { area: "food" }));

        let mut land = LandArea::new(items(vec![1.0, 2.0]), items(vec![3.0, 3.0]));
        assert!(land.set(BASELINE_KEY, items(vec![0.0, 0.0])).is_err());
    }
}

//! The DataBlock
//!
//! One [`DataBlock`] belongs to one scenario evaluation. It is seeded from
//! [`BaselineData`], snapshotted once, then mutated in place by every node of
//! the pipeline.
//!
//! # Write-once areas
//!
//! - `advanced_settings` is fixed at construction
//! - `run_params` is recorded once by the scenario compiler
//! - `food.baseline` and `land.baseline` are set once by
//!   [`DataBlock::snapshot_baseline`] and only ever shared, never mutated

use crate::areas::{FoodArea, GlobalParameters, ImpactArea, LandArea, Metric, PopulationArea};
use crate::baseline::BaselineData;
use crate::error::DataBlockError;
use crate::provider::DataProvider;
use crate::secure::SecureDatasetLoader;
use crate::settings::{AdvancedSettings, RegionConfig, ScenarioParams};
use ffc_array::LabeledArray;
use std::sync::Arc;

/// Domain areas of a DataBlock
#[derive(Debug, Clone, PartialEq)]
pub struct Areas {
    pub food: FoodArea,
    pub land: LandArea,
    pub impact: ImpactArea,
    pub population: PopulationArea,
    pub global_parameters: GlobalParameters,
}

/// Structured state of one scenario evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct DataBlock {
    pub areas: Areas,
    advanced_settings: Arc<AdvancedSettings>,
    run_params: Option<Arc<ScenarioParams>>,
}

/// Identity of the baseline snapshots at the time they were taken
///
/// Holds the snapshot pointers; [`SnapshotGuard::is_intact`] checks that a
/// block still shares exactly these instances.
#[derive(Debug, Clone)]
pub struct SnapshotGuard {
    food: Arc<LabeledArray>,
    land: Arc<LabeledArray>,
}

impl SnapshotGuard {
    /// True when both baselines are still the snapshotted instances
    #[must_use]
    pub fn is_intact(&self, block: &DataBlock) -> bool {
        let same = |held: &Arc<LabeledArray>, current: Option<&Arc<LabeledArray>>| {
            current.is_some_and(|c| Arc::ptr_eq(held, c))
        };
        same(&self.food, block.areas.food.baseline()) && same(&self.land, block.areas.land.baseline())
    }

    /// Snapshotted `food.g/cap/day`
    #[inline]
    #[must_use]
    pub fn food(&self) -> &LabeledArray {
        &self.food
    }

    /// Snapshotted `land.percentage_land_use`
    #[inline]
    #[must_use]
    pub fn land(&self) -> &LabeledArray {
        &self.land
    }
}

impl DataBlock {
    /// Fresh block seeded from baseline data
    ///
    /// # Errors
    /// Returns [`crate::ConfigurationError`] if the settings are invalid.
    pub fn new(baseline: &BaselineData, settings: AdvancedSettings) -> Result<Self, DataBlockError> {
        settings.validate()?;
        Ok(Self {
            areas: Areas {
                food: baseline.food.clone(),
                land: baseline.land.clone(),
                impact: baseline.impact.clone(),
                population: baseline.population.clone(),
                global_parameters: GlobalParameters::default(),
            },
            advanced_settings: Arc::new(settings),
            run_params: None,
        })
    }

    /// Load baseline data and seed a fresh block
    ///
    /// The projection is taken from `settings.pop_proj`.
    ///
    /// # Errors
    /// Returns error if the settings or the region's year range are invalid,
    /// decryption fails or sources cannot be aligned.
    pub fn initialize(
        provider: &dyn DataProvider,
        loader: &SecureDatasetLoader,
        settings: AdvancedSettings,
        region: &RegionConfig,
    ) -> Result<Self, DataBlockError> {
        settings.validate()?;
        let baseline = BaselineData::load(provider, loader, &settings.pop_proj, region)?;
        Self::new(&baseline, settings)
    }

    /// Recompute per-capita and per-year food metrics from the current quantity
    ///
    /// # Errors
    /// Returns error if an intensity cannot be aligned with the quantity.
    pub fn derive_metrics(&mut self) -> Result<(), DataBlockError> {
        let population = self.areas.population.baseline_population;
        let Areas { food, impact, .. } = &mut self.areas;
        food.derive_metrics(impact, population)
    }

    /// Freeze `land.percentage_land_use` and `food.g/cap/day` as baselines
    ///
    /// # Errors
    /// Returns [`DataBlockError::SnapshotAlreadyTaken`] on a second call and
    /// [`DataBlockError::MissingMetric`] if metrics were never derived.
    pub fn snapshot_baseline(&mut self) -> Result<SnapshotGuard, DataBlockError> {
        if self.has_baseline_snapshot() {
            return Err(DataBlockError::SnapshotAlreadyTaken);
        }
        let food = Arc::new(self.areas.food.per_capita(Metric::Weight)?.clone());
        let land = Arc::new(self.areas.land.percentage_land_use.clone());
        self.areas.food.set_baseline(Arc::clone(&food));
        self.areas.land.set_baseline(Arc::clone(&land));

        tracing::debug!(
            food_digest = %food.digest().short(),
            land_digest = %land.digest().short(),
            "baseline snapshot taken"
        );
        Ok(SnapshotGuard { food, land })
    }

    /// True once [`DataBlock::snapshot_baseline`] has run
    #[must_use]
    pub fn has_baseline_snapshot(&self) -> bool {
        self.areas.food.baseline().is_some() || self.areas.land.baseline().is_some()
    }

    /// Guard over the current snapshots, if taken
    #[must_use]
    pub fn snapshot_guard(&self) -> Option<SnapshotGuard> {
        Some(SnapshotGuard {
            food: Arc::clone(self.areas.food.baseline()?),
            land: Arc::clone(self.areas.land.baseline()?),
        })
    }

    /// Settings fixed for this evaluation
    #[inline]
    #[must_use]
    pub fn advanced_settings(&self) -> &AdvancedSettings {
        &self.advanced_settings
    }

    /// Parameters the pipeline was built from, once recorded
    #[inline]
    #[must_use]
    pub fn run_params(&self) -> Option<&ScenarioParams> {
        self.run_params.as_deref()
    }

    /// Record the scenario parameters of this run
    ///
    /// # Errors
    /// Returns [`DataBlockError::RunParamsAlreadyRecorded`] on a second call.
    pub fn record_run_params(&mut self, params: ScenarioParams) -> Result<(), DataBlockError> {
        if self.run_params.is_some() {
            return Err(DataBlockError::RunParamsAlreadyRecorded);
        }
        self.run_params = Some(Arc::new(params));
        Ok(())
    }

    /// Array by area name and external key
    #[must_use]
    pub fn get(&self, area: &str, key: &str) -> Option<&LabeledArray> {
        match area {
            "food" => self.areas.food.get(key),
            "land" => self.areas.land.get(key),
            "impact" => self.areas.impact.get(key),
            "population" => self.areas.population.get(key),
            _ => None,
        }
    }
}

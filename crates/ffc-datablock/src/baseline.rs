//! Baseline dataset assembly
//!
//! [`BaselineData`] is everything a DataBlock is seeded with: population,
//! food consumption with derived metrics, emission factors and land use. It
//! depends only on the population projection and the region configuration,
//! never on scenario parameters, so one instance can back many evaluations.

use crate::areas::{FoodArea, ImpactArea, LandArea, PopulationArea};
use crate::error::{ConfigurationError, DataBlockError};
use crate::provider::{DataProvider, NUTRIENT_FAT, NUTRIENT_KCAL, NUTRIENT_PROTEIN};
use crate::secure::SecureDatasetLoader;
use crate::settings::RegionConfig;
use ffc_array::{
    labels, require_overlap, ArrayError, Axis, DataAlignmentError, Label, LabeledArray, Side,
};

/// Projection used to fill gaps in every other series
pub const REFERENCE_PROJECTION: &str = "Medium";

/// Population series values are thousands of people
const POPULATION_UNIT: f64 = 1000.0;

/// Aggregate food-balance rows that double-count their detail rows
pub const SUMMARY_ITEMS: [i64; 20] = [
    2905, 2943, 2924, 2946, 2961, 2960, 2919, 2945, 2913, 2911, 2923, 2907, 2918, 2914, 2912,
    2908, 2909, 2922, 2941, 2903,
];

/// Baseline areas for one projection and region configuration
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineData {
    pub projection: String,
    pub region: RegionConfig,
    pub population: PopulationArea,
    pub food: FoodArea,
    pub impact: ImpactArea,
    pub land: LandArea,
}

impl BaselineData {
    /// Load and derive every baseline area
    ///
    /// # Errors
    /// Returns [`ConfigurationError::UnknownProjection`] for an unknown
    /// series, [`DataBlockError::Encryption`] if the land-use resource cannot
    /// be decrypted, [`ConfigurationError::InvalidValue`] for an empty year
    /// range and [`DataBlockError::Alignment`] when a source lacks a required
    /// dimension or two sources do not share one.
    pub fn load(
        provider: &dyn DataProvider,
        loader: &SecureDatasetLoader,
        projection: &str,
        region: &RegionConfig,
    ) -> Result<Self, DataBlockError> {
        region.validate()?;
        let population = load_population(provider, projection, region)?;
        let (mut food, mut impact) = load_food(provider, region)?;
        food.derive_metrics(&mut impact, population.baseline_population)?;

        let classification = provider.land_classification()?;
        let resource = provider.encrypted_land_use()?;
        let (land_use, classification) = loader.load_land_use(&resource, &classification)?;
        let land = LandArea::new(land_use, classification);

        tracing::info!(
            projection,
            items = food.quantity.axis("Item").map_or(0, Axis::len),
            baseline_population = population.baseline_population,
            food_digest = %food.quantity.digest().short(),
            land_digest = %land.percentage_land_use.digest().short(),
            "baseline loaded"
        );

        Ok(Self {
            projection: projection.to_string(),
            region: region.clone(),
            population,
            food,
            impact,
            land,
        })
    }
}

/// Dimensions every population series is selected on
const POPULATION_DIMS: [&str; 3] = ["Datatype", "Region", "Year"];

fn series(provider: &dyn DataProvider, name: &str) -> Result<LabeledArray, DataBlockError> {
    let series = provider
        .population_series(name)?
        .ok_or_else(|| ConfigurationError::UnknownProjection(name.to_string()))?;
    if let Some(dim) = POPULATION_DIMS.into_iter().find(|d| !series.has_dim(d)) {
        tracing::warn!(projection = name, dimension = dim, "population series lacks dimension");
        return Err(DataAlignmentError::MissingDimension {
            dimension: dim.to_string(),
            side: Side::Left,
        }
        .into());
    }
    Ok(series)
}

/// Restrict a series to total population, thousands converted to people
fn totals(series: &LabeledArray) -> Result<LabeledArray, DataBlockError> {
    Ok(series
        .sel_one("Datatype", &Label::from("Total"))?
        .scale(POPULATION_UNIT))
}

/// Population for the region's years, `projection` first
///
/// Filling works per cell: wherever the selected series has no value for a
/// region and year, the reference series' value for that cell is used. A
/// year missing entirely is therefore filled whole, and a year missing for
/// only one region is filled for that region alone instead of being left
/// empty.
fn load_population(
    provider: &dyn DataProvider,
    projection: &str,
    region: &RegionConfig,
) -> Result<PopulationArea, DataBlockError> {
    let reference = totals(&series(provider, REFERENCE_PROJECTION)?)?;
    let selected = if projection == REFERENCE_PROJECTION {
        reference.clone()
    } else {
        totals(&series(provider, projection)?)?
    };

    let regions = Axis::new("Region", labels(region.population_regions()))?;
    let years = Axis::new("Year", labels(region.years()))?;
    let conform = |a: &LabeledArray| -> Result<LabeledArray, DataBlockError> {
        Ok(a.reindex("Region", &regions)?.reindex("Year", &years)?)
    };

    let population = conform(&selected)?.zip_with(&conform(&reference)?, |s, r| {
        if s.is_finite() {
            s
        } else {
            r
        }
    })?;
    let missing = population.len() - population.count_finite();
    if missing > 0 {
        return Err(DataAlignmentError::MissingValue {
            what: format!("{missing} population cells in '{projection}' and '{REFERENCE_PROJECTION}'"),
        }
        .into());
    }

    let baseline_population = reference
        .sel_one("Region", &Label::Int(region.focus_region))?
        .sel_one("Year", &Label::Int(region.base_year))?
        .values()
        .first()
        .copied()
        .filter(|p| p.is_finite() && *p > 0.0)
        .ok_or_else(|| DataAlignmentError::MissingValue {
            what: format!(
                "baseline population for region {} in {}",
                region.focus_region, region.base_year
            ),
        })?;

    tracing::debug!(
        projection,
        regions = ?region.population_regions(),
        first_year = region.first_year,
        last_year = region.last_year,
        "population conformed"
    );
    Ok(PopulationArea::new(population, baseline_population))
}

/// Values at the food-balance area and base year
fn at_base(array: &LabeledArray, region: &RegionConfig) -> Result<LabeledArray, DataBlockError> {
    Ok(array
        .sel_one("Region", &Label::Int(region.food_area))?
        .sel_one("Year", &Label::Int(region.base_year))?)
}

fn load_food(
    provider: &dyn DataProvider,
    region: &RegionConfig,
) -> Result<(FoodArea, ImpactArea), DataBlockError> {
    let year = Axis::new("Year", vec![Label::Int(region.base_year)])?;
    let quantity = at_base(&provider.food_balance()?, region)?
        .drop_labels("Item", &labels(SUMMARY_ITEMS))?
        .expand_dims(year.clone())?;

    // Intensities and factors are conformed to the consumed items; an item
    // without an entry contributes nothing
    let items = quantity
        .axis("Item")
        .cloned()
        .ok_or_else(|| ArrayError::UnknownDimension("Item".to_string()))?;

    let nutrients = at_base(&provider.nutrients()?, region)?;
    require_overlap(&quantity, &nutrients, "Item")?;
    let intensity = |kind: &str| -> Result<LabeledArray, DataBlockError> {
        Ok(nutrients
            .sel_one("Nutrient", &Label::from(kind))?
            .reindex("Item", &items)?
            .fill_non_finite(0.0))
    };

    let ones = LabeledArray::filled(vec![year], 1.0)?;
    let factors = |table: LabeledArray| -> Result<LabeledArray, DataBlockError> {
        require_overlap(&quantity, &table, "Item")?;
        Ok(table
            .reindex("Item", &items)?
            .fill_non_finite(0.0)
            .mul(&ones)?)
    };
    let impact = ImpactArea::new(
        factors(provider.emissions_agriculture()?)?,
        factors(provider.emissions_land_use()?)?,
    );

    let food = FoodArea::new(
        quantity,
        intensity(NUTRIENT_KCAL)?,
        intensity(NUTRIENT_PROTEIN)?,
        intensity(NUTRIENT_FAT)?,
    );
    Ok((food, impact))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_items_are_unique() {
        let mut items = SUMMARY_ITEMS.to_vec();
        items.sort_unstable();
        items.dedup();
        assert_eq!(items.len(), SUMMARY_ITEMS.len());
    }

    #[test]
    fn totals_scale_thousands() {
        let series = LabeledArray::new(
            vec![
                Axis::new("Year", labels([2020])).unwrap(),
                Axis::new("Datatype", labels(["Total", "Male"])).unwrap(),
            ],
            vec![67.0, 33.0],
        )
        .unwrap();
        let t = totals(&series).unwrap();
        assert_eq!(t.dims(), vec!["Year"]);
        assert_eq!(t.values(), &[67_000.0]);
    }
}

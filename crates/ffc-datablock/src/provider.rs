//! Read-only access to the baseline datasets
//!
//! A [`DataProvider`] supplies every external dataset the DataBlock is seeded
//! from. Dimension conventions:
//!
//! | dataset                   | dims                                 |
//! |---------------------------|--------------------------------------|
//! | population series         | `Region`, `Year`, `Datatype`         |
//! | food balance              | `Region`, `Year`, `Item`             |
//! | nutrients                 | `Region`, `Year`, `Item`, `Nutrient` |
//! | emission factors          | `Item`                               |
//! | land classification       | grid dims (e.g. `x`, `y`)            |
//!
//! The `Item` axis of the food balance carries the `Item_group`,
//! `Item_origin` and `Item_name` coordinates used by item selectors.

use crate::error::{ConfigurationError, DataBlockError};
use ffc_array::LabeledArray;
use std::path::{Path, PathBuf};

/// Nutrient label for energy, kCal per gram
pub const NUTRIENT_KCAL: &str = "kcal";
/// Nutrient label for protein, grams per gram
pub const NUTRIENT_PROTEIN: &str = "protein";
/// Nutrient label for fat, grams per gram
pub const NUTRIENT_FAT: &str = "fat";

/// Source of baseline datasets
pub trait DataProvider: Send + Sync {
    /// Population projection series by name; `None` if the series is unknown
    ///
    /// Values are in thousands of people.
    ///
    /// # Errors
    /// Returns error if the series exists but cannot be read.
    fn population_series(&self, name: &str) -> Result<Option<LabeledArray>, DataBlockError>;

    /// Food balance quantities, 1000 t/year
    ///
    /// # Errors
    /// Returns error if the dataset cannot be read.
    fn food_balance(&self) -> Result<LabeledArray, DataBlockError>;

    /// Nutrient intensities per gram of food
    ///
    /// # Errors
    /// Returns error if the dataset cannot be read.
    fn nutrients(&self) -> Result<LabeledArray, DataBlockError>;

    /// Agricultural emission factors, gCO2e per gram of food
    ///
    /// # Errors
    /// Returns error if the dataset cannot be read.
    fn emissions_agriculture(&self) -> Result<LabeledArray, DataBlockError>;

    /// Land-use emission factors, gCO2e per gram of food
    ///
    /// # Errors
    /// Returns error if the dataset cannot be read.
    fn emissions_land_use(&self) -> Result<LabeledArray, DataBlockError>;

    /// Unencrypted land classification grid
    ///
    /// # Errors
    /// Returns error if the dataset cannot be read.
    fn land_classification(&self) -> Result<LabeledArray, DataBlockError>;

    /// Encrypted land-use percentage resource
    ///
    /// # Errors
    /// Returns error if the resource cannot be read.
    fn encrypted_land_use(&self) -> Result<Vec<u8>, DataBlockError>;
}

/// Provider over a data directory
///
/// Layout:
///
/// ```text
/// <root>/population/<series>.json
/// <root>/food_balance.json
/// <root>/nutrients.json
/// <root>/emissions_agriculture.json
/// <root>/emissions_land_use.json
/// <root>/land_classification.json
/// <root>/land_use_target_percentage.bin
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    root: PathBuf,
}

impl DirectoryProvider {
    /// File name of the encrypted land-use resource
    pub const LAND_USE_RESOURCE: &'static str = "land_use_target_percentage.bin";

    /// Create a provider rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Data directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_array(dataset: &str, path: &Path) -> Result<LabeledArray, DataBlockError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::io_error(path, e))?;
        serde_json::from_str(&text).map_err(|e| DataBlockError::provider(dataset, e))
    }

    fn read_named(&self, dataset: &str) -> Result<LabeledArray, DataBlockError> {
        let path = self.root.join(format!("{dataset}.json"));
        Self::read_array(dataset, &path)
    }
}

impl DataProvider for DirectoryProvider {
    fn population_series(&self, name: &str) -> Result<Option<LabeledArray>, DataBlockError> {
        if name.contains(['/', '\\']) || name.starts_with('.') {
            return Ok(None);
        }
        let path = self.root.join("population").join(format!("{name}.json"));
        if !path.is_file() {
            return Ok(None);
        }
        Self::read_array("population", &path).map(Some)
    }

    fn food_balance(&self) -> Result<LabeledArray, DataBlockError> {
        self.read_named("food_balance")
    }

    fn nutrients(&self) -> Result<LabeledArray, DataBlockError> {
        self.read_named("nutrients")
    }

    fn emissions_agriculture(&self) -> Result<LabeledArray, DataBlockError> {
        self.read_named("emissions_agriculture")
    }

    fn emissions_land_use(&self) -> Result<LabeledArray, DataBlockError> {
        self.read_named("emissions_land_use")
    }

    fn land_classification(&self) -> Result<LabeledArray, DataBlockError> {
        self.read_named("land_classification")
    }

    fn encrypted_land_use(&self) -> Result<Vec<u8>, DataBlockError> {
        let path = self.root.join(Self::LAND_USE_RESOURCE);
        std::fs::read(&path).map_err(|e| ConfigurationError::io_error(&path, e).into())
    }
}

//! Testing utilities for FFC workspace
//!
//! Shared fixtures: a small synthetic dataset behind [`SyntheticProvider`],
//! fixed key material for the encrypted land-use resource, and ready-made
//! DataBlocks and registries.

#![allow(missing_docs)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockEncryptMut, KeyIvInit};
use ffc_array::{labels, Axis, Label, LabeledArray};
use ffc_datablock::{
    AdvancedSettings, BaselineData, DataBlock, DataBlockError, DataProvider, DirectoryProvider,
    RegionConfig, ScenarioParams, SecureDatasetLoader,
};
use ffc_pipeline::{NodeKind, NodeParams, TransformError, TransformRegistry};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const TEST_KEY: [u8; 32] = *b"synthetic-land-use-key-32-bytes!";
pub const TEST_IV: [u8; 16] = *b"synthetic-iv-16b";

pub const FOOD_AREA: i64 = 229;
pub const OTHER_FOOD_AREA: i64 = 5000;
pub const FOCUS_REGION: i64 = 826;
pub const WORLD_REGION: i64 = 900;
pub const BASE_YEAR: i64 = 2020;

struct ItemSpec {
    code: i64,
    name: &'static str,
    group: &'static str,
    origin: &'static str,
    quantity: f64,
    kcal: f64,
    protein: f64,
    fat: f64,
    ghg: f64,
    land_ghg: f64,
}

const VEGETAL: &str = "Vegetal Products";
const ANIMAL: &str = "Animal Products";

const ITEMS: [ItemSpec; 17] = [
    ItemSpec { code: 2511, name: "Wheat and products", group: "Cereals - Excluding Beer", origin: VEGETAL, quantity: 6200.0, kcal: 3.34, protein: 0.103, fat: 0.015, ghg: 0.6, land_ghg: 0.1 },
    ItemSpec { code: 2514, name: "Maize and products", group: "Cereals - Excluding Beer", origin: VEGETAL, quantity: 300.0, kcal: 3.56, protein: 0.092, fat: 0.038, ghg: 0.7, land_ghg: 0.2 },
    ItemSpec { code: 2546, name: "Beans", group: "Pulses", origin: VEGETAL, quantity: 120.0, kcal: 3.41, protein: 0.21, fat: 0.012, ghg: 0.8, land_ghg: 0.3 },
    ItemSpec { code: 2601, name: "Tomatoes and products", group: "Vegetables", origin: VEGETAL, quantity: 500.0, kcal: 0.17, protein: 0.009, fat: 0.002, ghg: 1.4, land_ghg: 0.1 },
    ItemSpec { code: 2611, name: "Oranges, Mandarines", group: "Fruits - Excluding Wine", origin: VEGETAL, quantity: 750.0, kcal: 0.34, protein: 0.007, fat: 0.001, ghg: 0.4, land_ghg: 0.2 },
    ItemSpec { code: 2731, name: "Bovine Meat", group: "Meat", origin: ANIMAL, quantity: 1100.0, kcal: 2.42, protein: 0.17, fat: 0.19, ghg: 25.0, land_ghg: 9.0 },
    ItemSpec { code: 2732, name: "Mutton & Goat Meat", group: "Meat", origin: ANIMAL, quantity: 280.0, kcal: 2.59, protein: 0.15, fat: 0.22, ghg: 22.0, land_ghg: 11.0 },
    ItemSpec { code: 2733, name: "Pigmeat", group: "Meat", origin: ANIMAL, quantity: 1500.0, kcal: 2.9, protein: 0.14, fat: 0.25, ghg: 5.5, land_ghg: 1.5 },
    ItemSpec { code: 2734, name: "Poultry Meat", group: "Meat", origin: ANIMAL, quantity: 2100.0, kcal: 1.6, protein: 0.2, fat: 0.08, ghg: 4.0, land_ghg: 2.0 },
    ItemSpec { code: 2735, name: "Meat, Other", group: "Meat", origin: ANIMAL, quantity: 40.0, kcal: f64::NAN, protein: 0.18, fat: 0.05, ghg: 6.0, land_ghg: 1.0 },
    ItemSpec { code: 2740, name: "Butter, Ghee", group: "Animal fats", origin: ANIMAL, quantity: 140.0, kcal: 7.2, protein: 0.008, fat: 0.81, ghg: 9.0, land_ghg: 3.0 },
    ItemSpec { code: 2743, name: "Cream", group: "Animal fats", origin: ANIMAL, quantity: 90.0, kcal: 1.95, protein: 0.025, fat: 0.19, ghg: 5.0, land_ghg: 1.2 },
    ItemSpec { code: 2761, name: "Freshwater Fish", group: "Fish, Seafood", origin: ANIMAL, quantity: 60.0, kcal: 1.1, protein: 0.18, fat: 0.04, ghg: 3.5, land_ghg: 0.5 },
    ItemSpec { code: 2948, name: "Milk - Excluding Butter", group: "Milk - Excluding Butter", origin: ANIMAL, quantity: 9800.0, kcal: 0.61, protein: 0.033, fat: 0.035, ghg: 1.3, land_ghg: 0.4 },
    ItemSpec { code: 2949, name: "Eggs", group: "Eggs", origin: ANIMAL, quantity: 800.0, kcal: 1.31, protein: 0.11, fat: 0.09, ghg: 2.1, land_ghg: 0.7 },
    ItemSpec { code: 2905, name: "Cereals - Excluding Beer", group: "Cereals - Excluding Beer", origin: VEGETAL, quantity: 6500.0, kcal: 3.35, protein: 0.1, fat: 0.017, ghg: 0.6, land_ghg: 0.1 },
    ItemSpec { code: 2941, name: "Animal Products", group: "Animal Products", origin: ANIMAL, quantity: 16000.0, kcal: 1.2, protein: 0.07, fat: 0.09, ghg: 5.0, land_ghg: 1.5 },
];

/// Item codes in the synthetic food balance, summary rows included
#[must_use]
pub fn item_codes() -> Vec<i64> {
    ITEMS.iter().map(|i| i.code).collect()
}

/// Item axis with name, group and origin coordinates
pub fn item_axis() -> Axis {
    Axis::new("Item", labels(item_codes()))
        .unwrap()
        .with_coord("Item_name", ITEMS.iter().map(|i| i.name.to_string()).collect())
        .unwrap()
        .with_coord("Item_group", ITEMS.iter().map(|i| i.group.to_string()).collect())
        .unwrap()
        .with_coord("Item_origin", ITEMS.iter().map(|i| i.origin.to_string()).collect())
        .unwrap()
}

fn axis<T: Into<Label>>(name: &str, values: impl IntoIterator<Item = T>) -> Axis {
    Axis::new(name, labels(values)).unwrap()
}

fn food_axes() -> (Axis, Axis) {
    (
        axis("Region", [FOOD_AREA, OTHER_FOOD_AREA]),
        axis("Year", [2019, 2020]),
    )
}

fn area_scale(region: i64) -> f64 {
    if region == OTHER_FOOD_AREA {
        40.0
    } else {
        1.0
    }
}

fn food_balance() -> LabeledArray {
    let (regions, years) = food_axes();
    let mut data = Vec::new();
    for region in [FOOD_AREA, OTHER_FOOD_AREA] {
        for year in [2019, 2020] {
            let trend = 1.0 + 0.01 * f64::from(year - 2020);
            data.extend(ITEMS.iter().map(|i| i.quantity * trend * area_scale(region)));
        }
    }
    LabeledArray::new(vec![regions, years, item_axis()], data).unwrap()
}

fn nutrients() -> LabeledArray {
    let (regions, years) = food_axes();
    let mut data = Vec::new();
    for _ in 0..regions.len() * years.len() {
        for item in &ITEMS {
            data.extend([item.kcal, item.protein, item.fat]);
        }
    }
    LabeledArray::new(
        vec![
            regions,
            years,
            item_axis(),
            axis("Nutrient", ["kcal", "protein", "fat"]),
        ],
        data,
    )
    .unwrap()
}

fn item_table(value: impl Fn(&ItemSpec) -> f64) -> LabeledArray {
    LabeledArray::from_axis(item_axis(), ITEMS.iter().map(value).collect()).unwrap()
}

/// Population series in thousands, dims `Region`, `Year`, `Datatype`
///
/// `factor` scales every value; `gaps` lists `(region, year)` cells with no
/// data.
pub fn population_series(factor: f64, gaps: &[(i64, i64)]) -> LabeledArray {
    let years = [2020, 2021, 2022];
    let mut data = Vec::new();
    for region in [FOCUS_REGION, WORLD_REGION] {
        for year in years {
            let offset = f64::from(i32::try_from(year - 2020).unwrap());
            let total = match region {
                FOCUS_REGION => 67_000.0 + 300.0 * offset,
                _ => 7_800_000.0 + 80_000.0 * offset,
            } * factor;
            let total = if gaps.contains(&(region, year)) {
                f64::NAN
            } else {
                total
            };
            data.extend([total, total / 2.0]);
        }
    }
    LabeledArray::new(
        vec![
            axis("Region", [FOCUS_REGION, WORLD_REGION]),
            axis("Year", years),
            axis("Datatype", ["Total", "Male"]),
        ],
        data,
    )
    .unwrap()
}

/// Land classification grid over `x` 0..=2, `y` 0..=1
pub fn land_classification() -> LabeledArray {
    LabeledArray::new(
        vec![axis("x", [0, 1, 2]), axis("y", [0, 1])],
        vec![1.0, 2.0, 3.0, 3.0, 4.0, 5.0],
    )
    .unwrap()
}

/// Plaintext land-use percentages over `x` 0..=3, `y` 0..=1
pub fn land_use() -> LabeledArray {
    LabeledArray::new(
        vec![axis("x", [0, 1, 2, 3]), axis("y", [0, 1])],
        vec![40.0, 60.0, 25.0, 75.0, 50.0, 50.0, 10.0, 90.0],
    )
    .unwrap()
}

pub fn key_base64() -> String {
    STANDARD.encode(TEST_KEY)
}

pub fn iv_base64() -> String {
    STANDARD.encode(TEST_IV)
}

/// Loader holding the test key material
pub fn test_loader() -> SecureDatasetLoader {
    SecureDatasetLoader::from_base64(&key_base64(), &iv_base64()).unwrap()
}

/// Serialize and encrypt an array with AES-256-CBC
pub fn encrypt_array_with(key: &[u8; 32], iv: &[u8; 16], array: &LabeledArray) -> Vec<u8> {
    let plaintext = serde_json::to_vec(array).unwrap();
    cbc::Encryptor::<aes::Aes256>::new_from_slices(key, iv)
        .unwrap()
        .encrypt_padded_vec_mut::<Pkcs7>(&plaintext)
}

/// Serialize and encrypt an array with the test key material
pub fn encrypt_array(array: &LabeledArray) -> Vec<u8> {
    encrypt_array_with(&TEST_KEY, &TEST_IV, array)
}

/// In-memory provider over the synthetic dataset
///
/// Series `Medium` is complete; `High` is 1% higher with no data for the
/// focus region in 2022.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    series: BTreeMap<String, LabeledArray>,
    food_balance: LabeledArray,
    nutrients: LabeledArray,
    emissions_agriculture: LabeledArray,
    emissions_land_use: LabeledArray,
    land_classification: LabeledArray,
    encrypted_land_use: Vec<u8>,
    loads: Arc<AtomicUsize>,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticProvider {
    pub fn new() -> Self {
        let mut series = BTreeMap::new();
        series.insert("Medium".to_string(), population_series(1.0, &[]));
        series.insert(
            "High".to_string(),
            population_series(1.01, &[(FOCUS_REGION, 2022)]),
        );
        Self {
            series,
            food_balance: food_balance(),
            nutrients: nutrients(),
            emissions_agriculture: item_table(|i| i.ghg),
            emissions_land_use: item_table(|i| i.land_ghg),
            land_classification: land_classification(),
            encrypted_land_use: encrypt_array(&land_use()),
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[must_use]
    pub fn with_series(mut self, name: &str, series: LabeledArray) -> Self {
        self.series.insert(name.to_string(), series);
        self
    }

    #[must_use]
    pub fn without_series(mut self, name: &str) -> Self {
        self.series.remove(name);
        self
    }

    #[must_use]
    pub fn with_encrypted_land_use(mut self, bytes: Vec<u8>) -> Self {
        self.encrypted_land_use = bytes;
        self
    }

    #[must_use]
    pub fn with_nutrients(mut self, nutrients: LabeledArray) -> Self {
        self.nutrients = nutrients;
        self
    }

    /// Number of times the food balance was read, one per baseline load
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Write every dataset in the layout read by [`DirectoryProvider`]
    pub fn write_to(&self, dir: &Path) -> DirectoryProvider {
        let write = |path: &Path, array: &LabeledArray| {
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, serde_json::to_string(array).unwrap()).unwrap();
        };
        for (name, series) in &self.series {
            write(&dir.join("population").join(format!("{name}.json")), series);
        }
        write(&dir.join("food_balance.json"), &self.food_balance);
        write(&dir.join("nutrients.json"), &self.nutrients);
        write(&dir.join("emissions_agriculture.json"), &self.emissions_agriculture);
        write(&dir.join("emissions_land_use.json"), &self.emissions_land_use);
        write(&dir.join("land_classification.json"), &self.land_classification);
        std::fs::write(
            dir.join(DirectoryProvider::LAND_USE_RESOURCE),
            &self.encrypted_land_use,
        )
        .unwrap();
        DirectoryProvider::new(dir)
    }
}

impl DataProvider for SyntheticProvider {
    fn population_series(&self, name: &str) -> Result<Option<LabeledArray>, DataBlockError> {
        Ok(self.series.get(name).cloned())
    }

    fn food_balance(&self) -> Result<LabeledArray, DataBlockError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.food_balance.clone())
    }

    fn nutrients(&self) -> Result<LabeledArray, DataBlockError> {
        Ok(self.nutrients.clone())
    }

    fn emissions_agriculture(&self) -> Result<LabeledArray, DataBlockError> {
        Ok(self.emissions_agriculture.clone())
    }

    fn emissions_land_use(&self) -> Result<LabeledArray, DataBlockError> {
        Ok(self.emissions_land_use.clone())
    }

    fn land_classification(&self) -> Result<LabeledArray, DataBlockError> {
        Ok(self.land_classification.clone())
    }

    fn encrypted_land_use(&self) -> Result<Vec<u8>, DataBlockError> {
        Ok(self.encrypted_land_use.clone())
    }
}

/// Region configuration matching the synthetic dataset
pub fn test_region() -> RegionConfig {
    RegionConfig {
        focus_region: FOCUS_REGION,
        world_region: WORLD_REGION,
        food_area: FOOD_AREA,
        base_year: BASE_YEAR,
        first_year: 2020,
        last_year: 2022,
    }
}

pub fn test_settings() -> AdvancedSettings {
    AdvancedSettings::new("Medium")
}

pub fn baseline(projection: &str) -> BaselineData {
    BaselineData::load(
        &SyntheticProvider::new(),
        &test_loader(),
        projection,
        &test_region(),
    )
    .unwrap()
}

/// Fresh `Medium` DataBlock, no snapshot taken
pub fn initialized_block() -> DataBlock {
    DataBlock::initialize(
        &SyntheticProvider::new(),
        &test_loader(),
        test_settings(),
        &test_region(),
    )
    .unwrap()
}

/// Fresh `Medium` DataBlock with baselines snapshotted
pub fn snapshotted_block() -> DataBlock {
    let mut block = initialized_block();
    block.snapshot_baseline().unwrap();
    block
}

fn passthrough(_: &mut DataBlock, _: &NodeParams) -> Result<(), TransformError> {
    Ok(())
}

/// Built-in transforms plus a no-op for every external kind
pub fn passthrough_registry() -> TransformRegistry {
    let mut registry = TransformRegistry::with_builtins();
    for kind in NodeKind::ALL {
        if !kind.is_builtin() {
            registry.register(kind, passthrough);
        }
    }
    registry
}

/// Every slider moved away from its neutral position
pub fn perturbed_params() -> ScenarioParams {
    let mut params = ScenarioParams::default();
    for (i, key) in ScenarioParams::KEYS.iter().enumerate() {
        let step = f64::from(u32::try_from(i % 7).unwrap());
        params.set(key, 5.0 + 5.0 * step);
    }
    params.ruminant = -40.0;
    params.livestock_yield = 120.0;
    params
}

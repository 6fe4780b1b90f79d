//! FFC DataBlock - scenario state and baseline ingestion
//!
//! # Core Concepts
//!
//! - [`DataBlock`]: per-evaluation state, split into typed domain [`Areas`]
//! - [`BaselineData`]: population, food, impact and land baselines for one
//!   population projection
//! - [`SecureDatasetLoader`]: AES-CBC decryption of the land-use resource
//! - [`DataProvider`]: read-only source of every external dataset
//! - [`BaselineCache`]: projection-keyed memo of loaded baselines
//!
//! # Lifecycle
//!
//! ```rust,ignore
//! let loader = SecureDatasetLoader::from_base64(&key, &iv)?;
//! let mut block = DataBlock::initialize(&provider, &loader, settings, &RegionConfig::default())?;
//! block.snapshot_baseline()?;
//! // nodes mutate block.areas in order
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod areas;
mod baseline;
mod cache;
mod datablock;
mod error;
mod provider;
mod secure;
mod settings;

pub use areas::{
    FoodArea, GlobalParameters, ImpactArea, LandArea, Metric, PopulationArea, BASELINE_KEY,
    DAYS_PER_YEAR, GRAMS_PER_KILOTONNE,
};
pub use baseline::{BaselineData, REFERENCE_PROJECTION, SUMMARY_ITEMS};
pub use cache::{BaselineCache, CacheStats};
pub use datablock::{Areas, DataBlock, SnapshotGuard};
pub use error::{ConfigurationError, DataBlockError, EncryptionError};
pub use provider::{
    DataProvider, DirectoryProvider, NUTRIENT_FAT, NUTRIENT_KCAL, NUTRIENT_PROTEIN,
};
pub use secure::{SecureDatasetLoader, BLOCK_SIZE};
pub use settings::{AdvancedSettings, RegionConfig, ScenarioParams};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! FFC Core - scenario calculator
//!
//! Ties baseline loading, scenario compilation and execution together:
//! - Loads each population projection's baseline once and caches it
//! - Seeds a fresh DataBlock per evaluation and freezes its baselines
//! - Compiles slider positions into a pipeline and runs it
//!
//! # Example
//!
//! ```rust,ignore
//! use ffc_core::{Calculator, CalculatorConfig};
//!
//! let calculator = Calculator::new(
//!     CalculatorConfig::from_path("ffc.toml")?,
//!     Arc::new(DirectoryProvider::new("data")),
//!     SecureDatasetLoader::from_base64(&key, &iv)?,
//!     registry,
//! )?;
//!
//! let block = calculator.evaluate(params, AdvancedSettings::new("Medium"))?;
//! println!("{:?}", block.areas.global_parameters.scenario_id);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod calculator;
mod config;
mod error;
pub mod logging;

pub use calculator::Calculator;
pub use config::{CalculatorConfig, DEFAULT_CACHE_CAPACITY};
pub use error::CalculatorError;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for evaluating scenarios
    pub use crate::{Calculator, CalculatorConfig, CalculatorError};
    pub use ffc_datablock::{AdvancedSettings, DataBlock, DataProvider, ScenarioParams};
    pub use ffc_pipeline::{Transform, TransformRegistry};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

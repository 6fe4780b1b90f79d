//! Calculator configuration
//!
//! ```toml
//! cache_capacity = 4
//!
//! [region]
//! focus_region = 826
//! base_year = 2020
//! ```

use ffc_datablock::{ConfigurationError, RegionConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of cached baselines
pub const DEFAULT_CACHE_CAPACITY: u64 = 8;

/// Region coverage and baseline cache sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalculatorConfig {
    pub region: RegionConfig,
    /// Maximum number of projections kept in the baseline cache
    pub cache_capacity: u64,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            region: RegionConfig::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl CalculatorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With region coverage
    #[inline]
    #[must_use]
    pub fn with_region(mut self, region: RegionConfig) -> Self {
        self.region = region;
        self
    }

    /// With baseline cache capacity
    #[inline]
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Check cache capacity and year range
    ///
    /// # Errors
    /// Returns [`ConfigurationError::InvalidValue`] for a zero capacity or an
    /// invalid region.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.cache_capacity == 0 {
            return Err(ConfigurationError::invalid(
                "cache_capacity",
                "must hold at least one baseline",
            ));
        }
        self.region.validate()
    }

    /// Parse and validate TOML configuration
    ///
    /// # Errors
    /// Returns error if the text is invalid or fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigurationError> {
        let config: Self =
            toml::from_str(text).map_err(|e| ConfigurationError::parse("toml", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigurationError::io_error(path, e))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(CalculatorConfig::from_toml_str("").unwrap(), CalculatorConfig::default());
    }

    #[test]
    fn partial_region_keeps_other_defaults() {
        let config = CalculatorConfig::from_toml_str(
            "cache_capacity = 2\n[region]\nfocus_region = 250\nlast_year = 2030\n",
        )
        .unwrap();
        assert_eq!(config.cache_capacity, 2);
        assert_eq!(config.region.focus_region, 250);
        assert_eq!(config.region.world_region, 900);
        assert_eq!(config.region.years().len(), 11);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = CalculatorConfig::from_toml_str("cache_capacity = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::InvalidValue { key: "cache_capacity", .. }
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = CalculatorConfig::from_toml_str("cache_size = 3").unwrap_err();
        assert!(matches!(err, ConfigurationError::Parse { format: "toml", .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = CalculatorConfig::from_path("/nonexistent/ffc.toml").unwrap_err();
        assert!(matches!(err, ConfigurationError::Io { .. }));
    }
}

//! Calculator composition root
//!
//! Owns everything an evaluation needs that outlives a single scenario: the
//! data provider, key material, baseline cache and transform registry. Each
//! evaluation gets a fresh DataBlock seeded from the cached baseline, so
//! concurrent evaluations never share mutable state.

use crate::config::CalculatorConfig;
use crate::error::CalculatorError;
use ffc_datablock::{
    AdvancedSettings, BaselineCache, BaselineData, CacheStats, DataBlock, DataProvider,
    RegionConfig, ScenarioParams, SecureDatasetLoader,
};
use ffc_pipeline::{Executor, Pipeline, PipelineBuilder, TransformRegistry};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Scenario calculator
///
/// `Calculator` is `Send + Sync`; share it behind an `Arc` to evaluate
/// scenarios from several threads.
pub struct Calculator {
    provider: Arc<dyn DataProvider>,
    loader: SecureDatasetLoader,
    cache: BaselineCache,
    executor: Executor,
    region: RegionConfig,
}

impl Calculator {
    /// Create calculator from validated configuration
    ///
    /// # Errors
    /// Returns [`CalculatorError::Configuration`] if the configuration is
    /// invalid.
    pub fn new(
        config: CalculatorConfig,
        provider: Arc<dyn DataProvider>,
        loader: SecureDatasetLoader,
        registry: TransformRegistry,
    ) -> Result<Self, CalculatorError> {
        config.validate()?;
        Ok(Self {
            provider,
            loader,
            cache: BaselineCache::new(config.cache_capacity),
            executor: Executor::new(Arc::new(registry)),
            region: config.region,
        })
    }

    /// Region coverage of every baseline
    #[inline]
    #[must_use]
    pub fn region(&self) -> &RegionConfig {
        &self.region
    }

    /// Executor shared by every evaluation
    #[inline]
    #[must_use]
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Baseline cache statistics
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop every cached baseline
    ///
    /// Call after the provider's datasets change.
    pub fn invalidate_baselines(&self) {
        self.cache.invalidate_all();
    }

    /// Baseline for a population projection, loaded once per projection
    ///
    /// # Errors
    /// Returns [`CalculatorError::DataBlock`] if loading fails; failed loads
    /// are not cached.
    pub fn baseline(&self, projection: &str) -> Result<Arc<BaselineData>, CalculatorError> {
        let baseline = self.cache.try_get_or_insert_with(projection, || {
            let start = Instant::now();
            let baseline =
                BaselineData::load(self.provider.as_ref(), &self.loader, projection, &self.region)?;
            tracing::info!(
                projection,
                elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                "baseline loaded"
            );
            Ok::<_, CalculatorError>(baseline)
        })?;
        Ok(baseline)
    }

    /// Fresh DataBlock with baseline snapshots taken
    ///
    /// # Errors
    /// Returns error if the settings are invalid or the baseline cannot be
    /// loaded.
    pub fn datablock(&self, settings: AdvancedSettings) -> Result<DataBlock, CalculatorError> {
        settings.validate()?;
        let baseline = self.baseline(&settings.pop_proj)?;
        let mut block = DataBlock::new(&baseline, settings)?;
        block.snapshot_baseline()?;
        Ok(block)
    }

    /// Compile a scenario without running it
    ///
    /// For callers that run the pipeline themselves, e.g. to keep the partial
    /// DataBlock of a failed run.
    ///
    /// # Errors
    /// Returns error if the DataBlock cannot be prepared or the parameters do
    /// not compile.
    pub fn prepare(
        &self,
        params: ScenarioParams,
        settings: AdvancedSettings,
    ) -> Result<Pipeline, CalculatorError> {
        let block = self.datablock(settings)?;
        let pipeline = PipelineBuilder::build(params, block)?;

        let missing = self.executor.registry().missing(pipeline.nodes());
        if !missing.is_empty() {
            tracing::warn!(?missing, "pipeline uses node kinds without a registered transform");
        }
        Ok(pipeline)
    }

    /// Evaluate a scenario
    ///
    /// # Workflow
    /// 1. Cached baseline for `settings.pop_proj`
    /// 2. Fresh DataBlock, baselines snapshotted
    /// 3. Compile `params` into a pipeline
    /// 4. Run every node in order
    ///
    /// # Errors
    /// Returns [`CalculatorError::Execution`] carrying the partial DataBlock
    /// if a node fails; any earlier failure leaves nothing to keep.
    pub fn evaluate(
        &self,
        params: ScenarioParams,
        settings: AdvancedSettings,
    ) -> Result<DataBlock, CalculatorError> {
        let pipeline = self.prepare(params, settings)?;
        Ok(self.executor.run(pipeline)?)
    }
}

impl fmt::Debug for Calculator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Calculator")
            .field("loader", &self.loader)
            .field("cache", &self.cache.stats())
            .field("executor", &self.executor)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn calculator_is_shareable() {
        assert_send_sync::<Calculator>();
    }
}

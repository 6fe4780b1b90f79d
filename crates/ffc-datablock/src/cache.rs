//! Baseline cache using moka
//!
//! Baseline data depends only on the population projection, so the cache is
//! keyed by projection name alone. Scenario parameters never reach the key.

use crate::baseline::BaselineData;
use moka::sync::Cache;
use std::sync::Arc;

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
}

/// Projection-keyed cache of loaded baselines
#[derive(Debug, Clone)]
pub struct BaselineCache {
    inner: Cache<String, Arc<BaselineData>>,
}

impl BaselineCache {
    /// Create cache with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Cached baseline for a projection
    #[inline]
    #[must_use]
    pub fn get(&self, projection: &str) -> Option<Arc<BaselineData>> {
        self.inner.get(projection)
    }

    /// Insert a baseline under its projection
    #[inline]
    pub fn insert(&self, baseline: Arc<BaselineData>) {
        self.inner.insert(baseline.projection.clone(), baseline);
    }

    /// Cached baseline, or load and cache it
    ///
    /// Failed loads are not cached.
    ///
    /// # Errors
    /// Returns the loader's error.
    pub fn try_get_or_insert_with<E, F>(
        &self,
        projection: &str,
        load: F,
    ) -> Result<Arc<BaselineData>, E>
    where
        F: FnOnce() -> Result<BaselineData, E>,
    {
        if let Some(cached) = self.get(projection) {
            tracing::info!(projection, "baseline cache hit");
            return Ok(cached);
        }

        tracing::info!(projection, "baseline cache miss");
        let baseline = Arc::new(load()?);
        self.inner.insert(projection.to_string(), Arc::clone(&baseline));
        Ok(baseline)
    }

    /// Invalidate one projection
    #[inline]
    pub fn invalidate(&self, projection: &str) {
        self.inner.invalidate(projection);
    }

    /// Invalidate all entries
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Entry count after pending maintenance
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.entry_count(),
        }
    }
}

impl Default for BaselineCache {
    /// One entry per projection in common use
    fn default() -> Self {
        Self::new(8)
    }
}

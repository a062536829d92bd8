//! Metrics collection using Prometheus

use anyhow::Result;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;
use std::time::Duration;

/// Main metrics collector for the matchmaking service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Pool-related metrics
    pool_metrics: PoolMetrics,

    /// Engine-related metrics
    engine_metrics: EngineMetrics,

    /// Storage-related metrics
    storage_metrics: StorageMetrics,
}

/// Pool-related metrics
#[derive(Clone)]
pub struct PoolMetrics {
    /// Total gamers added to the pool
    pub gamers_added_total: IntCounter,

    /// Total gamers removed from the pool
    pub gamers_removed_total: IntCounter,

    /// Current number of gamers in the pool
    pub pool_size: IntGauge,
}

/// Engine-related metrics
#[derive(Clone)]
pub struct EngineMetrics {
    /// Total group recalculations performed
    pub recalculations_total: IntCounter,

    /// Number of groups formed by the latest recalculation
    pub formed_groups: IntGauge,

    /// Candidates left unassigned by the latest recalculation
    pub unassigned_gamers: IntGauge,

    /// Recalculation duration
    pub recalculation_duration_seconds: Histogram,
}

/// Storage-related metrics
#[derive(Clone)]
pub struct StorageMetrics {
    /// Write-behind jobs submitted, by operation
    pub store_jobs_total: IntCounterVec,

    /// Store jobs that failed
    pub store_failures_total: IntCounter,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let pool_metrics = PoolMetrics::new(&registry)?;
        let engine_metrics = EngineMetrics::new(&registry)?;
        let storage_metrics = StorageMetrics::new(&registry)?;

        Ok(Self {
            registry,
            pool_metrics,
            engine_metrics,
            storage_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get pool metrics
    pub fn pool(&self) -> &PoolMetrics {
        &self.pool_metrics
    }

    /// Get engine metrics
    pub fn engine(&self) -> &EngineMetrics {
        &self.engine_metrics
    }

    /// Get storage metrics
    pub fn storage(&self) -> &StorageMetrics {
        &self.storage_metrics
    }

    /// Record a gamer joining the pool
    pub fn record_gamer_added(&self, pool_size: usize) {
        self.pool_metrics.gamers_added_total.inc();
        self.pool_metrics.pool_size.set(pool_size as i64);
    }

    /// Record a gamer leaving the pool
    pub fn record_gamer_removed(&self, pool_size: usize) {
        self.pool_metrics.gamers_removed_total.inc();
        self.pool_metrics.pool_size.set(pool_size as i64);
    }

    /// Record a completed recalculation
    pub fn record_recalculation(&self, groups: usize, unassigned: usize, duration: Duration) {
        self.engine_metrics.recalculations_total.inc();
        self.engine_metrics.formed_groups.set(groups as i64);
        self.engine_metrics.unassigned_gamers.set(unassigned as i64);
        self.engine_metrics
            .recalculation_duration_seconds
            .observe(duration.as_secs_f64());
    }

    /// Record a write-behind job submission
    pub fn record_store_job(&self, operation: &str) {
        self.storage_metrics
            .store_jobs_total
            .with_label_values(&[operation])
            .inc();
    }

    /// Record a store failure reported on the error channel
    pub fn record_store_failure(&self) {
        self.storage_metrics.store_failures_total.inc();
    }
}

impl PoolMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let gamers_added_total = IntCounter::new(
            "match_pool_gamers_added_total",
            "Total gamers added to the pool",
        )?;
        registry.register(Box::new(gamers_added_total.clone()))?;

        let gamers_removed_total = IntCounter::new(
            "match_pool_gamers_removed_total",
            "Total gamers removed from the pool",
        )?;
        registry.register(Box::new(gamers_removed_total.clone()))?;

        let pool_size = IntGauge::new(
            "match_pool_pool_size",
            "Current number of gamers in the pool",
        )?;
        registry.register(Box::new(pool_size.clone()))?;

        Ok(Self {
            gamers_added_total,
            gamers_removed_total,
            pool_size,
        })
    }
}

impl EngineMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let recalculations_total = IntCounter::new(
            "match_pool_recalculations_total",
            "Total group recalculations performed",
        )?;
        registry.register(Box::new(recalculations_total.clone()))?;

        let formed_groups = IntGauge::new(
            "match_pool_formed_groups",
            "Groups formed by the latest recalculation",
        )?;
        registry.register(Box::new(formed_groups.clone()))?;

        let unassigned_gamers = IntGauge::new(
            "match_pool_unassigned_gamers",
            "Candidates left unassigned by the latest recalculation",
        )?;
        registry.register(Box::new(unassigned_gamers.clone()))?;

        let recalculation_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "match_pool_recalculation_duration_seconds",
            "Recalculation duration in seconds",
        ))?;
        registry.register(Box::new(recalculation_duration_seconds.clone()))?;

        Ok(Self {
            recalculations_total,
            formed_groups,
            unassigned_gamers,
            recalculation_duration_seconds,
        })
    }
}

impl StorageMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let store_jobs_total = IntCounterVec::new(
            Opts::new(
                "match_pool_store_jobs_total",
                "Write-behind jobs submitted",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(store_jobs_total.clone()))?;

        let store_failures_total = IntCounter::new(
            "match_pool_store_failures_total",
            "Store jobs that failed",
        )?;
        registry.register(Box::new(store_failures_total.clone()))?;

        Ok(Self {
            store_jobs_total,
            store_failures_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_registers_metric_families() {
        let collector = MetricsCollector::new().unwrap();
        collector.record_gamer_added(1);
        collector.record_recalculation(2, 1, Duration::from_millis(5));
        collector.record_store_job("insert");

        let families = collector.registry().gather();
        let names: Vec<String> = families.iter().map(|f| f.get_name().to_string()).collect();

        assert!(names.iter().any(|n| n.contains("gamers_added")));
        assert!(names.iter().any(|n| n.contains("recalculation")));
        assert!(names.iter().any(|n| n.contains("store_jobs")));
    }

    #[test]
    fn test_pool_size_gauge_tracks_latest_value() {
        let collector = MetricsCollector::new().unwrap();
        collector.record_gamer_added(3);
        collector.record_gamer_removed(2);

        assert_eq!(collector.pool().pool_size.get(), 2);
    }
}

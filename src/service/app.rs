//! Matchmaking service composition root
//!
//! Ties the gamer pool, the match engine, the optional write-behind storage,
//! and the metrics collector together. The pool is authoritative: store
//! submissions are fire-and-forget and a persistence failure never rolls
//! back an in-memory operation.

use crate::engine::MatchEngine;
use crate::error::{MatchPoolError, Result};
use crate::metrics::MetricsCollector;
use crate::pool::GamerPool;
use crate::storage::{GamerStore, WriteBehind};
use crate::types::{GamerRecord, Group, GroupStatistics};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{info, warn};

struct StorageHandle {
    store: Arc<dyn GamerStore>,
    queue: WriteBehind,
}

/// The matchmaking service
pub struct MatchmakingService {
    pool: Arc<GamerPool>,
    engine: Arc<MatchEngine>,
    storage: Option<StorageHandle>,
    metrics: Arc<MetricsCollector>,
}

impl MatchmakingService {
    /// Create a memory-only service (no persistence)
    pub fn new(
        pool: Arc<GamerPool>,
        engine: Arc<MatchEngine>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            pool,
            engine,
            storage: None,
            metrics,
        }
    }

    /// Create a service mirroring pool mutations into `store`
    ///
    /// Spawns the write-behind worker; the returned receiver carries store
    /// failures for the caller to observe.
    pub fn with_storage(
        pool: Arc<GamerPool>,
        engine: Arc<MatchEngine>,
        metrics: Arc<MetricsCollector>,
        store: Arc<dyn GamerStore>,
        buffer_size: usize,
    ) -> (Self, mpsc::Receiver<anyhow::Error>) {
        let (queue, errors) = WriteBehind::spawn(store.clone(), buffer_size);
        let service = Self {
            pool,
            engine,
            storage: Some(StorageHandle { store, queue }),
            metrics,
        };
        (service, errors)
    }

    /// Whether pool mutations are mirrored into a store
    pub fn persistence_enabled(&self) -> bool {
        self.storage.is_some()
    }

    /// Register a gamer in the pool and, when enabled, in the store
    pub async fn add_gamer(&self, record: GamerRecord) -> Result<()> {
        validate_record(&record)?;

        self.pool.add(record.clone())?;
        self.metrics.record_gamer_added(self.pool.len()?);

        if let Some(storage) = &self.storage {
            storage.queue.submit_insert(record).await?;
            self.metrics.record_store_job("insert");
        }
        Ok(())
    }

    /// Remove a gamer by name from the pool and, when enabled, the store
    ///
    /// Surfaces `GamerNotFound` when the name is unknown.
    pub async fn delete_gamer(&self, name: &str) -> Result<GamerRecord> {
        let record = self.pool.get(name)?;
        self.pool.delete(name)?;
        self.metrics.record_gamer_removed(self.pool.len()?);

        if let Some(storage) = &self.storage {
            storage.queue.submit_remove(name).await?;
            self.metrics.record_store_job("remove");
        }
        Ok(record)
    }

    /// Look up a gamer in the pool
    pub fn get_gamer(&self, name: &str) -> Result<GamerRecord> {
        self.pool.get(name)
    }

    /// Current pool size
    pub fn pool_size(&self) -> Result<usize> {
        self.pool.len()
    }

    /// Rebuild groups from the pool, resynchronizing from the store first
    /// when persistence is enabled
    ///
    /// A resync failure is logged and the rebuild proceeds from the
    /// in-memory pool, which stays authoritative.
    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        if self.storage.is_some() {
            if let Err(e) = self.resync_from_store().await {
                warn!("Failed to resynchronize pool from store: {}", e);
            }
        }
        self.recalculate()
    }

    /// Rebuild groups from the in-memory pool without touching the store
    pub fn reset_groups(&self) -> Result<Vec<Group>> {
        self.recalculate()
    }

    /// Currently formed groups, without recomputation
    pub fn get_groups(&self) -> Result<Vec<Group>> {
        self.engine.get_groups()
    }

    /// Statistics for the group at `index`; zeroed sentinel when out of range
    pub fn group_stats(&self, index: usize) -> Result<GroupStatistics> {
        self.engine.group_stats(index)
    }

    /// Replay every persisted record into the pool
    ///
    /// The full stream is collected before any record is applied: on a
    /// stream error the pool is left untouched and the error propagates.
    pub async fn resync_from_store(&self) -> Result<()> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };

        let mut stream = storage.store.read_all();
        let mut records = Vec::new();
        while let Some(item) = stream.next().await {
            records.push(item?);
        }

        let count = records.len();
        for record in records {
            self.pool.add(record)?;
        }
        info!("Resynchronized {} gamers from the store", count);
        Ok(())
    }

    /// Flush the write-behind queue and stop its worker
    pub async fn shutdown(&self) -> Result<()> {
        if let Some(storage) = &self.storage {
            storage.queue.shutdown().await?;
            info!("Write-behind queue drained");
        }
        Ok(())
    }

    fn recalculate(&self) -> Result<Vec<Group>> {
        let start = Instant::now();
        let groups = self.engine.recalculate(self.pool.snapshot()?)?;
        self.metrics
            .record_recalculation(groups.len(), self.engine.unassigned()?, start.elapsed());
        Ok(groups)
    }
}

/// Boundary validation: reject structurally invalid player data before it
/// reaches the pool
fn validate_record(record: &GamerRecord) -> Result<()> {
    if record.name.trim().is_empty() {
        return Err(MatchPoolError::MalformedGamer {
            reason: "name must not be empty".to_string(),
        }
        .into());
    }
    if !record.skill.is_finite() {
        return Err(MatchPoolError::MalformedGamer {
            reason: format!("skill must be finite, got {}", record.skill),
        }
        .into());
    }
    if !record.latency.is_finite() {
        return Err(MatchPoolError::MalformedGamer {
            reason: format!("latency must be finite, got {}", record.latency),
        }
        .into());
    }
    Ok(())
}

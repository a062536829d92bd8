//! Metrics and monitoring for the matchmaking service
//!
//! This module provides Prometheus metrics collection for the pool, the
//! grouping engine, and the write-behind storage queue.

pub mod collector;

pub use collector::{EngineMetrics, MetricsCollector, PoolMetrics, StorageMetrics};

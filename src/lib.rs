//! Match Pool - Real-time matchmaking service
//!
//! This crate keeps a shared pool of waiting gamers and periodically batches
//! them into fixed-size groups chosen to keep skill and latency spread low,
//! with per-group statistics, optional write-behind persistence, and an HTTP
//! API.

pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod pool;
pub mod service;
pub mod storage;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{MatchPoolError, Result};
pub use types::*;

// Re-export key components
pub use engine::MatchEngine;
pub use pool::GamerPool;
pub use service::MatchmakingService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

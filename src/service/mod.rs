//! Service layer for the match-pool matchmaking service
//!
//! This module contains the composition root tying the pool, the engine,
//! and the storage queue together, plus the HTTP API server.

pub mod app;
pub mod http;

pub use app::MatchmakingService;
pub use http::{ApiServer, ApiServerConfig};

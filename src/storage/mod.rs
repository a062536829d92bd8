//! Persistence layer for the matchmaking service
//!
//! Defines the gamer store interface, an in-memory implementation used by
//! tests and as a fallback, a Postgres-backed implementation, and the
//! asynchronous write-behind queue that decouples request handling from
//! database round-trips.

pub mod postgres;
pub mod store;
pub mod write_behind;

// Re-export commonly used types
pub use postgres::PostgresGamerStore;
pub use store::{GamerStore, InMemoryGamerStore, RecordStream};
pub use write_behind::WriteBehind;

//! Error types for the matchmaking service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific matchmaking scenarios
#[derive(Debug, thiserror::Error)]
pub enum MatchPoolError {
    #[error("no gamer named '{name}' in the pool")]
    GamerNotFound { name: String },

    #[error("invalid gamer payload: {reason}")]
    MalformedGamer { reason: String },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("storage error: {message}")]
    Storage { message: String },

    #[error("internal service error: {message}")]
    Internal { message: String },
}

//! Shared pool of gamers waiting for a match
//!
//! The pool is a concurrent name-keyed registry. Writers (add/delete) are
//! mutually exclusive with each other and with readers (get/snapshot);
//! readers run concurrently. The lock is never held across calls into other
//! components.

use crate::error::{MatchPoolError, Result};
use crate::types::{GamerName, GamerRecord};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// Concurrent registry of gamers keyed by name
#[derive(Debug, Default)]
pub struct GamerPool {
    gamers: RwLock<HashMap<GamerName, GamerRecord>>,
}

impl GamerPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self {
            gamers: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or overwrite a record keyed by its name
    ///
    /// A second add with an existing name replaces the prior record entirely
    /// (last-write-wins).
    pub fn add(&self, record: GamerRecord) -> Result<()> {
        let mut gamers = self
            .gamers
            .write()
            .map_err(|_| MatchPoolError::Internal {
                message: "Failed to acquire pool write lock".to_string(),
            })?;

        debug!("Adding gamer '{}' to the pool", record.name);
        gamers.insert(record.name.clone(), record);
        Ok(())
    }

    /// Look up a gamer by name
    pub fn get(&self, name: &str) -> Result<GamerRecord> {
        let gamers = self.gamers.read().map_err(|_| MatchPoolError::Internal {
            message: "Failed to acquire pool read lock".to_string(),
        })?;

        gamers
            .get(name)
            .cloned()
            .ok_or_else(|| {
                MatchPoolError::GamerNotFound {
                    name: name.to_string(),
                }
                .into()
            })
    }

    /// Remove the entry with the given name
    ///
    /// Deleting a name that is not present is a no-op.
    pub fn delete(&self, name: &str) -> Result<()> {
        let mut gamers = self
            .gamers
            .write()
            .map_err(|_| MatchPoolError::Internal {
                message: "Failed to acquire pool write lock".to_string(),
            })?;

        if gamers.remove(name).is_some() {
            debug!("Removed gamer '{}' from the pool", name);
        }
        Ok(())
    }

    /// Point-in-time copy of the pool contents
    ///
    /// The returned map is independent of internal storage; callers may
    /// mutate it freely.
    pub fn snapshot(&self) -> Result<HashMap<GamerName, GamerRecord>> {
        let gamers = self.gamers.read().map_err(|_| MatchPoolError::Internal {
            message: "Failed to acquire pool read lock".to_string(),
        })?;

        Ok(gamers.clone())
    }

    /// Current number of gamers in the pool
    pub fn len(&self) -> Result<usize> {
        let gamers = self.gamers.read().map_err(|_| MatchPoolError::Internal {
            message: "Failed to acquire pool read lock".to_string(),
        })?;

        Ok(gamers.len())
    }

    /// Whether the pool holds no gamers
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

//! Gamer store interface and in-memory implementation

use crate::error::{MatchPoolError, Result};
use crate::types::{GamerName, GamerRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::RwLock;
use tokio_stream::Stream;

/// Lazy, finite sequence of persisted records
///
/// The stream ends by natural exhaustion or after yielding a single error
/// item.
pub type RecordStream = Pin<Box<dyn Stream<Item = Result<GamerRecord>> + Send>>;

/// Trait for persisting and retrieving gamer records
#[async_trait]
pub trait GamerStore: Send + Sync {
    /// Insert or overwrite a record keyed by its name
    async fn insert(&self, record: GamerRecord) -> Result<()>;

    /// Remove the record with the given name, if any
    async fn remove(&self, name: &str) -> Result<()>;

    /// Stream back every persisted record
    fn read_all(&self) -> RecordStream;
}

/// In-memory gamer store implementation
///
/// Used by tests and as the fallback when no database is configured.
#[derive(Debug, Default)]
pub struct InMemoryGamerStore {
    records: RwLock<HashMap<GamerName, GamerRecord>>,
}

impl InMemoryGamerStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted records
    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a record with the given name is persisted
    pub fn contains(&self, name: &str) -> bool {
        self.records
            .read()
            .map(|records| records.contains_key(name))
            .unwrap_or(false)
    }
}

#[async_trait]
impl GamerStore for InMemoryGamerStore {
    async fn insert(&self, record: GamerRecord) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| MatchPoolError::Internal {
                message: "Failed to acquire store write lock".to_string(),
            })?;

        records.insert(record.name.clone(), record);
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| MatchPoolError::Internal {
                message: "Failed to acquire store write lock".to_string(),
            })?;

        records.remove(name);
        Ok(())
    }

    fn read_all(&self) -> RecordStream {
        let mut records: Vec<GamerRecord> = self
            .records
            .read()
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default();
        records.sort_by(|a, b| a.name.cmp(&b.name));

        Box::pin(tokio_stream::iter(records.into_iter().map(Ok)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn test_insert_overwrites_by_name() {
        let store = InMemoryGamerStore::new();
        store
            .insert(GamerRecord::new("alice", 10.0, 5.0))
            .await
            .unwrap();
        store
            .insert(GamerRecord::new("alice", 20.0, 6.0))
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let store = InMemoryGamerStore::new();
        store.remove("ghost").await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_read_all_streams_every_record_in_name_order() {
        let store = InMemoryGamerStore::new();
        store
            .insert(GamerRecord::new("zed", 1.0, 1.0))
            .await
            .unwrap();
        store
            .insert(GamerRecord::new("alice", 2.0, 2.0))
            .await
            .unwrap();

        let mut stream = store.read_all();
        let mut names = Vec::new();
        while let Some(item) = stream.next().await {
            names.push(item.unwrap().name);
        }

        assert_eq!(names, vec!["alice", "zed"]);
    }
}

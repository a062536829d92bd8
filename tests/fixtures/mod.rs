//! Test fixtures and mock implementations for integration testing

use async_trait::async_trait;
use match_pool::error::{MatchPoolError, Result};
use match_pool::storage::store::RecordStream;
use match_pool::storage::GamerStore;
use match_pool::types::GamerRecord;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Build a record stamped with the current join time
pub fn gamer(name: &str, skill: f64, latency: f64) -> GamerRecord {
    GamerRecord::new(name, skill, latency)
}

/// A batch of close-skill, close-latency gamers plus one outlier
pub fn close_pair_with_outlier() -> Vec<GamerRecord> {
    vec![
        gamer("alice", 10.0, 5.0),
        gamer("bob", 12.0, 6.0),
        gamer("carol", 50.0, 40.0),
    ]
}

/// Store that counts writes and rejects everything
#[derive(Debug, Default)]
pub struct RejectingStore {
    attempts: AtomicUsize,
}

impl RejectingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GamerStore for RejectingStore {
    async fn insert(&self, record: GamerRecord) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(MatchPoolError::Storage {
            message: format!("insert of '{}' rejected", record.name),
        }
        .into())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(MatchPoolError::Storage {
            message: format!("removal of '{}' rejected", name),
        }
        .into())
    }

    fn read_all(&self) -> RecordStream {
        Box::pin(tokio_stream::iter(Vec::<Result<GamerRecord>>::new()))
    }
}

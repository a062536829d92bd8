//! Asynchronous write-behind queue in front of a gamer store
//!
//! Additions and removals are submitted as jobs on a bounded queue and
//! executed by a single worker task, so request handling never waits on a
//! database round-trip. Failures surface on an error channel and never roll
//! back in-memory state. `flush` is a completion barrier: the queue is FIFO
//! and the worker is serial, so acknowledging a flush job proves every
//! previously submitted job has been executed.

use crate::error::{MatchPoolError, Result};
use crate::storage::store::GamerStore;
use crate::types::{GamerName, GamerRecord};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Unit of work for the store worker
enum StoreJob {
    Insert(GamerRecord),
    Remove(GamerName),
    Flush(oneshot::Sender<()>),
    Stop,
}

/// Bounded write-behind queue with a single worker task
pub struct WriteBehind {
    jobs: mpsc::Sender<StoreJob>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl WriteBehind {
    /// Spawn the worker over `store` with the given queue capacity
    ///
    /// Returns the queue handle and the receiver on which store failures are
    /// reported.
    pub fn spawn(
        store: Arc<dyn GamerStore>,
        buffer_size: usize,
    ) -> (Self, mpsc::Receiver<anyhow::Error>) {
        let (jobs, mut job_rx) = mpsc::channel(buffer_size.max(1));
        let (error_tx, error_rx) = mpsc::channel(buffer_size.max(1));

        let worker = tokio::spawn(async move {
            while let Some(job) = job_rx.recv().await {
                match job {
                    StoreJob::Insert(record) => {
                        if let Err(e) = store.insert(record).await {
                            report_failure(&error_tx, e);
                        }
                    }
                    StoreJob::Remove(name) => {
                        if let Err(e) = store.remove(&name).await {
                            report_failure(&error_tx, e);
                        }
                    }
                    StoreJob::Flush(ack) => {
                        let _ = ack.send(());
                    }
                    StoreJob::Stop => break,
                }
            }
            debug!("Write-behind worker stopped");
        });

        (
            Self {
                jobs,
                worker: Mutex::new(Some(worker)),
            },
            error_rx,
        )
    }

    /// Submit a record for insertion; does not wait for the store
    pub async fn submit_insert(&self, record: GamerRecord) -> Result<()> {
        self.submit(StoreJob::Insert(record)).await
    }

    /// Submit a removal by name; does not wait for the store
    pub async fn submit_remove(&self, name: impl Into<GamerName>) -> Result<()> {
        self.submit(StoreJob::Remove(name.into())).await
    }

    /// Block until every previously submitted job has been executed
    pub async fn flush(&self) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.submit(StoreJob::Flush(ack_tx)).await?;

        ack_rx.await.map_err(|_| {
            MatchPoolError::Storage {
                message: "Write-behind worker stopped before flush completed".to_string(),
            }
            .into()
        })
    }

    /// Drain the queue and stop the worker
    ///
    /// Returns once the worker has exited; jobs submitted afterwards are
    /// rejected.
    pub async fn shutdown(&self) -> Result<()> {
        self.flush().await?;
        self.submit(StoreJob::Stop).await?;

        let handle = self
            .worker
            .lock()
            .map_err(|_| MatchPoolError::Internal {
                message: "Failed to acquire write-behind worker lock".to_string(),
            })?
            .take();

        if let Some(handle) = handle {
            handle.await.map_err(|_| MatchPoolError::Storage {
                message: "Write-behind worker panicked during shutdown".to_string(),
            })?;
        }
        Ok(())
    }

    async fn submit(&self, job: StoreJob) -> Result<()> {
        self.jobs.send(job).await.map_err(|_| {
            MatchPoolError::Storage {
                message: "Write-behind queue is closed".to_string(),
            }
            .into()
        })
    }
}

fn report_failure(error_tx: &mpsc::Sender<anyhow::Error>, error: anyhow::Error) {
    warn!("Store job failed: {}", error);
    if error_tx.try_send(error).is_err() {
        warn!("Store error channel full or closed; dropping error report");
    }
}

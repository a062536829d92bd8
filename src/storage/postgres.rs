//! Postgres-backed gamer store
//!
//! The table is created on connect if it does not exist. Inserts are
//! upserts keyed on the gamer name so the store mirrors the pool's
//! last-write-wins identity. Reads stream rows through a spawned task so the
//! caller sees a lazy sequence without borrowing the pool.

use crate::error::{MatchPoolError, Result};
use crate::storage::store::{GamerStore, RecordStream};
use crate::types::GamerRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::info;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS gamers (
    name            TEXT PRIMARY KEY,
    skill           DOUBLE PRECISION NOT NULL,
    latency         DOUBLE PRECISION NOT NULL,
    connected_at    TIMESTAMPTZ NOT NULL
)";

const INSERT_GAMER: &str = "INSERT INTO gamers (name, skill, latency, connected_at)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (name) DO UPDATE
    SET skill = EXCLUDED.skill,
        latency = EXCLUDED.latency,
        connected_at = EXCLUDED.connected_at";

const DELETE_GAMER: &str = "DELETE FROM gamers WHERE name = $1";

const SELECT_GAMERS: &str = "SELECT name, skill, latency, connected_at FROM gamers";

#[derive(Debug, sqlx::FromRow)]
struct GamerRow {
    name: String,
    skill: f64,
    latency: f64,
    connected_at: DateTime<Utc>,
}

impl From<GamerRow> for GamerRecord {
    fn from(row: GamerRow) -> Self {
        Self {
            name: row.name,
            skill: row.skill,
            latency: row.latency,
            connected_at: row.connected_at,
        }
    }
}

/// Gamer store backed by a Postgres connection pool
#[derive(Debug, Clone)]
pub struct PostgresGamerStore {
    pool: PgPool,
}

impl PostgresGamerStore {
    /// Connect to the database and ensure the gamers table exists
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(url)
            .await
            .map_err(|e| MatchPoolError::Storage {
                message: format!("Failed to connect to database: {}", e),
            })?;

        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .map_err(|e| MatchPoolError::Storage {
                message: format!("Failed to create gamers table: {}", e),
            })?;

        info!("Connected to gamer database");
        Ok(Self { pool })
    }
}

#[async_trait]
impl GamerStore for PostgresGamerStore {
    async fn insert(&self, record: GamerRecord) -> Result<()> {
        sqlx::query(INSERT_GAMER)
            .bind(&record.name)
            .bind(record.skill)
            .bind(record.latency)
            .bind(record.connected_at)
            .execute(&self.pool)
            .await
            .map_err(|e| MatchPoolError::Storage {
                message: format!("Failed to insert gamer '{}': {}", record.name, e),
            })?;

        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        sqlx::query(DELETE_GAMER)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| MatchPoolError::Storage {
                message: format!("Failed to delete gamer '{}': {}", name, e),
            })?;

        Ok(())
    }

    fn read_all(&self) -> RecordStream {
        let pool = self.pool.clone();
        let (tx, rx) = mpsc::channel(16);

        tokio::spawn(async move {
            let mut rows = sqlx::query_as::<_, GamerRow>(SELECT_GAMERS).fetch(&pool);

            while let Some(row) = rows.next().await {
                let item = match row {
                    Ok(row) => Ok(GamerRecord::from(row)),
                    Err(e) => Err(MatchPoolError::Storage {
                        message: format!("Failed to read gamers: {}", e),
                    }
                    .into()),
                };

                let stop = item.is_err();
                if tx.send(item).await.is_err() || stop {
                    break;
                }
            }
        });

        Box::pin(ReceiverStream::new(rx))
    }
}

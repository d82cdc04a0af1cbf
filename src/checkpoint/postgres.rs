//! Postgres-backed checkpoint store. Uses runtime-checked `sqlx::query`
//! rather than the compile-time `query!`/`query_as!` macros: those require
//! a live database (or a committed `.sqlx` query cache) to validate against
//! at build time, which this workspace has neither of.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::CheckpointStore;
use crate::error::{Result, WorkflowError};
use crate::state::WorkflowState;

pub struct PostgresCheckpointStore {
    pool: PgPool,
}

impl PostgresCheckpointStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| WorkflowError::Checkpoint(format!("connect failed: {e}")))?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workflow_checkpoints (
                thread_id  TEXT NOT NULL,
                seq        BIGINT NOT NULL,
                state      JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (thread_id, seq)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| WorkflowError::Checkpoint(format!("schema migration failed: {e}")))?;
        Ok(())
    }
}

fn row_to_checkpoint(row: sqlx::postgres::PgRow) -> Result<(u64, WorkflowState)> {
    let seq: i64 = row
        .try_get("seq")
        .map_err(|e| WorkflowError::Checkpoint(format!("malformed row: {e}")))?;
    let state_json: serde_json::Value = row
        .try_get("state")
        .map_err(|e| WorkflowError::Checkpoint(format!("malformed row: {e}")))?;
    let state: WorkflowState = serde_json::from_value(state_json)?;
    Ok((seq as u64, state))
}

#[async_trait]
impl CheckpointStore for PostgresCheckpointStore {
    async fn put(&self, thread_id: &str, seq: u64, state: &WorkflowState) -> Result<()> {
        let state_json = serde_json::to_value(state)?;
        sqlx::query(
            r#"
            INSERT INTO workflow_checkpoints (thread_id, seq, state)
            VALUES ($1, $2, $3)
            ON CONFLICT (thread_id, seq) DO UPDATE SET state = EXCLUDED.state
            "#,
        )
        .bind(thread_id)
        .bind(seq as i64)
        .bind(state_json)
        .execute(&self.pool)
        .await
        .map_err(|e| WorkflowError::Checkpoint(format!("put failed: {e}")))?;
        Ok(())
    }

    async fn get_latest(&self, thread_id: &str) -> Result<Option<(u64, WorkflowState)>> {
        let row = sqlx::query(
            "SELECT seq, state FROM workflow_checkpoints WHERE thread_id = $1 ORDER BY seq DESC LIMIT 1",
        )
        .bind(thread_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| WorkflowError::Checkpoint(format!("get_latest failed: {e}")))?;

        row.map(row_to_checkpoint).transpose()
    }

    async fn list(&self, thread_id: &str) -> Result<Vec<(u64, WorkflowState)>> {
        let rows = sqlx::query("SELECT seq, state FROM workflow_checkpoints WHERE thread_id = $1 ORDER BY seq ASC")
            .bind(thread_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| WorkflowError::Checkpoint(format!("list failed: {e}")))?;

        rows.into_iter().map(row_to_checkpoint).collect()
    }
}

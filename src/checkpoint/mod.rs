//! The checkpoint store contract (§6): durable, append-only, per-thread
//! history of `WorkflowState` snapshots. At-least-once durability of the
//! latest state per thread is required; exactly-once is not, since node
//! updates are idempotent with respect to their input state.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::Result;
use crate::state::WorkflowState;

pub use memory::InMemoryCheckpointStore;
pub use postgres::PostgresCheckpointStore;

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Persist `state` as the checkpoint at `seq` for `thread_id`. Sequence
    /// numbers are caller-assigned and expected to be strictly increasing
    /// per thread; the store does not itself validate monotonicity.
    async fn put(&self, thread_id: &str, seq: u64, state: &WorkflowState) -> Result<()>;

    /// The most recent checkpoint for a thread, if any.
    async fn get_latest(&self, thread_id: &str) -> Result<Option<(u64, WorkflowState)>>;

    /// The full checkpoint history for a thread, oldest first.
    async fn list(&self, thread_id: &str) -> Result<Vec<(u64, WorkflowState)>>;
}

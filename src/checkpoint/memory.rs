//! An in-process checkpoint store. Backs tests and single-process
//! development wiring; offers no durability across restarts.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::CheckpointStore;
use crate::error::Result;
use crate::state::WorkflowState;

#[derive(Default)]
pub struct InMemoryCheckpointStore {
    threads: Mutex<HashMap<String, Vec<(u64, WorkflowState)>>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn put(&self, thread_id: &str, seq: u64, state: &WorkflowState) -> Result<()> {
        let mut threads = self.threads.lock().await;
        threads
            .entry(thread_id.to_string())
            .or_default()
            .push((seq, state.clone()));
        Ok(())
    }

    async fn get_latest(&self, thread_id: &str) -> Result<Option<(u64, WorkflowState)>> {
        let threads = self.threads.lock().await;
        Ok(threads.get(thread_id).and_then(|v| v.last().cloned()))
    }

    async fn list(&self, thread_id: &str) -> Result<Vec<(u64, WorkflowState)>> {
        let threads = self.threads.lock().await;
        Ok(threads.get(thread_id).cloned().unwrap_or_default())
    }
}

//! `CheckpointStore` contract against the in-memory implementation: `put`
//! appends per-thread history, `get_latest` returns the highest `seq`
//! written, `list` returns the full ordered history, and threads never
//! cross-contaminate.

use nl2sql_workflow::checkpoint::{CheckpointStore, InMemoryCheckpointStore};
use nl2sql_workflow::state::WorkflowState;

#[tokio::test]
async fn get_latest_on_unknown_thread_is_none() {
    let store = InMemoryCheckpointStore::new();
    assert!(store.get_latest("missing").await.unwrap().is_none());
    assert!(store.list("missing").await.unwrap().is_empty());
}

#[tokio::test]
async fn put_then_get_latest_round_trips() {
    let store = InMemoryCheckpointStore::new();
    let state = WorkflowState::new("t1", "how many orders?", 3);
    store.put("t1", 0, &state).await.unwrap();

    let (seq, latest) = store.get_latest("t1").await.unwrap().expect("checkpoint present");
    assert_eq!(seq, 0);
    assert_eq!(latest.user_query, state.user_query);
}

#[tokio::test]
async fn get_latest_returns_the_highest_seq_not_the_last_inserted() {
    let store = InMemoryCheckpointStore::new();
    let mut state = WorkflowState::new("t1", "q", 3);
    store.put("t1", 0, &state).await.unwrap();
    state.retry_count = 1;
    store.put("t1", 1, &state).await.unwrap();
    state.retry_count = 2;
    store.put("t1", 2, &state).await.unwrap();

    let (seq, latest) = store.get_latest("t1").await.unwrap().unwrap();
    assert_eq!(seq, 2);
    assert_eq!(latest.retry_count, 2);
}

#[tokio::test]
async fn list_preserves_insertion_order_for_one_thread() {
    let store = InMemoryCheckpointStore::new();
    let state = WorkflowState::new("t1", "q", 3);
    for seq in 0..3 {
        store.put("t1", seq, &state).await.unwrap();
    }
    let history = store.list("t1").await.unwrap();
    let seqs: Vec<u64> = history.iter().map(|(s, _)| *s).collect();
    assert_eq!(seqs, vec![0, 1, 2]);
}

#[tokio::test]
async fn threads_do_not_share_history() {
    let store = InMemoryCheckpointStore::new();
    let state_a = WorkflowState::new("a", "question a", 3);
    let state_b = WorkflowState::new("b", "question b", 3);
    store.put("a", 0, &state_a).await.unwrap();
    store.put("b", 0, &state_b).await.unwrap();

    let (_, latest_a) = store.get_latest("a").await.unwrap().unwrap();
    let (_, latest_b) = store.get_latest("b").await.unwrap().unwrap();
    assert_eq!(latest_a.user_query, "question a");
    assert_eq!(latest_b.user_query, "question b");
}

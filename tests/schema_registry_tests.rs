//! Discovery against a real local-file source, plus the TTL/refresh-locking
//! contract (§4.2).

use std::fs;
use std::sync::Arc;

use nl2sql_workflow::executor::engine::default_engine;
use nl2sql_workflow::schema::{DataSource, SchemaRegistry};

fn temp_data_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("nl2sql-registry-test-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create temp data dir");
    fs::write(
        dir.join("orders.csv"),
        "order_id,amount,region\n1,10.5,west\n2,20.0,east\n3,5.25,west\n",
    )
    .expect("write fixture csv");
    dir
}

#[tokio::test]
async fn discovers_local_file_table_with_columns() {
    let dir = temp_data_dir("discover");
    let engine = Arc::new(default_engine(dir.clone()));
    let registry = SchemaRegistry::new(engine, vec![DataSource::local(dir.to_string_lossy().to_string(), "*.csv")], 300);

    let state = registry.get_schema(true).await;
    let table = state.get_table("orders").expect("orders table discovered");
    assert!(table.has_column_ci("amount"));
    assert!(table.has_column_ci("REGION"));
    assert_eq!(table.row_count, Some(3));

    fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn disabled_source_is_never_discovered() {
    let dir = temp_data_dir("disabled");
    let engine = Arc::new(default_engine(dir.clone()));
    let mut source = DataSource::local(dir.to_string_lossy().to_string(), "*.csv");
    source.enabled = false;
    let registry = SchemaRegistry::new(engine, vec![source], 300);

    let state = registry.get_schema(true).await;
    assert!(state.tables.is_empty());

    fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn a_fresh_refresh_is_not_repeated_until_ttl_expires() {
    let dir = temp_data_dir("ttl");
    let engine = Arc::new(default_engine(dir.clone()));
    let registry = SchemaRegistry::new(engine, vec![DataSource::local(dir.to_string_lossy().to_string(), "*.csv")], 300);

    let first = registry.get_schema(false).await;
    let first_refresh = first.last_refresh;

    // Remove the fixture so a second, unwanted refresh would be observable.
    fs::remove_dir_all(&dir).ok();

    let second = registry.get_schema(false).await;
    assert_eq!(second.last_refresh, first_refresh);
    assert!(second.get_table("orders").is_some());
}

#[tokio::test]
async fn concurrent_get_schema_calls_do_not_duplicate_refresh_work() {
    let dir = temp_data_dir("concurrent");
    let engine = Arc::new(default_engine(dir.clone()));
    let registry = Arc::new(SchemaRegistry::new(
        engine,
        vec![DataSource::local(dir.to_string_lossy().to_string(), "*.csv")],
        300,
    ));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move { registry.get_schema(true).await }));
    }
    for handle in handles {
        let state = handle.await.unwrap();
        assert!(state.get_table("orders").is_some());
    }

    fs::remove_dir_all(&dir).ok();
}

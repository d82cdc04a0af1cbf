//! The schema registry: a TTL-cached, thread-safe, cross-source name→schema
//! map (§4.2). Reads go through a shared lock; refreshes are serialized by a
//! dedicated lock so a slow refresh never blocks readers, and the new
//! snapshot is installed with a single atomic swap so no reader ever
//! observes a partially-built map.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use super::discovery::discover_source;
use super::types::{DataSource, RegistryState, TableSchema};
use crate::executor::engine::AnalyticEngine;

pub struct SchemaRegistry {
    engine: Arc<dyn AnalyticEngine>,
    sources: RwLock<Vec<DataSource>>,
    state: RwLock<RegistryState>,
    refresh_lock: Mutex<()>,
    ttl_seconds: u64,
}

impl SchemaRegistry {
    pub fn new(engine: Arc<dyn AnalyticEngine>, sources: Vec<DataSource>, ttl_seconds: u64) -> Self {
        Self {
            engine,
            sources: RwLock::new(sources),
            state: RwLock::new(RegistryState::default()),
            refresh_lock: Mutex::new(()),
            ttl_seconds,
        }
    }

    /// Build a registry pre-populated with a fixed snapshot, bypassing
    /// discovery entirely. Used by tests and by any caller that already has
    /// a `RegistryState` from elsewhere (e.g. a warm-started snapshot).
    pub fn from_state(engine: Arc<dyn AnalyticEngine>, state: RegistryState, ttl_seconds: u64) -> Self {
        Self {
            engine,
            sources: RwLock::new(Vec::new()),
            state: RwLock::new(state),
            refresh_lock: Mutex::new(()),
            ttl_seconds,
        }
    }

    pub async fn add_source(&self, source: DataSource) {
        self.sources.write().await.push(source);
        // Marking the registry stale is implicit: the next `get_schema` call
        // will see an (unchanged) `last_refresh` from before this source was
        // added and a caller that wants it picked up immediately should pass
        // `force_refresh = true`.
    }

    pub async fn get_schema(&self, force_refresh: bool) -> RegistryState {
        let stale = {
            let state = self.state.read().await;
            force_refresh || state.is_stale(self.ttl_seconds)
        };
        if stale {
            self.refresh().await;
        }
        self.state.read().await.clone()
    }

    pub async fn get_table(&self, name: &str) -> Option<TableSchema> {
        self.state.read().await.get_table(name).cloned()
    }

    pub async fn get_valid_tables(&self) -> Vec<String> {
        self.state.read().await.table_names()
    }

    pub async fn get_valid_columns(&self, table: &str) -> Vec<String> {
        self.state
            .read()
            .await
            .get_table(table)
            .map(|t| t.columns.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Find columns whose name contains `keyword` (case-insensitive) across
    /// every known table. Backs the schema-discovery agent's `search_columns`
    /// tool.
    pub async fn search_columns(&self, keyword: &str) -> Vec<(String, String, String)> {
        let keyword = keyword.to_lowercase();
        let state = self.state.read().await;
        let mut matches = Vec::new();
        for table in state.tables.values() {
            for column in &table.columns {
                if column.name.to_lowercase().contains(&keyword) {
                    matches.push((table.name.clone(), column.name.clone(), column.data_type.clone()));
                }
            }
        }
        matches
    }

    /// Refresh is serialized by `refresh_lock`; if a refresh is already
    /// under way this call waits for it rather than running a second one
    /// concurrently, then returns the (now-current) state.
    pub async fn refresh(&self) -> RegistryState {
        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited for the lock.
        {
            let state = self.state.read().await;
            if !state.is_stale(self.ttl_seconds) {
                return state.clone();
            }
        }

        let sources: Vec<DataSource> = self.sources.read().await.clone();
        let mut tables = std::collections::HashMap::new();
        let mut source_stats = std::collections::HashMap::new();

        for source in sources.iter().filter(|s| s.enabled) {
            let discovered = discover_source(&self.engine, source);
            if discovered.is_empty() {
                warn!(source = %source.path, "discovery produced no tables");
            }
            *source_stats
                .entry(format!("{:?}", source.source_type))
                .or_insert(0usize) += discovered.len();
            for table in discovered {
                tables.insert(table.name.clone(), table);
            }
        }

        let new_state = RegistryState {
            tables,
            last_refresh: Some(Utc::now()),
            source_stats,
        };
        info!(tables = new_state.tables.len(), "schema registry refreshed");

        // Atomic swap: readers see either the fully-old or fully-new state,
        // never a partial one.
        *self.state.write().await = new_state.clone();
        new_state
    }

    /// Format a bounded, LLM-and-human-readable schema description: a
    /// tabular header per table with up to 3 sample values per column and
    /// any detected date range, truncated to `max_tables` tables.
    pub async fn get_schema_context(&self, max_tables: usize) -> String {
        let state = self.state.read().await;
        let mut names = state.table_names();
        names.truncate(max_tables);
        Self::format_tables(&state, &names)
    }

    /// Same formatting, restricted to an explicit table list. Used by
    /// schema discovery to build `refined_schema_context` once it has
    /// decided which tables matter for a question.
    pub async fn get_schema_context_for(&self, tables: &[String]) -> String {
        let state = self.state.read().await;
        Self::format_tables(&state, tables)
    }

    fn format_tables(state: &RegistryState, names: &[String]) -> String {
        let total = state.tables.len();
        let mut out = String::new();
        for name in names {
            let Some(table) = state.get_table(name) else { continue };
            out.push_str(&format!("### {}\n", table.name));
            for column in &table.columns {
                let samples = if column.sample_values.is_empty() {
                    String::new()
                } else {
                    format!(" (e.g. {})", column.sample_values.join(", "))
                };
                out.push_str(&format!(
                    "- {} {}{}{}\n",
                    column.name,
                    column.data_type,
                    if column.nullable { " NULL" } else { " NOT NULL" },
                    samples
                ));
            }
            if let (Some(col), Some(start), Some(end)) =
                (&table.date_column, &table.date_range_start, &table.date_range_end)
            {
                out.push_str(&format!("  date range on {col}: {start} .. {end}\n"));
            }
            if let Some(rows) = table.row_count {
                out.push_str(&format!("  ~{rows} rows\n"));
            }
            out.push('\n');
        }
        if total > names.len() {
            out.push_str(&format!("... and {} more tables not shown\n", total - names.len()));
        }
        out
    }
}

//! Data model for the schema registry: §3 `TableSchema`, `DataSource`,
//! `RegistryState`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    LocalFile,
    ObjectStore,
    Relational,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    pub source_type: SourceType,
    pub path: String,
    pub file_pattern: String,
    pub enabled: bool,
}

impl DataSource {
    pub fn local(path: impl Into<String>, file_pattern: impl Into<String>) -> Self {
        Self {
            source_type: SourceType::LocalFile,
            path: path.into(),
            file_pattern: file_pattern.into(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub sample_values: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub source_type: SourceType,
    pub source_path: String,
    pub columns: Vec<ColumnSchema>,
    pub row_count: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
    pub file_format: Option<String>,
    pub date_column: Option<String>,
    pub date_range_start: Option<String>,
    pub date_range_end: Option<String>,
}

impl TableSchema {
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column_ci(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// A snapshot of the registry's discovered tables, plus bookkeeping used to
/// decide staleness and to report per-source-type discovery counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryState {
    pub tables: HashMap<String, TableSchema>,
    pub last_refresh: Option<DateTime<Utc>>,
    pub source_stats: HashMap<String, usize>,
}

impl RegistryState {
    pub fn is_stale(&self, ttl_seconds: u64) -> bool {
        match self.last_refresh {
            None => true,
            Some(ts) => {
                let age = Utc::now().signed_duration_since(ts);
                age.num_seconds() as u64 >= ttl_seconds
            }
        }
    }

    pub fn get_table(&self, name: &str) -> Option<&TableSchema> {
        self.tables
            .values()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }
}

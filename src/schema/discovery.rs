//! Per-source-type discovery: introspect columns, gather sample values, and
//! detect date ranges for a single `DataSource`. A failure discovering one
//! source must not abort the whole refresh — callers log and omit it.

use std::sync::Arc;

use tracing::warn;

use super::types::{ColumnSchema, DataSource, SourceType, TableSchema};
use crate::executor::engine::AnalyticEngine;
use crate::error::Result;

const SAMPLE_VALUES_PER_COLUMN: usize = 3;

/// Discover every table exposed by one data source, registering local/
/// object-store tables with the engine under their logical (file-stem) name
/// so SQL stays free of physical paths.
pub fn discover_source(engine: &Arc<dyn AnalyticEngine>, source: &DataSource) -> Vec<TableSchema> {
    match source.source_type {
        SourceType::LocalFile | SourceType::ObjectStore => discover_file_source(engine, source),
        SourceType::Relational => discover_relational_source(engine, source),
    }
}

fn discover_file_source(engine: &Arc<dyn AnalyticEngine>, source: &DataSource) -> Vec<TableSchema> {
    let path = std::path::Path::new(&source.path);
    let files = crate::executor::engine::PolarsEngine::discover_files(path, &source.file_pattern);
    let mut tables = Vec::new();

    for file in files {
        let Some(stem) = file.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let logical_name = stem.to_string();
        let source_path = file.to_string_lossy().to_string();

        if let Err(err) = engine.register_view(&logical_name, &source_path) {
            warn!(table = %logical_name, error = %err, "failed to register discovered table");
            continue;
        }

        match describe_table(engine, &logical_name, source.source_type, &source_path, &file) {
            Ok(schema) => tables.push(schema),
            Err(err) => warn!(table = %logical_name, error = %err, "schema discovery failed"),
        }
    }
    tables
}

fn describe_table(
    engine: &Arc<dyn AnalyticEngine>,
    logical_name: &str,
    source_type: SourceType,
    source_path: &str,
    file: &std::path::Path,
) -> Result<TableSchema> {
    let columns_info = engine.describe(logical_name)?;
    let row_count = engine.row_count(logical_name).ok();

    let mut columns = Vec::with_capacity(columns_info.len());
    let mut date_column = None;
    let mut date_range_start = None;
    let mut date_range_end = None;

    for (idx, info) in columns_info.iter().enumerate() {
        let sample_values = if idx < 5 {
            engine
                .sample_values(logical_name, &info.name, SAMPLE_VALUES_PER_COLUMN)
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        let is_date_like = info.data_type.to_lowercase().contains("date") || info.data_type.to_lowercase().contains("time");
        if is_date_like && date_column.is_none() {
            if let Ok((min, max)) = engine.date_range(logical_name, &info.name) {
                date_column = Some(info.name.clone());
                date_range_start = min;
                date_range_end = max;
            }
        }

        columns.push(ColumnSchema {
            name: info.name.clone(),
            data_type: info.data_type.clone(),
            nullable: info.nullable,
            sample_values,
        });
    }

    let file_format = file
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase());

    Ok(TableSchema {
        name: logical_name.to_string(),
        source_type,
        source_path: source_path.to_string(),
        columns,
        row_count,
        last_modified: std::fs::metadata(file)
            .and_then(|m| m.modified())
            .ok()
            .map(chrono::DateTime::<chrono::Utc>::from),
        file_format,
        date_column,
        date_range_start,
        date_range_end,
    })
}

/// `information_schema`-backed discovery for relational sources. The engine
/// is expected to expose `information_schema.tables` /
/// `information_schema.columns` the way a real RDBMS would; callers that
/// wire a relational engine in supply that through the same `AnalyticEngine`
/// trait used for local files.
fn discover_relational_source(engine: &Arc<dyn AnalyticEngine>, source: &DataSource) -> Vec<TableSchema> {
    let query = "SELECT table_name FROM information_schema.tables";
    let result = match engine.execute(query) {
        Ok(r) => r,
        Err(err) => {
            warn!(source = %source.path, error = %err, "relational discovery failed");
            return Vec::new();
        }
    };

    let mut tables = Vec::new();
    for row in result.rows {
        let Some(name) = row.get("table_name").and_then(|v| v.as_str()) else {
            continue;
        };
        match engine.describe(name) {
            Ok(columns_info) => {
                let columns = columns_info
                    .into_iter()
                    .map(|info| ColumnSchema {
                        name: info.name,
                        data_type: info.data_type,
                        nullable: info.nullable,
                        sample_values: Vec::new(),
                    })
                    .collect();
                tables.push(TableSchema {
                    name: name.to_string(),
                    source_type: SourceType::Relational,
                    source_path: source.path.clone(),
                    columns,
                    row_count: engine.row_count(name).ok(),
                    last_modified: None,
                    file_format: None,
                    date_column: None,
                    date_range_start: None,
                    date_range_end: None,
                });
            }
            Err(err) => warn!(table = %name, error = %err, "failed to describe relational table"),
        }
    }
    tables
}

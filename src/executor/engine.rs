//! The analytic engine contract (§6) and its Polars-backed implementation.
//!
//! Local/object-store tables are exposed to SQL as named views over lazily
//! scanned CSV/Parquet frames; queries run through `polars::sql::SQLContext`
//! so the executor and the schema registry's discovery pass share one code
//! path for "run SQL against whatever is registered".

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use dashmap::DashMap;
use polars::prelude::*;
use polars::sql::SQLContext;
use serde_json::{Map, Number, Value};

use crate::error::{Result, WorkflowError};
use crate::state::ResultRow;

#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

#[derive(Debug, Clone)]
pub struct EngineQueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<ResultRow>,
    pub row_count: u64,
}

/// What the rest of the crate requires from a columnar analytic engine.
/// Matches the external interface described for the analytic engine
/// collaborator: execute, describe, register_view, set_config.
pub trait AnalyticEngine: Send + Sync {
    fn execute(&self, sql: &str) -> Result<EngineQueryResult>;
    fn describe(&self, table_ref: &str) -> Result<Vec<ColumnInfo>>;
    fn register_view(&self, name: &str, source_path: &str) -> Result<()>;
    fn set_config(&self, key: &str, value: &str);
    fn sample_values(&self, table_ref: &str, column: &str, limit: usize) -> Result<Vec<String>>;
    fn date_range(&self, table_ref: &str, column: &str) -> Result<(Option<String>, Option<String>)>;
    fn row_count(&self, table_ref: &str) -> Result<u64>;
}

pub struct PolarsEngine {
    data_dir: PathBuf,
    views: DashMap<String, LazyFrame>,
    config: DashMap<String, String>,
}

impl PolarsEngine {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            views: DashMap::new(),
            config: DashMap::new(),
        }
    }

    fn scan_path(path: &Path) -> Result<LazyFrame> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "parquet" => Ok(LazyFrame::scan_parquet(path, ScanArgsParquet::default())?),
            _ => Ok(LazyCsvReader::new(path)
                .with_try_parse_dates(true)
                .with_infer_schema_length(Some(1000))
                .finish()?),
        }
    }

    fn resolve(&self, table_ref: &str) -> Result<LazyFrame> {
        if let Some(lf) = self.views.get(table_ref) {
            return Ok(lf.clone());
        }
        let path = self.data_dir.join(table_ref);
        Self::scan_path(&path)
    }

    /// Enumerate files under `path` matching a simple glob-style
    /// `file_pattern` (only `*` is treated specially, matching the suffix
    /// after the last `*`).
    pub fn discover_files(path: &Path, file_pattern: &str) -> Vec<PathBuf> {
        let mut out = Vec::new();
        let Ok(entries) = std::fs::read_dir(path) else {
            return out;
        };
        let suffix = file_pattern.rsplit('*').next().unwrap_or("");
        for entry in entries.flatten() {
            let p = entry.path();
            if p.is_file() {
                if let Some(name) = p.file_name().and_then(|n| n.to_str()) {
                    if suffix.is_empty() || name.ends_with(suffix) {
                        out.push(p);
                    }
                }
            }
        }
        out
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl AnalyticEngine for PolarsEngine {
    fn execute(&self, sql: &str) -> Result<EngineQueryResult> {
        let mut ctx = SQLContext::new();
        for entry in self.views.iter() {
            ctx.register(entry.key(), entry.value().clone());
        }
        let df = ctx
            .execute(sql)
            .and_then(|lf| lf.collect())
            .map_err(WorkflowError::from)?;
        dataframe_to_result(&df)
    }

    fn describe(&self, table_ref: &str) -> Result<Vec<ColumnInfo>> {
        let lf = self.resolve(table_ref)?;
        let schema = lf.clone().schema()?;
        let df = lf.clone().limit(2000).collect()?;
        let mut out = Vec::with_capacity(schema.len());
        for (name, dtype) in schema.iter() {
            let nullable = df
                .column(name.as_str())
                .map(|s| s.null_count() > 0)
                .unwrap_or(true);
            out.push(ColumnInfo {
                name: name.to_string(),
                data_type: dtype.to_string(),
                nullable,
            });
        }
        Ok(out)
    }

    fn register_view(&self, name: &str, source_path: &str) -> Result<()> {
        let lf = Self::scan_path(Path::new(source_path))?;
        self.views.insert(name.to_string(), lf);
        Ok(())
    }

    fn set_config(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    fn sample_values(&self, table_ref: &str, column: &str, limit: usize) -> Result<Vec<String>> {
        let lf = self.resolve(table_ref)?;
        let df = lf
            .select([col(column)])
            .unique(None, UniqueKeepStrategy::First)
            .limit(limit as u32)
            .collect()?;
        let series = df.column(column)?;
        let mut values = Vec::with_capacity(series.len());
        for idx in 0..series.len() {
            let v = series.get(idx).map_err(WorkflowError::from)?;
            values.push(format!("{v}"));
        }
        Ok(values)
    }

    fn date_range(&self, table_ref: &str, column: &str) -> Result<(Option<String>, Option<String>)> {
        let lf = self.resolve(table_ref)?;
        let df = lf
            .select([col(column).min().alias("__min"), col(column).max().alias("__max")])
            .collect()?;
        let min = df
            .column("__min")
            .ok()
            .and_then(|s| s.get(0).ok())
            .map(|v| v.to_string());
        let max = df
            .column("__max")
            .ok()
            .and_then(|s| s.get(0).ok())
            .map(|v| v.to_string());
        Ok((min, max))
    }

    fn row_count(&self, table_ref: &str) -> Result<u64> {
        let lf = self.resolve(table_ref)?;
        let df = lf.select([len().alias("__n")]).collect()?;
        let n = df
            .column("__n")
            .ok()
            .and_then(|s| s.u32().ok().and_then(|a| a.get(0)))
            .unwrap_or(0);
        Ok(n as u64)
    }
}

fn dataframe_to_result(df: &DataFrame) -> Result<EngineQueryResult> {
    let columns: Vec<String> = df.get_column_names_str().into_iter().map(String::from).collect();
    let mut rows = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let mut row: Map<String, Value> = Map::new();
        for name in &columns {
            let series = df.column(name)?;
            let av = series.get(idx).map_err(WorkflowError::from)?;
            row.insert(name.clone(), any_value_to_json(&av));
        }
        rows.push(row);
    }
    Ok(EngineQueryResult {
        row_count: rows.len() as u64,
        columns,
        rows,
    })
}

/// Coerce a Polars scalar to a JSON-safe value: NaN/Inf become null, dates
/// become ISO-8601 strings, everything else becomes its primitive.
pub fn any_value_to_json(value: &AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(*b),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Int8(v) => Value::from(*v),
        AnyValue::Int16(v) => Value::from(*v),
        AnyValue::Int32(v) => Value::from(*v),
        AnyValue::Int64(v) => Value::from(*v),
        AnyValue::UInt8(v) => Value::from(*v),
        AnyValue::UInt16(v) => Value::from(*v),
        AnyValue::UInt32(v) => Value::from(*v),
        AnyValue::UInt64(v) => Value::from(*v),
        AnyValue::Float32(v) => Number::from_f64(*v as f64).map(Value::Number).unwrap_or(Value::Null),
        AnyValue::Float64(v) => Number::from_f64(*v).map(Value::Number).unwrap_or(Value::Null),
        AnyValue::Date(_) | AnyValue::Datetime(..) | AnyValue::DatetimeOwned(..) => {
            Value::String(value.to_string())
        }
        other => Value::String(other.to_string()),
    }
}

/// A no-op engine config key used by the demo CLI/tests when no real data
/// directory is present yet.
pub fn default_engine(data_dir: impl Into<PathBuf>) -> PolarsEngine {
    let engine = PolarsEngine::new(data_dir);
    engine.set_config("threads", &num_cpus_hint().to_string());
    engine
}

fn num_cpus_hint() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

pub type SharedColumns = HashMap<String, Vec<String>>;

//! Crate-wide error taxonomy.
//!
//! Recoverable, data-dependent failures (a bad SQL string, a missing table)
//! never reach this type — they become fields on a `WorkflowState` patch
//! instead. `WorkflowError` is reserved for the infrastructural failures the
//! graph runtime treats as fatal: I/O, parser panics, a checkpoint store that
//! is unreachable, an LLM provider that cannot be reached at all.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("schema registry error: {0}")]
    Schema(String),

    #[error("validator error: {0}")]
    Validation(String),

    #[error("executor error: {0}")]
    Execution(String),

    #[error("LLM provider error: {0}")]
    Llm(String),

    #[error("graph runtime error: {0}")]
    Graph(String),

    #[error("checkpoint store error: {0}")]
    Checkpoint(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("recursion bound exceeded: {0}")]
    Recursion(String),

    #[error("run canceled")]
    Canceled,

    #[error("pool saturated: {0}")]
    Backpressure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQL parse error: {0}")]
    SqlParse(#[from] sqlparser::parser::ParserError),

    #[error("polars error: {0}")]
    Polars(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("database error: {0}")]
    Database(String),
}

impl From<polars::error::PolarsError> for WorkflowError {
    fn from(err: polars::error::PolarsError) -> Self {
        WorkflowError::Polars(err.to_string())
    }
}

impl From<sqlx::Error> for WorkflowError {
    fn from(err: sqlx::Error) -> Self {
        WorkflowError::Database(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WorkflowError>;

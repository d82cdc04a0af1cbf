//! Engine error classification: a fixed taxonomy plus an ordered,
//! pattern-matched classifier over the engine's message text. Order matters —
//! column-not-found is checked before table-not-found to avoid a column name
//! that happens to look like a table name stealing the match.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SyntaxError,
    TableNotFound,
    ColumnNotFound,
    TypeMismatch,
    DivisionByZero,
    OutOfMemory,
    IoError,
    Timeout,
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::SyntaxError => "syntax_error",
            ErrorKind::TableNotFound => "table_not_found",
            ErrorKind::ColumnNotFound => "column_not_found",
            ErrorKind::TypeMismatch => "type_mismatch",
            ErrorKind::DivisionByZero => "division_by_zero",
            ErrorKind::OutOfMemory => "out_of_memory",
            ErrorKind::IoError => "io_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Retrying the same SQL against the same schema context is plausibly
/// useful for these kinds; the graph runtime does not act on this directly
/// (the executor never re-enters the validator/generator loop — see the
/// executor module's own doc comment) but the classification still records
/// it for callers that want to trigger an out-of-band registry refresh.
impl ErrorKind {
    pub fn suggests_retry(self) -> bool {
        matches!(
            self,
            ErrorKind::TableNotFound | ErrorKind::ColumnNotFound | ErrorKind::SyntaxError | ErrorKind::Timeout
        )
    }
}

/// Classify a lowercased engine error message into one of the fixed kinds.
/// Checked in order: division-by-zero and out-of-memory first (most
/// specific), then syntax, type, io, column, table, defaulting to unknown.
pub fn classify_error(message: &str) -> ErrorKind {
    let m = message.to_lowercase();

    if m.contains("division by zero") || m.contains("divide by zero") {
        return ErrorKind::DivisionByZero;
    }
    if m.contains("out of memory") || m.contains("memory limit") {
        return ErrorKind::OutOfMemory;
    }
    if m.contains("timed out") || m.contains("timeout") {
        return ErrorKind::Timeout;
    }
    if m.contains("syntax error") || m.contains("parser error") || m.contains("parse error") {
        return ErrorKind::SyntaxError;
    }
    if m.contains("type mismatch") || m.contains("cannot cast") || m.contains("conversion failed") || m.contains("type error") {
        return ErrorKind::TypeMismatch;
    }
    if m.contains("i/o error")
        || m.contains("io error")
        || m.contains("could not read")
        || m.contains("file not found")
        || m.contains("s3")
        || m.contains("http")
    {
        return ErrorKind::IoError;
    }
    // Column patterns are checked before table patterns: a message like
    // "column 'x' not found in table 'y'" must not be mistaken for a
    // missing table.
    if m.contains("unknown column")
        || (m.contains("column") && (m.contains("not found") || m.contains("does not exist")))
    {
        return ErrorKind::ColumnNotFound;
    }
    if m.contains("no such table")
        || m.contains("table with name")
        || (m.contains("table") && (m.contains("not found") || m.contains("does not exist")))
    {
        return ErrorKind::TableNotFound;
    }
    ErrorKind::Unknown
}

/// Turn a classified error into an actionable, user-facing string. Never
/// includes the raw engine message — only `classify_error` sees that text.
pub fn format_error_for_llm(kind: ErrorKind) -> String {
    let suggestion = match kind {
        ErrorKind::SyntaxError => "Check for missing commas, unclosed quotes, or invalid keywords.",
        ErrorKind::TableNotFound => "Verify the table name against the available schema.",
        ErrorKind::ColumnNotFound => "Verify the column name against the table's schema.",
        ErrorKind::TypeMismatch => "Check that compared or cast values share a compatible type.",
        ErrorKind::DivisionByZero => "Add a guard for zero values in the denominator.",
        ErrorKind::OutOfMemory => "Add more restrictive WHERE filters or reduce the LIMIT.",
        ErrorKind::IoError => "The underlying data file could not be read; verify the source path.",
        ErrorKind::Timeout => "Narrow the query's filters or reduce the requested row count.",
        ErrorKind::Unknown => "Review the query for correctness.",
    };
    format!("Query failed ({kind}): {suggestion}")
}

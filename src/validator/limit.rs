//! Step 8 of the validator pipeline: append a default LIMIT when absent,
//! clamp an oversized one.

use sqlparser::ast::{Expr, Query, Value};

pub enum LimitOutcome {
    Unchanged,
    Appended,
    Clamped,
}

pub fn enforce_limit(query: &mut Query, default_limit: u64, max_limit: u64) -> LimitOutcome {
    match &query.limit {
        None => {
            query.limit = Some(Expr::Value(Value::Number(default_limit.to_string(), false)));
            LimitOutcome::Appended
        }
        Some(Expr::Value(Value::Number(raw, _))) => match raw.parse::<u64>() {
            Ok(n) if n > max_limit => {
                query.limit = Some(Expr::Value(Value::Number(max_limit.to_string(), false)));
                LimitOutcome::Clamped
            }
            _ => LimitOutcome::Unchanged,
        },
        Some(_) => LimitOutcome::Unchanged,
    }
}

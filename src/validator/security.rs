//! Step 4/5 of the validator pipeline: reject non-read-only statements by
//! AST shape, then defend against parser quirks with a word-boundary scan
//! of the raw text, then require the root to be a SELECT-family query.

use lazy_static::lazy_static;
use regex::Regex;
use sqlparser::ast::{SetExpr, SetOperator, Statement};

const DANGEROUS_KEYWORDS: &[&str] = &[
    "DROP", "DELETE", "INSERT", "UPDATE", "ALTER", "CREATE", "TRUNCATE", "MERGE", "GRANT", "REVOKE", "EXECUTE",
    "ATTACH", "DETACH", "COPY", "EXPORT",
];

lazy_static! {
    static ref KEYWORD_SCAN: Regex = {
        let alternation = DANGEROUS_KEYWORDS.join("|");
        Regex::new(&format!(r"(?i)\b({alternation})\b")).expect("dangerous-keyword regex is a compile-time literal")
    };
}

/// AST-level check: the parsed statement's top-level node must not be a
/// write/DDL/admin statement.
pub fn check_statement_kind(stmt: &Statement) -> Option<String> {
    let offending = match stmt {
        Statement::Drop { .. } => Some("DROP"),
        Statement::Delete { .. } => Some("DELETE"),
        Statement::Insert { .. } => Some("INSERT"),
        Statement::Update { .. } => Some("UPDATE"),
        Statement::AlterTable { .. } | Statement::AlterIndex { .. } => Some("ALTER"),
        Statement::CreateTable { .. } | Statement::CreateView { .. } | Statement::CreateIndex { .. } => Some("CREATE"),
        Statement::Truncate { .. } => Some("TRUNCATE"),
        Statement::Merge { .. } => Some("MERGE"),
        Statement::Grant { .. } => Some("GRANT"),
        Statement::Revoke { .. } => Some("REVOKE"),
        Statement::ExplainTable { .. } => None,
        Statement::Execute { .. } => Some("EXECUTE"),
        _ => None,
    };
    offending.map(|kw| format!("Blocked: query contains a disallowed {kw} statement"))
}

/// Text-level defense against AST parser quirks: scan the raw source for
/// the same dangerous keyword set as standalone words.
pub fn scan_for_dangerous_keywords(sql: &str) -> Option<String> {
    KEYWORD_SCAN
        .find(sql)
        .map(|m| format!("Blocked: query text contains disallowed keyword '{}'", m.as_str().to_uppercase()))
}

/// The query's root must be a SELECT, a set operation over SELECTs
/// (UNION/INTERSECT/EXCEPT), or a WITH clause wrapping one of those.
pub fn is_select_family(stmt: &Statement) -> bool {
    match stmt {
        Statement::Query(query) => set_expr_is_select_family(&query.body),
        _ => false,
    }
}

fn set_expr_is_select_family(expr: &SetExpr) -> bool {
    match expr {
        SetExpr::Select(_) | SetExpr::Values(_) => matches!(expr, SetExpr::Select(_)),
        SetExpr::SetOperation { op, left, right, .. } => {
            matches!(op, SetOperator::Union | SetOperator::Intersect | SetOperator::Except)
                && set_expr_is_select_family(left)
                && set_expr_is_select_family(right)
        }
        SetExpr::Query(inner) => set_expr_is_select_family(&inner.body),
        _ => false,
    }
}

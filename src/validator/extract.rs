//! Best-effort extraction of table and column references from a parsed
//! query, used by the table-existence and column-existence checks. Covers
//! the expression shapes that show up in generated analytic SQL (binary
//! comparisons, functions, CASE, BETWEEN, IN-lists); exotic expression
//! shapes are skipped rather than causing a panic.

use std::collections::HashSet;

use sqlparser::ast::{
    Expr, FunctionArg, FunctionArgExpr, FunctionArguments, Query, Select, SelectItem, SetExpr, TableFactor,
};

#[derive(Debug, Default)]
pub struct QueryRefs {
    pub tables: Vec<String>,
    pub cte_names: HashSet<String>,
    pub projection_aliases: HashSet<String>,
    pub columns: Vec<String>,
}

pub fn extract_refs(query: &Query) -> QueryRefs {
    let mut refs = QueryRefs::default();
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            refs.cte_names.insert(cte.alias.name.value.clone());
        }
    }
    walk_set_expr(&query.body, &mut refs);
    for ob in &query.order_by {
        walk_expr(&ob.expr, &mut refs.columns);
    }
    refs
}

fn walk_set_expr(expr: &SetExpr, refs: &mut QueryRefs) {
    match expr {
        SetExpr::Select(select) => walk_select(select, refs),
        SetExpr::SetOperation { left, right, .. } => {
            walk_set_expr(left, refs);
            walk_set_expr(right, refs);
        }
        SetExpr::Query(inner) => {
            if let Some(with) = &inner.with {
                for cte in &with.cte_tables {
                    refs.cte_names.insert(cte.alias.name.value.clone());
                }
            }
            walk_set_expr(&inner.body, refs);
        }
        _ => {}
    }
}

fn walk_select(select: &Select, refs: &mut QueryRefs) {
    for twj in &select.from {
        walk_table_factor(&twj.relation, refs);
        for join in &twj.joins {
            walk_table_factor(&join.relation, refs);
        }
    }
    for item in &select.projection {
        match item {
            SelectItem::UnnamedExpr(e) => walk_expr(e, &mut refs.columns),
            SelectItem::ExprWithAlias { expr, alias } => {
                refs.projection_aliases.insert(alias.value.clone());
                walk_expr(expr, &mut refs.columns);
            }
            SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(_, _) => {}
        }
    }
    if let Some(selection) = &select.selection {
        walk_expr(selection, &mut refs.columns);
    }
    for expr in &select.group_by_exprs() {
        walk_expr(expr, &mut refs.columns);
    }
    if let Some(having) = &select.having {
        walk_expr(having, &mut refs.columns);
    }
}

fn walk_table_factor(factor: &TableFactor, refs: &mut QueryRefs) {
    match factor {
        TableFactor::Table { name, .. } => {
            if let Some(ident) = name.0.last() {
                refs.tables.push(ident.value.clone());
            }
        }
        TableFactor::Derived { subquery, .. } => {
            walk_set_expr(&subquery.body, refs);
        }
        TableFactor::NestedJoin { table_with_joins, .. } => {
            walk_table_factor(&table_with_joins.relation, refs);
            for join in &table_with_joins.joins {
                walk_table_factor(&join.relation, refs);
            }
        }
        _ => {}
    }
}

fn walk_expr(expr: &Expr, out: &mut Vec<String>) {
    match expr {
        Expr::Identifier(ident) => out.push(ident.value.clone()),
        Expr::CompoundIdentifier(parts) => {
            if let Some(last) = parts.last() {
                out.push(last.value.clone());
            }
        }
        Expr::BinaryOp { left, right, .. } => {
            walk_expr(left, out);
            walk_expr(right, out);
        }
        Expr::UnaryOp { expr, .. } | Expr::Nested(expr) | Expr::IsNull(expr) | Expr::IsNotNull(expr) => {
            walk_expr(expr, out);
        }
        Expr::Between { expr, low, high, .. } => {
            walk_expr(expr, out);
            walk_expr(low, out);
            walk_expr(high, out);
        }
        Expr::InList { expr, list, .. } => {
            walk_expr(expr, out);
            for item in list {
                walk_expr(item, out);
            }
        }
        Expr::Cast { expr, .. } | Expr::TryCast { expr, .. } => walk_expr(expr, out),
        Expr::Case {
            operand,
            conditions,
            results,
            else_result,
        } => {
            if let Some(o) = operand {
                walk_expr(o, out);
            }
            for c in conditions {
                walk_expr(c, out);
            }
            for r in results {
                walk_expr(r, out);
            }
            if let Some(e) = else_result {
                walk_expr(e, out);
            }
        }
        Expr::Function(func) => {
            if let FunctionArguments::List(args) = &func.args {
                for arg in &args.args {
                    walk_function_arg(arg, out);
                }
            }
        }
        _ => {}
    }
}

fn walk_function_arg(arg: &FunctionArg, out: &mut Vec<String>) {
    let expr = match arg {
        FunctionArg::Named { arg, .. } | FunctionArg::Unnamed(arg) => arg,
    };
    if let FunctionArgExpr::Expr(e) = expr {
        walk_expr(e, out);
    }
}

/// A small compatibility shim: different sqlparser versions expose GROUP BY
/// either as `Vec<Expr>` or a `GroupByExpr` enum wrapping one. This crate
/// pins a version exposing the enum form; normalize to a plain slice here so
/// the walker above doesn't need to know which.
trait GroupByExprs {
    fn group_by_exprs(&self) -> Vec<Expr>;
}

impl GroupByExprs for Select {
    fn group_by_exprs(&self) -> Vec<Expr> {
        use sqlparser::ast::GroupByExpr;
        match &self.group_by {
            GroupByExpr::All => Vec::new(),
            GroupByExpr::Expressions(exprs) => exprs.clone(),
        }
    }
}

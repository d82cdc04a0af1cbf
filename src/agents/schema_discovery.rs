//! Schema discovery shim: a bounded tool-using loop that narrows the full
//! schema down to the tables relevant to the user's question.
//!
//! The model is handed three tools backed directly by the registry —
//! `list_tables`, `get_table_schema(table_names)`, `search_columns(keyword)` —
//! and may call them for up to `max_tool_iterations` turns. The loop ends as
//! soon as the model stops requesting tools (or the iteration budget runs
//! out); if no tool was ever called, the node falls back to the full schema
//! context rather than starving the generator.

use std::sync::Arc;

use serde_json::json;

use super::prompts::{schema_discovery_user_prompt, SCHEMA_DISCOVERY_SYSTEM};
use crate::llm::{ChatMessage, LlmProvider, ToolCall, ToolDefinition, ToolTurn};
use crate::schema::SchemaRegistry;
use crate::state::{StatePatch, WorkflowState};

pub struct SchemaDiscovery {
    registry: Arc<SchemaRegistry>,
    max_tool_iterations: u32,
}

impl SchemaDiscovery {
    pub fn new(registry: Arc<SchemaRegistry>, max_tool_iterations: u32) -> Self {
        Self {
            registry,
            max_tool_iterations,
        }
    }

    pub async fn discover(&self, llm: &dyn LlmProvider, state: &WorkflowState) -> StatePatch {
        let mut patch = StatePatch::new();
        let tools = schema_tools();
        let mut messages = vec![
            ChatMessage::System(SCHEMA_DISCOVERY_SYSTEM.to_string()),
            ChatMessage::User(schema_discovery_user_prompt(state)),
        ];

        let mut discovered_tables: Vec<String> = Vec::new();
        let mut schema_parts: Vec<String> = Vec::new();

        for _iteration in 0..self.max_tool_iterations.max(1) {
            let turn = match llm.invoke_with_tools(&messages, &tools, 0.0).await {
                Ok(turn) => turn,
                Err(_) => break,
            };

            let calls = match turn {
                ToolTurn::FinalText(text) => {
                    messages.push(ChatMessage::Assistant(text));
                    break;
                }
                ToolTurn::ToolCalls(calls) => calls,
            };

            messages.push(ChatMessage::Assistant(format!(
                "calling tools: {}",
                calls.iter().map(|c| c.name.clone()).collect::<Vec<_>>().join(", ")
            )));

            for call in &calls {
                let result = self.dispatch_tool(call, &mut discovered_tables).await;
                schema_parts.push(result.clone());
                messages.push(ChatMessage::ToolResult {
                    name: call.name.clone(),
                    content: result,
                });
            }
        }

        dedupe_preserve_order(&mut discovered_tables);

        if schema_parts.is_empty() {
            patch.refined_schema_context = Some(Some(state.schema_context.clone()));
            patch.discovered_tables = Some(None);
            return patch;
        }

        let known = self.registry.get_valid_tables().await;
        discovered_tables.retain(|t| known.iter().any(|k| k.eq_ignore_ascii_case(t)));

        let refined = build_refined_context(&discovered_tables, &schema_parts);
        patch.refined_schema_context = Some(Some(refined));
        patch.discovered_tables = Some(Some(discovered_tables));
        patch
    }

    async fn dispatch_tool(&self, call: &ToolCall, discovered: &mut Vec<String>) -> String {
        match call.name.as_str() {
            "list_tables" => self.tool_list_tables().await,
            "get_table_schema" => {
                let names = call
                    .arguments
                    .get("table_names")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                let requested: Vec<String> = names
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                let result = self.tool_get_table_schema(&requested).await;
                discovered.extend(requested);
                result
            }
            "search_columns" => {
                let keyword = call.arguments.get("keyword").and_then(|v| v.as_str()).unwrap_or("");
                let matches = self.registry.search_columns(keyword).await;
                discovered.extend(matches.iter().map(|(table, _, _)| table.clone()));
                Self::format_column_matches(keyword, &matches)
            }
            other => format!("Unknown tool: {other}"),
        }
    }

    async fn tool_list_tables(&self) -> String {
        let names = self.registry.get_valid_tables().await;
        if names.is_empty() {
            return "No tables found in the schema registry.".to_string();
        }
        let mut lines = vec!["Available tables:".to_string()];
        for name in &names {
            if let Some(table) = self.registry.get_table(name).await {
                let mut parts = vec![format!("- {name}")];
                if let Some(rows) = table.row_count {
                    parts.push(format!("(~{rows} rows)"));
                }
                if let (Some(start), Some(end)) = (&table.date_range_start, &table.date_range_end) {
                    parts.push(format!("[{start} to {end}]"));
                }
                lines.push(parts.join(" "));
            }
        }
        lines.push("Use get_table_schema with comma-separated table names to see columns.".to_string());
        lines.join("\n")
    }

    async fn tool_get_table_schema(&self, table_names: &[String]) -> String {
        if table_names.is_empty() {
            return "No table names supplied.".to_string();
        }
        let mut results = Vec::with_capacity(table_names.len());
        for requested in table_names {
            let Some(table) = self.resolve_table(requested).await else {
                results.push(format!("Table '{requested}' not found. Use list_tables to see available tables."));
                continue;
            };
            let mut lines = vec![format!("## {}", table.name)];
            if let Some(rows) = table.row_count {
                lines.push(format!("Rows: ~{rows}"));
            }
            if let (Some(col), Some(start), Some(end)) = (&table.date_column, &table.date_range_start, &table.date_range_end) {
                lines.push(format!("Date range: {start} to {end} (column: {col})"));
            }
            lines.push("| Column | Type | Sample Values |".to_string());
            lines.push("|--------|------|---------------|".to_string());
            for column in &table.columns {
                let samples = if column.sample_values.is_empty() {
                    "-".to_string()
                } else {
                    column.sample_values.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
                };
                lines.push(format!("| {} | {} | {} |", column.name, column.data_type, samples));
            }
            results.push(lines.join("\n"));
        }
        results.join("\n\n")
    }

    fn format_column_matches(keyword: &str, matches: &[(String, String, String)]) -> String {
        if keyword.is_empty() {
            return "No keyword supplied.".to_string();
        }
        if matches.is_empty() {
            return format!("No columns found matching '{keyword}'. Try different keywords or use list_tables.");
        }
        let mut lines = vec![format!("Columns matching '{keyword}':")];
        for (table, column, data_type) in matches {
            lines.push(format!("- {table}.{column} ({data_type})"));
        }
        lines.join("\n")
    }

    async fn resolve_table(&self, name: &str) -> Option<crate::schema::TableSchema> {
        if let Some(table) = self.registry.get_table(name).await {
            return Some(table);
        }
        let known = self.registry.get_valid_tables().await;
        let matched = known.into_iter().find(|t| t.eq_ignore_ascii_case(name))?;
        self.registry.get_table(&matched).await
    }
}

fn dedupe_preserve_order(names: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    names.retain(|name| seen.insert(name.clone()));
}

fn build_refined_context(tables: &[String], schema_parts: &[String]) -> String {
    let mut lines = vec![
        "## Discovered Schema".to_string(),
        format!(
            "Relevant tables: {}",
            if tables.is_empty() { "all tables".to_string() } else { tables.join(", ") }
        ),
    ];
    for part in schema_parts {
        if !part.trim().is_empty() && !part.starts_with("No ") {
            lines.push(part.clone());
        }
    }
    lines.join("\n\n")
}

fn schema_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "list_tables".to_string(),
            description: "List all available tables with row counts and date ranges.".to_string(),
            parameters: json!({"type": "object", "properties": {}, "required": []}),
        },
        ToolDefinition {
            name: "get_table_schema".to_string(),
            description: "Get columns, types, and sample values for specified tables (comma-separated).".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "table_names": {"type": "string", "description": "Comma-separated table names"}
                },
                "required": ["table_names"]
            }),
        },
        ToolDefinition {
            name: "search_columns".to_string(),
            description: "Search for columns matching a keyword across all tables.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "keyword": {"type": "string", "description": "Keyword to search for in column names"}
                },
                "required": ["keyword"]
            }),
        },
    ]
}

/// Deterministic test double.
pub fn create_mock_schema_discovery(
    relevant_tables: Vec<String>,
    refined_context: String,
) -> impl Fn(&WorkflowState) -> StatePatch + Send + Sync + 'static {
    move |_state: &WorkflowState| {
        let mut patch = StatePatch::new();
        patch.refined_schema_context = Some(Some(refined_context.clone()));
        patch.discovered_tables = Some(Some(relevant_tables.clone()));
        patch
    }
}

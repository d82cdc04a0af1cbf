//! Minimal CLI driver: accepts a question and an optional thread id, wires
//! up the default service (in-memory checkpoint store, local-file schema
//! registry, the HTTP-backed LLM client falling back to a dummy responder
//! when no API key is configured), runs one workflow turn, and prints the
//! answer.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use nl2sql_workflow::agents::{Router, SchemaDiscovery, SqlGenerator, Summarizer};
use nl2sql_workflow::checkpoint::InMemoryCheckpointStore;
use nl2sql_workflow::config::Settings;
use nl2sql_workflow::executor::engine::default_engine;
use nl2sql_workflow::executor::Executor;
use nl2sql_workflow::llm::{LlmProvider, OpenAiClient};
use nl2sql_workflow::schema::{DataSource, SchemaRegistry};
use nl2sql_workflow::state::WorkflowState;
use nl2sql_workflow::validator::Validator;
use nl2sql_workflow::GraphRuntime;

#[derive(Parser)]
#[command(name = "nl2sql")]
#[command(about = "Ask a natural-language analytics question against the local data directory")]
struct Args {
    /// The question to ask, e.g. "how many orders shipped last week?"
    question: String,

    /// Conversation thread id; a new one is generated if omitted.
    #[arg(short, long)]
    thread_id: Option<String>,

    /// Print every intermediate state transition, not just the final answer.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let settings = Settings::from_env()?;

    let engine = Arc::new(default_engine(settings.local_data_path.clone()));
    let registry = Arc::new(SchemaRegistry::new(
        engine.clone(),
        vec![DataSource::local(settings.local_data_path.clone(), "*.parquet")],
        settings.schema_cache_ttl_seconds,
    ));
    let registry_state = registry.get_schema(false).await;
    info!(tables = registry_state.tables.len(), "schema registry ready");

    let llm: Arc<dyn LlmProvider> = Arc::new(OpenAiClient::new(
        settings.openai_api_key.clone(),
        settings.openai_base_url.clone(),
        settings.openai_model.clone(),
        settings.openai_timeout_seconds,
    ));

    let runtime = GraphRuntime::new(
        llm,
        Router,
        SchemaDiscovery::new(registry.clone(), settings.max_tool_iterations),
        SqlGenerator,
        Validator::new(registry.clone(), settings.default_row_limit, settings.max_row_limit),
        Executor::new(
            engine.clone(),
            settings.executor_pool_size,
            settings.query_timeout_seconds,
            settings.max_result_rows,
        ),
        Summarizer,
        Arc::new(InMemoryCheckpointStore::new()),
    );

    let thread_id = args.thread_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let mut state = WorkflowState::new(thread_id.clone(), args.question.clone(), settings.max_retries);
    state.available_tables = registry.get_valid_tables().await;
    state.schema_context = registry.get_schema_context(50).await;

    let final_state = runtime.run(state).await?;

    if args.verbose {
        for message in &final_state.messages {
            println!("[{:?}] {}", message.role, message.content);
        }
        println!("--- retry_count: {} ---", final_state.retry_count);
    }

    println!("{}", final_state.final_answer.unwrap_or_else(|| "(no answer produced)".to_string()));
    Ok(())
}

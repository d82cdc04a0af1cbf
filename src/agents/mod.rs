//! Thin LLM-backed node shims. Each shim takes `&dyn LlmProvider` and the
//! current state and returns a `StatePatch`; none of them touch the graph
//! runtime or checkpointing directly.

pub mod prompts;
pub mod router;
pub mod schema_discovery;
pub mod sql_generator;
pub mod summarizer;

pub use router::{create_mock_router, Router};
pub use schema_discovery::{create_mock_schema_discovery, SchemaDiscovery};
pub use sql_generator::{create_mock_sql_generator, SqlGenerator};
pub use summarizer::{create_mock_summarizer, Summarizer};

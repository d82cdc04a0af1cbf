pub mod discovery;
pub mod registry;
pub mod types;

pub use registry::SchemaRegistry;
pub use types::{ColumnSchema, DataSource, RegistryState, SourceType, TableSchema};

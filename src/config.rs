//! Layered settings, loaded from the environment with `.env` support in
//! development. Mirrors the configuration keys the workflow engine actually
//! reads — no HTTP server, auth layer, or rate limiter is in scope, so their
//! settings have no place here.

use std::env;

use crate::error::{Result, WorkflowError};

#[derive(Debug, Clone)]
pub struct Settings {
    pub app_name: String,
    pub environment: String,
    pub log_level: String,

    // Agent / graph runtime
    pub max_retries: u32,
    pub max_tool_iterations: u32,

    // Validator
    pub default_row_limit: u64,
    pub max_row_limit: u64,

    // Executor
    pub query_timeout_seconds: u64,
    pub executor_pool_size: usize,
    pub max_result_rows: usize,

    // Schema registry
    pub schema_cache_ttl_seconds: u64,
    pub local_data_path: String,
    pub s3_data_path: String,

    // LLM provider
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_temperature: f32,
    pub openai_timeout_seconds: u64,

    // Checkpoint store
    pub database_url: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        Ok(Self {
            app_name: env_or("APP_NAME", "Analytics Workflow Engine"),
            environment: env_or("ENVIRONMENT", "development"),
            log_level: env_or("LOG_LEVEL", "info"),

            max_retries: env_parsed("MAX_RETRY_ATTEMPTS", 3)?,
            max_tool_iterations: env_parsed("MAX_TOOL_ITERATIONS", 5)?,

            default_row_limit: env_parsed("DEFAULT_ROW_LIMIT", 100)?,
            max_row_limit: env_parsed("MAX_ROW_LIMIT", 1000)?,

            query_timeout_seconds: env_parsed("QUERY_TIMEOUT_SECONDS", 30)?,
            executor_pool_size: env_parsed("EXECUTOR_POOL_SIZE", 4)?,
            max_result_rows: env_parsed("MAX_RESULT_ROWS", 1000)?,

            schema_cache_ttl_seconds: env_parsed("SCHEMA_CACHE_TTL_SECONDS", 300)?,
            local_data_path: env_or("LOCAL_DATA_PATH", "data"),
            s3_data_path: env_or("S3_DATA_PATH", "s3://analytics/data"),

            openai_api_key: env_or("OPENAI_API_KEY", "dummy-api-key"),
            openai_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            openai_model: env_or("OPENAI_MODEL", "gpt-4o"),
            openai_temperature: env_parsed("OPENAI_TEMPERATURE", 0.0)?,
            openai_timeout_seconds: env_parsed("OPENAI_TIMEOUT_SECONDS", 60)?,

            database_url: env::var("DATABASE_URL").ok(),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn llm_is_dummy(&self) -> bool {
        self.openai_api_key == "dummy-api-key"
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| WorkflowError::Config(format!("invalid {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

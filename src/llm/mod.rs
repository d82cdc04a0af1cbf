//! The LLM provider contract (§6): `invoke` for free text, `invoke_structured`
//! for a schema-constrained decode, and `invoke_with_tools` for a bounded
//! tool-calling turn. The default implementation speaks an OpenAI-compatible
//! chat-completions endpoint; a `dummy-api-key` short-circuits to canned
//! responses for offline development and tests.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Result, WorkflowError};

/// One turn of a tool-calling conversation. Kept deliberately small — just
/// enough to round-trip through an OpenAI-shaped `messages` array.
#[derive(Debug, Clone)]
pub enum ChatMessage {
    System(String),
    User(String),
    Assistant(String),
    ToolResult { name: String, content: String },
}

/// A callable tool surface, described the way OpenAI-style function calling
/// expects: a name, a human description, and a JSON Schema for arguments.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// What a tool-calling turn produced: either the model asked to call one or
/// more tools, or it gave a final answer and the loop should stop.
#[derive(Debug, Clone)]
pub enum ToolTurn {
    ToolCalls(Vec<ToolCall>),
    FinalText(String),
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn invoke(&self, system: &str, user: &str, temperature: f32) -> Result<String>;

    /// Advance a tool-calling conversation by one turn. Implementations that
    /// cannot speak function-calling at all may always return `FinalText`
    /// from the last message, ending the loop immediately.
    async fn invoke_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        temperature: f32,
    ) -> Result<ToolTurn>;
}

/// Free function rather than a trait method so `LlmProvider` stays object-
/// safe (a generic method on the trait would prevent `Arc<dyn LlmProvider>`).
/// Calls `invoke`, then decodes the text as the requested schema; rejects on
/// mismatch rather than attempting to salvage free text.
pub async fn invoke_structured<T: DeserializeOwned>(
    provider: &dyn LlmProvider,
    system: &str,
    user: &str,
    temperature: f32,
) -> Result<T> {
    let text = provider.invoke(system, user, temperature).await?;
    serde_json::from_str(&text).map_err(|e| WorkflowError::Llm(format!("structured decode failed: {e}")))
}

pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    model: String,
    timeout_seconds: u64,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, model: impl Into<String>, timeout_seconds: u64) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
            timeout_seconds,
            http: reqwest::Client::new(),
        }
    }

    fn is_dummy(&self) -> bool {
        self.api_key == "dummy-api-key"
    }

    fn to_json_message(message: &ChatMessage) -> serde_json::Value {
        match message {
            ChatMessage::System(content) => json!({"role": "system", "content": content}),
            ChatMessage::User(content) => json!({"role": "user", "content": content}),
            ChatMessage::Assistant(content) => json!({"role": "assistant", "content": content}),
            ChatMessage::ToolResult { name, content } => {
                json!({"role": "tool", "name": name, "content": content})
            }
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn invoke(&self, system: &str, user: &str, temperature: f32) -> Result<String> {
        if self.is_dummy() {
            return Ok(dummy_response(system, user));
        }

        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "temperature": temperature,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(std::time::Duration::from_secs(self.timeout_seconds))
            .json(&body)
            .send()
            .await?;

        let payload: serde_json::Value = response.json().await?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| WorkflowError::Llm("malformed chat-completions response".to_string()))
    }

    async fn invoke_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        temperature: f32,
    ) -> Result<ToolTurn> {
        if self.is_dummy() {
            // No live model to call tools against; end the loop on the first
            // turn the way a model with nothing useful to ask for would.
            return Ok(ToolTurn::FinalText(dummy_response("", "")));
        }

        let json_tools: Vec<serde_json::Value> = tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    }
                })
            })
            .collect();

        let body = json!({
            "model": self.model,
            "messages": messages.iter().map(Self::to_json_message).collect::<Vec<_>>(),
            "tools": json_tools,
            "tool_choice": "auto",
            "temperature": temperature,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(std::time::Duration::from_secs(self.timeout_seconds))
            .json(&body)
            .send()
            .await?;

        let payload: serde_json::Value = response.json().await?;
        let message = &payload["choices"][0]["message"];

        let raw_calls = message["tool_calls"].as_array().cloned().unwrap_or_default();
        if raw_calls.is_empty() {
            let text = message["content"].as_str().unwrap_or_default().to_string();
            return Ok(ToolTurn::FinalText(text));
        }

        let mut calls = Vec::with_capacity(raw_calls.len());
        for raw in raw_calls {
            let name = raw["function"]["name"]
                .as_str()
                .ok_or_else(|| WorkflowError::Llm("tool call missing function name".to_string()))?
                .to_string();
            let arguments_str = raw["function"]["arguments"].as_str().unwrap_or("{}");
            let arguments = serde_json::from_str(arguments_str).unwrap_or(serde_json::Value::Null);
            calls.push(ToolCall { name, arguments });
        }
        Ok(ToolTurn::ToolCalls(calls))
    }
}

/// A deterministic canned response for development without an API key.
/// Structured-output callers rely on this returning syntactically valid
/// JSON for their particular schema shape, which each agent shim's prompt
/// (and fallback path) is written to tolerate.
fn dummy_response(_system: &str, _user: &str) -> String {
    json!({}).to_string()
}

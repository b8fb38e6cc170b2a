//! Agent-style requests against the Responses API.
//!
//! A request carries an agent's instructions, its hosted tools, reasoning
//! settings and an optional structured output schema; the response is a list
//! of output items (messages, reasoning, hosted tool calls).

use concierge_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Reasoning effort requested from reasoning models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Minimal,
    Low,
    Medium,
    High,
}

/// Reasoning configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reasoning {
    pub effort: ReasoningEffort,

    /// Reasoning summary mode ("auto", "concise", "detailed")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Approximate user location for web search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
    #[serde(rename = "type")]
    pub kind: String,
}

impl UserLocation {
    pub fn approximate() -> Self {
        Self {
            kind: "approximate".to_string(),
        }
    }
}

/// Sandbox container for the code interpreter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeContainer {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub file_ids: Vec<String>,
}

impl CodeContainer {
    /// Automatically provisioned container with no files attached.
    pub fn auto() -> Self {
        Self {
            kind: "auto".to_string(),
            file_ids: Vec::new(),
        }
    }
}

/// Tools executed by the remote service on the agent's behalf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostedTool {
    /// Retrieval over vector stores
    FileSearch { vector_store_ids: Vec<String> },

    /// Web search
    WebSearchPreview {
        search_context_size: String,
        user_location: UserLocation,
    },

    /// Sandboxed code execution
    CodeInterpreter { container: CodeContainer },
}

impl HostedTool {
    /// Name of the tool as the service reports it.
    pub fn name(&self) -> &'static str {
        match self {
            HostedTool::FileSearch { .. } => "file_search",
            HostedTool::WebSearchPreview { .. } => "web_search_preview",
            HostedTool::CodeInterpreter { .. } => "code_interpreter",
        }
    }
}

/// Named JSON schema the final output must conform to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSchema {
    pub name: String,
    pub schema: Value,
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize)]
struct TextConfig {
    format: TextFormat,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TextFormat {
    JsonSchema {
        name: String,
        schema: Value,
        strict: bool,
    },
}

/// Responses API request.
#[derive(Debug, Clone, Serialize)]
pub struct ResponsesRequest {
    pub model: String,

    /// System-level instructions for the agent
    pub instructions: String,

    /// Ordered input items (messages and replayed output items)
    pub input: Vec<Value>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<HostedTool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<Reasoning>,

    pub store: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<TextConfig>,

    /// Run-scoped metadata (trace id, workflow id)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl ResponsesRequest {
    pub fn new(model: impl Into<String>, instructions: impl Into<String>, input: Vec<Value>) -> Self {
        Self {
            model: model.into(),
            instructions: instructions.into(),
            input,
            tools: Vec::new(),
            reasoning: None,
            store: true,
            text: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<HostedTool>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_reasoning(mut self, reasoning: Reasoning) -> Self {
        self.reasoning = Some(reasoning);
        self
    }

    pub fn with_store(mut self, store: bool) -> Self {
        self.store = store;
        self
    }

    /// Require the final output to be JSON conforming to `schema`.
    pub fn with_output_schema(mut self, schema: &OutputSchema) -> Self {
        self.text = Some(TextConfig {
            format: TextFormat::JsonSchema {
                name: schema.name.clone(),
                schema: schema.schema.clone(),
                strict: schema.strict,
            },
        });
        self
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Build a user message input item.
pub fn user_input(text: impl Into<String>) -> Value {
    serde_json::json!({
        "role": "user",
        "content": [{ "type": "input_text", "text": text.into() }]
    })
}

/// Responses API response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsesResponse {
    pub id: String,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    /// Items produced by this response, in order
    #[serde(default)]
    pub output: Vec<Value>,

    #[serde(default)]
    pub usage: Option<Value>,

    /// Why generation stopped early, present when `status` is `incomplete`
    #[serde(default)]
    pub incomplete_details: Option<Value>,

    #[serde(default)]
    pub error: Option<Value>,
}

impl ResponsesResponse {
    /// Fail unless the response finished generating.
    ///
    /// A missing status is treated as completed; anything else
    /// (`incomplete`, `failed`, `cancelled`, `in_progress`) is an error
    /// carrying the service's reason when one is given.
    pub fn ensure_completed(&self) -> AppResult<()> {
        let status = match self.status.as_deref() {
            None | Some("completed") => return Ok(()),
            Some(status) => status,
        };

        let reason = self
            .incomplete_details
            .as_ref()
            .and_then(|details| details.get("reason"))
            .or_else(|| self.error.as_ref().and_then(|error| error.get("message")))
            .and_then(Value::as_str);

        Err(AppError::Llm(match reason {
            Some(reason) => format!(
                "Response {} ended with status '{}': {}",
                self.id, status, reason
            ),
            None => format!("Response {} ended with status '{}'", self.id, status),
        }))
    }

    /// Text of the last assistant message, concatenating its text parts.
    pub fn output_text(&self) -> Option<String> {
        self.output
            .iter()
            .rev()
            .find(|item| item_type(item) == "message")
            .map(message_text)
    }
}

/// The `type` tag of an output item.
pub fn item_type(item: &Value) -> &str {
    item.get("type").and_then(Value::as_str).unwrap_or("")
}

/// Concatenated `output_text` parts of a message item.
pub fn message_text(item: &Value) -> String {
    item.get("content")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter(|part| item_type(part) == "output_text")
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

/// Concatenated summary text of a reasoning item.
pub fn reasoning_summary(item: &Value) -> String {
    item.get("summary")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

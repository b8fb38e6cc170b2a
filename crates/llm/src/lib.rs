//! Remote model service crate for Concierge.
//!
//! This crate wraps the OpenAI-compatible HTTP API used by every tool:
//! chat completions (with function tools), agent runs through the Responses
//! API, file upload, fine-tuning jobs and model management.
//!
//! # Example
//! ```no_run
//! use concierge_llm::{ChatMessage, ChatRequest, LlmClient, OpenAiClient, OpenAiSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenAiClient::new(OpenAiSettings {
//!     base_url: "https://api.openai.com/v1".to_string(),
//!     api_key: "sk-...".to_string(),
//!     organization: None,
//!     project: None,
//!     timeout: None,
//! })?;
//! let request = ChatRequest::new("gpt-4", vec![ChatMessage::user("Hello")]);
//! let response = client.complete(&request).await?;
//! println!("{:?}", response.text());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod responses;
pub mod types;

// Re-export main types
pub use client::{
    ChatMessage, ChatRequest, ChatResponse, ChatRole, FunctionCall, LlmClient, LlmUsage,
    ToolCall, ToolDefinition,
};
pub use factory::create_client;
pub use providers::{OpenAiClient, OpenAiSettings};
pub use responses::{
    HostedTool, OutputSchema, Reasoning, ReasoningEffort, ResponsesRequest, ResponsesResponse,
};
pub use types::{DeletedModel, FileObject, FineTuningJob, JobStatus, ModelObject};

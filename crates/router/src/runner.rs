//! Remote agent invocation.
//!
//! [`AgentRunner`] is the seam between the pipeline and the remote service:
//! it takes an agent definition and the ordered input turns and returns the
//! turns the agent produced plus its final output.

use crate::agents::AgentDefinition;
use crate::types::Turn;
use concierge_core::{AppError, AppResult};
use concierge_llm::{OpenAiClient, ResponsesRequest, ResponsesResponse};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Run-scoped metadata attached to every remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMetadata {
    pub trace_id: String,
    pub trace_name: String,
    pub workflow_id: String,
}

impl RunMetadata {
    /// Fresh metadata with a random trace id.
    pub fn new(trace_name: impl Into<String>, workflow_id: impl Into<String>) -> Self {
        Self {
            trace_id: format!("trace_{}", uuid::Uuid::new_v4().simple()),
            trace_name: trace_name.into(),
            workflow_id: workflow_id.into(),
        }
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("__trace_source__".to_string(), "concierge".to_string());
        map.insert("trace_id".to_string(), self.trace_id.clone());
        map.insert("trace_name".to_string(), self.trace_name.clone());
        map.insert("workflow_id".to_string(), self.workflow_id.clone());
        map
    }
}

/// What one agent invocation produced.
#[derive(Debug, Clone)]
pub struct AgentRun {
    /// Newly produced turns, in order
    pub new_turns: Vec<Turn>,

    /// Final output: free text, or the JSON record for structured agents
    pub final_output: String,
}

/// Invokes remote agents.
#[async_trait::async_trait]
pub trait AgentRunner: Send + Sync {
    async fn run(
        &self,
        agent: &AgentDefinition,
        input: &[Turn],
        metadata: &RunMetadata,
    ) -> AppResult<AgentRun>;
}

/// Runner backed by the Responses API.
pub struct OpenAiAgentRunner {
    client: Arc<OpenAiClient>,
}

impl OpenAiAgentRunner {
    pub fn new(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

/// Translate an agent definition and its input into a Responses API request.
pub fn build_request(
    agent: &AgentDefinition,
    input: &[Turn],
    metadata: &RunMetadata,
) -> ResponsesRequest {
    let items = input.iter().map(Turn::to_input_item).collect();

    let mut request = ResponsesRequest::new(&agent.model, &agent.instructions, items)
        .with_tools(agent.tools.clone())
        .with_reasoning(agent.settings.reasoning.clone())
        .with_store(agent.settings.store)
        .with_metadata(metadata.to_map());

    if let Some(ref schema) = agent.output_schema {
        request = request.with_output_schema(schema);
    }

    request
}

/// Turn a finished response into the agent's run.
///
/// Responses that stopped early are rejected even when they carry partial
/// text.
pub fn agent_run_from_response(
    agent: &AgentDefinition,
    response: ResponsesResponse,
) -> AppResult<AgentRun> {
    response.ensure_completed()?;

    let final_output = response.output_text().ok_or_else(|| {
        AppError::Llm(format!(
            "Response {} from agent '{}' contained no output text",
            response.id, agent.name
        ))
    })?;

    let new_turns = response
        .output
        .into_iter()
        .map(Turn::from_output_item)
        .collect();

    Ok(AgentRun {
        new_turns,
        final_output,
    })
}

#[async_trait::async_trait]
impl AgentRunner for OpenAiAgentRunner {
    async fn run(
        &self,
        agent: &AgentDefinition,
        input: &[Turn],
        metadata: &RunMetadata,
    ) -> AppResult<AgentRun> {
        let request = build_request(agent, input, metadata);
        let response = self.client.respond(&request).await?;

        agent_run_from_response(agent, response)
    }
}

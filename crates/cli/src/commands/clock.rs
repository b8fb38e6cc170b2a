//! Clock command handler: a single function-calling round trip.
//!
//! The model is offered one local tool, `get_current_time`. When it calls
//! the tool, the result is sent back and the model's final reply printed.

use chrono::{DateTime, Local};
use clap::Args;
use concierge_core::{config::AppConfig, AppResult};
use concierge_llm::{
    create_client, ChatMessage, ChatRequest, LlmClient, ToolCall, ToolDefinition,
};
use serde_json::{json, Value};

pub const DEFAULT_MESSAGE: &str = "今何時？";
const TOOL_NAME: &str = "get_current_time";

/// Function-calling demo: ask the model for the current time
#[derive(Args, Debug)]
pub struct ClockCommand {
    /// Message to send (default: 今何時？)
    pub message: Option<String>,

    /// Model to use for both requests
    #[arg(short, long, default_value = "gpt-4")]
    pub model: String,
}

impl ClockCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing clock command");

        let client = create_client(config)?;
        let user = ChatMessage::user(self.message.as_deref().unwrap_or(DEFAULT_MESSAGE));

        let request = ChatRequest::new(&self.model, vec![user.clone()]).with_tools(vec![tool()]);
        let response = client.complete(&request).await?;

        let assistant = match response.message() {
            Some(message) if !message.tool_calls.is_empty() => message.clone(),
            _ => {
                println!("Tool call was not triggered.");
                return Ok(());
            }
        };

        for call in &assistant.tool_calls {
            if call.function.name != TOOL_NAME {
                tracing::warn!(function = %call.function.name, "Ignoring call to unknown function");
                continue;
            }

            let result = current_time(Local::now());
            tracing::debug!(call = %call.id, result = %result, "Tool executed");

            let follow_up = follow_up_request(&self.model, &user, &assistant, call, &result);
            let second = client.complete(&follow_up).await?;
            let content = second
                .message()
                .and_then(|message| message.content.clone())
                .unwrap_or_default();
            println!("Assistant response: {}", content);
        }

        Ok(())
    }
}

fn tool() -> ToolDefinition {
    ToolDefinition::function(
        TOOL_NAME,
        "現在の時刻を返します",
        json!({
            "type": "object",
            "properties": {},
            "required": []
        }),
    )
}

/// Local time as ISO 8601; the fraction is omitted at a whole second.
fn current_time(now: DateTime<Local>) -> Value {
    let format = if now.timestamp_subsec_micros() == 0 {
        "%Y-%m-%dT%H:%M:%S"
    } else {
        "%Y-%m-%dT%H:%M:%S%.6f"
    };
    json!({ "current_time": now.format(format).to_string() })
}

/// Second request: the user turn, the assistant's tool call and its result.
fn follow_up_request(
    model: &str,
    user: &ChatMessage,
    assistant: &ChatMessage,
    call: &ToolCall,
    result: &Value,
) -> ChatRequest {
    ChatRequest::new(
        model,
        vec![
            user.clone(),
            assistant.clone(),
            ChatMessage::tool_result(&call.id, &call.function.name, result.to_string()),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use concierge_llm::{ChatRole, FunctionCall};

    #[test]
    fn test_tool_declaration() {
        let json = serde_json::to_value(tool()).unwrap();
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], TOOL_NAME);
        assert_eq!(json["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_current_time_payload() {
        let now = Local.with_ymd_and_hms(2025, 4, 1, 9, 30, 0).unwrap();
        let value = current_time(now);
        assert_eq!(value["current_time"], "2025-04-01T09:30:00");

        let precise = now.with_nanosecond(123_456_789).unwrap();
        assert_eq!(
            current_time(precise)["current_time"],
            "2025-04-01T09:30:00.123456"
        );

        let sub_micro = now.with_nanosecond(999).unwrap();
        assert_eq!(current_time(sub_micro)["current_time"], "2025-04-01T09:30:00");
    }

    #[test]
    fn test_follow_up_request() {
        let call = ToolCall {
            id: "call_1".to_string(),
            kind: "function".to_string(),
            function: FunctionCall {
                name: TOOL_NAME.to_string(),
                arguments: "{}".to_string(),
            },
        };
        let assistant = ChatMessage {
            role: ChatRole::Assistant,
            content: None,
            tool_calls: vec![call.clone()],
            tool_call_id: None,
            name: None,
        };
        let result = json!({ "current_time": "2025-04-01T09:30:00" });

        let request = follow_up_request(
            "gpt-4",
            &ChatMessage::user(DEFAULT_MESSAGE),
            &assistant,
            &call,
            &result,
        );

        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[1].tool_calls.len(), 1);
        let tool_message = &request.messages[2];
        assert_eq!(tool_message.role, ChatRole::Tool);
        assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(tool_message.name.as_deref(), Some(TOOL_NAME));
        assert!(tool_message
            .content
            .as_deref()
            .unwrap()
            .contains("2025-04-01T09:30:00"));
        assert!(request.tools.is_empty());
    }
}

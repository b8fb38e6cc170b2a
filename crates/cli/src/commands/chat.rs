//! Chat command handler.

use clap::Args;
use concierge_core::{config::AppConfig, AppError, AppResult};
use concierge_llm::{create_client, ChatMessage, ChatRequest, LlmClient};

pub const DEFAULT_MESSAGE: &str = "サービスアカウントのメリットを説明してください。";
const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Send one chat message
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Message to send (default: a question about service accounts)
    pub message: Option<String>,

    /// Model to chat with
    #[arg(short, long, default_value = "gpt-4")]
    pub model: String,

    /// Temperature for response generation (0.0-2.0)
    #[arg(long, default_value_t = 0.7)]
    pub temperature: f32,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let client = create_client(config)?;
        let request = self.request();
        let response = client.complete(&request).await?;

        tracing::debug!(
            "Token usage - Prompt: {}, Completion: {}, Total: {}",
            response.usage.prompt_tokens,
            response.usage.completion_tokens,
            response.usage.total_tokens
        );

        let content = response
            .message()
            .and_then(|message| message.content.clone())
            .ok_or_else(|| AppError::Llm("Chat response contained no content".to_string()))?;
        println!("{}", content);

        Ok(())
    }

    fn request(&self) -> ChatRequest {
        let message = self.message.as_deref().unwrap_or(DEFAULT_MESSAGE);
        ChatRequest::new(
            &self.model,
            vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(message)],
        )
        .with_temperature(self.temperature)
    }
}

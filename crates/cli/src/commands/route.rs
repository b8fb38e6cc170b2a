//! Route command handler.
//!
//! Runs one question through the query router and prints the specialist's
//! answer.

use clap::Args;
use concierge_core::{config::AppConfig, AppError, AppResult};
use concierge_llm::create_client;
use concierge_prompt::load_instruction_overrides;
use concierge_router::{
    AgentRegistry, OpenAiAgentRunner, QueryRouter, RouterConfig, RunResult, WorkflowInput,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Question used when none is given.
pub const DEFAULT_QUESTION: &str = "昨年行われた見積の中で粗利額が大きいものを5つ抽出して。";

/// Route a question through rewrite, classify and one specialist agent
#[derive(Args, Debug)]
pub struct RouteCommand {
    /// The question to route (default: the built-in estimate question)
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "question")]
    pub file: Option<PathBuf>,

    /// Model used by every agent (overrides router.model)
    #[arg(short, long, env = "CONCIERGE_MODEL")]
    pub model: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RouteCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing route command");

        let question = self.question_text()?;
        tracing::debug!("Question: {}", question);

        let router_config = RouterConfig::from(&config.router);
        router_config.validate()?;

        // Fails before any remote call when the credential is missing
        let client = create_client(config)?;

        let overrides = load_instruction_overrides(&config.workspace)?;
        let registry = Arc::new(AgentRegistry::new(&router_config, &overrides));
        let runner = Arc::new(OpenAiAgentRunner::new(client));
        let router = QueryRouter::new(router_config, registry, runner);

        let cancel = CancellationToken::new();
        let interrupt = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupted, cancelling run");
                    cancel.cancel();
                }
            }
        });

        let result = router.run(&WorkflowInput::new(question), &cancel).await;
        interrupt.abort();
        let result = result?;

        if self.json {
            println!("{}", render_json(&result)?);
        } else {
            println!("{}", result);
        }

        tracing::debug!(
            specialist = result.specialist.header(),
            turns = result.conversation.len(),
            "Run finished"
        );

        Ok(())
    }

    fn question_text(&self) -> AppResult<String> {
        if let Some(ref question) = self.question {
            return Ok(question.clone());
        }
        if let Some(ref path) = self.file {
            let text = std::fs::read_to_string(path).map_err(|e| {
                AppError::Config(format!("Failed to read question file {:?}: {}", path, e))
            })?;
            return Ok(text.trim().to_string());
        }
        Ok(DEFAULT_QUESTION.to_string())
    }
}

fn render_json(result: &RunResult) -> AppResult<String> {
    let output = serde_json::json!({
        "specialist": result.specialist.header(),
        "operatingProcedure": result.procedure.label(),
        "rewrittenQuestion": result.rewritten_question,
        "answer": result.answer,
        "turns": result.conversation.len(),
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

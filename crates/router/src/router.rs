//! The query router pipeline.
//!
//! rewrite → classify → dispatch to one specialist → answer. Stages run
//! strictly in order; each stage receives the conversation built so far and
//! returns it extended with the turns its agent produced.

use crate::agents::{AgentDefinition, AgentId, AgentRegistry};
use crate::config::RouterConfig;
use crate::runner::{AgentRun, AgentRunner, RunMetadata};
use crate::types::{
    ClassifySchema, Conversation, OperatingProcedure, RunResult, Stage, Turn, WorkflowInput,
};
use concierge_core::{AppError, AppResult};
use concierge_prompt::StageTemplate;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Routes one question through the agent pipeline.
pub struct QueryRouter {
    config: RouterConfig,
    registry: Arc<AgentRegistry>,
    runner: Arc<dyn AgentRunner>,
}

impl QueryRouter {
    pub fn new(
        config: RouterConfig,
        registry: Arc<AgentRegistry>,
        runner: Arc<dyn AgentRunner>,
    ) -> Self {
        Self {
            config,
            registry,
            runner,
        }
    }

    /// Run the pipeline for one question.
    ///
    /// Fails without a result if any stage fails, times out or is cancelled.
    /// Nothing is retried.
    pub async fn run(
        &self,
        input: &WorkflowInput,
        cancel: &CancellationToken,
    ) -> AppResult<RunResult> {
        self.config.validate()?;

        let metadata = RunMetadata::new(&self.config.trace_name, &self.config.workflow_id);
        let span = tracing::info_span!(
            "workflow",
            trace = %self.config.trace_name,
            trace_id = %metadata.trace_id
        );

        async {
            let question = input.input_as_text.as_str();
            let conversation = Conversation::seeded(question);

            let (conversation, rewritten) =
                self.rewrite(conversation, question, &metadata, cancel).await?;

            let (conversation, procedure) = self
                .classify(conversation, &rewritten, &metadata, cancel)
                .await?;

            let specialist = procedure.specialist();
            tracing::info!(
                label = procedure.label(),
                specialist = specialist.header(),
                "Dispatching to specialist"
            );

            let stage = Stage::Dispatch(specialist);
            let agent = self.registry.specialist(specialist);
            let run = self
                .invoke(stage, agent, conversation.turns().to_vec(), &metadata, cancel)
                .await?;
            let conversation = conversation.extended(run.new_turns);

            tracing::info!(turns = conversation.len(), "Workflow completed");

            Ok::<_, AppError>(RunResult {
                specialist,
                procedure,
                rewritten_question: rewritten,
                answer: run.final_output,
                conversation,
            })
        }
        .instrument(span)
        .await
    }

    async fn rewrite(
        &self,
        conversation: Conversation,
        question: &str,
        metadata: &RunMetadata,
        cancel: &CancellationToken,
    ) -> AppResult<(Conversation, String)> {
        let pending = Turn::user(StageTemplate::OriginalQuestion.render(question)?);
        let input = conversation.with_pending(pending);

        let run = self
            .invoke(
                Stage::Rewrite,
                self.registry.get(AgentId::Rewrite),
                input,
                metadata,
                cancel,
            )
            .await?;

        tracing::debug!(rewritten = %run.final_output, "Rewrote question");
        Ok((conversation.extended(run.new_turns), run.final_output))
    }

    async fn classify(
        &self,
        conversation: Conversation,
        rewritten: &str,
        metadata: &RunMetadata,
        cancel: &CancellationToken,
    ) -> AppResult<(Conversation, OperatingProcedure)> {
        let pending = Turn::user(StageTemplate::RewrittenQuestion.render(rewritten)?);
        let input = conversation.with_pending(pending);

        let run = self
            .invoke(
                Stage::Classify,
                self.registry.get(AgentId::Classify),
                input,
                metadata,
                cancel,
            )
            .await?;

        let parsed: ClassifySchema = serde_json::from_str(&run.final_output).map_err(|e| {
            AppError::agent(
                Stage::Classify.to_string(),
                format!("Malformed structured output {:?}: {}", run.final_output, e),
            )
        })?;

        Ok((
            conversation.extended(run.new_turns),
            OperatingProcedure::parse(&parsed.operating_procedure),
        ))
    }

    /// Invoke one agent under the stage deadline and the run's cancellation token.
    async fn invoke(
        &self,
        stage: Stage,
        agent: &AgentDefinition,
        input: Vec<Turn>,
        metadata: &RunMetadata,
        cancel: &CancellationToken,
    ) -> AppResult<AgentRun> {
        let span = tracing::info_span!("stage", name = %stage, agent = %agent.name);
        let deadline = self.config.stage_timeout;

        async {
            tracing::info!(input_turns = input.len(), "Invoking agent");

            let call = tokio::time::timeout(deadline, self.runner.run(agent, &input, metadata));

            let run = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::warn!("Stage cancelled");
                    return Err(AppError::Cancelled(format!("stage '{}'", stage)));
                }
                outcome = call => match outcome {
                    Ok(Ok(run)) => run,
                    Ok(Err(AppError::Llm(message))) => {
                        return Err(AppError::agent(stage.to_string(), message));
                    }
                    Ok(Err(other)) => return Err(other),
                    Err(_) => {
                        tracing::warn!(?deadline, "Stage timed out");
                        return Err(AppError::Timeout(format!(
                            "stage '{}' exceeded {:?}",
                            stage, deadline
                        )));
                    }
                },
            };

            tracing::info!(new_turns = run.new_turns.len(), "Agent finished");
            Ok::<_, AppError>(run)
        }
        .instrument(span)
        .await
    }
}

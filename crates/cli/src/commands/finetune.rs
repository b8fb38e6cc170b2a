//! Fine-tune command handlers.

use clap::{Args, Subcommand};
use concierge_core::{config::AppConfig, AppError, AppResult};
use concierge_llm::{create_client, FineTuningJob};
use concierge_office::{build_training_jsonl, load_vocabulary};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

/// Name the training data is uploaded under.
const TRAINING_FILE_NAME: &str = "vocab_chat.jsonl";

/// Fine-tune a model on a bilingual vocabulary sheet
#[derive(Args, Debug)]
pub struct FineTuneCommand {
    #[command(subcommand)]
    pub command: FineTuneSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum FineTuneSubcommand {
    /// Upload the vocabulary and start a fine-tuning job
    Create(CreateArgs),

    /// Show the state of a fine-tuning job
    Status(StatusArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Vocabulary workbook (default: fineTune.vocabulary)
    #[arg(long)]
    pub vocabulary: Option<PathBuf>,

    /// Model to fine-tune (default: fineTune.baseModel)
    #[arg(long)]
    pub base_model: Option<String>,

    /// Write the training JSONL here instead of uploading it
    #[arg(long)]
    pub dry_run: Option<PathBuf>,

    /// Return after the job is created instead of waiting for it to finish
    #[arg(long)]
    pub no_wait: bool,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Fine-tuning job id
    #[arg(long)]
    pub job: String,
}

impl FineTuneCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.command {
            FineTuneSubcommand::Create(args) => execute_create(args, config).await,
            FineTuneSubcommand::Status(args) => execute_status(args, config).await,
        }
    }
}

async fn execute_create(args: &CreateArgs, config: &AppConfig) -> AppResult<()> {
    tracing::info!("Executing finetune create command");

    let vocabulary = args
        .vocabulary
        .clone()
        .or_else(|| config.fine_tune.vocabulary.clone())
        .ok_or_else(|| {
            AppError::Config(
                "No vocabulary workbook (use --vocabulary or fineTune.vocabulary)".to_string(),
            )
        })?;

    let pairs = load_vocabulary(
        &vocabulary,
        &config.fine_tune.source_column,
        &config.fine_tune.target_column,
    )?;
    if pairs.is_empty() {
        return Err(AppError::Document(format!(
            "No term pairs found in {}",
            vocabulary.display()
        )));
    }
    let jsonl = build_training_jsonl(&pairs)?;

    if let Some(ref path) = args.dry_run {
        std::fs::write(path, &jsonl)?;
        println!("Wrote {} training examples to {}", pairs.len(), path.display());
        return Ok(());
    }

    let client = create_client(config)?;
    let base_model = args
        .base_model
        .clone()
        .unwrap_or_else(|| config.fine_tune.base_model.clone());

    let file = client
        .upload_file(TRAINING_FILE_NAME, jsonl.into_bytes(), "fine-tune")
        .await?;
    tracing::info!(file = %file.id, examples = pairs.len(), "Uploaded training file");

    let job = client.create_fine_tuning_job(&file.id, &base_model).await?;
    println!("Fine-Tune Job ID: {}; status: {}", job.id, job.status);
    println!("------------------");

    if args.no_wait {
        return Ok(());
    }

    let interval = Duration::from_secs(config.fine_tune.poll_interval_secs);
    let job = wait_for_job(|| client.retrieve_fine_tuning_job(&job.id), interval).await?;
    match job.fine_tuned_model {
        Some(ref model) => println!("Fine-Tune Model ID: {}", model),
        None => println!("Fine-Tune Model ID: (none, job {})", job.status),
    }

    Ok(())
}

/// Poll `fetch` until the job reaches a terminal state.
async fn wait_for_job<F, Fut>(mut fetch: F, interval: Duration) -> AppResult<FineTuningJob>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<FineTuningJob>>,
{
    loop {
        let job = fetch().await?;
        println!("Status: {}", job.status);
        if job.status.is_terminal() {
            if let Some(ref error) = job.error {
                tracing::warn!(job = %job.id, error = %error, "Fine-tuning job reported an error");
            }
            return Ok(job);
        }
        tokio::time::sleep(interval).await;
    }
}

async fn execute_status(args: &StatusArgs, config: &AppConfig) -> AppResult<()> {
    tracing::info!("Executing finetune status command");

    let client = create_client(config)?;
    let job = client.retrieve_fine_tuning_job(&args.job).await?;

    println!("Fine-Tune Job ID: {}; status: {}", job.id, job.status);
    println!("Base model: {}", job.model);
    if let Some(ref model) = job.fine_tuned_model {
        println!("Fine-Tune Model ID: {}", model);
    }

    Ok(())
}

//! Translate command handler.

use clap::Args;
use concierge_core::{config::AppConfig, AppError, AppResult};
use concierge_llm::create_client;
use concierge_office::{
    output_path_for, uniquify, ParagraphEvent, ProgressReporter, TranslateOptions, Translator,
};
use std::path::PathBuf;
use std::sync::Arc;

const RULE: &str = "-------------------------------------";

/// Translate a Japanese .docx into English paragraph by paragraph
#[derive(Args, Debug)]
pub struct TranslateCommand {
    /// Source document (default: translate.input from the config file)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory for the translated copy (default: current directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Translation model (default: translate.model or translate.modelEnv)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Show per-paragraph progress lines on stderr
    #[arg(long)]
    pub progress: bool,
}

impl TranslateCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing translate command");

        let input = self
            .input
            .clone()
            .or_else(|| config.translate.input.clone())
            .ok_or_else(|| {
                AppError::Config("No input document (use --input or translate.input)".to_string())
            })?;
        let model = match self.model {
            Some(ref model) => model.clone(),
            None => config.translation_model()?,
        };

        let client = create_client(config)?;

        let dir = match self.output_dir {
            Some(ref dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        let output = uniquify(&output_path_for(&input, &dir));
        tracing::info!(input = %input.display(), output = %output.display(), model = %model, "Translating document");

        let reporter = if self.progress {
            ProgressReporter::new(Arc::new(|event| eprintln!("{}", event.format_simple())))
        } else {
            ProgressReporter::noop()
        };

        let translator = Translator::new(
            client.as_ref(),
            TranslateOptions::from_settings(&config.translate, model),
        );
        let report = translator
            .translate_file(&input, &output, &reporter, &mut print_event)
            .await?;

        if report.failed > 0 {
            tracing::warn!(failed = report.failed, "Some paragraphs were left untranslated");
        }
        println!("完了: {}", report.output.display());

        Ok(())
    }
}

fn print_event(event: &ParagraphEvent) {
    match event {
        ParagraphEvent::Source { text, .. } => {
            println!("===========================");
            println!("【原文】{}", text);
        }
        ParagraphEvent::Translated { text, .. } => {
            println!("{}", RULE);
            println!("【翻訳】{}", text);
            println!("{}", RULE);
        }
        ParagraphEvent::Failed { error, .. } => {
            println!("翻訳エラー: {}", error);
        }
    }
}

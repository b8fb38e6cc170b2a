//! Concierge CLI
//!
//! Main entry point for the concierge command-line tool: multi-agent query
//! routing, document translation, fine-tuning and model management.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    ChatCommand, ClockCommand, FineTuneCommand, ModelsCommand, RouteCommand, TranslateCommand,
};
use concierge_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Concierge - routes questions to specialist agents and runs OpenAI utilities
#[derive(Parser, Debug)]
#[command(name = "concierge")]
#[command(about = "Routes questions to specialist agents and runs OpenAI utilities", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "CONCIERGE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "CONCIERGE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Route a question through rewrite, classify and one specialist agent
    Route(RouteCommand),

    /// Translate a Japanese .docx into English paragraph by paragraph
    Translate(TranslateCommand),

    /// Fine-tune a model on a bilingual vocabulary sheet
    #[command(name = "finetune")]
    FineTune(FineTuneCommand),

    /// List or delete models
    Models(ModelsCommand),

    /// Send one chat message
    Chat(ChatCommand),

    /// Function-calling demo: ask the model for the current time
    Clock(ClockCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Workspace and config file decide which YAML is merged, so they are
    // applied while loading rather than as overrides afterwards
    let config = AppConfig::load_from(cli.workspace.clone(), cli.config.clone())?;

    let model = match &cli.command {
        Commands::Route(cmd) => cmd.model.clone(),
        _ => None,
    };
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );
    config.validate()?;

    logging::init_logging(
        config.log_level.as_deref(),
        config.no_color,
        config.log_file.as_deref(),
    )?;

    tracing::info!("Concierge starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Endpoint: {}", config.openai.endpoint);

    let command_name = match &cli.command {
        Commands::Route(_) => "route",
        Commands::Translate(_) => "translate",
        Commands::FineTune(_) => "finetune",
        Commands::Models(_) => "models",
        Commands::Chat(_) => "chat",
        Commands::Clock(_) => "clock",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Route(cmd) => cmd.execute(&config).await,
        Commands::Translate(cmd) => cmd.execute(&config).await,
        Commands::FineTune(cmd) => cmd.execute(&config).await,
        Commands::Models(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Clock(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}

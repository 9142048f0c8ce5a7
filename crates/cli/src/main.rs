//! Binh Dinh travel assistant CLI
//!
//! Entry point for the `dulich` command-line tool: a one-shot `ask`
//! command and an interactive `chat` read-loop over the RAG pipeline.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand};
use dulich_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Travel assistant for Binh Dinh tourism, culture, and history
#[derive(Parser, Debug)]
#[command(name = "dulich")]
#[command(about = "RAG chatbot for Binh Dinh travel questions", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "DULICH_CONFIG")]
    config: Option<PathBuf>,

    /// Model identifier
    #[arg(short, long, global = true, env = "DULICH_MODEL")]
    model: Option<String>,

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
    /// Ask a single question
    Ask(AskCommand),

    /// Interactive chat with conversation history
    Chat(ChatCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load()?;
    let config = config.with_overrides(
        cli.config,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Travel assistant starting");
    tracing::debug!("Model: {}", config.model);
    tracing::debug!("Search index: {}", config.search_index);

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}

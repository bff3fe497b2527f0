//! CLI module for Confab
//!
//! Provides the interactive commands:
//! - `chat`: full-screen chat TUI (the default)
//! - `ask`: submit one question and print the answer

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod ask;
pub mod tui;

/// Confab multi-agent chat client CLI
#[derive(Parser, Debug)]
#[command(name = "confab")]
#[command(about = "Terminal chat client for a multi-agent orchestration backend")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = "confab.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the interactive chat TUI (default)
    Chat,
    /// Submit one question and print the answer
    Ask {
        /// The question to submit
        question: String,
        /// Also print the formatted execution trace to stderr
        #[arg(long)]
        trace: bool,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = crate::config::AppConfig::load(&cli.config)?;

    match cli.command {
        Some(Commands::Ask { question, trace }) => ask::run(config, question, trace).await,
        Some(Commands::Chat) | None => tui::run(config).await,
    }
}

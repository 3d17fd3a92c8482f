//! CLI module for the document processor
//!
//! Provides subcommands:
//! - `ask`: answer a question about one or more documents
//! - `split`: show how a document would be fragmented

pub mod ask;
pub mod split;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// PMP Document Processor - ask questions about documents of any size
#[derive(Parser)]
#[command(name = "pmp-document-processor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Answer a question about one or more documents
    Ask(ask::AskArgs),

    /// Print the fragment plan for a document without calling the model
    Split(split::SplitArgs),
}

/// Load `.env`, configuration and logging shared by every subcommand
fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    if let Err(e) = logging::init_logging(&config.logging) {
        eprintln!("logging disabled: {e}");
    }
    Ok(config)
}

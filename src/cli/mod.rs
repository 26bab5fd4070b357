//! CLI module for the answer evaluation cache
//!
//! Provides subcommands for operating the cache:
//! - `resolve`: grade one answer through the cache
//! - `replay`: resolve a JSONL file of answers with bounded concurrency
//! - `inspect`: list the cached records of a question

pub mod inspect;
pub mod replay;
pub mod resolve;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Answer Evaluation Cache - reuse LLM grades of repeated answers
#[derive(Parser, Debug)]
#[command(name = "answer-eval-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding default.toml and local.toml
    #[arg(long, global = true, default_value = "config")]
    pub config_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve one answer and print the evaluation
    Resolve(resolve::ResolveArgs),

    /// Resolve every answer in a JSONL file
    Replay(replay::ReplayArgs),

    /// Print the cached records of a question
    Inspect(inspect::InspectArgs),
}

/// Load `.env` and configuration, then install logging
fn bootstrap(config_dir: &Path) -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load(config_dir)?;
    logging::init_logging(&config.logging)?;

    Ok(config)
}

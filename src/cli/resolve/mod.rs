//! Resolve command - grades one answer through the cache

use std::path::Path;

use clap::Args;
use tracing::info;

/// Arguments for the resolve command
#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Question ID
    #[arg(long)]
    pub question: String,

    /// Answer text to grade
    #[arg(long)]
    pub answer: String,
}

/// Resolve one answer and print the resolution as JSON
pub async fn run(config_dir: &Path, args: ResolveArgs) -> anyhow::Result<()> {
    let config = super::bootstrap(config_dir)?;
    let cache = crate::create_answer_cache(&config).await?;

    let resolution = cache.resolve_detailed(&args.question, &args.answer).await?;
    info!(source = resolution.source.as_str(), "Answer resolved");

    println!("{}", serde_json::to_string_pretty(&resolution)?);

    Ok(())
}

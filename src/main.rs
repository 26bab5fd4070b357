use answer_eval_cache::cli::{self, Cli, Command};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli {
        config_dir,
        command,
    } = Cli::parse();

    match command {
        Command::Resolve(args) => cli::resolve::run(&config_dir, args).await,
        Command::Replay(args) => cli::replay::run(&config_dir, args).await,
        Command::Inspect(args) => cli::inspect::run(&config_dir, args).await,
    }
}

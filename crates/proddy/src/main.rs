//! proddy - A conversational productivity assistant
//!
//! Runs the assistant as an interactive terminal chat. Replies go to
//! stdout; logs go to stderr (set RUST_LOG=proddy=debug to see them).

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { user, name } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(cli::cmd_chat(cli.config, user, name))
        }
        Commands::Config { init } => cli::cmd_config(cli.config, init),
        Commands::Paths => cli::cmd_paths(cli.config),
    }
}

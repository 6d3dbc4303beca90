//! CLI command definitions and handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use proddy::{render, Dispatcher, Inbound, MemoryStore, Sender, SessionEngine, Store};
use proddy_core::{Config, Paths};

/// proddy - A conversational productivity assistant
#[derive(Parser)]
#[command(name = "proddy")]
#[command(version)]
#[command(about = "Pomodoro timer, task list and goal tracker you talk to")]
#[command(after_help = "EXAMPLES:\n\
    proddy chat\n\
    proddy chat --user alice --name Alice\n\
    proddy config --init\n\
    proddy paths\n\n\
CHAT:\n\
    Type 'help' for commands. Lines starting with 'cb:' are sent as\n\
    button callbacks, e.g. 'cb:pomodoro_start'. 'quit' or Ctrl-C exits.")]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session
    #[command(alias = "c")]
    Chat {
        /// User id to chat as
        #[arg(long, default_value = "local")]
        user: String,

        /// Display name used in greetings
        #[arg(long, default_value = "friend")]
        name: String,
    },

    /// Show the effective configuration
    Config {
        /// Write the default configuration file if none exists
        #[arg(long)]
        init: bool,
    },

    /// Show where Proddy keeps its files
    Paths,
}

fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| Paths::new().config_file())
}

pub async fn cmd_chat(config_file: Option<PathBuf>, user: String, name: String) -> Result<()> {
    let config = Config::load(&config_path(config_file))?;

    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let (engine, mut notifications) = SessionEngine::new(store.clone(), config);
    let dispatcher = Dispatcher::new(store, engine.clone()).context("Failed to build intent parser")?;
    let sender = Sender::new(user, name);
    info!(user_id = %sender.user_id, "chat session started");

    println!("Proddy is listening. Say 'hello', or 'quit' to leave.\n");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(raw) = line.context("Failed to read from stdin")? else {
                    break;
                };
                let line = raw.trim();
                if line.is_empty() {
                    continue;
                }
                if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
                    break;
                }

                let inbound = match line.strip_prefix("cb:") {
                    Some(payload) => Inbound::Callback(payload.trim().to_string()),
                    None => Inbound::Text(line.to_string()),
                };
                let reply = dispatcher.handle(&sender, inbound).await;
                println!("{}\n", render::reply_text(&reply));
            }
            Some(notification) = notifications.recv() => {
                println!("{}\n", render::notification_text(&notification));
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    engine.shutdown();
    info!("chat session ended");
    Ok(())
}

pub fn cmd_config(config_file: Option<PathBuf>, init: bool) -> Result<()> {
    let path = config_path(config_file);

    if init && !path.exists() {
        Config::default().save(&path)?;
        println!("[ok] Wrote {}", path.display());
    }

    let config = Config::load(&path)?;
    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

pub fn cmd_paths(config_file: Option<PathBuf>) -> Result<()> {
    let paths = Paths::new();
    println!("Config: {}", config_path(config_file).display());
    println!("Data:   {}", paths.data.display());
    Ok(())
}

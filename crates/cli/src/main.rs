//! redbind CLI
//!
//! Issues (conditional) key commands against Redis and inspects listener
//! configuration.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::FileConfig;

/// redbind CLI: conditional Redis commands from the shell.
#[derive(Parser, Debug)]
#[command(name = "redbind", version, about)]
struct Cli {
    /// Configuration file (TOML).
    #[arg(long, env = "REDBIND_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Redis URL, overriding the configuration file.
    #[arg(long, env = "REDBIND_URL", global = true)]
    url: Option<String>,

    /// Key prefix, overriding the configuration file.
    #[arg(long, global = true)]
    prefix: Option<String>,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Get the value of a key.
    Get(commands::keys::KeyArgs),
    /// Set a key, optionally only if a condition holds.
    Set(commands::keys::SetArgs),
    /// Delete a key, optionally only if a condition holds.
    Del(commands::keys::DelArgs),
    /// Print the digest of a key's value.
    Digest(commands::keys::KeyArgs),
    /// Classify a destination as a channel or a pattern.
    Topic(commands::topics::TopicArgs),
    /// List the configured listener endpoints.
    Listeners,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    if let Some(url) = &cli.url {
        config.redis.url.clone_from(url);
    }
    if let Some(prefix) = &cli.prefix {
        config.redis.prefix = Some(prefix.clone());
    }

    match cli.command {
        Command::Get(args) => commands::keys::get(&config.redis, &args, &cli.format).await,
        Command::Set(args) => commands::keys::set(&config.redis, &args, &cli.format).await,
        Command::Del(args) => commands::keys::del(&config.redis, &args, &cli.format).await,
        Command::Digest(args) => commands::keys::digest(&config.redis, &args, &cli.format).await,
        Command::Topic(args) => commands::topics::topic(&config.listener, &args, &cli.format),
        Command::Listeners => commands::topics::listeners(&config.listener, &cli.format),
    }
}

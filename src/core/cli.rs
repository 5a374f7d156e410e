use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::constants::{ENV_CONFIG, ENV_DEFAULT_DELIVER, ENV_DEFAULT_LINGER, ENV_DEFAULT_TIMEOUT, ENV_HOST, ENV_LOG, ENV_PORT};

#[derive(Parser)]
#[command(name = "linger")]
#[command(version, about = "In-process message broker", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Enable debug-level request logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Path to a JSON config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Log filter (tracing-subscriber EnvFilter syntax)
    #[arg(long, global = true, env = ENV_LOG)]
    pub log: Option<String>,

    /// Default visibility timeout in seconds, applied when a request omits one
    #[arg(long, global = true, env = ENV_DEFAULT_TIMEOUT)]
    pub default_timeout: Option<f64>,

    /// Default linger (message TTL) in seconds, 0 disables (never purge)
    #[arg(long, global = true, env = ENV_DEFAULT_LINGER)]
    pub default_linger: Option<f64>,

    /// Default delivery cap, 0 means unlimited
    #[arg(long, global = true, env = ENV_DEFAULT_DELIVER)]
    pub default_deliver: Option<u32>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the broker (default command)
    Start,
}

/// Configuration derived from CLI arguments.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub debug: bool,
    pub config: Option<PathBuf>,
    pub log: Option<String>,
    pub default_timeout: Option<f64>,
    pub default_linger: Option<f64>,
    pub default_deliver: Option<u32>,
}

/// Parse CLI arguments and return config with command.
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        debug: cli.debug,
        config: cli.config,
        log: cli.log,
        default_timeout: cli.default_timeout,
        default_linger: cli.default_linger,
        default_deliver: cli.default_deliver,
    };
    (config, cli.command)
}

//! Application configuration, merged from (highest to lowest precedence)
//! CLI flags, environment variables, an optional JSON config file, then
//! built-in defaults — the same layering the CLI's `env = ENV_X` attributes
//! already encode for everything except the JSON file, which this module
//! merges in underneath them.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::cli::CliConfig;
use super::constants::{
    DEFAULT_DELIVER, DEFAULT_HOST, DEFAULT_LINGER_SECS, DEFAULT_PORT, DEFAULT_TIMEOUT_SECS,
};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Broker-wide defaults applied when a request doesn't specify its own
/// timeout/linger/deliver.
#[derive(Debug, Clone, Copy)]
pub struct EngineDefaults {
    pub timeout: f64,
    pub linger: Option<f64>,
    pub deliver: u32,
}

impl Default for EngineDefaults {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT_SECS,
            linger: DEFAULT_LINGER_SECS,
            deliver: DEFAULT_DELIVER,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub engine: EngineDefaults,
    pub log_filter: Option<String>,
    pub debug: bool,
}

/// Shape of the optional JSON config file. Every field is optional: the
/// file only overrides what it sets, the rest falls through to env/CLI/
/// defaults.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    default_timeout: Option<f64>,
    default_linger: Option<f64>,
    default_deliver: Option<u32>,
    log: Option<String>,
}

impl AppConfig {
    pub fn load(cli: &CliConfig) -> anyhow::Result<Self> {
        let file = match &cli.config {
            Some(path) => load_file(path)?,
            None => {
                let default_path = Path::new(super::constants::CONFIG_FILE_NAME);
                if default_path.exists() {
                    load_file(default_path)?
                } else {
                    FileConfig::default()
                }
            }
        };

        let server = ServerConfig {
            host: cli
                .host
                .clone()
                .or(file.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
        };

        let engine = EngineDefaults {
            timeout: cli
                .default_timeout
                .or(file.default_timeout)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            // A configured linger of zero (or less) means the same thing a
            // request-level `linger=0` does — no linger at all — so it's
            // normalized to `None` here, once, rather than relying on every
            // call site that reads `EngineDefaults.linger` to re-check it.
            linger: cli
                .default_linger
                .or(file.default_linger)
                .or(DEFAULT_LINGER_SECS)
                .filter(|l| *l > 0.0),
            deliver: cli
                .default_deliver
                .or(file.default_deliver)
                .unwrap_or(DEFAULT_DELIVER),
        };

        Ok(Self {
            server,
            engine,
            log_filter: cli.log.clone().or(file.log),
            debug: cli.debug,
        })
    }
}

fn load_file(path: &Path) -> anyhow::Result<FileConfig> {
    let contents = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {}", path.display(), e))?;
    serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("invalid config file {}: {}", path.display(), e))
}

/// `true` when `host` means "bind to every interface" (`0.0.0.0` or `::`).
pub fn is_all_interfaces(host: &str) -> bool {
    host == "0.0.0.0" || host == "::"
}

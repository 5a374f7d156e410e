//! Core application

use anyhow::Result;

use crate::api::ApiServer;
use crate::core::banner;
use crate::core::cli;
use crate::core::config::AppConfig;
use crate::core::shutdown::ShutdownService;
use crate::engine::Engine;

/// Everything the broker needs to run: the engine, resolved config, and the
/// shutdown coordinator. Cloning `Engine` is cheap (it's an `Arc` handle),
/// so `CoreApp` doesn't need one itself beyond what it hands to the API
/// server.
pub struct CoreApp {
    pub engine: Engine,
    pub config: AppConfig,
    pub shutdown: ShutdownService,
}

impl CoreApp {
    /// Entry point used by `main`: load env/CLI/config, wire up the engine
    /// and HTTP adapter, run until shutdown.
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        let (cli_config, _command) = cli::parse();

        let app = Self::init(&cli_config)?;
        Self::start_server(app).await
    }

    fn init(cli_config: &cli::CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli_config)?;
        let engine = Engine::new();
        let shutdown = ShutdownService::new();

        Ok(Self {
            engine,
            config,
            shutdown,
        })
    }

    fn init_logging() {
        use tracing_subscriber::EnvFilter;

        let filter = std::env::var("LINGER_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "info,linger=info".to_string());

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(EnvFilter::new(filter))
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        app.shutdown.install_signal_handlers();

        let host = app.config.server.host.clone();
        let port = app.config.server.port;
        banner::print_banner(&host, port);

        let shutdown = app.shutdown.clone();
        let server = ApiServer::new(app);
        server.start().await?;

        shutdown.shutdown().await;
        Ok(())
    }
}

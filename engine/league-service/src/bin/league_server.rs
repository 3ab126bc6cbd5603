//! League server
//!
//! Loads the league data file, serves the REST API and, when configured,
//! writes the league data back to disk on shutdown.

use anyhow::{Context, Result};
use clap::Parser;
use league_service::{
    create_routes, initialize_logging_with_config, setup_signal_handlers, DraftBoard,
    KeeperCostService, LeagueServiceConfig, TradeDesk,
};
use league_store::InMemoryLeagueStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "league-server")]
#[command(about = "Keeper league pricing and trade service")]
struct Args {
    /// League data file
    #[arg(short, long)]
    data_file: Option<PathBuf>,

    /// Host to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to bind
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (json, pretty, compact)
    #[arg(long)]
    log_format: Option<String>,

    /// Write league data back to the data file on shutdown
    #[arg(long)]
    save_on_shutdown: bool,
}

impl Args {
    fn apply(self, config: &mut LeagueServiceConfig) {
        if let Some(data_file) = self.data_file {
            config.data.data_file = data_file;
        }
        if let Some(host) = self.host {
            config.http.host = host;
        }
        if let Some(port) = self.port {
            config.http.port = port;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level.to_lowercase();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format.to_lowercase();
        }
        if self.save_on_shutdown {
            config.data.save_on_shutdown = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration; flags win over the environment and are validated together
    let mut config = LeagueServiceConfig::from_env().context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    initialize_logging_with_config(&config.logging.level, &config.logging.format)?;
    info!("Starting League Service v{}", env!("CARGO_PKG_VERSION"));

    // Load league data
    let store = InMemoryLeagueStore::load_from_file(&config.data.data_file)
        .await
        .with_context(|| format!("Failed to load league data from {:?}", config.data.data_file))?;
    let store = Arc::new(store);

    let keeper = KeeperCostService::new(store.clone(), config.keeper.self_trade_policy);
    let desk = TradeDesk::new(keeper.clone());
    let board = DraftBoard::new(keeper.clone());
    let routes = create_routes(Arc::new(keeper), Arc::new(desk), Arc::new(board));

    // Setup signal handlers for graceful shutdown
    let shutdown_signal = setup_signal_handlers()?;

    let addr = config.socket_addr()?;
    let (bound, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(addr, async {
            let _ = shutdown_signal.await;
            info!("Shutdown signal received. Stopping HTTP server...");
        })
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("League Service listening on {}", bound);
    server.await;

    if config.data.save_on_shutdown {
        if let Err(e) = store.save_to_file(&config.data.data_file).await {
            error!("Failed to save league data: {}", e);
        }
    }

    info!("League Service shutdown complete");
    Ok(())
}

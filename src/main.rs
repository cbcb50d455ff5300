//! sql-gateway - runs ad-hoc SQL from HTTP requests against MySQL.

use anyhow::Context;
use sql_gateway::cli::Cli;
use sql_gateway::config::{ConnectionConfig, ENV_DB_PASSWORD};
use sql_gateway::db::MySqlConnector;
use sql_gateway::gateway::QueryGateway;
use sql_gateway::logging;
use sql_gateway::server::GatewayServer;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    // Not through tracing: logging may be what failed to start
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // Load .env before clap so GATEWAY_* and DB_* can come from it
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse_args();
    logging::init_stderr_logging(&cli.log_level)?;

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    // Settings are re-read per request; this only reports problems early.
    match ConnectionConfig::from_env() {
        Ok(config) => info!("Database: {}", config.display_string()),
        Err(e) => warn!("{} (requests will fail until {} is set)", e, ENV_DB_PASSWORD),
    }

    let gateway = QueryGateway::new(MySqlConnector::new());
    let server = GatewayServer::new(cli.server_config(), gateway);
    let addr = server.socket_addr();

    server
        .start()
        .await
        .with_context(|| format!("HTTP server on {addr} failed"))?;

    info!("Server stopped");
    Ok(())
}

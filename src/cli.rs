//! Command-line argument parsing for the gateway.
//!
//! Database settings are not CLI arguments: they are read from `DB_*`
//! environment variables whenever a connection is opened.

use crate::config::ServerConfig;
use clap::Parser;
use std::net::IpAddr;

/// HTTP gateway that runs SQL from the `q` query parameter against MySQL.
#[derive(Parser, Debug)]
#[command(name = "sql-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, value_name = "ADDR", env = "GATEWAY_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short = 'p', long, value_name = "PORT", env = "GATEWAY_PORT", default_value = "5000")]
    pub port: u16,

    /// Log filter used when RUST_LOG is unset (e.g. "debug", "sql_gateway=trace")
    #[arg(long, value_name = "FILTER", env = "GATEWAY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the listener configuration.
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
        }
    }
}

//! Configuration management for the gateway.
//!
//! Database connection settings come from `DB_*` environment variables and are
//! resolved each time a connection is opened. Server settings come from the CLI.

use crate::error::{GatewayError, Result};
use sqlx::mysql::MySqlConnectOptions;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

pub const ENV_DB_HOST: &str = "DB_HOST";
pub const ENV_DB_PORT: &str = "DB_PORT";
pub const ENV_DB_USER: &str = "DB_USER";
pub const ENV_DB_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_DB_NAME: &str = "DB_NAME";

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_user() -> String {
    "root".to_string()
}

fn default_database() -> String {
    "movix_db".to_string()
}

/// Database connection configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Database host.
    pub host: String,

    /// Database port.
    pub port: u16,

    /// Database user.
    pub user: String,

    /// Database password. Required, has no default.
    pub password: String,

    /// Database (schema) name.
    pub database: String,
}

impl ConnectionConfig {
    /// Reads the connection settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the settings from an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let password = get(ENV_DB_PASSWORD).ok_or_else(|| {
            GatewayError::config(format!(
                "Database password not set. Export the {ENV_DB_PASSWORD} environment variable."
            ))
        })?;

        let port = match get(ENV_DB_PORT) {
            Some(raw) => raw.parse().map_err(|_| {
                GatewayError::config(format!("Invalid {ENV_DB_PORT} value '{raw}'"))
            })?,
            None => default_port(),
        };

        Ok(Self {
            host: get(ENV_DB_HOST).unwrap_or_else(default_host),
            port,
            user: get(ENV_DB_USER).unwrap_or_else(default_user),
            password,
            database: get(ENV_DB_NAME).unwrap_or_else(default_database),
        })
    }

    /// Converts the settings into sqlx connect options.
    pub fn to_connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }

    /// Returns a display-safe string (no password) for logs.
    pub fn display_string(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind to (default: all interfaces).
    pub host: IpAddr,

    /// Port to bind to (default: 5000).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 5000,
        }
    }
}

impl ServerConfig {
    /// Returns the socket address to listen on.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

//! Database abstraction layer for the gateway.
//!
//! Provides a trait-based interface for opening per-request connections and
//! executing statements, so the HTTP layer can be exercised without a server.

mod mock;
mod mysql;
mod types;

pub use mock::{MockConnector, ScriptedResult};
pub use mysql::{MySqlClient, MySqlConnector};
pub use types::{MutationSummary, Outcome, Row, Value};

use crate::error::Result;
use async_trait::async_trait;

/// Opens database connections.
///
/// Each call yields a fresh connection; nothing is pooled or reused.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a new connection, resolving settings at call time.
    async fn connect(&self) -> Result<Box<dyn DatabaseClient>>;
}

/// A single open database connection.
#[async_trait]
pub trait DatabaseClient: Send {
    /// Executes one SQL statement verbatim and classifies what it produced.
    async fn execute(&mut self, sql: &str) -> Result<Outcome>;

    /// Closes the connection.
    async fn close(self: Box<Self>) -> Result<()>;
}

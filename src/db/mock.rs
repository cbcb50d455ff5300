//! Mock connector for testing.
//!
//! Hands out in-memory connections that replay scripted outcomes and keep
//! count of how many connections were opened and how many are still open.

use super::{Connector, DatabaseClient, Outcome};
use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// What a mock connection does when it sees a given SQL string.
#[derive(Debug, Clone)]
pub enum ScriptedResult {
    /// Return this outcome.
    Ok(Outcome),
    /// Fail with this error.
    Err(GatewayError),
}

#[derive(Debug, Default)]
struct Counters {
    opened: AtomicUsize,
    open: AtomicUsize,
}

/// A mock connector that returns predefined results.
///
/// Unscripted SQL yields an empty mutation. Cloning shares the counters.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    script: Arc<Mutex<HashMap<String, ScriptedResult>>>,
    connect_error: Option<GatewayError>,
    counters: Arc<Counters>,
}

impl MockConnector {
    /// Creates a connector whose connections succeed with empty outcomes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a connector whose every connection attempt fails.
    pub fn failing(error: GatewayError) -> Self {
        Self {
            connect_error: Some(error),
            ..Self::default()
        }
    }

    /// Scripts the result for an exact SQL string.
    pub fn with_result(self, sql: impl Into<String>, result: ScriptedResult) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.insert(sql.into(), result);
        }
        self
    }

    /// Number of connection attempts that succeeded.
    pub fn opened_connections(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    /// Number of connections opened and not yet closed.
    pub fn open_connections(&self) -> usize {
        self.counters.open.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self) -> Result<Box<dyn DatabaseClient>> {
        if let Some(error) = &self.connect_error {
            return Err(error.clone());
        }

        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        self.counters.open.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MockClient {
            script: Arc::clone(&self.script),
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct MockClient {
    script: Arc<Mutex<HashMap<String, ScriptedResult>>>,
    counters: Arc<Counters>,
}

#[async_trait]
impl DatabaseClient for MockClient {
    async fn execute(&mut self, sql: &str) -> Result<Outcome> {
        let scripted = self
            .script
            .lock()
            .map_err(|_| GatewayError::internal("mock script lock poisoned"))?
            .get(sql)
            .cloned();

        match scripted {
            Some(ScriptedResult::Ok(outcome)) => Ok(outcome),
            Some(ScriptedResult::Err(error)) => Err(error),
            None => Ok(Outcome::mutation(0)),
        }
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.counters.open.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

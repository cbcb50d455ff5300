//! The query gateway.
//!
//! Turns one HTTP request into one statement execution on a fresh connection.
//! Nothing is retained between requests.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use tracing::{debug, info, warn};

use crate::db::{Connector, Outcome};
use crate::error::{GatewayError, Result};

/// Name of the query-string parameter carrying the SQL text.
pub const SQL_PARAM: &str = "q";

/// Executes caller-supplied SQL through a connector.
#[derive(Clone)]
pub struct QueryGateway {
    connector: Arc<dyn Connector>,
}

impl QueryGateway {
    /// Creates a gateway that opens connections through `connector`.
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self {
            connector: Arc::new(connector),
        }
    }

    /// Runs one statement: connect, execute, close.
    ///
    /// Missing or empty SQL fails before any connection is attempted. The
    /// connection is closed whether or not execution succeeded; a failure to
    /// close is logged and does not change the outcome.
    pub async fn run(&self, sql: Option<&str>) -> Result<Outcome> {
        let sql = sql
            .filter(|sql| !sql.is_empty())
            .ok_or(GatewayError::MissingQuery)?;

        debug!(sql, "Executing statement");

        let mut client = self.connector.connect().await?;
        let result = client.execute(sql).await;

        if let Err(e) = client.close().await {
            warn!("Failed to close database connection: {}", e);
        }

        result
    }
}

/// Returns the first value of `name` among decoded query-string pairs.
fn first_param<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// `GET /query?q=<sql>`
pub async fn query_handler(
    State(gateway): State<QueryGateway>,
    params: std::result::Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Outcome>> {
    let Query(pairs) = params.map_err(|rejection| {
        warn!("Rejected query string: {}", rejection);
        GatewayError::bad_request(rejection.body_text())
    })?;

    match gateway.run(first_param(&pairs, SQL_PARAM)).await {
        Ok(outcome) => {
            info!(
                kind = outcome.kind(),
                count = outcome.count(),
                "Statement completed"
            );
            Ok(Json(outcome))
        }
        Err(e) => {
            warn!("{}: {}", e.category(), e);
            Err(e)
        }
    }
}

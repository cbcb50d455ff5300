//! MySQL database client implementation.
//!
//! Provides `MySqlConnector`, which opens one unpooled sqlx connection per
//! request, and `MySqlClient`, which implements the `DatabaseClient` trait on it.

use crate::config::ConnectionConfig;
use crate::db::{Connector, DatabaseClient, Outcome, Row, Value};
use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::TryStreamExt;
use sqlx::mysql::{MySqlConnection, MySqlDatabaseError, MySqlQueryResult, MySqlRow, MySqlStatement};
use sqlx::{Column as SqlxColumn, Connection, Either, Executor, Row as SqlxRow, Statement};
use sqlx::{TypeInfo, ValueRef};
use tracing::debug;

/// MySQL client error: can't connect to the server.
const CR_CONN_HOST_ERROR: u16 = 2003;

/// MySQL client error: lost connection to the server during a query.
const CR_SERVER_LOST: u16 = 2013;

/// SQLSTATE MySQL reports for errors without a more specific class.
const GENERAL_SQLSTATE: &str = "HY000";

const MULTIPLE_STATEMENTS_MESSAGE: &str =
    "Multiple statements in one query are not supported";

/// Opens MySQL connections using settings read from the environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlConnector;

impl MySqlConnector {
    /// Creates a connector; settings are read on every `connect`.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    async fn connect(&self) -> Result<Box<dyn DatabaseClient>> {
        let config = ConnectionConfig::from_env()?;
        let client = MySqlClient::connect(&config).await?;
        Ok(Box::new(client))
    }
}

/// A single MySQL connection.
///
/// Autocommit is switched off, so nothing a request does persists unless
/// `execute` commits it. Closing without a commit rolls the work back.
#[derive(Debug)]
pub struct MySqlClient {
    conn: MySqlConnection,
}

impl MySqlClient {
    /// Opens a new connection with the given settings.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        debug!("Connecting to {}", config.display_string());

        let mut conn = MySqlConnection::connect_with(&config.to_connect_options())
            .await
            .map_err(|e| map_driver_error(e, CR_CONN_HOST_ERROR))?;

        run_raw(&mut conn, "SET autocommit = 0")
            .await
            .map_err(|e| map_driver_error(e, CR_CONN_HOST_ERROR))?;

        Ok(Self { conn })
    }

    /// Asks the server whether the statement yields a result set.
    ///
    /// Returns `None` when the statement cannot be prepared. MySQL refuses to
    /// prepare some valid statements and any text holding more than one
    /// statement; genuine errors resurface on execution.
    async fn describes_result_set(&mut self, sql: &str) -> Option<bool> {
        match prepare(&mut self.conn, sql).await {
            Ok(statement) => Some(!statement.columns().is_empty()),
            Err(e) => {
                debug!("Could not prepare statement for classification: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl DatabaseClient for MySqlClient {
    async fn execute(&mut self, sql: &str) -> Result<Outcome> {
        let described = self.describes_result_set(sql).await;

        let mut execution = Execution::default();
        {
            let mut stream = fetch_results(&mut self.conn, sql);
            while let Some(item) = stream
                .try_next()
                .await
                .map_err(|e| map_driver_error(e, CR_SERVER_LOST))?
            {
                execution.record(item)?;
            }
        }

        let outcome = classify(described, execution)?;
        if let Outcome::Mutation(_) = outcome {
            run_raw(&mut self.conn, "COMMIT")
                .await
                .map_err(|e| map_driver_error(e, CR_SERVER_LOST))?;
        }

        Ok(outcome)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| map_driver_error(e, CR_SERVER_LOST))
    }
}

// Concrete MySQL signatures for the `Executor` calls. Awaiting the generic
// projections directly inside the `Send` async-trait futures does not type-check.

fn prepare<'c>(
    conn: &'c mut MySqlConnection,
    sql: &'c str,
) -> BoxFuture<'c, sqlx::Result<MySqlStatement<'c>>> {
    conn.prepare(sql)
}

fn fetch_results<'c>(
    conn: &'c mut MySqlConnection,
    sql: &'c str,
) -> BoxStream<'c, sqlx::Result<Either<MySqlQueryResult, MySqlRow>>> {
    conn.fetch_many(sqlx::raw_sql(sql))
}

fn run_raw<'c>(
    conn: &'c mut MySqlConnection,
    sql: &'c str,
) -> BoxFuture<'c, sqlx::Result<MySqlQueryResult>> {
    conn.execute(sqlx::raw_sql(sql))
}

/// What streaming a statement's results produced.
#[derive(Debug, Default)]
struct Execution {
    /// Rows of the first result set.
    rows: Vec<Row>,
    affected_rows: u64,
    /// Completed results, one per statement or result set.
    results: usize,
}

impl Execution {
    fn record(&mut self, item: Either<MySqlQueryResult, MySqlRow>) -> Result<()> {
        match item {
            Either::Left(done) => {
                self.results += 1;
                self.affected_rows += done.rows_affected();
            }
            Either::Right(row) if self.results == 0 => self.rows.push(convert_row(&row)?),
            Either::Right(_) => {}
        }
        Ok(())
    }
}

/// Decides between a row set and a mutation.
///
/// A statement the server described with columns is a row set, as is one
/// that streamed rows anyway (a `CALL` describes as column-less). Text that
/// could not be prepared and produced more than one result held several
/// statements and is refused; since nothing was committed it leaves no trace.
fn classify(described: Option<bool>, execution: Execution) -> Result<Outcome> {
    if described.is_none() && execution.results > 1 {
        return Err(GatewayError::internal(MULTIPLE_STATEMENTS_MESSAGE));
    }

    if described.unwrap_or(false) || !execution.rows.is_empty() {
        Ok(Outcome::RowSet(execution.rows))
    } else {
        Ok(Outcome::mutation(execution.affected_rows))
    }
}

/// Converts a sqlx MySqlRow to our Row type.
fn convert_row(row: &MySqlRow) -> Result<Row> {
    let mut converted = Row::new();
    for col in row.columns() {
        let value = convert_value(row, col.ordinal(), col.type_info().name())?;
        converted.insert(col.name(), value);
    }
    Ok(converted)
}

/// Converts a single column value from a MySqlRow to our Value type.
///
/// Statements run over the text protocol, so every non-NULL value arrives as
/// the server's text rendering and is parsed according to the column type.
fn convert_value(row: &MySqlRow, index: usize, type_name: &str) -> Result<Value> {
    let raw = row.try_get_raw(index).map_err(decode_error)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    if is_binary_type(type_name) {
        let bytes: Vec<u8> = row.try_get_unchecked(index).map_err(decode_error)?;
        return Ok(binary_value(type_name, bytes));
    }

    let text: String = row.try_get_unchecked(index).map_err(decode_error)?;
    Ok(text_value(type_name, text))
}

fn is_binary_type(type_name: &str) -> bool {
    matches!(
        type_name,
        "BIT" | "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB"
            | "GEOMETRY"
    )
}

/// Maps binary column contents: BIT as an integer, UTF-8 as text, the rest as bytes.
fn binary_value(type_name: &str, bytes: Vec<u8>) -> Value {
    if type_name == "BIT" && bytes.len() <= 8 {
        let bits = bytes
            .iter()
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));
        return Value::UInt(bits);
    }

    match String::from_utf8(bytes) {
        Ok(text) => Value::String(text),
        Err(e) => Value::Bytes(e.into_bytes()),
    }
}

/// Maps a textual column value by its MySQL type name.
///
/// Falls back to the raw text when the server's rendering does not parse.
fn text_value(type_name: &str, text: String) -> Value {
    let (base, unsigned) = match type_name.strip_suffix(" UNSIGNED") {
        Some(base) => (base, true),
        None => (type_name, false),
    };

    match base {
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            if unsigned {
                text.parse().map(Value::UInt).unwrap_or(Value::String(text))
            } else {
                text.parse().map(Value::Int).unwrap_or(Value::String(text))
            }
        }
        "FLOAT" | "DOUBLE" => text.parse().map(Value::Float).unwrap_or(Value::String(text)),
        "DECIMAL" => Value::Decimal(text),
        _ => Value::String(text),
    }
}

fn decode_error(error: sqlx::Error) -> GatewayError {
    GatewayError::internal(format!("Failed to decode column value: {error}"))
}

/// Maps sqlx errors onto the gateway error taxonomy.
///
/// Server-reported errors keep their MySQL error number and SQLSTATE. Transport
/// failures get the client error number for the phase they interrupted.
fn map_driver_error(error: sqlx::Error, client_code: u16) -> GatewayError {
    match &error {
        sqlx::Error::Database(db_error) => {
            if let Some(mysql_error) = db_error.try_downcast_ref::<MySqlDatabaseError>() {
                GatewayError::database(
                    mysql_error.message(),
                    mysql_error.number(),
                    mysql_error.code().unwrap_or(GENERAL_SQLSTATE),
                )
            } else {
                let sqlstate = db_error
                    .code()
                    .map(|code| code.into_owned())
                    .unwrap_or_else(|| GENERAL_SQLSTATE.to_string());
                GatewayError::database(db_error.message(), client_code, sqlstate)
            }
        }
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
            GatewayError::database(error.to_string(), client_code, GENERAL_SQLSTATE)
        }
        _ => GatewayError::internal(error.to_string()),
    }
}

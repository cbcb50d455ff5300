//! Error types for the gateway.
//!
//! Defines the main error enum and its mapping onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Message returned when the request carries no SQL text.
pub const MISSING_QUERY_MESSAGE: &str = "No SQL query provided";

/// Main error type for gateway operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The `q` parameter was absent or empty.
    #[error("{}", MISSING_QUERY_MESSAGE)]
    MissingQuery,

    /// The query string could not be decoded.
    #[error("{0}")]
    BadRequest(String),

    /// Configuration errors (required setting absent, unparsable value, etc.)
    #[error("{0}")]
    Config(String),

    /// Errors reported by the database or its driver (syntax, constraints, connectivity).
    #[error("{message}")]
    Database {
        message: String,
        code: u16,
        sqlstate: String,
    },

    /// Anything else (value decoding, unexpected driver states, etc.)
    #[error("{0}")]
    Internal(String),
}

impl GatewayError {
    /// Creates a bad request error with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a database error carrying the server's error number and SQLSTATE.
    pub fn database(msg: impl Into<String>, code: u16, sqlstate: impl Into<String>) -> Self {
        Self::Database {
            message: msg.into(),
            code,
            sqlstate: sqlstate.into(),
        }
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingQuery | Self::BadRequest(_) => "Client Error",
            Self::Config(_) => "Configuration Error",
            Self::Database { .. } => "Database Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingQuery | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Database { .. } | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Builds the JSON body sent to the caller.
    pub fn to_response_body(&self) -> ErrorResponse {
        match self {
            Self::Database {
                message,
                code,
                sqlstate,
            } => ErrorResponse {
                error: message.clone(),
                code: Some(*code),
                sqlstate: Some(sqlstate.clone()),
            },
            other => ErrorResponse {
                error: other.to_string(),
                code: None,
                sqlstate: None,
            },
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_response_body())).into_response()
    }
}

/// Error body returned to HTTP callers.
///
/// `code` and `sqlstate` are present only for database-originated errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sqlstate: Option<String>,
}

/// Result type alias using GatewayError.
pub type Result<T> = std::result::Result<T, GatewayError>;

//! sql-gateway - a single-endpoint HTTP gateway for ad-hoc SQL.
//!
//! `GET /query?q=<sql>` opens a MySQL connection, runs the statement verbatim,
//! and answers with the rows or the affected-row count as JSON.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod server;

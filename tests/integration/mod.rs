//! Integration tests for sql-gateway.

pub mod router_test;

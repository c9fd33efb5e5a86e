//! # Taskboard Shared Library
//!
//! Types, persistence and identity primitives used by the Taskboard API
//! server and its integration tests.
//!
//! ## Module Organization
//!
//! - `db`: connection pool, migrations and append-order assignment
//! - `models`: database models and their queries
//! - `auth`: identity token validation
//! - `error`: domain errors raised by model operations

pub mod auth;
pub mod db;
pub mod error;
pub mod models;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

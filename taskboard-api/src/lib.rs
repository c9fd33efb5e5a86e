//! # Taskboard API Server Library
//!
//! HTTP surface of the Taskboard backend: projects, lists, tasks with their
//! subtasks and comments, users and notifications.
//!
//! ## Modules
//!
//! - `app`: Application state, router and identity layer
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Validated JSON bodies and request helpers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

//! # Todo Shared Library
//!
//! Domain types, storage and business rules used by the todo API server.
//!
//! ## Module Organization
//!
//! - `models`: database models and their SQL operations
//! - `store`: storage traits with PostgreSQL and in-memory backends
//! - `filter`: search and date-window filtering of task lists
//! - `service`: owner-scoped task operations
//! - `auth`: password hashing, session tokens and session resolution
//! - `db`: connection pool and migrations
//! - `error`: storage error type

pub mod auth;
pub mod db;
pub mod error;
pub mod filter;
pub mod models;
pub mod service;
pub mod store;

/// Current version of the todo shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

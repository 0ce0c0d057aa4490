//! # Plannr Shared Library
//!
//! Domain types, tier policy, persistence and service clients used by the
//! Plannr API server.
//!
//! ## Module Organization
//!
//! - `tier`: subscription tier limits and capability checks
//! - `models`: database rows and their queries
//! - `db`: connection pool and migrations
//! - `store`: storage traits with PostgreSQL and in-memory implementations
//! - `resources`: per-entity state holders with loading/error tracking
//! - `auth`: provider tokens, sessions, admin lookups, authorization
//! - `cms`: headless CMS content

pub mod auth;
pub mod cms;
pub mod db;
pub mod models;
pub mod resources;
pub mod store;
pub mod tier;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

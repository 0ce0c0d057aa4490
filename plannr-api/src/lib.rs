//! # Plannr API Server Library
//!
//! HTTP surface of Plannr: page models behind the session gate, the JSON
//! API under `/api`, and the admin user lookup.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Session gate and security headers
//! - `pages`: Page controllers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod pages;
pub mod routes;

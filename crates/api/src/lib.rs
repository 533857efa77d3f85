//! Pathway HTTP API.
//!
//! Exposes config, state, error handling and the router so the binary and
//! the integration tests build the same app.

#![forbid(unsafe_code)]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

//! HTTP API module.
//!
//! This module provides the HTTP server, its response types and the
//! pipeline log broadcaster.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::{app, start_server, AppState, SharedState};
pub use types::*;

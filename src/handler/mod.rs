//! Custom handler HTTP layer
//!
//! The functions host forwards `/api/<function>` requests to this server.
//!
//! # Modules
//!
//! - [`goversion_select`]: Resolves a constraint to the greatest Go version
//! - [`demo`]: Hello-world, ping and environment dump functions
//! - [`server`]: Router, request logging and server lifecycle

pub mod demo;
pub mod goversion_select;
pub mod server;

use std::sync::Arc;

use crate::version::resolver::VersionResolver;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<VersionResolver>,
    pub build_version: Arc<str>,
}

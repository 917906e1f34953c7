//! Server initialization and lifecycle

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::any;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::HandlerConfig;
use crate::handler::AppState;
use crate::handler::demo::{env_dump, hello_world, ping};
use crate::handler::goversion_select::goversion_select;
use crate::version::cache::VersionCache;
use crate::version::error::FetchError;
use crate::version::resolver::VersionResolver;
use crate::version::source::HttpVersionSource;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] FetchError),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppState {
    /// Wire the production version source, cache and resolver
    pub fn from_config(config: &HandlerConfig) -> Result<Self, ServerError> {
        let versions = &config.versions;
        let source = HttpVersionSource::new(&versions.source, versions.fetch_timeout())?;
        let cache = VersionCache::new(Arc::new(source), versions.max_age());
        let resolver = VersionResolver::new(cache)
            .with_fallback(versions.fallback)
            .with_serve_stale(versions.serve_stale);

        Ok(Self {
            resolver: Arc::new(resolver),
            build_version: Arc::from(config.build_version.as_str()),
        })
    }
}

/// Build the router for every function this handler serves
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/goversion_select", any(goversion_select))
        .route("/api/helloworld", any(hello_world))
        .route("/api/ping", any(ping))
        .route("/api/env", any(env_dump))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn log_request(request: Request, next: Next) -> Response {
    info!(method = %request.method(), uri = %request.uri(), "got a request");
    next.run(request).await
}

pub async fn run_server(config: HandlerConfig) -> Result<(), ServerError> {
    let state = AppState::from_config(&config)?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let listener = TcpListener::bind(addr).await?;
    info!(
        "About to listen on {}. Go to http://127.0.0.1:{}/",
        addr, config.port
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

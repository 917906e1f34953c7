//! Version source test utilities

use std::sync::Arc;
use std::time::Duration;

use azurefuncs::config::FallbackPolicy;
use azurefuncs::handler::AppState;
use azurefuncs::handler::server::router;
use azurefuncs::version::cache::VersionCache;
use azurefuncs::version::resolver::VersionResolver;
use azurefuncs::version::source::HttpVersionSource;
use axum::Router;

/// Create handler state backed by a real HTTP source at `url`
fn create_test_state(url: &str, fallback: FallbackPolicy) -> AppState {
    let source = HttpVersionSource::new(url, Duration::from_secs(5)).unwrap();
    let cache = VersionCache::new(Arc::new(source), Duration::from_secs(900));
    let resolver = VersionResolver::new(cache).with_fallback(fallback);

    AppState {
        resolver: Arc::new(resolver),
        build_version: Arc::from("test-build"),
    }
}

/// Create the router and keep a handle on its state for inspection
pub fn create_test_app(url: &str, fallback: FallbackPolicy) -> (Router, AppState) {
    let state = create_test_state(url, fallback);
    (router(state.clone()), state)
}

/// URL on a loopback port nothing listens on
pub fn unreachable_url() -> String {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    format!("http://{addr}/versions.txt")
}

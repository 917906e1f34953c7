use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::version::error::CacheError;
use crate::version::goversion::Version;
use crate::version::source::VersionSource;

/// Monotonic time source used for staleness checks
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Default)]
struct CacheState {
    versions: Arc<Vec<Version>>,
    fetched_at: Option<Instant>,
}

impl CacheState {
    fn is_stale(&self, now: Instant, max_age: Duration) -> bool {
        match self.fetched_at {
            None => true,
            Some(fetched_at) => now.saturating_duration_since(fetched_at) > max_age,
        }
    }
}

/// In-memory cache of the remote version list.
///
/// The lock is held across the staleness check, the fetch and the update,
/// so at most one fetch is in flight. The refresh itself runs in its own
/// task that owns the lock: a caller that gives up waiting does not abort
/// it, and later callers get its result.
pub struct VersionCache {
    state: Arc<Mutex<CacheState>>,
    source: Arc<dyn VersionSource>,
    clock: Arc<dyn Clock>,
    max_age: Duration,
}

impl VersionCache {
    pub fn new(source: Arc<dyn VersionSource>, max_age: Duration) -> Self {
        Self::with_clock(source, max_age, Arc::new(SystemClock))
    }

    pub fn with_clock(
        source: Arc<dyn VersionSource>,
        max_age: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        info!(
            "Version cache for {} initialized (max age {:?})",
            source.location(),
            max_age
        );

        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            source,
            clock,
            max_age,
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Get the cached versions, refreshing them first when stale.
    ///
    /// On a failed refresh the error carries the previous list, which is
    /// left untouched together with its fetch time.
    pub async fn get_versions(&self) -> Result<Arc<Vec<Version>>, CacheError> {
        let state = Arc::clone(&self.state).lock_owned().await;

        if !state.is_stale(self.clock.now(), self.max_age) {
            debug!("Serving {} cached versions", state.versions.len());
            return Ok(Arc::clone(&state.versions));
        }

        let source = Arc::clone(&self.source);
        let clock = Arc::clone(&self.clock);
        tokio::spawn(refresh(state, source, clock)).await?
    }

    /// Current contents without triggering a refresh
    pub async fn snapshot(&self) -> Arc<Vec<Version>> {
        Arc::clone(&self.state.lock().await.versions)
    }
}

async fn refresh(
    mut state: OwnedMutexGuard<CacheState>,
    source: Arc<dyn VersionSource>,
    clock: Arc<dyn Clock>,
) -> Result<Arc<Vec<Version>>, CacheError> {
    let location = source.location();
    debug!("Refreshing version list from {}", location);

    let body = match source.fetch_list().await {
        Ok(body) => body,
        Err(e) => {
            warn!("Failed to fetch version list from {}: {}", location, e);
            return Err(CacheError::Fetch {
                source: e,
                stale: Arc::clone(&state.versions),
            });
        }
    };

    let versions = parse_version_list(&body);
    info!("Fetched {} versions from {}", versions.len(), location);

    state.versions = Arc::new(versions);
    state.fetched_at = Some(clock.now());
    Ok(Arc::clone(&state.versions))
}

/// Parse a version list document, one literal per line.
///
/// Blank and unparsable lines are skipped.
pub fn parse_version_list(body: &str) -> Vec<Version> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            Version::parse(line)
                .inspect_err(|e| debug!("Skipping version list line: {}", e))
                .ok()
        })
        .collect()
}

/// Clock that only moves when told to
#[cfg(test)]
pub(crate) struct ManualClock {
    now: std::sync::Mutex<Instant>,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            now: std::sync::Mutex::new(Instant::now()),
        })
    }

    pub(crate) fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}

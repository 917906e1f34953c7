//! Version resolution: constraint + candidates (or the cached remote list)
//! to the single greatest satisfying version.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::FallbackPolicy;
use crate::version::cache::VersionCache;
use crate::version::constraint::Constraint;
use crate::version::error::{CacheError, ResolveError};
use crate::version::goversion::Version;
use crate::version::select::max_match;

/// One resolution query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveRequest {
    /// Constraint expression; `None` or empty means `1.x`
    pub constraint: Option<String>,
    /// Comma-separated version literals; `None` or empty means use the remote list
    pub candidates: Option<String>,
    /// Never fall back to the remote list when candidates are given
    pub exclusive: bool,
}

pub struct VersionResolver {
    cache: VersionCache,
    fallback: FallbackPolicy,
    serve_stale: bool,
}

impl VersionResolver {
    pub fn new(cache: VersionCache) -> Self {
        Self {
            cache,
            fallback: FallbackPolicy::default(),
            serve_stale: false,
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_serve_stale(mut self, serve_stale: bool) -> Self {
        self.serve_stale = serve_stale;
        self
    }

    pub fn cache(&self) -> &VersionCache {
        &self.cache
    }

    pub async fn resolve(&self, request: &ResolveRequest) -> Result<Version, ResolveError> {
        let constraint = Constraint::parse(request.constraint.as_deref().unwrap_or_default())
            .map_err(ResolveError::InvalidConstraint)?;

        let Some(candidates) = request.candidates.as_deref().filter(|c| !c.is_empty()) else {
            let versions = self.remote_versions().await?;
            return select(&constraint, &versions);
        };

        let candidates = parse_candidates(candidates)?;
        if let Some(found) = max_match(&constraint, &candidates) {
            return Ok(found.clone());
        }

        if request.exclusive || self.fallback == FallbackPolicy::Never {
            return Err(ResolveError::NoMatch);
        }

        debug!(
            "No candidate satisfies {}, falling back to remote list",
            constraint
        );
        match self.remote_versions().await {
            Ok(versions) => select(&constraint, &versions),
            Err(e) => {
                warn!("Fallback to remote list failed: {}", e);
                Err(ResolveError::NoMatch)
            }
        }
    }

    async fn remote_versions(&self) -> Result<Arc<Vec<Version>>, ResolveError> {
        match self.cache.get_versions().await {
            Ok(versions) => Ok(versions),
            Err(CacheError::Fetch { stale, source }) if self.serve_stale && !stale.is_empty() => {
                warn!(
                    "Serving {} stale versions after refresh failure: {}",
                    stale.len(),
                    source
                );
                Ok(stale)
            }
            Err(e) => Err(ResolveError::Unavailable(e)),
        }
    }
}

fn select(constraint: &Constraint, versions: &[Version]) -> Result<Version, ResolveError> {
    max_match(constraint, versions)
        .cloned()
        .ok_or(ResolveError::NoMatch)
}

/// Parse a comma-separated candidate list; any bad literal fails the whole list
fn parse_candidates(candidates: &str) -> Result<Vec<Version>, ResolveError> {
    candidates
        .split(',')
        .map(|literal| {
            Version::parse(literal).map_err(|source| ResolveError::InvalidCandidate {
                literal: literal.to_string(),
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::cache::ManualClock;
    use crate::version::error::FetchError;
    use crate::version::source::MockVersionSource;
    use rstest::rstest;
    use std::time::Duration;

    fn resolver_with(source: MockVersionSource) -> VersionResolver {
        VersionResolver::new(VersionCache::new(
            Arc::new(source),
            Duration::from_secs(900),
        ))
    }

    fn mock_source() -> MockVersionSource {
        let mut source = MockVersionSource::new();
        source
            .expect_location()
            .return_const("mock://versions.txt".to_string());
        source
    }

    /// Source that must never be hit
    fn unused_source() -> MockVersionSource {
        let mut source = mock_source();
        source.expect_fetch_list().never();
        source
    }

    fn listing(body: &'static str) -> MockVersionSource {
        let mut source = mock_source();
        source
            .expect_fetch_list()
            .times(1)
            .returning(move || Ok(body.to_string()));
        source
    }

    fn failing() -> MockVersionSource {
        let mut source = mock_source();
        source.expect_fetch_list().returning(|| {
            Err(FetchError::Status {
                status: 502,
                url: "mock://versions.txt".to_string(),
            })
        });
        source
    }

    fn request(
        constraint: Option<&str>,
        candidates: Option<&str>,
        exclusive: bool,
    ) -> ResolveRequest {
        ResolveRequest {
            constraint: constraint.map(str::to_string),
            candidates: candidates.map(str::to_string),
            exclusive,
        }
    }

    #[rstest]
    #[case(Some("1.x"), "1.2.0,1.10.0,2.0.0", "1.10.0")]
    #[case(None, "1.2.0,1.10.0,2.0.0", "1.10.0")]
    #[case(Some(""), "1.2.0,1.10.0,2.0.0", "1.10.0")]
    #[case(Some("2.x"), "1.2.0,1.10.0,2.0.0", "2.0.0")]
    #[case(Some(">=1.15, <1.16"), "1.15.8,1.16,1.14", "1.15.8")]
    #[case(Some("~1.15.2"), "go1.15.3,go1.16", "1.15.3")]
    #[tokio::test]
    async fn resolve_selects_greatest_matching_candidate(
        #[case] constraint: Option<&str>,
        #[case] candidates: &str,
        #[case] expected: &str,
    ) {
        let resolver = resolver_with(unused_source());

        let result = resolver
            .resolve(&request(constraint, Some(candidates), true))
            .await
            .unwrap();

        assert_eq!(result.to_string(), expected);
    }

    #[tokio::test]
    async fn resolve_is_idempotent() {
        let resolver = resolver_with(unused_source());
        let req = request(Some("1.x"), Some("1.2.0,1.10.0,2.0.0"), true);

        let first = resolver.resolve(&req).await.unwrap();
        let second = resolver.resolve(&req).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn resolve_rejects_malformed_constraint() {
        let resolver = resolver_with(unused_source());

        let result = resolver
            .resolve(&request(Some("not-a-version"), None, false))
            .await;

        assert!(matches!(result, Err(ResolveError::InvalidConstraint(_))));
    }

    #[tokio::test]
    async fn resolve_rejects_malformed_candidate() {
        let resolver = resolver_with(unused_source());

        let result = resolver
            .resolve(&request(None, Some("1.2.0,bogus,1.3.0"), false))
            .await;

        match result {
            Err(ResolveError::InvalidCandidate { literal, .. }) => assert_eq!(literal, "bogus"),
            other => panic!("expected invalid candidate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn resolve_exclusive_candidates_without_match_is_not_found() {
        let resolver = resolver_with(unused_source());

        let result = resolver
            .resolve(&request(Some("1.5.2"), Some("1.5.1,1.5.3"), true))
            .await;

        assert!(matches!(result, Err(ResolveError::NoMatch)));
    }

    #[tokio::test]
    async fn resolve_never_policy_ignores_remote_list() {
        let resolver = resolver_with(unused_source()).with_fallback(FallbackPolicy::Never);

        let result = resolver
            .resolve(&request(Some("1.5.2"), Some("1.5.1,1.5.3"), false))
            .await;

        assert!(matches!(result, Err(ResolveError::NoMatch)));
    }

    #[tokio::test]
    async fn resolve_falls_back_to_remote_list_when_no_candidate_matches() {
        let resolver = resolver_with(listing("1.5.0\n1.5.2\n1.6.0\n"));

        let result = resolver
            .resolve(&request(Some("1.5.2"), Some("1.5.1,1.5.3"), false))
            .await
            .unwrap();

        assert_eq!(result.to_string(), "1.5.2");
    }

    #[tokio::test]
    async fn resolve_fallback_fetch_failure_is_not_found() {
        let resolver = resolver_with(failing());

        let result = resolver
            .resolve(&request(Some("1.5.2"), Some("1.5.1"), false))
            .await;

        assert!(matches!(result, Err(ResolveError::NoMatch)));
    }

    #[tokio::test]
    async fn resolve_uses_remote_list_without_candidates() {
        let resolver = resolver_with(listing("1.16.2\n1.16.1\n1.17rc1\n1.15.8\n"));

        let first = resolver.resolve(&request(None, None, false)).await.unwrap();
        let second = resolver
            .resolve(&request(Some("1.15.x"), Some(""), false))
            .await
            .unwrap();

        assert_eq!(first.to_string(), "1.16.2");
        assert_eq!(second.to_string(), "1.15.8");
    }

    #[tokio::test]
    async fn resolve_remote_list_without_match_is_not_found() {
        let resolver = resolver_with(listing("1.16.2\n"));

        let result = resolver.resolve(&request(Some("2.x"), None, false)).await;

        assert!(matches!(result, Err(ResolveError::NoMatch)));
    }

    #[tokio::test]
    async fn resolve_unreachable_remote_list_is_unavailable() {
        let resolver = resolver_with(failing());

        let result = resolver.resolve(&request(None, None, false)).await;

        assert!(matches!(
            result,
            Err(ResolveError::Unavailable(CacheError::Fetch { .. }))
        ));
        assert!(resolver.cache().snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn resolve_serves_stale_list_when_enabled() {
        let mut source = mock_source();
        let mut seq = mockall::Sequence::new();
        source
            .expect_fetch_list()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok("1.16.2\n".to_string()));
        source
            .expect_fetch_list()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| {
                Err(FetchError::Status {
                    status: 502,
                    url: "mock://versions.txt".to_string(),
                })
            });
        let clock = ManualClock::new();
        let max_age = Duration::from_secs(900);
        let cache = VersionCache::with_clock(Arc::new(source), max_age, clock.clone());
        let resolver = VersionResolver::new(cache).with_serve_stale(true);

        resolver.resolve(&request(None, None, false)).await.unwrap();
        clock.advance(max_age + Duration::from_secs(1));
        let result = resolver.resolve(&request(None, None, false)).await.unwrap();

        assert_eq!(result.to_string(), "1.16.2");
    }

    #[tokio::test]
    async fn resolve_stale_list_is_unavailable_by_default() {
        let mut source = mock_source();
        let mut seq = mockall::Sequence::new();
        source
            .expect_fetch_list()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok("1.16.2\n".to_string()));
        source
            .expect_fetch_list()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| {
                Err(FetchError::Status {
                    status: 502,
                    url: "mock://versions.txt".to_string(),
                })
            });
        let clock = ManualClock::new();
        let max_age = Duration::from_secs(900);
        let cache = VersionCache::with_clock(Arc::new(source), max_age, clock.clone());
        let resolver = VersionResolver::new(cache);

        resolver.resolve(&request(None, None, false)).await.unwrap();
        clock.advance(max_age + Duration::from_secs(1));
        let result = resolver.resolve(&request(None, None, false)).await;

        assert!(matches!(result, Err(ResolveError::Unavailable(_))));
    }
}

use std::sync::Arc;

use thiserror::Error;

use crate::version::goversion::Version;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid go version {literal:?}: {reason}")]
    InvalidVersion { literal: String, reason: String },

    #[error("invalid constraint {expr:?}: {reason}")]
    InvalidConstraint { expr: String, reason: String },
}

impl ParseError {
    pub(crate) fn version(literal: &str, reason: impl Into<String>) -> Self {
        Self::InvalidVersion {
            literal: literal.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn constraint(expr: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConstraint {
            expr: expr.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Invalid response body: {0}")]
    Body(String),
}

#[derive(Debug, Error)]
pub enum CacheError {
    /// The refresh failed. `stale` holds whatever the cache had before.
    #[error("Failed to refresh version list: {source}")]
    Fetch {
        #[source]
        source: FetchError,
        stale: Arc<Vec<Version>>,
    },

    #[error("Refresh task aborted: {0}")]
    Aborted(#[from] tokio::task::JoinError),
}

/// Outcome of a failed resolution, one variant per response class
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid constraint")]
    InvalidConstraint(#[source] ParseError),

    #[error("invalid go version {literal:?}")]
    InvalidCandidate {
        literal: String,
        #[source]
        source: ParseError,
    },

    #[error("no matching version found")]
    NoMatch,

    #[error("version list unavailable")]
    Unavailable(#[from] CacheError),
}

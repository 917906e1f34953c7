//! Go release version literals
//!
//! Go releases are numbered `MAJOR[.MINOR[.PATCH]]` with an optional
//! pre-release suffix glued to the last component:
//! - Release: `1.16`, `1.16.2`
//! - Pre-release: `1.16beta1`, `1.16rc2`, `1.9.2rc2`
//! - Toolchain form: `go1.16.2` (the `go` prefix is accepted and dropped)
//!
//! Internally each version is a `semver::Version` with missing components
//! padded with zeros and the suffix split into `kind.number`, so `beta2`
//! sorts before `beta10` and every pre-release sorts before its release.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use semver::Prerelease;

use crate::version::error::ParseError;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:go)?(0|[1-9][0-9]*)(?:\.(0|[1-9][0-9]*))?(?:\.(0|[1-9][0-9]*))?(?:(alpha|beta|rc)(0|[1-9][0-9]*))?$",
    )
    .expect("version pattern is valid")
});

/// A parsed Go release version.
///
/// Equality and ordering ignore how many components the literal spelled
/// out: `1.16` and `1.16.0` are the same version.
#[derive(Debug, Clone)]
pub struct Version {
    inner: semver::Version,
    components: usize,
}

impl Version {
    /// Parse a version literal, trimming surrounding whitespace.
    pub fn parse(literal: &str) -> Result<Self, ParseError> {
        let trimmed = literal.trim();
        if trimmed.is_empty() {
            return Err(ParseError::version(literal, "empty version"));
        }

        let caps = VERSION_RE
            .captures(trimmed)
            .ok_or_else(|| ParseError::version(literal, "not a go release version"))?;

        let number = |idx: usize| -> Result<Option<u64>, ParseError> {
            caps.get(idx)
                .map(|m| {
                    m.as_str()
                        .parse::<u64>()
                        .map_err(|e| ParseError::version(literal, e.to_string()))
                })
                .transpose()
        };

        let major = number(1)?.unwrap_or_default();
        let minor = number(2)?;
        let patch = number(3)?;
        let pre_number = number(5)?;

        let components = 1 + usize::from(minor.is_some()) + usize::from(patch.is_some());
        let mut inner = semver::Version::new(
            major,
            minor.unwrap_or_default(),
            patch.unwrap_or_default(),
        );

        if let (Some(kind), Some(n)) = (caps.get(4), pre_number) {
            inner.pre = Prerelease::new(&format!("{}.{}", kind.as_str(), n))
                .map_err(|e| ParseError::version(literal, e.to_string()))?;
        }

        Ok(Self { inner, components })
    }

    pub fn major(&self) -> u64 {
        self.inner.major
    }

    pub fn minor(&self) -> u64 {
        self.inner.minor
    }

    pub fn patch(&self) -> u64 {
        self.inner.patch
    }

    pub fn is_prerelease(&self) -> bool {
        !self.inner.pre.is_empty()
    }

    /// Same version with the pre-release suffix removed.
    pub fn release(&self) -> Self {
        let mut inner = self.inner.clone();
        inner.pre = Prerelease::EMPTY;
        Self {
            inner,
            components: self.components,
        }
    }

    pub(crate) fn from_parts(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            inner: semver::Version::new(major, minor, patch),
            components: 3,
        }
    }

    pub fn greater_than(&self, other: &Self) -> bool {
        self > other
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}

impl FromStr for Version {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.major)?;
        if self.components >= 2 {
            write!(f, ".{}", self.inner.minor)?;
        }
        if self.components >= 3 {
            write!(f, ".{}", self.inner.patch)?;
        }
        if !self.inner.pre.is_empty() {
            // stored as "beta.1", rendered as "beta1"
            for ident in self.inner.pre.as_str().split('.') {
                f.write_str(ident)?;
            }
        }
        Ok(())
    }
}

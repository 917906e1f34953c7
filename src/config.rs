use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Defaults
// =============================================================================

/// Constraint used when a request supplies none
pub const DEFAULT_CONSTRAINT: &str = "1.x";

/// Default maximum age of the cached version list in seconds (15 minutes)
pub const DEFAULT_MAX_AGE_SECS: u64 = 15 * 60;

/// Timeout for fetching the version list in seconds
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Port used when the functions host doesn't assign one
pub const DEFAULT_PORT: u16 = 9834;

/// Environment variable the functions host sets to the port to listen on
pub const PORT_ENV: &str = "FUNCTIONS_CUSTOMHANDLER_PORT";

/// Plaintext list of Go releases, one per line
pub const DEFAULT_VERSIONS_SOURCE: &str =
    "https://raw.githubusercontent.com/WillAbides/goreleases/main/versions.txt";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid FUNCTIONS_CUSTOMHANDLER_PORT value {0:?}")]
    InvalidPort(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Handler configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct HandlerConfig {
    pub port: u16,
    /// Reported by the ping handler. Defaults to `AZUREFUNCS_BUILD_VERSION`
    /// at compile time, then the crate version.
    pub build_version: String,
    pub versions: VersionsConfig,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            build_version: option_env!("AZUREFUNCS_BUILD_VERSION")
                .unwrap_or(env!("CARGO_PKG_VERSION"))
                .to_string(),
            versions: VersionsConfig::default(),
        }
    }
}

/// Version resolution configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct VersionsConfig {
    /// URL of the remote version list
    pub source: String,
    /// Cache maximum age in seconds
    pub max_age_secs: u64,
    /// HTTP timeout for fetching the list in seconds
    pub fetch_timeout_secs: u64,
    pub fallback: FallbackPolicy,
    /// Resolve against the previous list when a refresh fails
    pub serve_stale: bool,
}

impl Default for VersionsConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_VERSIONS_SOURCE.to_string(),
            max_age_secs: DEFAULT_MAX_AGE_SECS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            fallback: FallbackPolicy::default(),
            serve_stale: false,
        }
    }
}

impl VersionsConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// What to do when explicit candidates are given but none matches
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Explicit candidates are authoritative
    Never,
    /// Consult the remote list unless the request sets `exclusive`
    #[default]
    WhenUnmatched,
}

impl HandlerConfig {
    /// Load configuration from an optional JSON file, then apply the
    /// port assigned by the functions host.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(std::env::var(PORT_ENV).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env(&mut self, port: Option<String>) -> Result<(), ConfigError> {
        if let Some(port) = port {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
        }
        if self.build_version.trim().is_empty() {
            self.build_version = "dev".to_string();
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let source = self.versions.source.trim();
        if source.is_empty() {
            return Err(ConfigError::Invalid("versions.source is empty".to_string()));
        }
        if !(source.starts_with("http://") || source.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "versions.source must be an http(s) URL, got {source:?}"
            )));
        }
        if self.versions.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "versions.fetchTimeoutSecs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Returns the path to the data directory for azurefuncs.
/// Uses $XDG_DATA_HOME/azurefuncs if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/azurefuncs,
/// or ./azurefuncs if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("azurefuncs.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("azurefuncs")
}

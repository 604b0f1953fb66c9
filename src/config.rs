//! Session subsystem configuration.

use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::auth::DEFAULT_API_URL;

/// Environment variable overriding [`SessionConfig::api_base_url`].
pub const ENV_API_URL: &str = "LEARNPATH_API_URL";
/// Environment variable overriding [`SessionConfig::refresh_timeout`] (seconds).
pub const ENV_REFRESH_TIMEOUT: &str = "LEARNPATH_REFRESH_TIMEOUT_SECS";
/// Environment variable overriding [`SessionConfig::request_timeout`] (seconds).
pub const ENV_REQUEST_TIMEOUT: &str = "LEARNPATH_REQUEST_TIMEOUT_SECS";
/// Environment variable enabling proactive refresh (seconds before expiry).
pub const ENV_PROACTIVE_REFRESH: &str = "LEARNPATH_PROACTIVE_REFRESH_SECS";
/// Environment variable overriding [`SessionConfig::storage_dir`].
pub const ENV_STORAGE_DIR: &str = "LEARNPATH_STORAGE_DIR";

/// Configuration for the session services.
///
/// Use the builder pattern to customize.
///
/// # Example
///
/// ```ignore
/// use learnpath_session::config::SessionConfig;
/// use std::time::Duration;
///
/// let config = SessionConfig::default()
///     .with_api_base_url("http://localhost:8080")
///     .with_refresh_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Backend base URL (default: https://api.learnpath.app)
    pub api_base_url: String,
    /// Upper bound for one refresh request (default: 15s)
    pub refresh_timeout: Duration,
    /// Transport timeout for every request (default: 30s)
    pub request_timeout: Duration,
    /// Refresh before a request when the token expires within this window
    /// (default: disabled)
    pub proactive_refresh_threshold: Option<Duration>,
    /// Directory for the file credential store (default: ~/.learnpath)
    pub storage_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            refresh_timeout: Duration::from_secs(15),
            request_timeout: Duration::from_secs(30),
            proactive_refresh_threshold: None,
            storage_dir: dirs::home_dir().map(|home| home.join(".learnpath")),
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_proactive_refresh(mut self, threshold: Option<Duration>) -> Self {
        self.proactive_refresh_threshold = threshold;
        self
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Defaults overridden by the `LEARNPATH_*` environment variables.
    ///
    /// Values that do not parse are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(url) = env_string(ENV_API_URL) {
            config.api_base_url = url;
        }
        if let Some(secs) = env_secs(ENV_REFRESH_TIMEOUT) {
            config.refresh_timeout = secs;
        }
        if let Some(secs) = env_secs(ENV_REQUEST_TIMEOUT) {
            config.request_timeout = secs;
        }
        if let Some(secs) = env_secs(ENV_PROACTIVE_REFRESH) {
            config.proactive_refresh_threshold = Some(secs);
        }
        if let Some(dir) = env_string(ENV_STORAGE_DIR) {
            config.storage_dir = Some(PathBuf::from(dir));
        }

        config
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_secs(name: &str) -> Option<Duration> {
    let raw = env_string(name)?;
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => {
            warn!("Ignoring {}={:?}: expected a positive number of seconds", name, raw);
            None
        }
    }
}

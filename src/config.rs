use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::upgrade::driver::FailurePolicy;

// =============================================================================
// Defaults
// =============================================================================

/// Package index queried when no other URL is configured
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org";

/// Timeout for fetch operations in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Number of registry requests allowed in flight while building the plan
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;

/// Environment variable holding the tracing filter
pub const LOG_ENV: &str = "REQ_UPGRADE_LOG";

const APP_DIR: &str = "req-upgrade";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Run configuration, loaded from an optional JSON file and overridden by CLI flags
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Base URL of the package index (JSON API)
    pub index_url: String,
    /// Registry request timeout in milliseconds
    pub fetch_timeout_ms: u64,
    /// Validation command timeout in seconds, unlimited when absent
    pub validation_timeout_secs: Option<u64>,
    pub max_concurrent_fetches: usize,
    pub failure_policy: FailurePolicy,
    /// Discard the validation command's output instead of passing it through
    pub quiet_tests: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
            fetch_timeout_ms: FETCH_TIMEOUT_MS,
            validation_timeout_secs: None,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            failure_policy: FailurePolicy::default(),
            quiet_tests: false,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file; missing fields keep their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn validation_timeout(&self) -> Option<Duration> {
        self.validation_timeout_secs.map(Duration::from_secs)
    }
}

/// Returns the path to the data directory for req-upgrade.
/// Uses $XDG_DATA_HOME/req-upgrade if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/req-upgrade,
/// or ./req-upgrade if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the default path of the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("req-upgrade.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn config_from_partial_object_uses_defaults_for_missing_fields() {
        let result = serde_json::from_value::<Config>(json!({
            "indexUrl": "https://mirror.example.com"
        }))
        .unwrap();

        assert_eq!(result.index_url, "https://mirror.example.com");
        assert_eq!(result.fetch_timeout_ms, FETCH_TIMEOUT_MS);
        assert_eq!(result.validation_timeout_secs, None);
        assert_eq!(result.failure_policy, FailurePolicy::StopAtFirstFailure);
    }

    #[test]
    fn config_from_full_object_parses_all_fields() {
        let result = serde_json::from_value::<Config>(json!({
            "indexUrl": "http://localhost:8080",
            "fetchTimeoutMs": 5000,
            "validationTimeoutSecs": 600,
            "maxConcurrentFetches": 2,
            "failurePolicy": "skipAhead",
            "quietTests": true
        }))
        .unwrap();

        assert_eq!(
            result,
            Config {
                index_url: "http://localhost:8080".to_string(),
                fetch_timeout_ms: 5000,
                validation_timeout_secs: Some(600),
                max_concurrent_fetches: 2,
                failure_policy: FailurePolicy::SkipAhead,
                quiet_tests: true,
            }
        );
        assert_eq!(result.fetch_timeout(), Duration::from_secs(5));
        assert_eq!(result.validation_timeout(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn load_reads_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"quietTests": true}}"#).unwrap();

        let config = Config::load(file.path()).unwrap();

        assert!(config.quiet_tests);
        assert_eq!(config.index_url, DEFAULT_INDEX_URL);
    }

    #[test]
    fn load_reports_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"failurePolicy": "sometimes"}}"#).unwrap();

        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        assert!(matches!(
            Config::load(Path::new("/nonexistent/req-upgrade.json")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn data_dir_with_env_uses_xdg_data_home_when_set() {
        let path = data_dir_with_env(
            Some("/tmp/test-data".to_string()),
            Some(PathBuf::from("/home/user")),
        );

        assert_eq!(path, PathBuf::from("/tmp/test-data/req-upgrade"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_home_local_share() {
        let path = data_dir_with_env(None, Some(PathBuf::from("/home/user")));

        assert_eq!(path, PathBuf::from("/home/user/.local/share/req-upgrade"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_current_dir_when_no_dirs_available() {
        let path = data_dir_with_env(None, None);
        assert_eq!(path, PathBuf::from("./req-upgrade"));
    }
}

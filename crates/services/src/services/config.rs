//! Client configuration: file-based with environment overrides.

use std::{env, fs, path::PathBuf, sync::Arc, time::Duration};

use api::{
    ApiClient, ApiError, TokenStore,
    client::DEFAULT_API_URL,
    models::place::Region,
};
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

pub const CONFIG_FILE: &str = "waylocal.toml";
const APP_DIR: &str = "waylocal";

const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_POLL_SECS: u64 = 5;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: Url,
    pub request_timeout_secs: u64,
    /// Interval for the polling fallback of the received-view watcher.
    pub poll_secs: u64,
    /// Operating regions of the signed-in local. Empty means serve
    /// everywhere.
    pub regions: Vec<Region>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default api url is well-formed"),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            poll_secs: DEFAULT_POLL_SECS,
            regions: Vec::new(),
        }
    }
}

impl Config {
    /// Load from the user config dir, then apply environment overrides
    /// (`WAYLOCAL_API_URL`, `WAYLOCAL_POLL_SECS`). A missing file is fine.
    pub fn load() -> Self {
        let path = config_dir().join(CONFIG_FILE);
        let mut config = match fs::read_to_string(&path) {
            Ok(raw) => match toml::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), "ignoring invalid config: {e}");
                    Self::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
        };

        if let Ok(raw) = env::var("WAYLOCAL_API_URL") {
            match Url::parse(&raw) {
                Ok(url) => config.api_url = url,
                Err(e) => warn!("ignoring invalid WAYLOCAL_API_URL: {e}"),
            }
        }
        if let Ok(raw) = env::var("WAYLOCAL_POLL_SECS") {
            match raw.parse() {
                Ok(secs) => config.poll_secs = secs,
                Err(e) => warn!("ignoring invalid WAYLOCAL_POLL_SECS: {e}"),
            }
        }
        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_secs)
    }

    /// Build the shared API handle with the on-disk token store.
    pub fn api_client(&self) -> Result<ApiClient, ApiError> {
        let tokens = Arc::new(TokenStore::open(token_path()));
        ApiClient::with_timeout(self.api_url.clone(), tokens, self.request_timeout())
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

pub fn token_path() -> PathBuf {
    data_dir().join("token")
}

pub fn tracker_path() -> PathBuf {
    data_dir().join("tracker.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert!(config.regions.is_empty());
    }

    #[test]
    fn partial_files_fall_back_per_field() {
        let config: Config = toml::from_str(
            r#"
            api_url = "http://localhost:8000/"
            poll_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.api_url.as_str(), "http://localhost:8000/");
        assert_eq!(config.poll_secs, 30);
        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn regions_deserialize_from_toml_tables() {
        let config: Config = toml::from_str(
            r#"
            [[regions]]
            country = "KR"
            city = "Seoul"
            "#,
        )
        .unwrap();

        assert_eq!(config.regions.len(), 1);
        assert_eq!(config.regions[0].country, "KR");
        assert_eq!(config.regions[0].city.as_deref(), Some("Seoul"));
    }
}

//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the backend URL, the routes the guard redirects to and
//! the last email used to log in.
//!
//! Configuration is stored at `~/.config/sessiongate/config.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::auth::{FileCookieStore, IdentitySource, SessionStore};
use crate::guard::{NavigationGuard, DEFAULT_ENTRY_ROUTE, DEFAULT_LANDING_ROUTE};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "sessiongate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";

/// Environment variable overriding `backend_url`
pub const BACKEND_URL_ENV: &str = "SESSIONGATE_BACKEND_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend_url: String,
    pub entry_route: String,
    pub landing_route: String,
    pub identity_source: IdentitySource,
    pub request_timeout_secs: Option<u64>,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            entry_route: DEFAULT_ENTRY_ROUTE.to_string(),
            landing_route: DEFAULT_LANDING_ROUTE.to_string(),
            identity_source: IdentitySource::default(),
            request_timeout_secs: None,
            last_email: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply `SESSIONGATE_BACKEND_URL` if set.
    pub fn apply_env(&mut self) {
        self.apply_backend_override(std::env::var(BACKEND_URL_ENV).ok());
    }

    pub fn apply_backend_override(&mut self, backend_url: Option<String>) {
        if let Some(url) = backend_url.filter(|u| !u.trim().is_empty()) {
            self.backend_url = url.trim().to_string();
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn guard(&self) -> NavigationGuard {
        NavigationGuard::new(self.entry_route.clone(), self.landing_route.clone())
    }

    /// Session store whose cookie lives in `cache_dir`.
    pub fn session_store(&self, cache_dir: PathBuf) -> Result<SessionStore> {
        let client = ApiClient::with_timeout(self.request_timeout())
            .context("Failed to build HTTP client")?;
        Ok(
            SessionStore::new(client, Box::new(FileCookieStore::new(cache_dir)))
                .with_identity_source(self.identity_source),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.entry_route, "/");
        assert_eq!(config.landing_route, "/ideas");
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            backend_url: "https://api.example.com".to_string(),
            identity_source: IdentitySource::ResponseFields,
            request_timeout_secs: Some(15),
            last_email: Some("alice@example.com".to_string()),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.request_timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"identity_source":"response_fields"}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.identity_source, IdentitySource::ResponseFields);
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
    }

    #[test]
    fn test_backend_override() {
        let mut config = Config::default();
        config.apply_backend_override(None);
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        config.apply_backend_override(Some("  ".to_string()));
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        config.apply_backend_override(Some(" https://api.example.com ".to_string()));
        assert_eq!(config.backend_url, "https://api.example.com");
    }

    #[test]
    fn test_guard_uses_configured_routes() {
        let config = Config {
            entry_route: "/login".to_string(),
            landing_route: "/home".to_string(),
            ..Config::default()
        };
        let guard = config.guard();
        assert_eq!(guard.entry_route(), "/login");
        assert_eq!(guard.landing_route(), "/home");
    }
}

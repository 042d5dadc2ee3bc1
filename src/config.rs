//! # Client Configuration Module
//!
//! Settings for talking to the crawl API and for local state.
//!
//! ## Key Components
//!
//! - `ClientConfig`: API location, timeouts, batch pacing and the data directory
//! - `ClientConfigBuilder`: Builder pattern implementation for easier configuration
//! - `KeyStore`: The persisted API key, a single file under the data directory
//!
//! Environment variables override the defaults; command-line flags override
//! the environment.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::batch::DEFAULT_BATCH_DELAY;
use crate::error::Result;
use crate::log::DEFAULT_LOG_CAPACITY;

/// Default API base URL
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default local state directory
pub const DEFAULT_DATA_DIR: &str = ".crawlterm";

pub const ENV_API_URL: &str = "CRAWLTERM_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "CRAWLTERM_TIMEOUT_SECS";
pub const ENV_DATA_DIR: &str = "CRAWLTERM_DATA_DIR";

/// Configuration for the API client
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the API, including the `/api` prefix
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Pause between batch requests in milliseconds
    pub batch_delay_ms: u64,

    /// Entries kept in the terminal log
    pub log_capacity: usize,

    /// Directory for the API key and the TUI log file
    pub data_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            batch_delay_ms: DEFAULT_BATCH_DELAY.as_millis() as u64,
            log_capacity: DEFAULT_LOG_CAPACITY,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl ClientConfig {
    /// Create a new builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Defaults overridden by `CRAWLTERM_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = ClientConfig::builder();

        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            builder = builder.base_url(url.trim());
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => builder = builder.timeout_secs(secs),
                _ => warn!("Ignoring invalid {}={:?}", ENV_TIMEOUT_SECS, raw),
            }
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            builder = builder.data_dir(dir.trim());
        }

        builder.build()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn key_store(&self) -> KeyStore {
        KeyStore::new(&self.data_dir)
    }

    /// Path of the TUI's tracing log
    pub fn tui_log_path(&self) -> PathBuf {
        self.data_dir.join("tui.log")
    }
}

/// Builder for ClientConfig
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.timeout_secs = timeout_secs;
        self
    }

    pub fn batch_delay_ms(mut self, batch_delay_ms: u64) -> Self {
        self.config.batch_delay_ms = batch_delay_ms;
        self
    }

    pub fn log_capacity(mut self, log_capacity: usize) -> Self {
        self.config.log_capacity = log_capacity;
        self
    }

    pub fn data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = data_dir.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

/// File-backed storage for the API key
#[derive(Debug, Clone)]
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("api_key"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored key, `None` when absent or blank
    pub fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let key = raw.trim();
                Ok((!key.is_empty()).then(|| key.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, key: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, key.trim())?;
        debug!("Saved API key to {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Shortened key for display, e.g. `gsk_...9f2a`
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert_eq!(config.batch_delay(), Duration::from_millis(500));
        assert_eq!(config.log_capacity, 50);
        assert_eq!(config.tui_log_path(), PathBuf::from(".crawlterm/tui.log"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_API_URL, "http://crawler:8080/api/"),
            (ENV_TIMEOUT_SECS, "30"),
            (ENV_DATA_DIR, "/tmp/ct"),
        ]);
        let config = ClientConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.base_url, "http://crawler:8080/api");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/ct"));
    }

    #[test]
    fn test_invalid_timeout_is_ignored() {
        let config = ClientConfig::from_lookup(|k| (k == ENV_TIMEOUT_SECS).then(|| "soon".to_string()));
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_key_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::new(&dir.path().join("nested"));

        assert_eq!(store.load().unwrap(), None);
        store.save("  gsk_secret_value \n").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("gsk_secret_value"));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("gsk_1234567890abcd"), "gsk_...abcd");
        assert_eq!(mask_key("short"), "*****");
    }
}

use std::path::PathBuf;

use color_eyre::eyre::{Result, WrapErr};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Get the data directory for the application.
pub fn get_data_dir() -> PathBuf {
    if let Ok(s) = std::env::var("DEMO_WALLET_DATA") {
        PathBuf::from(s)
    } else if let Some(proj_dirs) = ProjectDirs::from("com", "demo", "demo-wallet") {
        proj_dirs.data_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".data")
    }
}

/// Get the config directory for the application.
pub fn get_config_dir() -> PathBuf {
    if let Ok(s) = std::env::var("DEMO_WALLET_CONFIG") {
        PathBuf::from(s)
    } else if let Some(proj_dirs) = ProjectDirs::from("com", "demo", "demo-wallet") {
        proj_dirs.config_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".config")
    }
}

/// Which API implementation backs the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Backend {
    Mock,
    Rest,
}

impl Backend {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "mock" => Some(Backend::Mock),
            "rest" => Some(Backend::Rest),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub backend: Backend,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Extra attempts for idempotent requests that hit a transient failure.
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    /// Artificial latency of the mock backend.
    pub mock_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Mock,
            base_url: "http://127.0.0.1:5000/api".to_string(),
            timeout_secs: 30,
            max_retries: 2,
            retry_backoff_ms: 300,
            mock_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Seconds a transfer quote stays signable.
    pub expiry_secs: u64,
    /// Price used when the price feed is unavailable.
    pub fallback_eth_price: f64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            expiry_secs: 30,
            fallback_eth_price: 2500.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub transfer: TransferConfig,
}

impl Config {
    /// Build the config: defaults, then `config.json` if present, then the
    /// command line overrides.
    pub fn load(backend: Option<&str>, api_url: Option<&str>) -> Result<Self> {
        let mut config = Self::from_file(get_config_dir().join("config.json"))?.unwrap_or_default();
        config.apply_overrides(backend, api_url)?;
        Ok(config)
    }

    pub fn from_file(path: PathBuf) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .wrap_err_with(|| format!("Invalid config file {}", path.display()))?;
        Ok(Some(config))
    }

    pub fn apply_overrides(&mut self, backend: Option<&str>, api_url: Option<&str>) -> Result<()> {
        if let Some(name) = backend {
            self.api.backend = Backend::from_name(name).ok_or_else(|| {
                color_eyre::eyre::eyre!("Unknown backend '{}', expected mock or rest", name)
            })?;
        }
        if let Some(url) = api_url {
            self.api.base_url = url.trim_end_matches('/').to_string();
            // Pointing at a server implies the REST backend
            if backend.is_none() {
                self.api.backend = Backend::Rest;
            }
        }
        Ok(())
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::scan::ScanOptions;

/// Default address of the Eagle API server.
pub const DEFAULT_DOMAIN: &str = "http://localhost";
/// Default port Eagle listens on.
pub const DEFAULT_PORT: u16 = 41595;

/// Top-level configuration for the eagle-client library.
///
/// Controls where the Eagle API lives and how local library scans run.
///
/// # Loading
///
/// ```rust,no_run
/// use eagle_client::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.server.port = 41596;
/// config.scan.max_workers = 8;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the Eagle API server is listening.
    pub server: ServerConfig,
    /// Defaults for local library scans.
    pub scan: ScanConfig,
}

/// Eagle API server location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Scheme and host, e.g. `http://localhost`.
    pub domain: String,
    pub port: u16,
    /// Per-request timeout in seconds. `0` disables the timeout.
    pub timeout_secs: u64,
}

/// Library scan defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Number of metadata files read concurrently.
    pub max_workers: usize,
    /// Keep only items whose name starts with one of these. Empty keeps everything.
    pub name_prefixes: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
            port: DEFAULT_PORT,
            timeout_secs: 30,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_workers: ScanOptions::DEFAULT_MAX_WORKERS,
            name_prefixes: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Base URL of the API, `{domain}:{port}`.
    pub fn host(&self) -> String {
        format!("{}:{}", self.domain.trim_end_matches('/'), self.port)
    }
}

impl ScanConfig {
    pub fn options(&self) -> ScanOptions {
        ScanOptions {
            max_workers: self.max_workers,
            name_prefixes: self.name_prefixes.clone(),
        }
    }
}

impl Config {
    /// Resolve the config file path — same directory as the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Base URL of the Eagle API.
    pub fn host(&self) -> String {
        self.server.host()
    }
}

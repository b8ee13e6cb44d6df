/// Application configuration management
/// Stores botctl settings in ~/.config/botctl/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::{
    resolve_path, resolve_working_dir, DEFAULT_HEALTH_HOST, DEFAULT_HEALTH_PORT,
    DEFAULT_MONITOR_LOCK, DEFAULT_MONITOR_LOG, DEFAULT_SERVICE_ID, DEFAULT_SETTLE,
    DEFAULT_UNIT_NAME,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub working_dir: Option<String>,
    pub health: HealthSettings,
    pub monitor: MonitorSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthSettings {
    pub host: String,
    pub port: u16,
    pub service: String,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HEALTH_HOST.to_string(),
            port: DEFAULT_HEALTH_PORT,
            service: DEFAULT_SERVICE_ID.to_string(),
        }
    }
}

impl HealthSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid health address {}:{}", self.host, self.port))
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, crate::utils::HEALTH_PATH)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub unit: String,
    pub log_file: String,
    pub lock_file: String,
    /// humantime duration, e.g. "10s"
    pub settle: String,
    /// Prefix the restart with `sudo -n` when the monitor runs unprivileged
    pub use_sudo: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            unit: DEFAULT_UNIT_NAME.to_string(),
            log_file: DEFAULT_MONITOR_LOG.to_string(),
            lock_file: DEFAULT_MONITOR_LOCK.to_string(),
            settle: DEFAULT_SETTLE.to_string(),
            use_sudo: false,
        }
    }
}

impl MonitorSettings {
    pub fn settle_interval(&self) -> Result<Duration> {
        humantime::parse_duration(&self.settle)
            .with_context(|| format!("Invalid settle interval '{}'", self.settle))
    }
}

impl AppConfig {
    /// Get default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("botctl");
        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from the given file, or the default location
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default_path = Self::config_path()?;
                if !default_path.exists() {
                    return Ok(Self::default());
                }
                default_path
            }
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.monitor.settle_interval()?;
        Ok(config)
    }

    pub fn working_dir(&self) -> Result<PathBuf> {
        resolve_working_dir(self.working_dir.as_deref())
    }

    pub fn monitor_log_path(&self) -> Result<PathBuf> {
        Ok(resolve_path(&self.working_dir()?, &self.monitor.log_file))
    }

    pub fn monitor_lock_path(&self) -> Result<PathBuf> {
        Ok(resolve_path(&self.working_dir()?, &self.monitor.lock_file))
    }
}

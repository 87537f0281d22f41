use crate::types::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Per-channel settings from the config file. All fields are optional
/// overrides; the monitor only needs the channel id (the map key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSettings {
    /// Display name used in log output, if the operator wants something
    /// friendlier than the raw channel id.
    pub name: Option<String>,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            name: None,
            max_results: default_max_results(),
        }
    }
}

fn default_max_results() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_key: String,

    /// Channels to watch, keyed by channel id. BTreeMap keeps cycle
    /// iteration order stable across runs.
    pub channels: BTreeMap<String, ChannelSettings>,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,

    #[serde(default = "default_metadata_dir")]
    pub metadata_dir: String,

    #[serde(default = "default_download_dir")]
    pub download_dir: String,
}

fn default_poll_interval() -> u64 {
    3600
}

fn default_metadata_dir() -> String {
    "metadata".to_string()
}

fn default_download_dir() -> String {
    "downloads".to_string()
}

impl Config {
    /// Load configuration from a YAML file. The monitor re-reads this once
    /// per poll cycle so channel edits are picked up without a restart.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MonitorError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            MonitorError::Config(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(MonitorError::Config("api_key is empty".to_string()));
        }
        if self.channels.is_empty() {
            return Err(MonitorError::Config("no channels configured".to_string()));
        }
        if self.poll_interval_seconds == 0 {
            return Err(MonitorError::Config(
                "poll_interval_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

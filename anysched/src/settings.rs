//! Settings file management

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::SchedError;
use crate::logs::LogLevel;
use crate::models::ManagerConfig;
use crate::operation::WaitOptions;

/// Settings for the anysched binary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub log_level: LogLevel,

    /// Named scheduler environments
    #[serde(default)]
    pub envs: BTreeMap<String, ManagerConfig>,

    #[serde(default)]
    pub wait: WaitSettings,
}

/// Operation wait tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitSettings {
    /// Delay between status polls in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Wait timeout in seconds when a deploy sets none
    #[serde(default = "default_timeout")]
    pub default_timeout_secs: u64,
}

fn default_poll_interval() -> u64 {
    1
}

fn default_timeout() -> u64 {
    60
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            default_timeout_secs: default_timeout(),
        }
    }
}

impl WaitSettings {
    pub fn to_options(&self) -> WaitOptions {
        WaitOptions {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            default_timeout: Duration::from_secs(self.default_timeout_secs),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SchedError> {
        let path = path.as_ref();
        debug!("Loading settings from {}", path.display());
        let content = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Backend configuration of environment `env`
    pub fn manager_config(&self, env: &str) -> Result<&ManagerConfig, SchedError> {
        self.envs.get(env).ok_or_else(|| {
            SchedError::ConfigError(format!(
                "environment {:?} not found; known environments: {:?}",
                env,
                self.envs.keys().collect::<Vec<_>>()
            ))
        })
    }
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_connect_timeout() -> u64 {
    30
}

fn default_keepalive() -> u64 {
    60
}

fn default_inactivity_timeout() -> u64 {
    3600
}

/// How the server's host key is checked during the SSH handshake.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum HostKeyPolicy {
    /// Accept any host key. Every acceptance is logged on the `security`
    /// target; unsuitable for untrusted networks.
    #[default]
    AcceptAny,
    /// Check against a known_hosts file, learning unknown hosts and rejecting
    /// changed keys. `None` uses `~/.ssh/known_hosts`.
    KnownHosts {
        #[serde(default)]
        path: Option<PathBuf>,
    },
}

/// Settings applied to every connection a session opens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// 0 disables keepalive
    #[serde(default = "default_keepalive")]
    pub keepalive_interval_secs: u64,
    /// 0 disables the inactivity timeout
    #[serde(default = "default_inactivity_timeout")]
    pub inactivity_timeout_secs: u64,
    #[serde(default)]
    pub host_key_policy: HostKeyPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            keepalive_interval_secs: default_keepalive(),
            inactivity_timeout_secs: default_inactivity_timeout(),
            host_key_policy: HostKeyPolicy::default(),
        }
    }
}

impl SessionConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn keepalive_interval(&self) -> Option<Duration> {
        non_zero_secs(self.keepalive_interval_secs)
    }

    pub fn inactivity_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.inactivity_timeout_secs)
    }

    pub fn with_host_key_policy(mut self, policy: HostKeyPolicy) -> Self {
        self.host_key_policy = policy;
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_toml_str(&content)
    }

    /// Load from the default config file, falling back to defaults if it
    /// does not exist
    pub fn load_default() -> Result<Self, ConfigError> {
        match super::paths::config_file() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Save to the default config file, creating its directory if needed
    pub fn save_default(&self) -> Result<PathBuf, ConfigError> {
        let dir = super::paths::ensure_config_dir().map_err(ConfigError::CreateDir)?;
        let path = dir.join("config.toml");
        self.save(&path)?;
        Ok(path)
    }

    /// Save to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(ConfigError::CreateDir)?;
            }
        }

        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, content).map_err(|e| ConfigError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}

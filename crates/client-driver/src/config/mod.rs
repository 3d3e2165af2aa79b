//! Driver session configuration.
//!
//! Every field has a default, so an empty YAML document (or
//! `DriverConfig::default()`) yields a driver on an OS-assigned loopback port.
//!
//! ```yaml
//! host: 127.0.0.1
//! port: 0
//! unexpected_status: 404
//! near_miss_limit: 3
//! shutdown_timeout_ms: 5000
//! ```


use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_unexpected_status() -> u16 {
    404
}

fn default_near_miss_limit() -> usize {
    3
}

fn default_shutdown_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DriverConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind (0 = OS-assigned)
    #[serde(default)]
    pub port: u16,
    /// Status written for requests no expectation matched
    #[serde(default = "default_unexpected_status")]
    pub unexpected_status: u16,
    /// How many near misses the diagnostic response lists
    #[serde(default = "default_near_miss_limit")]
    pub near_miss_limit: usize,
    /// Upper bound on draining in-flight connections at shutdown
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: 0,
            unexpected_status: default_unexpected_status(),
            near_miss_limit: default_near_miss_limit(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
        }
    }
}

impl DriverConfig {
    /// Load configuration from a YAML file and validate it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, anyhow::Error> {
        // An empty document deserializes as unit, not as an empty map
        let config: DriverConfig = if contents.trim().is_empty() {
            DriverConfig::default()
        } else {
            serde_yaml::from_str(contents)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.host.trim().is_empty() {
            anyhow::bail!("'host' must not be empty");
        }
        if !(100..=599).contains(&self.unexpected_status) {
            anyhow::bail!(
                "'unexpected_status' must be a valid HTTP status code (100-599), got {}",
                self.unexpected_status
            );
        }
        if self.shutdown_timeout_ms == 0 {
            anyhow::bail!("'shutdown_timeout_ms' must be greater than zero");
        }
        Ok(())
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// `host:port` as passed to the listener.
    pub fn bind_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

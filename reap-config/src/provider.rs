use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_cache_ttl_days() -> u64 {
    7
}

fn default_cache_enabled() -> bool {
    true
}

/// Budget and cache policy for one metered upstream API.
///
/// A provider with no `requests_per_minute` is unbounded: callers never
/// wait for it. `cache_ttl_days` only matters while `cache_enabled` holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    #[serde(default)]
    pub requests_per_minute: Option<f64>,
    #[serde(default = "default_cache_ttl_days")]
    pub cache_ttl_days: u64,
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
}

impl ProviderConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            requests_per_minute: None,
            cache_ttl_days: default_cache_ttl_days(),
            cache_enabled: default_cache_enabled(),
        }
    }

    /// Read one provider table from a YAML config section.
    pub fn from_config(value: &serde_yaml::Value) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_value(value.clone())?)
    }

    /// Minimum spacing between live calls, `60 / requests_per_minute`.
    pub fn min_interval(&self) -> Option<Duration> {
        self.requests_per_minute
            .filter(|rpm| *rpm > 0.0)
            .map(|rpm| Duration::from_secs_f64(60.0 / rpm))
    }

    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.cache_ttl_days as i64)
    }
}

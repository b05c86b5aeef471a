//! Configuration for the sensor source and device selection
//!
//! All sections deserialize from TOML with per-field defaults, so a host
//! application can embed them in its own configuration file and only
//! override what it needs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[cfg(feature = "mock")]
use crate::devices::mock::config::SimulationConfig;

/// Sensor source configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// How long `start` waits for the first sample on each attempt (ms)
    #[serde(default = "default_startup_timeout_ms")]
    pub startup_timeout_ms: u64,

    /// Capacity of the sample channel between driver and consumer
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Consecutive non-finite samples of one kind before that sensor is
    /// declared unavailable
    #[serde(default = "default_max_consecutive_invalid")]
    pub max_consecutive_invalid: u32,

    /// Retry policy for hardware initialization
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_startup_timeout_ms() -> u64 {
    2000
}
fn default_channel_capacity() -> usize {
    1024
}
fn default_max_consecutive_invalid() -> u32 {
    50
}

impl SourceConfig {
    /// Startup timeout as a `Duration`
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            startup_timeout_ms: default_startup_timeout_ms(),
            channel_capacity: default_channel_capacity(),
            max_consecutive_invalid: default_max_consecutive_invalid(),
            retry: RetryConfig::default(),
        }
    }
}

/// Exponential backoff settings for sensor initialization
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Total start attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt (ms); doubles every attempt
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound for any single delay (ms)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    200
}
fn default_max_delay_ms() -> u64 {
    2000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Device selection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Device type ("mock")
    #[serde(rename = "type", default = "default_device_type")]
    pub device_type: String,

    /// Device name for logging
    #[serde(default = "default_device_name")]
    pub name: String,

    /// Simulated walker parameters (mock devices only)
    #[cfg(feature = "mock")]
    #[serde(default)]
    pub simulation: Option<SimulationConfig>,
}

fn default_device_type() -> String {
    "mock".to_string()
}
fn default_device_name() -> String {
    "Simulated phone".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_type: default_device_type(),
            name: default_device_name(),
            #[cfg(feature = "mock")]
            simulation: Some(SimulationConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_source_config() {
        let config = SourceConfig::default();
        assert_eq!(config.startup_timeout_ms, 2000);
        assert_eq!(config.channel_capacity, 1024);
        assert_eq!(config.max_consecutive_invalid, 50);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.startup_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_source_toml_uses_defaults() {
        let toml_content = r#"
startup_timeout_ms = 500

[retry]
max_attempts = 5
"#;

        let config: SourceConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.startup_timeout_ms, 500);
        assert_eq!(config.channel_capacity, 1024);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 200);
    }

    #[test]
    fn test_device_type_rename() {
        let config: DeviceConfig = toml::from_str("type = \"ble-tag\"").unwrap();
        assert_eq!(config.device_type, "ble-tag");
        assert_eq!(config.name, "Simulated phone");
    }

    #[test]
    fn test_empty_toml() {
        let source: SourceConfig = toml::from_str("").unwrap();
        assert_eq!(source.retry.max_delay_ms, 2000);
        let device: DeviceConfig = toml::from_str("").unwrap();
        assert_eq!(device.device_type, "mock");
    }
}

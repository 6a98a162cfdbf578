//! Monitor configuration.
//!
//! Every field has a default matching the deployed sensor rig, so a config
//! file only needs to name what it overrides.

use crate::alert::{AlertConfig, HotspotConfig};
use crate::error::{MonitorError, Result};
use crate::telemetry::{Channel, ChannelLimits, WINDOW_SIZE};
use crate::web::WebConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Validity limits bound to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub channel: Channel,
    #[serde(flatten)]
    pub limits: ChannelLimits,
}

impl ChannelConfig {
    pub fn new(channel: Channel, limits: ChannelLimits) -> Self {
        Self { channel, limits }
    }
}

/// Channel set of the deployed rig.
pub fn default_channels() -> Vec<ChannelConfig> {
    vec![
        ChannelConfig::new(Channel::Gas, ChannelLimits::range(30.0, 2000.0)),
        ChannelConfig::new(
            Channel::Temperature,
            ChannelLimits::range(-20.0, 150.0).with_max_step_delta(5.0),
        ),
        ChannelConfig::new(Channel::GasBeaconDistance, ChannelLimits::range(0.0, 20.0)),
        ChannelConfig::new(Channel::TempBeaconDistance, ChannelLimits::range(0.0, 20.0)),
    ]
}

/// Complete configuration for the ingest and watch processes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Per-channel validity limits
    pub channels: Vec<ChannelConfig>,
    /// Accepted values kept per channel
    pub window_size: usize,
    /// Snapshot publication period in milliseconds
    pub publish_interval_ms: u64,
    /// Watcher polling period in milliseconds
    pub poll_interval_ms: u64,
    /// Danger thresholds
    pub alert: AlertConfig,
    /// Emergency hotspot commands
    pub hotspot: HotspotConfig,
    /// Snapshot read API
    pub web: WebConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            channels: default_channels(),
            window_size: WINDOW_SIZE,
            publish_interval_ms: crate::DEFAULT_PUBLISH_INTERVAL_MS,
            poll_interval_ms: crate::DEFAULT_POLL_INTERVAL_MS,
            alert: AlertConfig::default(),
            hotspot: HotspotConfig::default(),
            web: WebConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load a JSON config file and validate it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MonitorError::config_error(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Parse a JSON config document and validate it.
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| MonitorError::config_error(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the publication period.
    pub fn with_publish_interval_ms(mut self, interval_ms: u64) -> Self {
        self.publish_interval_ms = interval_ms;
        self
    }

    /// Set the polling period.
    pub fn with_poll_interval_ms(mut self, interval_ms: u64) -> Self {
        self.poll_interval_ms = interval_ms;
        self
    }

    /// Set the window size.
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn publish_interval(&self) -> Duration {
        Duration::from_millis(self.publish_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(MonitorError::config_error("window_size must be at least 1"));
        }
        if self.publish_interval_ms == 0 || self.poll_interval_ms == 0 {
            return Err(MonitorError::config_error("intervals must be non-zero"));
        }

        for (index, entry) in self.channels.iter().enumerate() {
            let limits = &entry.limits;
            if limits.min_valid > limits.max_valid {
                return Err(MonitorError::config_error(format!(
                    "{}: min_valid {} exceeds max_valid {}",
                    entry.channel, limits.min_valid, limits.max_valid
                )));
            }
            if let Some(delta) = limits.max_step_delta {
                if delta < 0.0 {
                    return Err(MonitorError::config_error(format!(
                        "{}: max_step_delta must be non-negative",
                        entry.channel
                    )));
                }
            }
            if self.channels[..index].iter().any(|c| c.channel == entry.channel) {
                return Err(MonitorError::config_error(format!(
                    "{} configured twice",
                    entry.channel
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.channels.len(), 4);
        assert_eq!(config.window_size, 5);
        assert_eq!(config.publish_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = MonitorConfig::from_json(r#"{"poll_interval_ms": 250}"#).unwrap();
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.publish_interval_ms, 1000);
        assert_eq!(config.alert.gas_threshold, 350.0);
        assert_eq!(config.web, WebConfig::default());
    }

    #[test]
    fn test_web_section_from_json() {
        let config =
            MonitorConfig::from_json(r#"{"web": {"host": "127.0.0.1", "enable_cors": false}}"#)
                .unwrap();
        assert_eq!(config.web.host, "127.0.0.1");
        assert_eq!(config.web.port, 8080);
        assert!(!config.web.enable_cors);
    }

    #[test]
    fn test_channel_limits_from_json() {
        let config = MonitorConfig::from_json(
            r#"{"channels": [{"channel": "TEMP", "min_valid": 0, "max_valid": 80, "max_step_delta": 2.5}]}"#,
        )
        .unwrap();
        assert_eq!(config.channels.len(), 1);
        assert_eq!(config.channels[0].channel, Channel::Temperature);
        assert_eq!(config.channels[0].limits.max_step_delta, Some(2.5));
    }

    #[test]
    fn test_invalid_configs_rejected() {
        assert!(MonitorConfig::default().with_window_size(0).validate().is_err());
        assert!(MonitorConfig::default().with_poll_interval_ms(0).validate().is_err());
        assert!(MonitorConfig::from_json(
            r#"{"channels": [{"channel": "MQ3", "min_valid": 10, "max_valid": 5}]}"#
        )
        .is_err());
        assert!(MonitorConfig::from_json(
            r#"{"channels": [
                {"channel": "MQ3", "min_valid": 0, "max_valid": 5},
                {"channel": "MQ3", "min_valid": 0, "max_valid": 9}
            ]}"#
        )
        .is_err());
        assert!(MonitorConfig::from_json("not json").is_err());
    }
}

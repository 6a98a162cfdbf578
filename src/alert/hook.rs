//! Actuation hooks run on danger transitions.
//!
//! The production hook brings up an emergency Wi-Fi access point so people
//! nearby can receive alerts when normal connectivity is unreliable.

use crate::error::{MonitorError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

/// Side effects invoked exactly once per state transition.
#[async_trait]
pub trait ActuationHook: Send {
    /// Called on the SAFE -> DANGER edge.
    async fn on_enter_danger(&mut self) -> Result<()>;

    /// Called on the DANGER -> SAFE edge.
    async fn on_exit_danger(&mut self) -> Result<()>;
}

/// One step of a hotspot command sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotspotStep {
    /// Run a program with arguments
    Run(Vec<String>),
    /// Wait before the next step
    SleepMs(u64),
}

impl HotspotStep {
    fn run(args: &[&str]) -> Self {
        HotspotStep::Run(args.iter().map(|a| a.to_string()).collect())
    }
}

/// Commands that start and stop the emergency access point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotspotConfig {
    /// Prefix every command with `sudo`
    pub use_sudo: bool,
    /// Steps run when danger begins
    pub start: Vec<HotspotStep>,
    /// Steps run when danger clears
    pub stop: Vec<HotspotStep>,
}

impl Default for HotspotConfig {
    fn default() -> Self {
        Self {
            use_sudo: true,
            start: vec![
                HotspotStep::run(&["nmcli", "radio", "wifi", "off"]),
                HotspotStep::run(&["rfkill", "unblock", "wifi"]),
                HotspotStep::SleepMs(1000),
                HotspotStep::run(&["systemctl", "start", "hostapd"]),
                HotspotStep::run(&["systemctl", "start", "dnsmasq"]),
            ],
            stop: vec![
                HotspotStep::run(&["systemctl", "stop", "hostapd"]),
                HotspotStep::run(&["systemctl", "stop", "dnsmasq"]),
                HotspotStep::run(&["nmcli", "radio", "wifi", "on"]),
            ],
        }
    }
}

/// Starts `hostapd`/`dnsmasq` on danger and restores normal Wi-Fi afterwards.
#[derive(Debug, Clone, Default)]
pub struct HotspotHook {
    config: HotspotConfig,
}

impl HotspotHook {
    pub fn new(config: HotspotConfig) -> Self {
        Self { config }
    }

    fn command_for(&self, args: &[String]) -> Option<Command> {
        let (program, rest) = if self.config.use_sudo {
            ("sudo", args)
        } else {
            let (program, rest) = args.split_first()?;
            (program.as_str(), rest)
        };

        let mut command = Command::new(program);
        command.args(rest);
        Some(command)
    }

    /// Run every step in order. A failing command does not stop the
    /// sequence; all failures are reported together at the end.
    async fn run_steps(&self, steps: &[HotspotStep]) -> Result<()> {
        let mut failures = Vec::new();

        for step in steps {
            match step {
                HotspotStep::SleepMs(ms) => tokio::time::sleep(Duration::from_millis(*ms)).await,
                HotspotStep::Run(args) => {
                    let Some(mut command) = self.command_for(args) else {
                        continue;
                    };
                    let line = args.join(" ");
                    info!("Running: {}", line);

                    match command.status().await {
                        Ok(status) if status.success() => {}
                        Ok(status) => {
                            warn!("Command `{}` exited with {}", line, status);
                            failures.push(format!("`{}` exited with {}", line, status));
                        }
                        Err(err) => {
                            warn!("Command `{}` could not be started: {}", line, err);
                            failures.push(format!("`{}`: {}", line, err));
                        }
                    }
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(MonitorError::actuation_error(failures.join("; ")))
        }
    }
}

#[async_trait]
impl ActuationHook for HotspotHook {
    async fn on_enter_danger(&mut self) -> Result<()> {
        info!("Starting DISASTER ALERT hotspot");
        self.run_steps(&self.config.start).await
    }

    async fn on_exit_danger(&mut self) -> Result<()> {
        info!("Alert cleared, stopping hotspot");
        self.run_steps(&self.config.stop).await
    }
}

/// Hook that only logs, for dry runs on machines without the access point.
#[derive(Debug, Clone, Default)]
pub struct LogOnlyHook {
    pub entered: u64,
    pub exited: u64,
}

#[async_trait]
impl ActuationHook for LogOnlyHook {
    async fn on_enter_danger(&mut self) -> Result<()> {
        self.entered += 1;
        warn!("[dry run] would start emergency hotspot");
        Ok(())
    }

    async fn on_exit_danger(&mut self) -> Result<()> {
        self.exited += 1;
        info!("[dry run] would stop emergency hotspot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sequence_matches_rig() {
        let config = HotspotConfig::default();
        assert!(config.use_sudo);
        assert_eq!(config.start.len(), 5);
        assert_eq!(config.start[2], HotspotStep::SleepMs(1000));
        assert_eq!(config.stop.last(), Some(&HotspotStep::run(&["nmcli", "radio", "wifi", "on"])));
    }

    #[test]
    fn test_step_json_shape() {
        let json = serde_json::to_string(&HotspotStep::SleepMs(500)).unwrap();
        assert_eq!(json, r#"{"sleep_ms":500}"#);

        let step: HotspotStep = serde_json::from_str(r#"{"run": ["true"]}"#).unwrap();
        assert_eq!(step, HotspotStep::run(&["true"]));
    }

    #[tokio::test]
    async fn test_successful_commands() {
        let mut hook = HotspotHook::new(HotspotConfig {
            use_sudo: false,
            start: vec![HotspotStep::run(&["true"]), HotspotStep::SleepMs(1)],
            stop: vec![],
        });
        assert!(hook.on_enter_danger().await.is_ok());
        assert!(hook.on_exit_danger().await.is_ok());
    }

    #[tokio::test]
    async fn test_failures_collected_without_stopping() {
        let mut hook = HotspotHook::new(HotspotConfig {
            use_sudo: false,
            start: vec![
                HotspotStep::run(&["false"]),
                HotspotStep::run(&["hazard-watch-no-such-binary"]),
                HotspotStep::run(&["true"]),
            ],
            stop: vec![],
        });

        let err = hook.on_enter_danger().await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("`false`"));
        assert!(message.contains("hazard-watch-no-such-binary"));
    }

    #[tokio::test]
    async fn test_log_only_hook_counts() {
        let mut hook = LogOnlyHook::default();
        hook.on_enter_danger().await.unwrap();
        hook.on_exit_danger().await.unwrap();
        assert_eq!((hook.entered, hook.exited), (1, 1));
    }
}

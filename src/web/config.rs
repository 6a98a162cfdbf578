//! Read API settings, the `web` section of the config file.

use crate::error::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    /// Permissive CORS, so the dashboard can fetch from its own origin
    pub enable_cors: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: crate::DEFAULT_WEB_PORT,
            enable_cors: true,
        }
    }
}

impl WebConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_cors(mut self, enable_cors: bool) -> Self {
        self.enable_cors = enable_cors;
        self
    }

    /// Apply command-line values over the configured ones.
    pub fn with_overrides(mut self, host: Option<&str>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host.to_string();
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    /// Address to listen on. The host must be an IP literal.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        let ip = host.parse().map_err(|e| {
            MonitorError::config_error(format!("Invalid bind host {:?}: {}", self.host, e))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_only_replace_given_values() {
        let config = WebConfig::new("127.0.0.1", 9000).with_overrides(None, Some(9090));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9090);
        assert!(config.enable_cors);
    }

    #[test]
    fn test_socket_addr() {
        let addr = WebConfig::new("127.0.0.1", 8080).socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:8080");

        let addr = WebConfig::new("[::1]", 8080).socket_addr().unwrap();
        assert_eq!(addr.to_string(), "[::1]:8080");

        assert!(WebConfig::new("not a host", 8080).socket_addr().is_err());
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: WebConfig = serde_json::from_str(r#"{"port": 9999}"#).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9999);
        assert!(config.enable_cors);
    }
}

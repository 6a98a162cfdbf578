//! # Hazard Watch - sensor telemetry and emergency hotspot control
//!
//! Reads `CHANNEL:VALUE` lines from a sensor hub on a Raspberry Pi serial
//! link, smooths them into per-channel rolling means, and publishes a
//! snapshot file once per second. A separate watcher process polls that
//! snapshot and raises an emergency Wi-Fi hotspot while gas or temperature
//! readings are dangerous.
//!
//! ## Features
//!
//! - **Noise-tolerant parsing**: garbage lines and unknown channels are dropped
//! - **Validated smoothing**: range checks and glitch rejection per channel
//! - **Atomic snapshot exchange**: readers never observe a partial write
//! - **Edge-triggered alerts**: hotspot started and stopped once per danger episode
//! - **Read API**: current snapshot over HTTP
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hazard_watch::{open_link, run_ingest, Aggregator, IngestOptions, SnapshotStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let link = open_link("/dev/ttyACM0").await?;
//!     let store = SnapshotStore::new("/tmp/mq3_latest.json");
//!     let mut aggregator = Aggregator::default();
//!
//!     run_ingest(link, &mut aggregator, &store, IngestOptions::default(), |_| {}).await?;
//!     Ok(())
//! }
//! ```

pub mod alert;
pub mod config;
pub mod error;
pub mod store;
pub mod telemetry;
pub mod web;

// Re-export public API
pub use alert::{
    poll_store, watch, ActuationHook, AlertConfig, AlertState, AlertStateMachine, HotspotConfig,
    HotspotHook, LogOnlyHook, Transition, WatchOptions,
};
pub use config::{ChannelConfig, MonitorConfig};
pub use error::{MonitorError, Result};
pub use store::{NoData, SnapshotStore};
pub use telemetry::{
    open_link, run_ingest, Aggregator, Channel, ChannelLimits, ChannelWindow, IngestOptions,
    Sample, Snapshot, LINK_BAUD_RATE,
};
pub use web::{start_web_server, WebConfig};

/// Where the ingest process publishes and the watcher reads
pub const DEFAULT_SNAPSHOT_PATH: &str = "/tmp/mq3_latest.json";

/// Serial device of the sensor hub
pub const DEFAULT_DEVICE: &str = "/dev/ttyACM0";

/// The default snapshot publication interval in milliseconds
pub const DEFAULT_PUBLISH_INTERVAL_MS: u64 = 1000;

/// The default watcher polling interval in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// The default web server port
pub const DEFAULT_WEB_PORT: u16 = 8080;

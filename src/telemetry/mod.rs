//! Sensor telemetry ingestion and smoothing.
//!
//! This module turns the noisy line stream coming off the sensor hub into
//! smoothed per-channel snapshots: parsing, range and glitch validation,
//! rolling means, and the ingest loop that ties them to the snapshot store.

pub mod aggregator;
pub mod data;
pub mod ingest;
pub mod parser;
pub mod window;

// Re-export commonly used items
pub use aggregator::{Aggregator, IngestError};
pub use data::{Channel, Sample, Snapshot};
pub use ingest::{open_link, run_ingest, IngestOptions, IngestStats, LinkReader, LINK_BAUD_RATE};
pub use parser::{extract_first_number, parse_line, parse_sample, LineError, ParsedLine};
pub use window::{ChannelLimits, ChannelWindow, Rejection, WINDOW_SIZE};

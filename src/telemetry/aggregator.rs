//! Routing of samples into per-channel windows and snapshot production.

use crate::config::{default_channels, ChannelConfig};
use crate::telemetry::data::{Channel, Sample, Snapshot};
use crate::telemetry::window::{ChannelWindow, Rejection, WINDOW_SIZE};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Why a sample did not advance any window.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum IngestError {
    #[error("{channel} sample rejected: {rejection}")]
    Rejected {
        channel: Channel,
        rejection: Rejection,
    },

    #[error("no window configured for {0}")]
    Unconfigured(Channel),
}

/// Owns one [`ChannelWindow`] per configured channel.
#[derive(Debug, Clone)]
pub struct Aggregator {
    windows: BTreeMap<Channel, ChannelWindow>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(&default_channels(), WINDOW_SIZE)
    }
}

impl Aggregator {
    /// Create an aggregator with one window of `window_size` per channel.
    pub fn new(channels: &[ChannelConfig], window_size: usize) -> Self {
        let windows = channels
            .iter()
            .map(|entry| {
                (
                    entry.channel,
                    ChannelWindow::with_capacity(entry.limits, window_size),
                )
            })
            .collect();
        Self { windows }
    }

    /// Route a sample to its channel's window.
    pub fn ingest(&mut self, sample: &Sample) -> Result<(), IngestError> {
        let window = self
            .windows
            .get_mut(&sample.channel)
            .ok_or(IngestError::Unconfigured(sample.channel))?;

        window
            .offer(sample.value)
            .map_err(|rejection| IngestError::Rejected {
                channel: sample.channel,
                rejection,
            })
    }

    /// Smoothed values of every configured channel.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Snapshot {
        let mut snapshot = Snapshot::new(now);
        for (channel, window) in &self.windows {
            snapshot.values.insert(*channel, window.mean());
        }
        snapshot
    }

    pub fn window(&self, channel: Channel) -> Option<&ChannelWindow> {
        self.windows.get(&channel)
    }

    /// Configured channels in artifact order.
    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.windows.keys().copied()
    }
}

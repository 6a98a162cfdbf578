//! The ingest process: hardware link -> aggregator -> snapshot store.
//!
//! A reader task owns the link and hands parsed lines to the loop that owns
//! the [`Aggregator`], over a bounded channel. That loop is the only writer
//! of the windows; it also publishes on a timer, so publication cadence does
//! not depend on how (or whether) lines arrive.

use crate::error::{MonitorError, Result};
use crate::store::SnapshotStore;
use crate::telemetry::aggregator::Aggregator;
use crate::telemetry::data::{Sample, Snapshot};
use crate::telemetry::parser::{parse_sample, LineError};
use chrono::Utc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, trace};

/// Longest line kept in one piece; longer runs of bytes are split.
const MAX_LINE_BYTES: u64 = 4096;

/// Baud rate the sensor hub transmits at.
pub const LINK_BAUD_RATE: u32 = 115_200;

/// A boxed hardware link.
pub type LinkReader = Box<dyn AsyncRead + Unpin + Send>;

/// Ingest loop options.
#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    /// Time between snapshot publications
    pub publish_interval: Duration,
    /// Parsed lines buffered between the reader task and the loop
    pub queue_capacity: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            publish_interval: Duration::from_millis(crate::DEFAULT_PUBLISH_INTERVAL_MS),
            queue_capacity: 256,
        }
    }
}

impl IngestOptions {
    pub fn with_publish_interval(mut self, interval: Duration) -> Self {
        self.publish_interval = interval;
        self
    }
}

/// Counters kept by the ingest loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub lines_seen: u64,
    pub lines_dropped: u64,
    pub samples_rejected: u64,
    pub snapshots_published: u64,
    pub publish_failures: u64,
}

/// Open the hardware link. `-` reads standard input.
///
/// Serial line settings are expected to be applied to the TTY beforehand,
/// e.g. `stty -F /dev/ttyACM0 115200 raw` (see [`LINK_BAUD_RATE`]).
pub async fn open_link(device: &str) -> Result<LinkReader> {
    if device == "-" {
        return Ok(Box::new(tokio::io::stdin()));
    }

    let file = tokio::fs::File::open(device)
        .await
        .map_err(|e| MonitorError::link_error(format!("Cannot open {}: {}", device, e)))?;
    Ok(Box::new(file))
}

fn spawn_line_reader<R>(
    reader: R,
    tx: mpsc::Sender<std::result::Result<Sample, LineError>>,
) -> JoinHandle<std::io::Result<u64>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::with_capacity(128);
        let mut lines = 0u64;

        loop {
            buf.clear();
            let read = (&mut reader)
                .take(MAX_LINE_BYTES)
                .read_until(b'\n', &mut buf)
                .await?;
            if read == 0 {
                return Ok(lines);
            }
            lines += 1;

            let line = String::from_utf8_lossy(&buf);
            if tx.send(parse_sample(&line, Utc::now())).await.is_err() {
                return Ok(lines);
            }
        }
    })
}

fn publish_snapshot<F>(
    aggregator: &Aggregator,
    store: &SnapshotStore,
    stats: &mut IngestStats,
    on_publish: &mut F,
) where
    F: FnMut(&Snapshot),
{
    let snapshot = aggregator.snapshot(Utc::now());
    match store.publish(&snapshot) {
        Ok(()) => {
            stats.snapshots_published += 1;
            on_publish(&snapshot);
        }
        Err(err) => {
            stats.publish_failures += 1;
            error!("Failed to publish snapshot to {}: {}", store.path().display(), err);
        }
    }
}

/// Run the ingest loop until the link reaches end of input.
///
/// A final snapshot is published when the link closes. A link read error
/// ends the loop with [`MonitorError::Link`] after that final publication.
pub async fn run_ingest<R, F>(
    reader: R,
    aggregator: &mut Aggregator,
    store: &SnapshotStore,
    options: IngestOptions,
    mut on_publish: F,
) -> Result<IngestStats>
where
    R: AsyncRead + Unpin + Send + 'static,
    F: FnMut(&Snapshot),
{
    let (tx, mut rx) = mpsc::channel(options.queue_capacity.max(1));
    let reader_task = spawn_line_reader(reader, tx);
    let mut stats = IngestStats::default();

    let mut ticker = time::interval(options.publish_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; publish only after a full period.
    ticker.tick().await;

    loop {
        tokio::select! {
            line = rx.recv() => match line {
                Some(Ok(sample)) => {
                    stats.lines_seen += 1;
                    if let Err(err) = aggregator.ingest(&sample) {
                        stats.samples_rejected += 1;
                        debug!("{}", err);
                    }
                }
                Some(Err(err)) => {
                    stats.lines_seen += 1;
                    stats.lines_dropped += 1;
                    trace!("Dropped line: {}", err);
                }
                None => break,
            },
            _ = ticker.tick() => {
                publish_snapshot(aggregator, store, &mut stats, &mut on_publish);
            }
        }
    }

    publish_snapshot(aggregator, store, &mut stats, &mut on_publish);

    info!(
        lines = stats.lines_seen,
        dropped = stats.lines_dropped,
        rejected = stats.samples_rejected,
        published = stats.snapshots_published,
        "Hardware link closed"
    );

    match reader_task.await {
        Ok(Ok(_)) => Ok(stats),
        Ok(Err(err)) => Err(MonitorError::link_error(format!("Read failed: {}", err))),
        Err(err) => Err(MonitorError::link_error(format!("Reader task failed: {}", err))),
    }
}

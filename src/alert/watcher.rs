//! The poll -> evaluate -> act loop of the watch process.

use crate::alert::hook::ActuationHook;
use crate::alert::state::{AlertStateMachine, Transition};
use crate::store::{NoData, SnapshotStore};
use crate::telemetry::{Channel, Snapshot};
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use std::time::Duration;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{debug, info};

/// Result of one poll of the snapshot store.
pub type Reading = std::result::Result<Snapshot, NoData>;

/// Watcher polling options.
#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    /// Time between polls
    pub poll_interval: Duration,
    /// Treat snapshots older than this as no data
    pub stale_after: Option<Duration>,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(crate::DEFAULT_POLL_INTERVAL_MS),
            stale_after: None,
        }
    }
}

/// Counters kept by the watch loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchStats {
    pub cycles: u64,
    pub no_data_cycles: u64,
    pub entered_danger: u64,
    pub exited_danger: u64,
}

/// Poll the store on a fixed period, forever.
///
/// A hook that runs past the period delays the next poll instead of causing
/// a burst of catch-up polls.
pub fn poll_store(store: SnapshotStore, options: WatchOptions) -> BoxStream<'static, Reading> {
    let stream = stream::unfold(
        (store, None::<Interval>),
        move |(store, mut interval)| async move {
            interval
                .get_or_insert_with(|| {
                    let mut interval = time::interval(options.poll_interval);
                    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    interval
                })
                .tick()
                .await;

            let reading = store.load(options.stale_after).await;
            Some((reading, (store, interval)))
        },
    );

    Box::pin(stream)
}

/// Drive the state machine from a stream of readings until it ends.
pub async fn watch<S>(
    readings: S,
    machine: &mut AlertStateMachine,
    hook: &mut dyn ActuationHook,
) -> WatchStats
where
    S: Stream<Item = Reading> + Unpin,
{
    let mut readings = readings;
    let mut stats = WatchStats::default();

    while let Some(reading) = readings.next().await {
        stats.cycles += 1;

        let snapshot = match reading {
            Ok(snapshot) => {
                debug!(
                    gas = snapshot.value(Channel::Gas),
                    temperature = snapshot.value(Channel::Temperature),
                    dist_gas = snapshot.value(Channel::GasBeaconDistance),
                    dist_temp = snapshot.value(Channel::TempBeaconDistance),
                    "Polled snapshot"
                );
                Some(snapshot)
            }
            Err(no_data) => {
                stats.no_data_cycles += 1;
                debug!("No snapshot this cycle: {}", no_data);
                None
            }
        };

        match machine.step(snapshot.as_ref(), hook).await {
            Some(Transition::EnteredDanger) => stats.entered_danger += 1,
            Some(Transition::ExitedDanger) => stats.exited_danger += 1,
            None => {}
        }
    }

    info!(
        cycles = stats.cycles,
        no_data = stats.no_data_cycles,
        "Watch loop finished"
    );
    stats
}

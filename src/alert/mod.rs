//! Danger detection and actuation.
//!
//! The watch process polls the published snapshot, evaluates the gas and
//! fire thresholds, and starts or stops the emergency hotspot on each edge
//! of the SAFE/DANGER signal.

pub mod hook;
pub mod state;
pub mod watcher;

// Re-export commonly used items
pub use hook::{ActuationHook, HotspotConfig, HotspotHook, HotspotStep, LogOnlyHook};
pub use state::{
    AlertConfig, AlertState, AlertStateMachine, Evaluation, Rule, RuleHit, Transition,
    FIRE_THRESHOLD, GAS_THRESHOLD,
};
pub use watcher::{poll_store, watch, Reading, WatchOptions, WatchStats};

//! Per-channel rolling window with range validation and glitch rejection.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Number of accepted values kept per channel.
pub const WINDOW_SIZE: usize = 5;

/// Validity limits for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelLimits {
    /// Smallest physically plausible value (inclusive)
    pub min_valid: f64,
    /// Largest physically plausible value (inclusive)
    pub max_valid: f64,
    /// Largest allowed jump from the last accepted value, if glitch
    /// rejection is enabled for the channel
    #[serde(default)]
    pub max_step_delta: Option<f64>,
}

impl ChannelLimits {
    /// Limits with range validation only.
    pub fn range(min_valid: f64, max_valid: f64) -> Self {
        Self {
            min_valid,
            max_valid,
            max_step_delta: None,
        }
    }

    /// Enable glitch rejection with the given step limit.
    pub fn with_max_step_delta(mut self, delta: f64) -> Self {
        self.max_step_delta = Some(delta);
        self
    }

    /// Whether `value` lies inside the validity range.
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min_valid && value <= self.max_valid
    }
}

/// Why an offered value was not stored.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("{value} outside valid range [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },

    #[error("{value} jumps more than {delta} from last accepted {last}")]
    Glitch { value: f64, last: f64, delta: f64 },
}

/// Fixed-capacity ring of accepted values for a single channel.
#[derive(Debug, Clone)]
pub struct ChannelWindow {
    limits: ChannelLimits,
    capacity: usize,
    values: VecDeque<f64>,
}

impl ChannelWindow {
    /// Create a window holding [`WINDOW_SIZE`] values.
    pub fn new(limits: ChannelLimits) -> Self {
        Self::with_capacity(limits, WINDOW_SIZE)
    }

    /// Create a window with a custom capacity (at least one value).
    pub fn with_capacity(limits: ChannelLimits, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            limits,
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    /// Offer a value to the window.
    ///
    /// Out-of-range values are rejected. With glitch rejection enabled, a
    /// value further than the step limit from the last *accepted* value is
    /// rejected too; a rejected value never becomes the comparison base.
    pub fn offer(&mut self, value: f64) -> Result<(), Rejection> {
        if !self.limits.contains(value) {
            return Err(Rejection::OutOfRange {
                value,
                min: self.limits.min_valid,
                max: self.limits.max_valid,
            });
        }

        if let (Some(delta), Some(&last)) = (self.limits.max_step_delta, self.values.back()) {
            if (value - last).abs() > delta {
                return Err(Rejection::Glitch { value, last, delta });
            }
        }

        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
        Ok(())
    }

    /// Arithmetic mean of the stored values, `0.0` when empty.
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Most recently accepted value.
    pub fn last_accepted(&self) -> Option<f64> {
        self.values.back().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn limits(&self) -> &ChannelLimits {
        &self.limits
    }

    /// Stored values, oldest first.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }
}

//! Data structures for sensor telemetry.

use crate::error::{MonitorError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A named sensor measurement stream on the hardware link.
///
/// The serialized form is the wire name used both on the serial link and as
/// the key in the snapshot artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    /// MQ-3 gas concentration (raw ppm-equivalent)
    #[serde(rename = "MQ3")]
    Gas,
    /// Temperature in degrees Celsius
    #[serde(rename = "TEMP")]
    Temperature,
    /// Distance to the gas sensor beacon in metres
    #[serde(rename = "DIST_MQ3")]
    GasBeaconDistance,
    /// Distance to the temperature sensor beacon in metres
    #[serde(rename = "DIST_TEMP")]
    TempBeaconDistance,
}

impl Channel {
    /// Every channel known to the system, in artifact order.
    pub const ALL: [Channel; 4] = [
        Channel::Gas,
        Channel::Temperature,
        Channel::GasBeaconDistance,
        Channel::TempBeaconDistance,
    ];

    /// Name used on the serial link and in the snapshot artifact.
    pub fn wire_name(self) -> &'static str {
        match self {
            Channel::Gas => "MQ3",
            Channel::Temperature => "TEMP",
            Channel::GasBeaconDistance => "DIST_MQ3",
            Channel::TempBeaconDistance => "DIST_TEMP",
        }
    }

    /// Look up a channel by its wire name. Unknown names yield `None`.
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|channel| channel.wire_name() == name)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Channel {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_wire(s.trim())
            .ok_or_else(|| MonitorError::parse_error(format!("unknown channel: {}", s)))
    }
}

/// A single accepted-for-routing reading from the hardware link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub channel: Channel,
    pub value: f64,
    pub observed_at: DateTime<Utc>,
}

impl Sample {
    /// Create a sample observed now.
    pub fn new(channel: Channel, value: f64) -> Self {
        Self::observed(channel, value, Utc::now())
    }

    /// Create a sample with an explicit observation time.
    pub fn observed(channel: Channel, value: f64, observed_at: DateTime<Utc>) -> Self {
        Self {
            channel,
            value,
            observed_at,
        }
    }
}

/// Smoothed values for every channel at a point in time.
///
/// A channel without accepted data reads as `0.0`; consumers cannot tell a
/// data-starved channel from a genuine zero reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Smoothed value per channel
    pub values: BTreeMap<Channel, f64>,
    /// When the snapshot was produced (or last written, when read back)
    pub produced_at: DateTime<Utc>,
}

impl Snapshot {
    /// Create an empty snapshot.
    pub fn new(produced_at: DateTime<Utc>) -> Self {
        Self {
            values: BTreeMap::new(),
            produced_at,
        }
    }

    /// Set the value for a channel.
    pub fn with_value(mut self, channel: Channel, value: f64) -> Self {
        self.values.insert(channel, value);
        self
    }

    /// Value for a channel, `0.0` when absent.
    pub fn value(&self, channel: Channel) -> f64 {
        self.values.get(&channel).copied().unwrap_or(0.0)
    }

    /// Encode the artifact form: a flat JSON object keyed by wire name,
    /// containing exactly one number per known channel.
    pub fn to_artifact_json(&self) -> Result<String> {
        let artifact: BTreeMap<&'static str, f64> = Channel::ALL
            .into_iter()
            .map(|channel| (channel.wire_name(), self.value(channel)))
            .collect();
        Ok(serde_json::to_string(&artifact)?)
    }

    /// Decode the artifact form.
    ///
    /// Missing keys read as `0.0` and unknown keys are ignored. A document
    /// that is not an object, or a known key that is not a number, is an error.
    pub fn from_artifact_json(content: &str, produced_at: DateTime<Utc>) -> Result<Self> {
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)?;

        let mut snapshot = Snapshot::new(produced_at);
        for channel in Channel::ALL {
            let value = match object.get(channel.wire_name()) {
                None => 0.0,
                Some(raw) => raw.as_f64().ok_or_else(|| {
                    MonitorError::parse_error(format!("{} is not a number: {}", channel, raw))
                })?,
            };
            snapshot.values.insert(channel, value);
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip() {
        for channel in Channel::ALL {
            assert_eq!(Channel::from_wire(channel.wire_name()), Some(channel));
        }
        assert_eq!(Channel::from_wire("HUMIDITY"), None);
        assert_eq!(" TEMP ".parse::<Channel>().unwrap(), Channel::Temperature);
        assert!("mq3".parse::<Channel>().is_err());
    }

    #[test]
    fn test_missing_value_reads_as_zero() {
        let snapshot = Snapshot::new(Utc::now()).with_value(Channel::Gas, 120.0);
        assert_eq!(snapshot.value(Channel::Gas), 120.0);
        assert_eq!(snapshot.value(Channel::Temperature), 0.0);
    }

    #[test]
    fn test_artifact_has_exactly_the_channel_keys() {
        let snapshot = Snapshot::new(Utc::now()).with_value(Channel::Temperature, 25.0);
        let json = snapshot.to_artifact_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 4);
        assert_eq!(object["TEMP"], 25.0);
        assert_eq!(object["MQ3"], 0.0);
        assert!(object.contains_key("DIST_MQ3"));
        assert!(object.contains_key("DIST_TEMP"));
    }

    #[test]
    fn test_artifact_decoding_tolerates_missing_and_extra_keys() {
        let snapshot =
            Snapshot::from_artifact_json(r#"{"MQ3": 400, "EXTRA": "x"}"#, Utc::now()).unwrap();
        assert_eq!(snapshot.value(Channel::Gas), 400.0);
        assert_eq!(snapshot.value(Channel::TempBeaconDistance), 0.0);
    }

    #[test]
    fn test_artifact_decoding_rejects_bad_shapes() {
        assert!(Snapshot::from_artifact_json("[1, 2]", Utc::now()).is_err());
        assert!(Snapshot::from_artifact_json(r#"{"TEMP": "hot"}"#, Utc::now()).is_err());
        assert!(Snapshot::from_artifact_json(r#"{"MQ3": 1"#, Utc::now()).is_err());
    }
}

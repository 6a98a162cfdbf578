//! Threshold rules and the edge-triggered SAFE/DANGER state machine.

use crate::alert::hook::ActuationHook;
use crate::telemetry::{Channel, Snapshot};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info, warn};

/// Gas level (raw MQ-3 reading) at or above which the air is dangerous.
pub const GAS_THRESHOLD: f64 = 350.0;

/// Temperature in Celsius at or above which a fire is assumed.
pub const FIRE_THRESHOLD: f64 = 60.0;

/// Danger thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub gas_threshold: f64,
    pub fire_threshold: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            gas_threshold: GAS_THRESHOLD,
            fire_threshold: FIRE_THRESHOLD,
        }
    }
}

/// A threshold rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    GasHigh,
    FireHigh,
}

impl Rule {
    pub fn channel(self) -> Channel {
        match self {
            Rule::GasHigh => Channel::Gas,
            Rule::FireHigh => Channel::Temperature,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::GasHigh => f.write_str("gas high"),
            Rule::FireHigh => f.write_str("temperature high"),
        }
    }
}

/// A rule that fired, with the value that tripped it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleHit {
    pub rule: Rule,
    pub value: f64,
    pub threshold: f64,
}

/// Result of evaluating the rules against one reading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub hits: Vec<RuleHit>,
}

impl Evaluation {
    pub fn danger(&self) -> bool {
        !self.hits.is_empty()
    }
}

/// Alert state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertState {
    #[default]
    Safe,
    Danger,
}

/// A committed state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    EnteredDanger,
    ExitedDanger,
}

/// Debounced danger signal derived from snapshots.
///
/// Hooks fire once per transition edge, never once per evaluation.
#[derive(Debug, Clone)]
pub struct AlertStateMachine {
    config: AlertConfig,
    state: AlertState,
    last_fired: Vec<RuleHit>,
    transitions: u64,
}

impl Default for AlertStateMachine {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}

impl AlertStateMachine {
    pub fn new(config: AlertConfig) -> Self {
        Self {
            config,
            state: AlertState::Safe,
            last_fired: Vec::new(),
            transitions: 0,
        }
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    pub fn is_danger(&self) -> bool {
        self.state == AlertState::Danger
    }

    /// Rules that fired on the most recent evaluation that found danger.
    pub fn last_fired(&self) -> &[RuleHit] {
        &self.last_fired
    }

    /// Number of committed transitions since start.
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Evaluate the threshold rules. `None` (no data) never signals danger.
    pub fn evaluate(&self, reading: Option<&Snapshot>) -> Evaluation {
        let Some(snapshot) = reading else {
            return Evaluation::default();
        };

        let rules = [
            (Rule::GasHigh, self.config.gas_threshold),
            (Rule::FireHigh, self.config.fire_threshold),
        ];

        let hits = rules
            .into_iter()
            .filter_map(|(rule, threshold)| {
                let value = snapshot.value(rule.channel());
                (value >= threshold).then_some(RuleHit {
                    rule,
                    value,
                    threshold,
                })
            })
            .collect();

        Evaluation { hits }
    }

    /// Evaluate a reading and commit the resulting state.
    ///
    /// No data evaluates as not dangerous: it never escalates, and while in
    /// DANGER it clears the state like any safe reading.
    pub fn observe(&mut self, reading: Option<&Snapshot>) -> Option<Transition> {
        let evaluation = self.evaluate(reading);
        let danger = evaluation.danger();
        if danger {
            self.last_fired = evaluation.hits;
        }

        let transition = match (self.state, danger) {
            (AlertState::Safe, true) => Some(Transition::EnteredDanger),
            (AlertState::Danger, false) => Some(Transition::ExitedDanger),
            _ => None,
        }?;

        self.state = match transition {
            Transition::EnteredDanger => AlertState::Danger,
            Transition::ExitedDanger => AlertState::Safe,
        };
        self.transitions += 1;
        Some(transition)
    }

    /// Observe a reading and run the matching hook on a transition.
    ///
    /// A failing hook is logged and does not undo the transition.
    pub async fn step(
        &mut self,
        reading: Option<&Snapshot>,
        hook: &mut dyn ActuationHook,
    ) -> Option<Transition> {
        let no_data = reading.is_none();
        let transition = self.observe(reading)?;

        let outcome = match transition {
            Transition::EnteredDanger => {
                for hit in &self.last_fired {
                    warn!(rule = %hit.rule, value = hit.value, threshold = hit.threshold, "Danger rule fired");
                }
                warn!("Entering DANGER state, starting emergency hotspot");
                hook.on_enter_danger().await
            }
            Transition::ExitedDanger => {
                if no_data {
                    warn!("No snapshot available, treating as SAFE");
                }
                info!("Danger cleared, returning to SAFE state");
                hook.on_exit_danger().await
            }
        };

        if let Err(err) = outcome {
            error!(?transition, "Actuation hook failed: {}", err);
        }

        Some(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn reading(gas: f64, temp: f64) -> Snapshot {
        Snapshot::new(Utc::now())
            .with_value(Channel::Gas, gas)
            .with_value(Channel::Temperature, temp)
    }

    #[test]
    fn test_initial_state_is_safe() {
        let machine = AlertStateMachine::default();
        assert_eq!(machine.state(), AlertState::Safe);
        assert!(machine.last_fired().is_empty());
        assert_eq!(machine.transitions(), 0);
    }

    #[test]
    fn test_rules_are_inclusive() {
        let machine = AlertStateMachine::default();
        assert!(machine.evaluate(Some(&reading(350.0, 0.0))).danger());
        assert!(machine.evaluate(Some(&reading(0.0, 60.0))).danger());
        assert!(!machine.evaluate(Some(&reading(349.9, 59.9))).danger());
    }

    #[test]
    fn test_both_rules_reported() {
        let machine = AlertStateMachine::default();
        let evaluation = machine.evaluate(Some(&reading(500.0, 75.0)));
        let rules: Vec<_> = evaluation.hits.iter().map(|h| h.rule).collect();
        assert_eq!(rules, vec![Rule::GasHigh, Rule::FireHigh]);
    }

    #[test]
    fn test_no_data_is_not_danger() {
        let machine = AlertStateMachine::default();
        assert!(!machine.evaluate(None).danger());
    }

    #[test]
    fn test_transition_table() {
        let mut machine = AlertStateMachine::default();

        assert_eq!(machine.observe(Some(&reading(0.0, 20.0))), None);
        assert_eq!(
            machine.observe(Some(&reading(400.0, 20.0))),
            Some(Transition::EnteredDanger)
        );
        assert_eq!(machine.observe(Some(&reading(400.0, 20.0))), None);
        assert_eq!(machine.observe(Some(&reading(0.0, 70.0))), None);
        assert_eq!(machine.last_fired()[0].rule, Rule::FireHigh);
        assert_eq!(
            machine.observe(Some(&reading(0.0, 0.0))),
            Some(Transition::ExitedDanger)
        );
        assert_eq!(machine.state(), AlertState::Safe);
        assert_eq!(machine.transitions(), 2);
    }

    #[test]
    fn test_no_data_clears_danger_once() {
        let mut machine = AlertStateMachine::default();
        assert_eq!(machine.observe(None), None);
        assert_eq!(machine.state(), AlertState::Safe);

        machine.observe(Some(&reading(400.0, 0.0)));
        assert_eq!(machine.observe(None), Some(Transition::ExitedDanger));
        assert_eq!(machine.state(), AlertState::Safe);

        for _ in 0..10 {
            assert_eq!(machine.observe(None), None);
        }
        assert_eq!(machine.state(), AlertState::Safe);
        assert_eq!(machine.transitions(), 2);
    }

    #[test]
    fn test_custom_thresholds() {
        let mut machine = AlertStateMachine::new(AlertConfig {
            gas_threshold: 100.0,
            fire_threshold: 40.0,
        });
        assert_eq!(
            machine.observe(Some(&reading(120.0, 0.0))),
            Some(Transition::EnteredDanger)
        );
    }
}

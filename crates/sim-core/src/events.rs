//! Time-scoped global modifiers. The ledger tracks which events are
//! active and when they end; consumers read `active_effects` (or the
//! multiplier folds) to resolve their own scaling. Score, goal, and
//! resource-count auto-triggers are declared but intentionally left as
//! no-ops pending integration.

use std::collections::BTreeSet;

use contracts::{EventEffect, EventModality, EventSpec, EventTrigger};

#[derive(Debug, Clone)]
struct ActiveEntry {
    spec: EventSpec,
    /// Absolute simulation time when the effect ends; infinity for
    /// permanent events.
    end_time: f64,
}

#[derive(Debug, Clone, Default)]
pub struct EventLedger {
    /// Events that may auto-fire by condition.
    condition_events: Vec<EventSpec>,
    active: Vec<ActiveEntry>,
    fired_by_condition: BTreeSet<String>,
}

impl EventLedger {
    pub fn new(condition_events: Vec<EventSpec>) -> Self {
        Self {
            condition_events,
            active: Vec::new(),
            fired_by_condition: BTreeSet::new(),
        }
    }

    /// Activate an event now. Duration-scoped events get an end time;
    /// permanent ones stay until removed.
    pub fn fire(&mut self, spec: EventSpec, now: f64) {
        let end_time = match spec.modality {
            EventModality::WithDuration { seconds } => now + seconds,
            EventModality::Permanent => f64::INFINITY,
        };
        self.active.push(ActiveEntry { spec, end_time });
    }

    /// Remove every active entry for the given event id.
    pub fn remove(&mut self, event_id: &str) {
        self.active.retain(|entry| entry.spec.event_id != event_id);
    }

    /// Drop entries whose end time has passed, returning them. Calling
    /// twice with the same `now` removes nothing the second time.
    pub fn tick(&mut self, now: f64) -> Vec<EventSpec> {
        let mut expired = Vec::new();
        self.active.retain(|entry| {
            if entry.end_time <= now {
                expired.push(entry.spec.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    /// Evaluate condition triggers that have not fired yet and activate
    /// the due ones. The returned specs are already in the active set;
    /// callers react to them (logging, policy swaps) but must not fire
    /// them again. Only TimeElapsed is implemented; the remaining trigger
    /// kinds need integration with score/goal/resource state and stay
    /// no-ops.
    pub fn evaluate_auto_triggers(&mut self, now: f64, elapsed: f64) -> Vec<EventSpec> {
        let mut due = Vec::new();
        for spec in &self.condition_events {
            if self.fired_by_condition.contains(&spec.event_id) {
                continue;
            }
            match &spec.trigger {
                EventTrigger::TimeElapsed { seconds } => {
                    if *seconds > 0.0 && elapsed >= *seconds {
                        due.push(spec.clone());
                    }
                }
                EventTrigger::ScoreThreshold { .. }
                | EventTrigger::GoalCompleted { .. }
                | EventTrigger::ResourceCountExceeds { .. }
                | EventTrigger::TriggeredExternally => {}
            }
        }
        for spec in &due {
            self.fired_by_condition.insert(spec.event_id.clone());
            self.fire(spec.clone(), now);
        }
        due
    }

    pub fn is_active(&self, event_id: &str) -> bool {
        self.active.iter().any(|entry| entry.spec.event_id == event_id)
    }

    pub fn active_effects(&self) -> Vec<&EventEffect> {
        self.active
            .iter()
            .flat_map(|entry| entry.spec.effects.iter())
            .collect()
    }

    /// Product of all active MultiplySpeed factors.
    pub fn speed_factor(&self) -> f64 {
        self.active_effects()
            .iter()
            .fold(1.0, |acc, effect| match effect {
                EventEffect::MultiplySpeed { factor } => acc * factor,
                _ => acc,
            })
    }

    /// Product of all active ScaleDecay factors.
    pub fn decay_factor(&self) -> f64 {
        self.active_effects()
            .iter()
            .fold(1.0, |acc, effect| match effect {
                EventEffect::ScaleDecay { factor } => acc * factor,
                _ => acc,
            })
    }

    /// Product of active ScaleWorkDuration factors applying to the given
    /// station config (untargeted effects apply to all stations).
    pub fn work_duration_factor(&self, station_config_id: &str) -> f64 {
        self.active_effects()
            .iter()
            .fold(1.0, |acc, effect| match effect {
                EventEffect::ScaleWorkDuration {
                    factor,
                    station_config_id: target,
                } => match target {
                    Some(target) if target != station_config_id => acc,
                    _ => acc * factor,
                },
                _ => acc,
            })
    }
}

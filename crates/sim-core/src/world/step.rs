use super::*;

use crate::station::{StationCtx, TickOutcome};

impl SimWorld {
    pub fn start(&mut self) {
        if !self.status.is_complete() {
            self.status.mode = RunMode::Running;
        }
    }

    pub fn pause(&mut self) {
        self.status.mode = RunMode::Paused;
    }

    pub fn scenario_id(&self) -> &str {
        &self.status.scenario_id
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn status(&self) -> &SimStatus {
        &self.status
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.event_log
    }

    pub fn state_hash(&self) -> u64 {
        self.state_hash
    }

    /// Advance one tick. Returns false once the run is complete.
    ///
    /// Fixed order inside a tick: modifier expiry and auto-triggers, then
    /// resource decay, then every station in id order, then goal
    /// countdown/resolution. Relying on incidental update ordering is
    /// exactly what this scheduler exists to avoid.
    pub fn step(&mut self) -> bool {
        if self.status.is_complete() {
            self.status.mode = RunMode::Paused;
            return false;
        }
        self.status.mode = RunMode::Running;
        let tick = self.status.current_tick.saturating_add(1);
        if tick > self.status.max_ticks {
            self.status.mode = RunMode::Paused;
            return false;
        }
        self.status.current_tick = tick;
        let dt = self.config.tick_seconds;
        self.now += dt;

        for spec in self.modifiers.tick(self.now) {
            self.push_event(
                SimEventType::ModifierExpired,
                &spec.event_id,
                Some(json!({ "display_name": spec.display_name })),
            );
        }
        for spec in self.modifiers.evaluate_auto_triggers(self.now, self.now) {
            self.note_fired_event(&spec);
        }

        let decay_factor = self.modifiers.decay_factor();
        let expired = self
            .ledger
            .tick_decay(dt, &self.resource_types, decay_factor);
        for instance in expired {
            self.push_event(
                SimEventType::ResourceExpired,
                &instance.instance_id,
                Some(json!({ "resource_id": instance.resource_id })),
            );
        }

        let station_ids: Vec<String> = self.stations.keys().cloned().collect();
        for station_id in station_ids {
            let Some(mut station) = self.stations.remove(&station_id) else {
                continue;
            };
            let outcome = {
                let mut ctx = StationCtx {
                    ledger: &mut self.ledger,
                    goals: &mut self.goals,
                    loot_tables: &self.loot_tables,
                    sample: &mut self.sample,
                };
                station.tick(dt, &mut ctx)
            };
            self.apply_station_outcome(&station_id, station, outcome);
        }

        for resolution in self.goals.tick(dt, &mut self.score, &mut self.ledger) {
            if resolution.completed {
                self.push_event(
                    SimEventType::GoalCompleted,
                    &resolution.goal_id,
                    Some(json!({
                        "resource_id": resolution.resource_id,
                        "points": resolution.points,
                        "contributor": resolution.contributor,
                    })),
                );
            } else {
                self.push_event(
                    SimEventType::GoalFailed,
                    &resolution.goal_id,
                    Some(json!({
                        "resource_id": resolution.resource_id,
                        "penalty": resolution.points,
                    })),
                );
            }
        }

        if self.status.is_complete() {
            self.status.mode = RunMode::Paused;
        }
        true
    }

    /// Run until the tick budget is exhausted. Returns the ticks advanced.
    pub fn run_to_completion(&mut self) -> u64 {
        let mut advanced = 0;
        while self.step() {
            advanced += 1;
        }
        advanced
    }

    fn apply_station_outcome(
        &mut self,
        station_id: &str,
        station: StationEngine,
        outcome: TickOutcome,
    ) {
        for (event_type, details) in outcome.log {
            self.push_event(event_type, station_id, Some(details));
        }

        for config_id in outcome.spawn_station_configs {
            let spawned_id = self.next_station_id();
            match self.build_engine(&spawned_id, &config_id, Ownership::Unowned) {
                Ok(engine) => {
                    self.stations.insert(spawned_id.clone(), engine);
                    self.push_event(
                        SimEventType::StationProduced,
                        &spawned_id,
                        Some(json!({ "station_config": config_id, "spawned_by": station_id })),
                    );
                }
                Err(error) => self.push_event(
                    SimEventType::ConfigError,
                    station_id,
                    Some(json!({ "error": error.to_string() })),
                ),
            }
        }

        if outcome.upgrade_requested {
            self.apply_upgrade(station_id, station);
            return;
        }
        if station.pending_removal() {
            self.push_event(SimEventType::StationRemoved, station_id, None);
            return;
        }
        self.stations.insert(station_id.to_string(), station);
    }

    /// Swap the station for its upgrade target, carrying ownership over.
    /// A missing target is a logged config error and the station stays as
    /// it was.
    fn apply_upgrade(&mut self, station_id: &str, station: StationEngine) {
        let from_config = station.config().config_id.clone();
        let target = station.config().upgrade_config_id.clone();
        let owner = station.owner().clone();
        let Some(target_config_id) = target else {
            self.push_event(
                SimEventType::ConfigError,
                station_id,
                Some(json!({ "error": "upgrade without target config" })),
            );
            self.stations.insert(station_id.to_string(), station);
            return;
        };
        match self.build_engine(station_id, &target_config_id, owner) {
            Ok(upgraded) => {
                self.stations.insert(station_id.to_string(), upgraded);
                self.push_event(
                    SimEventType::StationUpgraded,
                    station_id,
                    Some(json!({ "from": from_config, "to": target_config_id })),
                );
            }
            Err(error) => {
                self.push_event(
                    SimEventType::ConfigError,
                    station_id,
                    Some(json!({ "error": error.to_string() })),
                );
                self.stations.insert(station_id.to_string(), station);
            }
        }
    }
}

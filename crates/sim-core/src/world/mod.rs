//! Composition root: one `SimWorld` owns the ledger, goal tracker, score
//! router, modifier ledger, and every station engine, and advances them in
//! a fixed, documented order each tick.

use std::collections::BTreeMap;
use std::fmt;

mod commands;
mod inspect;
mod step;

use contracts::{
    EventSpec, Ownership, PolicyConfig, Recipe, ResourceTypeDef, RunMode, ScenarioConfig,
    SimEvent, SimEventType, SimStatus, StationConfig, StationPlacement, SCHEMA_VERSION_V1,
};
use serde_json::{json, Value};

use crate::events::EventLedger;
use crate::goals::GoalTracker;
use crate::ledger::ResourceLedger;
use crate::loot::LootTable;
use crate::sample::{mix_seed, mix_state_hash, SampleStream};
use crate::score::ScoreRouter;
use crate::station::StationEngine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    UnknownResourceType(String),
    UnknownStationConfig(String),
    UnknownStation(String),
    UnknownInstance(String),
    UnknownEvent(String),
}

impl fmt::Display for WorldError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::UnknownResourceType(id) => write!(formatter, "unknown resource type {id}"),
            WorldError::UnknownStationConfig(id) => {
                write!(formatter, "unknown station config {id}")
            }
            WorldError::UnknownStation(id) => write!(formatter, "unknown station {id}"),
            WorldError::UnknownInstance(id) => write!(formatter, "unknown resource instance {id}"),
            WorldError::UnknownEvent(id) => write!(formatter, "unknown event {id}"),
        }
    }
}

impl std::error::Error for WorldError {}

/// How a take request resolved. Denials are plain outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TakeOutcome {
    Taken,
    TakenAsTheft,
    Denied,
}

#[derive(Debug)]
pub struct SimWorld {
    config: ScenarioConfig,
    status: SimStatus,
    /// Simulated seconds elapsed, `current_tick * tick_seconds`.
    now: f64,
    policy: PolicyConfig,
    resource_types: BTreeMap<String, ResourceTypeDef>,
    recipes: BTreeMap<String, Recipe>,
    loot_tables: BTreeMap<String, LootTable>,
    station_configs: BTreeMap<String, StationConfig>,
    stations: BTreeMap<String, StationEngine>,
    ledger: ResourceLedger,
    goals: GoalTracker,
    score: ScoreRouter,
    modifiers: EventLedger,
    event_log: Vec<SimEvent>,
    sample: SampleStream,
    state_hash: u64,
    next_station_sequence: u64,
}

impl SimWorld {
    pub fn new(config: ScenarioConfig) -> Self {
        let status = SimStatus {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            scenario_id: config.scenario_id.clone(),
            current_tick: 0,
            max_ticks: config.max_ticks,
            mode: RunMode::Paused,
        };

        let resource_types = config
            .resource_types
            .iter()
            .map(|def| (def.resource_id.clone(), def.clone()))
            .collect::<BTreeMap<_, _>>();
        let recipes = config
            .recipes
            .iter()
            .map(|recipe| (recipe.recipe_id.clone(), recipe.clone()))
            .collect::<BTreeMap<_, _>>();
        let loot_tables = config
            .loot_tables
            .iter()
            .map(|def| (def.table_id.clone(), LootTable::from_def(def)))
            .collect::<BTreeMap<_, _>>();
        let station_configs = config
            .station_configs
            .iter()
            .map(|station| (station.config_id.clone(), station.clone()))
            .collect::<BTreeMap<_, _>>();

        let mut ledger = ResourceLedger::new(config.initial_capital);
        let mut score = ScoreRouter::new(config.score_mode, config.score_aggregate);
        for player in &config.players {
            score.register_actor(&player.player_id, player.team_id);
            if player.starting_capital != 0 {
                ledger.adjust_actor_capital(&player.player_id, player.starting_capital);
            }
        }

        let goals = GoalTracker::from_templates(&config.goals);
        let modifiers = EventLedger::new(config.events.clone());
        let sample = SampleStream::new(mix_seed(config.seed, 0x5C3A_A01D));
        let state_hash = mix_seed(config.seed, 0x57A7_E4A5);

        let mut world = Self {
            status,
            now: 0.0,
            policy: config.policy.clone(),
            resource_types,
            recipes,
            loot_tables,
            station_configs,
            stations: BTreeMap::new(),
            ledger,
            goals,
            score,
            modifiers,
            event_log: Vec::new(),
            sample,
            state_hash,
            next_station_sequence: 0,
            config,
        };

        let placements = world.config.stations.clone();
        for placement in &placements {
            if let Err(error) = world.place_station(placement) {
                world.push_event(
                    SimEventType::ConfigError,
                    &placement.station_id,
                    Some(json!({ "error": error.to_string() })),
                );
            }
        }
        world
    }

    pub(super) fn push_event(
        &mut self,
        event_type: SimEventType,
        subject: &str,
        details: Option<Value>,
    ) {
        let event_id = format!("evt:{}:{}", self.status.current_tick, self.event_log.len());
        self.event_log.push(SimEvent {
            event_id,
            tick: self.status.current_tick,
            event_type,
            subject: subject.to_string(),
            details,
        });
        self.state_hash = mix_state_hash(
            self.state_hash,
            self.status.current_tick,
            self.event_log.len() as u64,
        );
    }

    fn place_station(&mut self, placement: &StationPlacement) -> Result<(), WorldError> {
        let engine =
            self.build_engine(&placement.station_id, &placement.config_id, placement.owner.clone())?;
        self.stations.insert(placement.station_id.clone(), engine);
        Ok(())
    }

    /// Instantiate a station engine from a config id, resolving its recipe.
    /// A dangling recipe reference is logged and falls back to the config's
    /// own input/output lists.
    fn build_engine(
        &mut self,
        station_id: &str,
        config_id: &str,
        owner: Ownership,
    ) -> Result<StationEngine, WorldError> {
        let config = self
            .station_configs
            .get(config_id)
            .cloned()
            .ok_or_else(|| WorldError::UnknownStationConfig(config_id.to_string()))?;
        let recipe = match &config.recipe_id {
            Some(recipe_id) => match self.recipes.get(recipe_id).cloned() {
                Some(recipe) => Some(recipe),
                None => {
                    self.push_event(
                        SimEventType::ConfigError,
                        station_id,
                        Some(json!({ "error": "unknown recipe", "recipe_id": recipe_id })),
                    );
                    None
                }
            },
            None => None,
        };
        Ok(StationEngine::new(
            station_id,
            config,
            owner,
            recipe.as_ref(),
            &mut self.sample,
        ))
    }

    fn next_station_id(&mut self) -> String {
        let station_id = format!("station:{:05}", self.next_station_sequence);
        self.next_station_sequence = self.next_station_sequence.saturating_add(1);
        station_id
    }
}

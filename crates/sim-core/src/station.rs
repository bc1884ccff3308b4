//! The per-station production/consumption state machine.
//!
//! Each engine owns one live station's mutable state and advances it one
//! tick at a time against the shared ledger and goal tracker. Structural
//! changes (upgrade swaps, linked-station spawns, removal after death)
//! are reported in the tick outcome and applied by the world.

use std::collections::BTreeMap;

use contracts::{
    InteractionTrigger, Ownership, ProductionSource, Recipe, SimEventType, StationConfig,
};
use serde_json::{json, Value};

use crate::goals::GoalTracker;
use crate::ledger::ResourceLedger;
use crate::loot::LootTable;
use crate::sample::SampleStream;

/// Shared state a station reads and mutates during its tick.
pub struct StationCtx<'a> {
    pub ledger: &'a mut ResourceLedger,
    pub goals: &'a mut GoalTracker,
    pub loot_tables: &'a BTreeMap<String, LootTable>,
    pub sample: &'a mut SampleStream,
}

/// What one station tick wants the world to log and apply.
#[derive(Debug, Default)]
pub struct TickOutcome {
    /// Log records about this station; the world stamps tick and subject.
    pub log: Vec<(SimEventType, Value)>,
    /// Station configs to instantiate as new stations.
    pub spawn_station_configs: Vec<String>,
    /// Swap this station for its upgrade target.
    pub upgrade_requested: bool,
}

#[derive(Debug, Clone)]
enum ProductionPlan {
    Resources(Vec<String>),
    LinkedStations(Vec<String>),
    Loot(String),
}

#[derive(Debug, Clone)]
pub struct StationEngine {
    station_id: String,
    config: StationConfig,
    owner: Ownership,
    /// One resource id per required input unit, recipe-expanded.
    required_inputs: Vec<String>,
    plan: ProductionPlan,
    work_duration: f64,

    is_alive: bool,
    pending_removal: bool,
    decay_value: u32,
    decay_timer: f64,
    work_progress: f64,
    work_completed: bool,
    resources_consumed: bool,
    workers: Vec<String>,
    /// Most recent laborer; capital for worked cycles routes here.
    active_worker: Option<String>,
    production_timer: f64,
    age: u32,
    age_timer: f64,
    /// -1 idle; armed at 2 by an upgrade-flagged consumption, counts down
    /// one per tick and fires the swap at 0.
    flagged_to_upgrade: i32,
    /// Deposited resource instance ids awaiting consumption.
    input_buffer: Vec<String>,
}

impl StationEngine {
    /// `recipe` must already be resolved from `config.recipe_id`; when
    /// present it overrides the consume list, resource outputs, and work
    /// duration.
    pub fn new(
        station_id: &str,
        config: StationConfig,
        owner: Ownership,
        recipe: Option<&Recipe>,
        sample: &mut SampleStream,
    ) -> Self {
        let required_inputs = match recipe {
            Some(recipe) => recipe.inputs_expanded(),
            None => config.consumes.clone(),
        };
        let plan = match &config.production {
            ProductionSource::Resources { types } => match recipe {
                Some(recipe) if !recipe.outputs.is_empty() => {
                    ProductionPlan::Resources(recipe.outputs_expanded())
                }
                _ => ProductionPlan::Resources(types.clone()),
            },
            ProductionSource::LinkedStations { config_ids } => {
                ProductionPlan::LinkedStations(config_ids.clone())
            }
            ProductionSource::LootTable { table_id } => ProductionPlan::Loot(table_id.clone()),
        };
        let work_duration = match recipe.and_then(|recipe| recipe.work_duration_override) {
            Some(duration) if duration > 0.0 => duration,
            _ => config.work_duration,
        };

        let (age, age_timer) = if config.random_start_age {
            let age = sample.next_range_i64(0, i64::from(config.max_age).max(1) - 1) as u32;
            let age_timer = sample.next_unit() * config.growth_rate_seconds;
            (age, age_timer)
        } else {
            (0, 0.0)
        };

        Self {
            station_id: station_id.to_string(),
            config,
            owner,
            required_inputs,
            plan,
            work_duration,
            is_alive: true,
            pending_removal: false,
            decay_value: 0,
            decay_timer: 0.0,
            work_progress: 0.0,
            work_completed: false,
            resources_consumed: false,
            workers: Vec::new(),
            active_worker: None,
            production_timer: 0.0,
            age,
            age_timer,
            flagged_to_upgrade: -1,
            input_buffer: Vec::new(),
        }
    }

    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    pub fn owner(&self) -> &Ownership {
        &self.owner
    }

    pub fn is_alive(&self) -> bool {
        self.is_alive
    }

    pub fn pending_removal(&self) -> bool {
        self.pending_removal
    }

    pub fn decay_value(&self) -> u32 {
        self.decay_value
    }

    pub fn work_progress_fraction(&self) -> f64 {
        if self.work_duration <= 0.0 {
            return 0.0;
        }
        self.work_progress / self.work_duration
    }

    pub fn workers(&self) -> &[String] {
        &self.workers
    }

    pub fn required_inputs(&self) -> &[String] {
        &self.required_inputs
    }

    pub fn input_buffer(&self) -> &[String] {
        &self.input_buffer
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    /// Index into an age-indexed visual list of the given length.
    pub fn age_sprite_index(&self, sprite_count: usize) -> Option<usize> {
        if sprite_count == 0 {
            return None;
        }
        Some((self.age as usize).min(sprite_count - 1))
    }

    pub fn register_worker(&mut self, actor_id: &str) {
        if !self.workers.iter().any(|worker| worker == actor_id) {
            self.workers.push(actor_id.to_string());
        }
        self.active_worker = Some(actor_id.to_string());
    }

    /// A worker leaving resets progress only when the set empties; the
    /// remaining cooperators keep their partial cycle.
    pub fn unregister_worker(&mut self, actor_id: &str) {
        self.workers.retain(|worker| worker != actor_id);
        if self.workers.is_empty() {
            self.work_progress = 0.0;
            self.active_worker = None;
        } else if self.active_worker.as_deref() == Some(actor_id) {
            self.active_worker = self.workers.last().cloned();
        }
    }

    /// Stage a live instance in this station's input area.
    pub fn deposit_input(&mut self, instance_id: &str) {
        if !self.input_buffer.iter().any(|id| id == instance_id) {
            self.input_buffer.push(instance_id.to_string());
        }
    }

    fn uses_labor(&self) -> bool {
        self.config.production_trigger == InteractionTrigger::WhenWorked
            || self.config.consumption_trigger == InteractionTrigger::WhenWorked
    }

    pub fn tick(&mut self, dt: f64, ctx: &mut StationCtx<'_>) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if !self.is_alive {
            return outcome;
        }

        if self.uses_labor() && !self.workers.is_empty() {
            self.work_progress += dt * self.workers.len() as f64;
            if self.work_progress >= self.work_duration {
                self.work_completed = true;
                self.work_progress = 0.0;
                outcome.log.push((
                    SimEventType::WorkCycleCompleted,
                    json!({ "workers": self.workers.len() }),
                ));
            }
        }

        // Consumption resolves before any production that depends on it.
        if self.config.consume_resource {
            self.tick_consumption(dt, ctx, &mut outcome);
        }
        if self.config.produce_resource && self.is_alive {
            self.tick_production(dt, ctx, &mut outcome);
        }

        if self.config.can_grow {
            self.age_timer += dt;
            if self.age_timer >= self.config.growth_rate_seconds {
                self.age += 1;
                self.age_timer = 0.0;
            }
        }

        if self.flagged_to_upgrade > -1 {
            self.flagged_to_upgrade -= 1;
        }
        if self.flagged_to_upgrade == 0 {
            outcome.upgrade_requested = true;
        }

        self.work_completed = false;
        outcome
    }

    fn tick_consumption(&mut self, dt: f64, ctx: &mut StationCtx<'_>, outcome: &mut TickOutcome) {
        match self.config.consumption_trigger {
            // Unconditional every tick. Automatic production stays
            // interval-gated; the asymmetry is observed source behavior.
            InteractionTrigger::Automatic => {
                if self.try_consume(ctx, outcome) {
                    self.consume_capital(self.owner.actor().map(str::to_string), ctx, outcome);
                }
            }
            InteractionTrigger::WhenWorked => {
                if self.work_completed && self.try_consume(ctx, outcome) {
                    self.consume_capital(self.active_worker.clone(), ctx, outcome);
                }
            }
            InteractionTrigger::Cycle => {
                self.decay_timer += dt;
                if self.decay_timer >= self.config.decay_cycle_seconds {
                    if self.try_consume(ctx, outcome) {
                        self.consume_capital(self.active_worker.clone(), ctx, outcome);
                        self.decay_value = 0;
                    } else {
                        self.decay_value += 1;
                        if self.decay_value >= self.config.max_decay {
                            self.die(outcome);
                        }
                    }
                    self.decay_timer = 0.0;
                }
            }
            InteractionTrigger::None | InteractionTrigger::WhenResourcesConsumed => {}
        }
    }

    fn tick_production(&mut self, dt: f64, ctx: &mut StationCtx<'_>, outcome: &mut TickOutcome) {
        match self.config.production_trigger {
            InteractionTrigger::Automatic => {
                self.production_timer += dt;
                if self.production_timer >= self.config.production_interval {
                    self.produce(ctx, self.owner.actor().map(str::to_string), outcome);
                    self.production_timer = 0.0;
                }
            }
            InteractionTrigger::WhenWorked => {
                if self.work_completed {
                    self.produce(ctx, self.active_worker.clone(), outcome);
                }
            }
            InteractionTrigger::WhenResourcesConsumed => {
                if self.resources_consumed {
                    self.produce(ctx, self.active_worker.clone(), outcome);
                    self.resources_consumed = false;
                }
            }
            InteractionTrigger::None | InteractionTrigger::Cycle => {}
        }
    }

    /// Attempt to satisfy and remove all input requirements from the
    /// staged instances. A station without an input area (or without
    /// requirements) never succeeds; that is silent, not an error.
    fn try_consume(&mut self, ctx: &mut StationCtx<'_>, outcome: &mut TickOutcome) -> bool {
        if !self.config.use_input_area || self.required_inputs.is_empty() {
            return false;
        }

        let Some(consumed) = ctx
            .ledger
            .take_matching(&self.required_inputs, &mut self.input_buffer)
        else {
            return false;
        };
        self.resources_consumed = true;
        outcome.log.push((
            SimEventType::StationConsumed,
            json!({ "consumed": consumed.len(), "inputs": self.required_inputs }),
        ));

        if self.config.contributes_goals_consumption {
            if let Some(first) = self.required_inputs.first() {
                if let Some(goal_id) = ctx.goals.contribute(first, None) {
                    outcome.log.push((
                        SimEventType::GoalContribution,
                        json!({ "goal_id": goal_id, "resource_id": first }),
                    ));
                }
            }
        }
        if self.config.can_be_upgraded {
            self.flagged_to_upgrade = 2;
        }
        true
    }

    fn produce(
        &mut self,
        ctx: &mut StationCtx<'_>,
        capital_target: Option<String>,
        outcome: &mut TickOutcome,
    ) {
        let plan = self.plan.clone();
        match plan {
            ProductionPlan::Resources(outputs) => {
                for resource_id in &outputs {
                    let instance_id = ctx.ledger.add_instance(resource_id, self.produced_owner());
                    outcome.log.push((
                        SimEventType::StationProduced,
                        json!({ "resource_id": resource_id, "instance_id": instance_id }),
                    ));
                    if self.config.contributes_goals_production {
                        // Multi-output stations only credit their first
                        // listed output toward goals.
                        if let Some(first) = outputs.first() {
                            if let Some(goal_id) = ctx.goals.contribute(first, None) {
                                outcome.log.push((
                                    SimEventType::GoalContribution,
                                    json!({ "goal_id": goal_id, "resource_id": first }),
                                ));
                            }
                        }
                    }
                }
                if self.config.is_single_use {
                    self.die(outcome);
                }
            }
            ProductionPlan::LinkedStations(config_ids) => {
                outcome.spawn_station_configs.extend(config_ids);
            }
            ProductionPlan::Loot(table_id) => match ctx.loot_tables.get(&table_id) {
                None => outcome.log.push((
                    SimEventType::ConfigError,
                    json!({ "error": "unknown loot table", "table_id": table_id }),
                )),
                Some(table) if table.is_empty() => outcome.log.push((
                    SimEventType::ConfigError,
                    json!({ "error": "loot table has no entries", "table_id": table_id }),
                )),
                Some(table) => {
                    let roll = ctx.sample.next_percent();
                    if let Some(resource_id) = table.draw(roll) {
                        let resource_id = resource_id.to_string();
                        let instance_id =
                            ctx.ledger.add_instance(&resource_id, self.produced_owner());
                        outcome.log.push((
                            SimEventType::StationProduced,
                            json!({ "resource_id": resource_id, "instance_id": instance_id }),
                        ));
                    }
                    if self.config.is_single_use {
                        self.die(outcome);
                    }
                }
            },
        }
        self.produce_capital(capital_target, ctx, outcome);
    }

    /// Output owner: station owner when there is no output area, unowned
    /// when instances land in a shared output area.
    fn produced_owner(&self) -> Ownership {
        if self.config.use_output_area {
            Ownership::Unowned
        } else {
            self.owner.clone()
        }
    }

    fn consume_capital(
        &mut self,
        target: Option<String>,
        ctx: &mut StationCtx<'_>,
        outcome: &mut TickOutcome,
    ) {
        if !self.config.capital_input {
            return;
        }
        let amount = self.config.capital_input_amount;
        if let Some(actor) = &target {
            ctx.ledger.adjust_actor_capital(actor, -amount);
        }
        ctx.ledger.adjust_global_capital(-amount);
        outcome.log.push((
            SimEventType::CapitalTransferred,
            json!({ "direction": "input", "amount": amount, "actor": target }),
        ));
    }

    fn produce_capital(
        &mut self,
        target: Option<String>,
        ctx: &mut StationCtx<'_>,
        outcome: &mut TickOutcome,
    ) {
        if !self.config.capital_output {
            return;
        }
        let amount = self.config.capital_output_amount;
        if let Some(actor) = &target {
            ctx.ledger.adjust_actor_capital(actor, amount);
        }
        ctx.ledger.adjust_global_capital(amount);
        outcome.log.push((
            SimEventType::CapitalTransferred,
            json!({ "direction": "output", "amount": amount, "actor": target }),
        ));
    }

    /// Terminal: fires at most once per station.
    fn die(&mut self, outcome: &mut TickOutcome) {
        if !self.is_alive {
            return;
        }
        self.is_alive = false;
        outcome.log.push((
            SimEventType::StationDied,
            json!({ "decay_value": self.decay_value, "age": self.age }),
        ));
        if self.config.destroy_after_single_use {
            self.pending_removal = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::RecipeSlot;

    fn ctx_parts() -> (ResourceLedger, GoalTracker, BTreeMap<String, LootTable>, SampleStream) {
        (
            ResourceLedger::default(),
            GoalTracker::default(),
            BTreeMap::new(),
            SampleStream::new(99),
        )
    }

    fn worked_producer(outputs: &[&str]) -> StationConfig {
        StationConfig {
            config_id: "mill".to_string(),
            produce_resource: true,
            production: ProductionSource::Resources {
                types: outputs.iter().map(|s| s.to_string()).collect(),
            },
            production_trigger: InteractionTrigger::WhenWorked,
            work_duration: 4.0,
            use_output_area: true,
            ..StationConfig::default()
        }
    }

    #[test]
    fn cooperating_workers_accelerate_the_cycle() {
        let (mut ledger, mut goals, loot, mut sample) = ctx_parts();
        let mut station = StationEngine::new(
            "station:mill",
            worked_producer(&["flour"]),
            Ownership::Unowned,
            None,
            &mut sample,
        );
        station.register_worker("player:a");
        station.register_worker("player:b");

        let mut ctx = StationCtx {
            ledger: &mut ledger,
            goals: &mut goals,
            loot_tables: &loot,
            sample: &mut sample,
        };
        station.tick(1.0, &mut ctx);
        assert!((station.work_progress_fraction() - 0.5).abs() < 1e-9);
        station.tick(1.0, &mut ctx);
        assert_eq!(ledger.count_by_type("flour", None, &Default::default()), 1);
        assert_eq!(station.work_progress_fraction(), 0.0);
    }

    #[test]
    fn departing_worker_resets_progress_only_when_station_empties() {
        let (mut ledger, mut goals, loot, mut sample) = ctx_parts();
        let mut station = StationEngine::new(
            "station:mill",
            worked_producer(&["flour"]),
            Ownership::Unowned,
            None,
            &mut sample,
        );
        station.register_worker("player:a");
        station.register_worker("player:b");
        let mut ctx = StationCtx {
            ledger: &mut ledger,
            goals: &mut goals,
            loot_tables: &loot,
            sample: &mut sample,
        };
        station.tick(1.0, &mut ctx);

        station.unregister_worker("player:b");
        assert!(station.work_progress_fraction() > 0.0);
        station.unregister_worker("player:a");
        assert_eq!(station.work_progress_fraction(), 0.0);
    }

    #[test]
    fn consumed_production_fires_in_the_same_tick() {
        let (mut ledger, mut goals, loot, mut sample) = ctx_parts();
        let config = StationConfig {
            config_id: "sawmill".to_string(),
            consume_resource: true,
            produce_resource: true,
            consumes: vec!["wood".to_string()],
            production: ProductionSource::Resources {
                types: vec!["plank".to_string(), "plank".to_string()],
            },
            consumption_trigger: InteractionTrigger::Automatic,
            production_trigger: InteractionTrigger::WhenResourcesConsumed,
            ..StationConfig::default()
        };
        let mut station =
            StationEngine::new("station:saw", config, Ownership::Unowned, None, &mut sample);

        let wood = ledger.add_instance("wood", Ownership::Unowned);
        station.deposit_input(&wood);
        let mut ctx = StationCtx {
            ledger: &mut ledger,
            goals: &mut goals,
            loot_tables: &loot,
            sample: &mut sample,
        };
        station.tick(1.0, &mut ctx);

        let policy = Default::default();
        assert_eq!(ledger.count_by_type("wood", None, &policy), 0);
        assert_eq!(ledger.count_by_type("plank", None, &policy), 2);
    }

    #[test]
    fn automatic_production_is_interval_gated() {
        let (mut ledger, mut goals, loot, mut sample) = ctx_parts();
        let config = StationConfig {
            config_id: "spring".to_string(),
            produce_resource: true,
            production: ProductionSource::Resources {
                types: vec!["water".to_string()],
            },
            production_trigger: InteractionTrigger::Automatic,
            production_interval: 3.0,
            ..StationConfig::default()
        };
        let mut station =
            StationEngine::new("station:spring", config, Ownership::Unowned, None, &mut sample);
        let mut ctx = StationCtx {
            ledger: &mut ledger,
            goals: &mut goals,
            loot_tables: &loot,
            sample: &mut sample,
        };
        station.tick(1.0, &mut ctx);
        station.tick(1.0, &mut ctx);
        assert_eq!(ctx.ledger.len(), 0);
        station.tick(1.0, &mut ctx);
        assert_eq!(ctx.ledger.len(), 1);
    }

    #[test]
    fn cycle_station_dies_exactly_at_max_decay() {
        let (mut ledger, mut goals, loot, mut sample) = ctx_parts();
        let config = StationConfig {
            config_id: "furnace".to_string(),
            consume_resource: true,
            consumes: vec!["coal".to_string()],
            consumption_trigger: InteractionTrigger::Cycle,
            decay_cycle_seconds: 1.0,
            max_decay: 3,
            ..StationConfig::default()
        };
        let mut station =
            StationEngine::new("station:furnace", config, Ownership::Unowned, None, &mut sample);
        let mut ctx = StationCtx {
            ledger: &mut ledger,
            goals: &mut goals,
            loot_tables: &loot,
            sample: &mut sample,
        };

        station.tick(1.0, &mut ctx);
        station.tick(1.0, &mut ctx);
        assert_eq!(station.decay_value(), 2);
        assert!(station.is_alive());
        station.tick(1.0, &mut ctx);
        assert_eq!(station.decay_value(), 3);
        assert!(!station.is_alive());
    }

    #[test]
    fn successful_cycle_consumption_resets_decay() {
        let (mut ledger, mut goals, loot, mut sample) = ctx_parts();
        let config = StationConfig {
            config_id: "furnace".to_string(),
            consume_resource: true,
            consumes: vec!["coal".to_string()],
            consumption_trigger: InteractionTrigger::Cycle,
            decay_cycle_seconds: 1.0,
            max_decay: 3,
            ..StationConfig::default()
        };
        let mut station =
            StationEngine::new("station:furnace", config, Ownership::Unowned, None, &mut sample);
        let mut ctx = StationCtx {
            ledger: &mut ledger,
            goals: &mut goals,
            loot_tables: &loot,
            sample: &mut sample,
        };
        station.tick(1.0, &mut ctx);
        station.tick(1.0, &mut ctx);
        assert_eq!(station.decay_value(), 2);

        let coal = ctx.ledger.add_instance("coal", Ownership::Unowned);
        station.deposit_input(&coal);
        station.tick(1.0, &mut ctx);
        assert_eq!(station.decay_value(), 0);
        assert!(station.is_alive());
    }

    #[test]
    fn single_use_station_dies_after_one_production() {
        let (mut ledger, mut goals, loot, mut sample) = ctx_parts();
        let mut config = worked_producer(&["gift"]);
        config.is_single_use = true;
        config.destroy_after_single_use = true;
        config.production_trigger = InteractionTrigger::Automatic;
        config.production_interval = 1.0;
        let mut station =
            StationEngine::new("station:crate", config, Ownership::Unowned, None, &mut sample);
        let mut ctx = StationCtx {
            ledger: &mut ledger,
            goals: &mut goals,
            loot_tables: &loot,
            sample: &mut sample,
        };
        station.tick(1.0, &mut ctx);
        assert!(!station.is_alive());
        assert!(station.pending_removal());
        station.tick(1.0, &mut ctx);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn capital_exchange_has_no_balance_gate() {
        let (mut ledger, mut goals, loot, mut sample) = ctx_parts();
        ledger.global_capital = 5;
        let config = StationConfig {
            config_id: "press".to_string(),
            consume_resource: true,
            consumes: vec!["ore".to_string()],
            consumption_trigger: InteractionTrigger::Automatic,
            capital_input: true,
            capital_input_amount: 10,
            ..StationConfig::default()
        };
        let mut station =
            StationEngine::new("station:press", config, Ownership::Unowned, None, &mut sample);
        let ore = ledger.add_instance("ore", Ownership::Unowned);
        station.deposit_input(&ore);
        let mut ctx = StationCtx {
            ledger: &mut ledger,
            goals: &mut goals,
            loot_tables: &loot,
            sample: &mut sample,
        };
        station.tick(1.0, &mut ctx);
        assert_eq!(ledger.global_capital, -5);
    }

    #[test]
    fn recipe_overrides_inputs_outputs_and_duration() {
        let (mut ledger, mut goals, loot, mut sample) = ctx_parts();
        let recipe = Recipe {
            recipe_id: "recipe:bread".to_string(),
            display_name: "Bread".to_string(),
            work_duration_override: Some(2.0),
            inputs: vec![RecipeSlot {
                resource_id: "flour".to_string(),
                amount: 2,
            }],
            outputs: vec![RecipeSlot {
                resource_id: "bread".to_string(),
                amount: 1,
            }],
        };
        let config = StationConfig {
            config_id: "oven".to_string(),
            consume_resource: true,
            produce_resource: true,
            recipe_id: Some("recipe:bread".to_string()),
            consumption_trigger: InteractionTrigger::WhenWorked,
            production_trigger: InteractionTrigger::WhenResourcesConsumed,
            work_duration: 10.0,
            ..StationConfig::default()
        };
        let mut station = StationEngine::new(
            "station:oven",
            config,
            Ownership::Unowned,
            Some(&recipe),
            &mut sample,
        );
        assert_eq!(station.required_inputs(), ["flour", "flour"]);

        for _ in 0..2 {
            let flour = ledger.add_instance("flour", Ownership::Unowned);
            station.deposit_input(&flour);
        }
        station.register_worker("player:a");
        let mut ctx = StationCtx {
            ledger: &mut ledger,
            goals: &mut goals,
            loot_tables: &loot,
            sample: &mut sample,
        };
        // override duration of 2s, one worker
        station.tick(1.0, &mut ctx);
        station.tick(1.0, &mut ctx);
        let policy = Default::default();
        assert_eq!(ledger.count_by_type("bread", None, &policy), 1);
        assert_eq!(ledger.count_by_type("flour", None, &policy), 0);
    }

    #[test]
    fn missing_input_area_never_consumes() {
        let (mut ledger, mut goals, loot, mut sample) = ctx_parts();
        let config = StationConfig {
            config_id: "void".to_string(),
            consume_resource: true,
            consumes: vec!["wood".to_string()],
            consumption_trigger: InteractionTrigger::Automatic,
            use_input_area: false,
            ..StationConfig::default()
        };
        let mut station =
            StationEngine::new("station:void", config, Ownership::Unowned, None, &mut sample);
        let wood = ledger.add_instance("wood", Ownership::Unowned);
        station.deposit_input(&wood);
        let mut ctx = StationCtx {
            ledger: &mut ledger,
            goals: &mut goals,
            loot_tables: &loot,
            sample: &mut sample,
        };
        station.tick(1.0, &mut ctx);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn production_without_output_area_assigns_station_owner() {
        let (mut ledger, mut goals, loot, mut sample) = ctx_parts();
        let mut config = worked_producer(&["flour"]);
        config.use_output_area = false;
        config.production_trigger = InteractionTrigger::Automatic;
        config.production_interval = 1.0;
        let mut station = StationEngine::new(
            "station:mill",
            config,
            Ownership::owned("player:a"),
            None,
            &mut sample,
        );
        let mut ctx = StationCtx {
            ledger: &mut ledger,
            goals: &mut goals,
            loot_tables: &loot,
            sample: &mut sample,
        };
        station.tick(1.0, &mut ctx);
        let instance = ledger.instances().next().unwrap();
        assert_eq!(instance.owner, Ownership::owned("player:a"));
    }

    #[test]
    fn empty_loot_table_logs_error_and_yields_nothing() {
        let (mut ledger, mut goals, mut loot, mut sample) = ctx_parts();
        loot.insert(
            "table:empty".to_string(),
            LootTable::from_def(&contracts::LootTableDef {
                table_id: "table:empty".to_string(),
                entries: Vec::new(),
            }),
        );
        let config = StationConfig {
            config_id: "chest".to_string(),
            produce_resource: true,
            production: ProductionSource::LootTable {
                table_id: "table:empty".to_string(),
            },
            production_trigger: InteractionTrigger::Automatic,
            production_interval: 1.0,
            ..StationConfig::default()
        };
        let mut station =
            StationEngine::new("station:chest", config, Ownership::Unowned, None, &mut sample);
        let mut ctx = StationCtx {
            ledger: &mut ledger,
            goals: &mut goals,
            loot_tables: &loot,
            sample: &mut sample,
        };
        let outcome = station.tick(1.0, &mut ctx);
        assert!(outcome
            .log
            .iter()
            .any(|(event_type, _)| *event_type == SimEventType::ConfigError));
        assert_eq!(ledger.len(), 0);
        assert!(station.is_alive());
    }

    #[test]
    fn upgrade_arms_on_consumption_and_fires_two_ticks_later() {
        let (mut ledger, mut goals, loot, mut sample) = ctx_parts();
        let config = StationConfig {
            config_id: "hut".to_string(),
            consume_resource: true,
            consumes: vec!["brick".to_string()],
            consumption_trigger: InteractionTrigger::Automatic,
            can_be_upgraded: true,
            upgrade_config_id: Some("house".to_string()),
            ..StationConfig::default()
        };
        let mut station =
            StationEngine::new("station:hut", config, Ownership::Unowned, None, &mut sample);
        let brick = ledger.add_instance("brick", Ownership::Unowned);
        station.deposit_input(&brick);
        let mut ctx = StationCtx {
            ledger: &mut ledger,
            goals: &mut goals,
            loot_tables: &loot,
            sample: &mut sample,
        };
        let first = station.tick(1.0, &mut ctx);
        assert!(!first.upgrade_requested);
        let second = station.tick(1.0, &mut ctx);
        assert!(second.upgrade_requested);
    }

    #[test]
    fn aging_counts_and_indexes_sprites() {
        let (mut ledger, mut goals, loot, mut sample) = ctx_parts();
        let config = StationConfig {
            config_id: "tree".to_string(),
            can_grow: true,
            growth_rate_seconds: 2.0,
            ..StationConfig::default()
        };
        let mut station =
            StationEngine::new("station:tree", config, Ownership::Unowned, None, &mut sample);
        let mut ctx = StationCtx {
            ledger: &mut ledger,
            goals: &mut goals,
            loot_tables: &loot,
            sample: &mut sample,
        };
        for _ in 0..5 {
            station.tick(1.0, &mut ctx);
        }
        assert_eq!(station.age(), 2);
        assert_eq!(station.age_sprite_index(2), Some(1));
        assert_eq!(station.age_sprite_index(0), None);
    }
}

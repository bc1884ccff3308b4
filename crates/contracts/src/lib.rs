//! Cross-boundary data contracts for the stationworks economy simulation:
//! scenario configuration, policy, station/goal/event templates, and the
//! structured event log records emitted by the core.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SCHEMA_VERSION_V1: &str = "1.0";

/// Maximum number of score slots a front end is expected to display.
pub const MAX_SCORE_DISPLAY_COUNT: usize = 4;

// ---------------------------------------------------------------------------
// Ownership
// ---------------------------------------------------------------------------

/// Explicit ownership tag for resource instances and stations. `Unowned`
/// means common property; counting and take-permission semantics for it
/// depend on the active policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ownership {
    #[default]
    Unowned,
    OwnedBy {
        actor_id: String,
    },
}

impl Ownership {
    pub fn owned(actor_id: impl Into<String>) -> Self {
        Ownership::OwnedBy {
            actor_id: actor_id.into(),
        }
    }

    pub fn actor(&self) -> Option<&str> {
        match self {
            Ownership::Unowned => None,
            Ownership::OwnedBy { actor_id } => Some(actor_id),
        }
    }

    pub fn is_unowned(&self) -> bool {
        matches!(self, Ownership::Unowned)
    }
}

// ---------------------------------------------------------------------------
// Resources and recipes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceBehavior {
    /// Never decays.
    Static,
    /// Destroyed once its age exceeds the lifespan.
    Decays { lifespan_seconds: f64 },
    /// Used up when consumed by a station.
    Consumable,
}

impl Default for ResourceBehavior {
    fn default() -> Self {
        ResourceBehavior::Static
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceTypeDef {
    pub resource_id: String,
    pub display_name: String,
    /// Opaque asset handle for front ends; the core never reads it.
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub behavior: ResourceBehavior,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipeSlot {
    pub resource_id: String,
    pub amount: u32,
}

/// One alternative production method a station may select: ordered inputs
/// and outputs. Slot amounts below 1 are treated as 1.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipe {
    pub recipe_id: String,
    #[serde(default)]
    pub display_name: String,
    /// 0 or absent = use the station's own work duration.
    #[serde(default)]
    pub work_duration_override: Option<f64>,
    #[serde(default)]
    pub inputs: Vec<RecipeSlot>,
    #[serde(default)]
    pub outputs: Vec<RecipeSlot>,
}

impl Recipe {
    /// Inputs flattened to one resource id per required unit.
    pub fn inputs_expanded(&self) -> Vec<String> {
        expand_slots(&self.inputs)
    }

    /// Outputs flattened to one resource id per produced unit.
    pub fn outputs_expanded(&self) -> Vec<String> {
        expand_slots(&self.outputs)
    }
}

fn expand_slots(slots: &[RecipeSlot]) -> Vec<String> {
    let mut expanded = Vec::new();
    for slot in slots {
        for _ in 0..slot.amount.max(1) {
            expanded.push(slot.resource_id.clone());
        }
    }
    expanded
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LootEntryDef {
    pub resource_id: String,
    pub drop_percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LootTableDef {
    pub table_id: String,
    #[serde(default)]
    pub entries: Vec<LootEntryDef>,
}

// ---------------------------------------------------------------------------
// Stations
// ---------------------------------------------------------------------------

/// How a production or consumption direction is triggered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InteractionTrigger {
    #[default]
    None,
    Automatic,
    WhenWorked,
    WhenResourcesConsumed,
    /// Consumption only: attempt on a fixed cycle, decaying toward death
    /// when requirements are unmet.
    Cycle,
}

/// What a station emits on a successful production.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProductionSource {
    /// One new instance of each listed type per cycle.
    Resources { types: Vec<String> },
    /// Spawn child stations from the listed configs.
    LinkedStations { config_ids: Vec<String> },
    /// One weighted random draw from the referenced loot table.
    LootTable { table_id: String },
}

impl Default for ProductionSource {
    fn default() -> Self {
        ProductionSource::Resources { types: Vec::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StationConfig {
    pub config_id: String,
    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub consume_resource: bool,
    #[serde(default)]
    pub produce_resource: bool,
    /// Required input types, one entry per unit. Ignored when `recipe_id`
    /// is set.
    #[serde(default)]
    pub consumes: Vec<String>,
    #[serde(default)]
    pub production: ProductionSource,
    /// Optional recipe overriding `consumes`/`production` inputs+outputs.
    #[serde(default)]
    pub recipe_id: Option<String>,

    #[serde(default)]
    pub capital_input: bool,
    #[serde(default)]
    pub capital_output: bool,
    #[serde(default)]
    pub capital_input_amount: i64,
    #[serde(default)]
    pub capital_output_amount: i64,

    #[serde(default = "default_true")]
    pub use_input_area: bool,
    #[serde(default = "default_true")]
    pub use_output_area: bool,

    #[serde(default)]
    pub production_trigger: InteractionTrigger,
    #[serde(default)]
    pub consumption_trigger: InteractionTrigger,
    #[serde(default = "default_work_duration")]
    pub work_duration: f64,
    #[serde(default = "default_work_duration")]
    pub production_interval: f64,

    #[serde(default = "default_max_decay")]
    pub max_decay: u32,
    #[serde(default = "default_decay_cycle")]
    pub decay_cycle_seconds: f64,

    #[serde(default)]
    pub is_single_use: bool,
    #[serde(default)]
    pub destroy_after_single_use: bool,

    #[serde(default)]
    pub can_be_upgraded: bool,
    /// Station config the engine swaps to after an upgrade-arming
    /// consumption. Missing target is a logged config error, not fatal.
    #[serde(default)]
    pub upgrade_config_id: Option<String>,

    #[serde(default)]
    pub contributes_goals_production: bool,
    #[serde(default)]
    pub contributes_goals_consumption: bool,

    #[serde(default)]
    pub can_grow: bool,
    #[serde(default = "default_growth_rate")]
    pub growth_rate_seconds: f64,
    #[serde(default = "default_max_age")]
    pub max_age: u32,
    #[serde(default)]
    pub random_start_age: bool,
}

fn default_true() -> bool {
    true
}

fn default_work_duration() -> f64 {
    5.0
}

fn default_max_decay() -> u32 {
    5
}

fn default_decay_cycle() -> f64 {
    10.0
}

fn default_growth_rate() -> f64 {
    1.0
}

fn default_max_age() -> u32 {
    100
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            config_id: String::new(),
            display_name: String::new(),
            consume_resource: false,
            produce_resource: false,
            consumes: Vec::new(),
            production: ProductionSource::default(),
            recipe_id: None,
            capital_input: false,
            capital_output: false,
            capital_input_amount: 0,
            capital_output_amount: 0,
            use_input_area: true,
            use_output_area: true,
            production_trigger: InteractionTrigger::None,
            consumption_trigger: InteractionTrigger::None,
            work_duration: default_work_duration(),
            production_interval: default_work_duration(),
            max_decay: default_max_decay(),
            decay_cycle_seconds: default_decay_cycle(),
            is_single_use: false,
            destroy_after_single_use: false,
            can_be_upgraded: false,
            upgrade_config_id: None,
            contributes_goals_production: false,
            contributes_goals_consumption: false,
            can_grow: false,
            growth_rate_seconds: default_growth_rate(),
            max_age: default_max_age(),
            random_start_age: false,
        }
    }
}

/// One live station placed at scenario start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StationPlacement {
    pub station_id: String,
    pub config_id: String,
    #[serde(default)]
    pub owner: Ownership,
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipModel {
    /// No private ownership; everything is shared.
    Communal,
    PrivateIndividual,
    PrivateTeam,
    /// Some resources communal, some private.
    Hybrid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StealingPolicy {
    Allowed,
    Disallowed,
    /// Taking succeeds but should trigger a penalty hook.
    Penalized,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoalAttribution {
    ResourceOwner,
    Deliverer,
    StationOwner,
    /// Credit split between owner and deliverer by `attribution_owner_share`.
    Split,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StationUsePolicy {
    OwnerOnly,
    SameTeam,
    Anyone,
    /// Fee enforcement is game logic; the policy only signals intent.
    AnyoneWithFee,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResourceVisibility {
    Public,
    Private,
}

/// The active ruleset governing ownership, stealing, attribution, and
/// station access. Swappable wholesale at runtime; changes take effect on
/// the next query with no migration of existing ownership.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyConfig {
    pub ownership_model: OwnershipModel,
    pub stealing_policy: StealingPolicy,
    pub goal_attribution: GoalAttribution,
    /// Owner's share of credit when `goal_attribution` is `Split` (0..1).
    pub attribution_owner_share: f64,
    pub station_use_policy: StationUsePolicy,
    pub sharing_allowed: bool,
    pub resource_visibility: ResourceVisibility,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            ownership_model: OwnershipModel::PrivateIndividual,
            stealing_policy: StealingPolicy::Disallowed,
            goal_attribution: GoalAttribution::ResourceOwner,
            attribution_owner_share: 0.7,
            station_use_policy: StationUsePolicy::Anyone,
            sharing_allowed: true,
            resource_visibility: ResourceVisibility::Public,
        }
    }
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

/// Immutable goal template; the tracker instantiates a mutable runtime
/// state from it at level start or on demand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalTemplate {
    pub goal_id: String,
    pub resource_id: String,
    pub required_count: u32,
    pub time_limit_seconds: f64,
    pub reward_points: i64,
    #[serde(default)]
    pub penalty: i64,
}

// ---------------------------------------------------------------------------
// Events (global modifiers)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventTrigger {
    /// Fired only through the ledger's fire call.
    TriggeredExternally,
    TimeElapsed { seconds: f64 },
    /// Declared but not auto-evaluated yet.
    ScoreThreshold { value: i64 },
    /// Declared but not auto-evaluated yet.
    GoalCompleted { goal_id: String },
    /// Declared but not auto-evaluated yet.
    ResourceCountExceeds { resource_id: String, count: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventModality {
    Permanent,
    WithDuration { seconds: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventEffect {
    ChangePolicy {
        policy: PolicyConfig,
    },
    MultiplySpeed {
        factor: f64,
    },
    ScaleRecipeInputs {
        factor: f64,
        recipe_id: Option<String>,
        station_config_id: Option<String>,
    },
    ScaleRecipeOutputs {
        factor: f64,
        recipe_id: Option<String>,
        station_config_id: Option<String>,
    },
    ScaleDecay {
        factor: f64,
    },
    ScaleWorkDuration {
        factor: f64,
        station_config_id: Option<String>,
    },
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventSpec {
    pub event_id: String,
    #[serde(default)]
    pub display_name: String,
    pub trigger: EventTrigger,
    pub modality: EventModality,
    #[serde(default)]
    pub effects: Vec<EventEffect>,
}

impl EventSpec {
    pub fn has_duration(&self) -> bool {
        matches!(self.modality, EventModality::WithDuration { .. })
    }
}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMode {
    /// One shared score backed by the ledger's global capital.
    #[default]
    SharedPool,
    PerTeam,
    PerActor,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LevelScoreAggregate {
    #[default]
    SumAll,
    Max,
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerSpec {
    pub player_id: String,
    #[serde(default)]
    pub team_id: Option<u32>,
    #[serde(default)]
    pub starting_capital: i64,
}

/// Complete externally authored run description. Persisted representation
/// is JSON; schema_version is checked at load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioConfig {
    pub schema_version: String,
    pub scenario_id: String,
    pub seed: u64,
    /// Logical seconds advanced per step.
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: f64,
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
    #[serde(default)]
    pub resource_types: Vec<ResourceTypeDef>,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub loot_tables: Vec<LootTableDef>,
    #[serde(default)]
    pub station_configs: Vec<StationConfig>,
    #[serde(default)]
    pub stations: Vec<StationPlacement>,
    #[serde(default)]
    pub players: Vec<PlayerSpec>,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub goals: Vec<GoalTemplate>,
    #[serde(default)]
    pub events: Vec<EventSpec>,
    #[serde(default)]
    pub score_mode: ScoreMode,
    #[serde(default)]
    pub score_aggregate: LevelScoreAggregate,
    #[serde(default)]
    pub initial_capital: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_tick_seconds() -> f64 {
    1.0
}

fn default_max_ticks() -> u64 {
    720
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            scenario_id: "scenario_local_001".to_string(),
            seed: 1337,
            tick_seconds: default_tick_seconds(),
            max_ticks: default_max_ticks(),
            resource_types: Vec::new(),
            recipes: Vec::new(),
            loot_tables: Vec::new(),
            station_configs: Vec::new(),
            stations: Vec::new(),
            players: Vec::new(),
            policy: PolicyConfig::default(),
            goals: Vec::new(),
            events: Vec::new(),
            score_mode: ScoreMode::SharedPool,
            score_aggregate: LevelScoreAggregate::SumAll,
            initial_capital: 0,
            notes: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Run status and structured log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Running,
    Paused,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimStatus {
    pub schema_version: String,
    pub scenario_id: String,
    pub current_tick: u64,
    pub max_ticks: u64,
    pub mode: RunMode,
}

impl SimStatus {
    pub fn is_complete(&self) -> bool {
        self.current_tick >= self.max_ticks
    }
}

impl fmt::Display for SimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scenario_id={} tick={}/{} mode={:?}",
            self.scenario_id, self.current_tick, self.max_ticks, self.mode
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SimEventType {
    StationProduced,
    StationConsumed,
    StationDied,
    StationUpgraded,
    StationRemoved,
    WorkCycleCompleted,
    CapitalTransferred,
    ResourceSpawned,
    ResourceExpired,
    ResourceTaken,
    StealingDetected,
    GoalContribution,
    GoalCompleted,
    GoalFailed,
    ModifierFired,
    ModifierExpired,
    PolicyChanged,
    ConfigError,
}

/// One structured log record. The world appends these in commit order;
/// front ends and tests read them instead of a text log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimEvent {
    pub event_id: String,
    pub tick: u64,
    pub event_type: SimEventType,
    /// Station, goal, resource instance, or actor the record is about.
    pub subject: String,
    #[serde(default)]
    pub details: Option<Value>,
}

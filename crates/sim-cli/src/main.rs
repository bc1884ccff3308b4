use std::env;
use std::fs;

use contracts::{
    EventModality, EventSpec, EventTrigger, GoalTemplate, InteractionTrigger, Ownership,
    ProductionSource, ResourceBehavior, ResourceTypeDef, ScenarioConfig, StationConfig,
    StationPlacement, SCHEMA_VERSION_V1,
};
use sim_core::world::SimWorld;

fn print_usage() {
    println!("sim-cli <command>");
    println!("commands:");
    println!("  scenario <path.json> [ticks]");
    println!("    loads a scenario file and runs it; ticks defaults to the scenario budget");
    println!("  demo [ticks]");
    println!("    runs the built-in demo scenario");
}

fn parse_ticks(value: Option<&String>) -> Result<Option<u64>, String> {
    match value {
        None => Ok(None),
        Some(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|_| format!("invalid ticks: {raw}")),
    }
}

fn load_scenario(path: &str) -> Result<ScenarioConfig, String> {
    let raw = fs::read_to_string(path).map_err(|err| format!("failed to read {path}: {err}"))?;
    let config: ScenarioConfig =
        serde_json::from_str(&raw).map_err(|err| format!("invalid scenario {path}: {err}"))?;
    if config.schema_version != SCHEMA_VERSION_V1 {
        return Err(format!(
            "unsupported schema_version {} (expected {})",
            config.schema_version, SCHEMA_VERSION_V1
        ));
    }
    Ok(config)
}

/// A small self-contained forest economy: a grove drops wood on a timer,
/// a berry bush grows decaying food, and a delivery goal with a timed
/// rot event exercises the modifier path.
fn demo_scenario() -> ScenarioConfig {
    ScenarioConfig {
        scenario_id: "scenario:demo-forest".to_string(),
        seed: 42,
        tick_seconds: 1.0,
        max_ticks: 120,
        resource_types: vec![
            ResourceTypeDef {
                resource_id: "wood".to_string(),
                display_name: "Wood".to_string(),
                icon: None,
                behavior: ResourceBehavior::Static,
            },
            ResourceTypeDef {
                resource_id: "berry".to_string(),
                display_name: "Berry".to_string(),
                icon: None,
                behavior: ResourceBehavior::Decays {
                    lifespan_seconds: 30.0,
                },
            },
        ],
        station_configs: vec![
            StationConfig {
                config_id: "grove".to_string(),
                display_name: "Grove".to_string(),
                produce_resource: true,
                production: ProductionSource::Resources {
                    types: vec!["wood".to_string()],
                },
                production_trigger: InteractionTrigger::Automatic,
                production_interval: 5.0,
                contributes_goals_production: true,
                can_grow: true,
                growth_rate_seconds: 10.0,
                random_start_age: true,
                ..StationConfig::default()
            },
            StationConfig {
                config_id: "berry_bush".to_string(),
                display_name: "Berry bush".to_string(),
                produce_resource: true,
                production: ProductionSource::Resources {
                    types: vec!["berry".to_string()],
                },
                production_trigger: InteractionTrigger::Automatic,
                production_interval: 8.0,
                ..StationConfig::default()
            },
        ],
        stations: vec![
            StationPlacement {
                station_id: "station:grove".to_string(),
                config_id: "grove".to_string(),
                owner: Ownership::Unowned,
            },
            StationPlacement {
                station_id: "station:bush".to_string(),
                config_id: "berry_bush".to_string(),
                owner: Ownership::Unowned,
            },
        ],
        goals: vec![GoalTemplate {
            goal_id: "goal:lumber".to_string(),
            resource_id: "wood".to_string(),
            required_count: 10,
            time_limit_seconds: 90.0,
            reward_points: 100,
            penalty: 20,
        }],
        events: vec![EventSpec {
            event_id: "event:rot".to_string(),
            display_name: "Rot sets in".to_string(),
            trigger: EventTrigger::TimeElapsed { seconds: 40.0 },
            modality: EventModality::WithDuration { seconds: 30.0 },
            effects: vec![contracts::EventEffect::ScaleDecay { factor: 3.0 }],
        }],
        ..ScenarioConfig::default()
    }
}

fn run_world(mut world: SimWorld, ticks: Option<u64>) {
    world.start();
    match ticks {
        Some(budget) => {
            for _ in 0..budget {
                if !world.step() {
                    break;
                }
            }
        }
        None => {
            world.run_to_completion();
        }
    }

    println!("{}", world.status());
    for (label, value) in world.scoreboard() {
        println!("{label}: {value}");
    }
    println!("capital: {}", world.ledger().global_capital);
    println!("resources: {}", world.ledger().len());
    println!("events:");
    for (event_type, count) in world.event_tally() {
        println!("  {event_type}: {count}");
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    match command {
        Some("scenario") => {
            let outcome = match args.get(2) {
                None => Err("missing scenario path".to_string()),
                Some(path) => load_scenario(path)
                    .and_then(|config| Ok((config, parse_ticks(args.get(3))?))),
            };
            match outcome {
                Ok((config, ticks)) => run_world(SimWorld::new(config), ticks),
                Err(err) => {
                    eprintln!("error: {err}");
                    print_usage();
                    std::process::exit(2);
                }
            }
        }
        Some("demo") => match parse_ticks(args.get(2)) {
            Ok(ticks) => run_world(SimWorld::new(demo_scenario()), ticks),
            Err(err) => {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        },
        _ => {
            print_usage();
        }
    }
}

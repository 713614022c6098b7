//! Encircle headless driver
//!
//! Runs one encounter to completion (or the tick limit) and prints a summary.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use encircle::EncounterConfig;
use encircle::sim::{Encounter, GroupEvent, ReleaseReason, tick};

#[derive(Parser, Debug)]
#[command(name = "encircle", about = "Run a headless group-AI encounter")]
struct Cli {
    /// JSON encounter config (defaults to the built-in three-unit encounter)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the RNG seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Override the number of ticks to run
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Print the effective config as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match EncounterConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => EncounterConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(ticks) = cli.ticks {
        config.ticks = ticks;
    }

    if cli.dump_config {
        return match config.to_json() {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    log::info!("Encounter starting with seed: {}", config.seed);
    let mut encounter = config.build();
    run(&mut encounter, &config);
    print_summary(&encounter);
    ExitCode::SUCCESS
}

fn run(encounter: &mut Encounter, config: &EncounterConfig) {
    let script = &config.hero.script;
    while encounter.time_ticks < config.ticks && !encounter.is_finished() {
        let input = script.input_for(encounter, config.dt);
        tick(encounter, &input, config.dt);
    }
    log::info!("Encounter stopped after {} ticks", encounter.time_ticks);
}

fn print_summary(encounter: &Encounter) {
    let group = &encounter.group;
    let count = |f: fn(&GroupEvent) -> bool| encounter.log.iter().filter(|e| f(&e.event)).count();

    println!("ticks run:        {}", encounter.time_ticks);
    println!("final state:      {:?} ({:?})", group.state, group.behavior);
    println!(
        "group health:     {:.1} / {:.1} ({} alive, {} dead)",
        group.group_health(),
        group.group_total_health(),
        group.alive_count(),
        group.dead_units().count()
    );
    if let Some(hero) = encounter.hero() {
        println!("hero health:      {:.1} / {:.1}", hero.health, hero.max_health);
    }
    println!(
        "strikes:          {}",
        count(|e| matches!(e, GroupEvent::StrikeStarted { .. }))
    );
    println!(
        "tokens granted:   {}",
        count(|e| matches!(e, GroupEvent::TokenGranted { .. }))
    );
    println!(
        "released by death: {}",
        count(|e| matches!(
            e,
            GroupEvent::TokenReleased {
                reason: ReleaseReason::Death,
                ..
            }
        ))
    );

    for unit in group.units() {
        println!(
            "  unit {:>3}  rank {:>4}  hp {:>6.1}  {:?}  strafe {:?} @ {:.2}",
            unit.id,
            unit.rank.map(|r| r.to_string()).unwrap_or_else(|| "-".into()),
            unit.health,
            unit.phase,
            unit.strafe,
            unit.strafe.move_speed(unit.stats.movement_speed)
        );
    }
}

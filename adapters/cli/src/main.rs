#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a scripted, headless Endless Defence match.

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use endless_defence_core::{Command, Event, PlayerEconomy, TowerKind};
use endless_defence_simulation::{MatchConfig, Simulation};
use endless_defence_system_builder::{Builder, BuilderInput};
use endless_defence_world::{CellState, World};
use glam::Vec3;
use tracing_subscriber::EnvFilter;

/// Tower kinds the scripted player buys, in order.
const BUILD_ORDER: [TowerKind; 7] = [
    TowerKind::Archer,
    TowerKind::Frost,
    TowerKind::Cannon,
    TowerKind::Flame,
    TowerKind::Tesla,
    TowerKind::Arcane,
    TowerKind::Glacier,
];

/// Runs a headless match and prints a summary.
#[derive(Debug, Parser)]
#[command(name = "endless-defence", version)]
struct Args {
    /// TOML match configuration; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Simulated seconds to run before stopping.
    #[arg(long, default_value_t = 600.0)]
    seconds: f32,
    /// Overrides the configured time scale.
    #[arg(long)]
    time_scale: Option<f32>,
    /// Overrides the configured match seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Real-time length of one tick in milliseconds.
    #[arg(long, default_value_t = 50)]
    frame_ms: u64,
}

#[derive(Debug, Default)]
struct Summary {
    waves_cleared: u32,
    segments_added: u32,
    towers_built: u32,
    towers_lost: u32,
    leaks: u32,
}

impl Summary {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::WaveCleared { .. } => self.waves_cleared += 1,
                Event::SegmentExtended { .. } => self.segments_added += 1,
                Event::TowerPlaced { .. } => self.towers_built += 1,
                Event::TowerDestroyed { .. } => self.towers_lost += 1,
                Event::EnemyReachedEnd { .. } => self.leaks += 1,
                _ => {}
            }
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    run(&args, &config)
}

fn load_config(args: &Args) -> Result<MatchConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read match config at {}", path.display()))?;
            MatchConfig::from_toml_str(&contents)
                .with_context(|| format!("invalid match config at {}", path.display()))?
        }
        None => MatchConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(scale) = args.time_scale {
        config.time_scale = scale;
    }
    config.validate().context("invalid command-line overrides")?;
    ensure!(args.frame_ms > 0, "--frame-ms must be positive");
    ensure!(
        args.seconds.is_finite() && args.seconds >= 0.0,
        "--seconds must be a non-negative number"
    );
    Ok(config)
}

fn run(args: &Args, config: &MatchConfig) -> Result<()> {
    let mut simulation = Simulation::from_config(config);
    let mut builder = Builder::new();
    let mut summary = Summary::default();
    let mut events = Vec::new();
    let mut next_kind = 0;

    simulation
        .apply(Command::AdvanceWave, &mut events)
        .context("failed to start the first wave")?;

    let frame = Duration::from_millis(args.frame_ms);
    let horizon = Duration::from_secs_f32(args.seconds);
    while simulation.now() < horizon && !simulation.is_lost() {
        let kind = BUILD_ORDER[next_kind % BUILD_ORDER.len()];
        if buy_tower(&mut simulation, &mut builder, kind, &mut events) {
            next_kind += 1;
        }

        simulation
            .apply(Command::Tick { dt: frame }, &mut events)
            .context("tick rejected")?;
        summary.record(&events);
        events.clear();
        if simulation.time_scale() == 0.0 {
            break;
        }
    }

    print_summary(&simulation, &summary);
    Ok(())
}

/// Selects `kind`, hovers the best free site and confirms when affordable.
fn buy_tower(
    simulation: &mut Simulation,
    builder: &mut Builder,
    kind: TowerKind,
    events: &mut Vec<Event>,
) -> bool {
    let money = simulation.economy().money();
    let Some(site) = best_site(simulation.world()) else {
        return false;
    };

    builder.select(kind);
    let mut commands = Vec::new();
    builder.handle(
        simulation.world(),
        money,
        BuilderInput {
            confirm_action: true,
            cursor: Some(site),
            ..BuilderInput::default()
        },
        &mut commands,
    );
    builder.cancel();

    let mut placed = false;
    for command in commands {
        match simulation.apply(command, events) {
            Ok(()) => placed = true,
            Err(error) => tracing::debug!(%error, "scripted purchase rejected"),
        }
    }
    placed
}

/// Free cell closest to the newest segment's path.
fn best_site(world: &World) -> Option<Vec3> {
    let segment = world.map().segments().last()?;
    let grid = segment.grid();
    grid.iter()
        .filter(|(_, state)| *state == CellState::Open)
        .map(|(cell, _)| {
            let center = grid.center(cell);
            let distance = segment
                .path()
                .iter()
                .map(|waypoint| waypoint.distance(center))
                .fold(f32::INFINITY, f32::min);
            (distance, center)
        })
        .min_by(|left, right| left.0.total_cmp(&right.0))
        .map(|(_, center)| center)
}

fn print_summary(simulation: &Simulation, summary: &Summary) {
    let economy = simulation.economy();
    let waves = simulation.waves();
    println!("Endless Defence headless run");
    println!("  simulated time : {:.1}s", simulation.now().as_secs_f32());
    println!("  outcome        : {}", if simulation.is_lost() { "lost" } else { "alive" });
    println!(
        "  waves cleared  : {} (next: absolute {}, segment {} wave {})",
        summary.waves_cleared,
        waves.absolute_wave(),
        waves.segment_index(),
        waves.segment_wave()
    );
    println!("  segments added : {}", summary.segments_added);
    println!(
        "  towers         : {} built, {} destroyed, {} standing",
        summary.towers_built,
        summary.towers_lost,
        simulation.world().towers().len()
    );
    println!("  kills / leaks  : {} / {}", economy.kills(), summary.leaks);
    println!("  money / health : {} / {}", economy.money(), economy.health());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_configured_values() {
        let args = Args::try_parse_from([
            "endless-defence",
            "--seed",
            "42",
            "--time-scale",
            "3",
            "--seconds",
            "5",
        ])
        .expect("arguments parse");

        let config = load_config(&args).expect("config loads");
        assert_eq!(config.seed, 42);
        assert_eq!(config.time_scale, 3.0);
        assert_eq!(args.seconds, 5.0);
    }

    #[test]
    fn negative_time_scale_is_rejected() {
        let args = Args::try_parse_from(["endless-defence", "--time-scale=-1"])
            .expect("arguments parse");
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn short_run_buys_towers_and_finishes() {
        let args = Args::try_parse_from(["endless-defence", "--seconds", "30"])
            .expect("arguments parse");
        let config = load_config(&args).expect("config loads");
        let mut simulation = Simulation::from_config(&config);
        let mut builder = Builder::new();
        let mut events = Vec::new();

        assert!(buy_tower(&mut simulation, &mut builder, TowerKind::Archer, &mut events));
        assert_eq!(simulation.world().towers().len(), 1);
        assert!(run(&args, &config).is_ok());
    }
}

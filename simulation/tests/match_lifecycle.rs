use std::time::Duration;

use endless_defence_core::{
    Command, CommandError, EnemyKind, Event, PlayerEconomy, StatusKind, TowerKind,
};
use endless_defence_simulation::{MatchConfig, Simulation, SIEGE_RADIUS};
use endless_defence_world::CellState;

const FRAME: Duration = Duration::from_millis(100);

#[test]
fn match_is_lost_once_and_then_rejects_commands() {
    let config = MatchConfig {
        starting_health: 1,
        ..MatchConfig::default()
    };
    let mut simulation = Simulation::from_config(&config);
    let mut events = Vec::new();
    simulation
        .apply(Command::AdvanceWave, &mut events)
        .expect("first wave starts");

    while !simulation.is_lost() {
        simulation
            .apply(Command::Tick { dt: FRAME }, &mut events)
            .expect("ticks succeed until the loss");
        assert!(simulation.now() < Duration::from_secs(600), "nobody leaked");
    }

    let losses: Vec<&Event> = events
        .iter()
        .filter(|event| matches!(event, Event::MatchLost { .. }))
        .collect();
    assert_eq!(losses, vec![&Event::MatchLost { absolute_wave: 1 }]);
    assert_eq!(simulation.economy().health(), 0);

    let before = events.len();
    assert_eq!(
        simulation.apply(Command::Tick { dt: FRAME }, &mut events),
        Err(CommandError::MatchOver)
    );
    assert_eq!(
        simulation.apply(Command::AdvanceWave, &mut events),
        Err(CommandError::MatchOver)
    );
    assert_eq!(events.len(), before, "a lost match emits nothing more");
}

#[test]
fn leaks_cost_health_and_kills_pay_rewards() {
    let mut simulation = Simulation::from_config(&MatchConfig::default());
    let mut events = Vec::new();
    simulation
        .apply(Command::AdvanceWave, &mut events)
        .expect("first wave starts");

    while !events
        .iter()
        .any(|event| matches!(event, Event::WaveCleared { .. }))
    {
        simulation
            .apply(Command::Tick { dt: FRAME }, &mut events)
            .expect("tick succeeds");
        assert!(simulation.now() < Duration::from_secs(600), "wave never cleared");
    }

    let leaked: u32 = events
        .iter()
        .filter_map(|event| match event {
            Event::EnemyReachedEnd { damage, .. } => Some(*damage),
            _ => None,
        })
        .sum();
    assert_eq!(leaked, 5, "five undefended basics leak one health each");
    assert_eq!(simulation.economy().health(), 15);
    assert_eq!(simulation.economy().money(), 200 + 25, "wave reward paid once");
}

#[test]
fn frozen_boss_smashes_the_nearest_tower_after_its_siege_interval() {
    let mut simulation = Simulation::from_config(&MatchConfig::default());
    let entry = simulation.world().map().composite_path()[0];
    let grid = simulation.world().map().segments()[0].grid().clone();
    let (cell, _) = grid
        .iter()
        .filter(|(_, state)| *state == CellState::Open)
        .find(|(cell, _)| grid.center(*cell).distance(entry) < SIEGE_RADIUS - 0.5)
        .expect("open cell near the entry");
    let mut events = Vec::new();
    simulation
        .apply(
            Command::PlaceTower {
                kind: TowerKind::Archer,
                position: grid.center(cell),
            },
            &mut events,
        )
        .expect("placed");
    let tower = simulation.tower_ids()[0];

    let now = simulation.now();
    let world = simulation.world_mut();
    let boss = world.spawn_enemy(EnemyKind::Boss, EnemyKind::Boss.stats());
    world
        .enemies_mut()
        .get_mut(boss)
        .expect("boss")
        .apply_status(StatusKind::Frozen, Duration::from_secs(60), 1.0, now);

    for _ in 0..79 {
        simulation
            .apply(Command::Tick { dt: FRAME }, &mut events)
            .expect("tick");
    }
    assert_eq!(simulation.tower_ids(), vec![tower], "siege fires after eight seconds");

    simulation
        .apply(Command::Tick { dt: FRAME }, &mut events)
        .expect("tick");

    assert!(events.contains(&Event::TowerDestroyed { tower, by: boss }));
    assert!(simulation.tower_ids().is_empty());
    assert_eq!(simulation.economy().money(), 150, "destroyed towers are not refunded");
    assert_eq!(
        simulation.world().check_placement(grid.center(cell)).map(|site| site.cell),
        Ok(cell),
        "the smashed tower's cell is free again"
    );
}

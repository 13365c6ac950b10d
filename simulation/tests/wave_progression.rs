use std::{collections::BTreeMap, time::Duration};

use endless_defence_core::{Command, Event, SegmentId, WAVES_PER_SEGMENT};
use endless_defence_simulation::{MatchConfig, Simulation};
use endless_defence_system_wave_generation::generate_composition;

const FRAME: Duration = Duration::from_millis(100);

#[test]
fn undefended_match_walks_through_a_segment_and_extends_the_map() {
    let config = MatchConfig {
        starting_health: 100_000,
        auto_wave_delay_secs: 1.0,
        ..MatchConfig::default()
    };
    let mut simulation = Simulation::from_config(&config);
    let mut events = Vec::new();
    simulation
        .apply(Command::AdvanceWave, &mut events)
        .expect("first wave starts");

    let mut current_wave = 0;
    let mut spawned_per_wave: BTreeMap<u32, u32> = BTreeMap::new();
    let mut extensions = Vec::new();
    let mut cleared = Vec::new();
    let mut consumed = 0;

    for _ in 0..60_000 {
        if simulation.waves().absolute_wave() > WAVES_PER_SEGMENT + 2 {
            break;
        }
        simulation
            .apply(Command::Tick { dt: FRAME }, &mut events)
            .expect("tick succeeds");

        let waves = simulation.waves();
        assert_eq!(
            waves.absolute_wave(),
            waves.segment_index() * WAVES_PER_SEGMENT + waves.segment_wave(),
            "wave counters diverged"
        );

        for event in &events[consumed..] {
            match event {
                Event::WaveStarted { absolute_wave, .. } => current_wave = *absolute_wave,
                Event::EnemySpawned { .. } => {
                    *spawned_per_wave.entry(current_wave).or_default() += 1;
                }
                Event::WaveCleared { absolute_wave, .. } => cleared.push(*absolute_wave),
                Event::SegmentExtended { segment } => extensions.push((*segment, current_wave)),
                _ => {}
            }
        }
        consumed = events.len();
    }

    assert!(
        cleared.len() as u32 > WAVES_PER_SEGMENT,
        "only {} waves cleared",
        cleared.len()
    );
    assert_eq!(cleared, (1..=cleared.len() as u32).collect::<Vec<_>>());
    assert_eq!(
        extensions,
        vec![(SegmentId::new(1), WAVES_PER_SEGMENT)],
        "exactly one extension, triggered by clearing the tenth wave"
    );
    for wave in &cleared {
        assert_eq!(
            spawned_per_wave.get(wave).copied().unwrap_or(0),
            generate_composition(*wave).total_enemies(),
            "wave {wave} spawned a different count than its composition"
        );
    }
    assert_eq!(simulation.world().map().segments().len(), 2);
}

#[test]
fn new_spawns_after_an_extension_walk_the_longer_path() {
    let config = MatchConfig {
        starting_health: 100_000,
        auto_wave_delay_secs: 0.5,
        ..MatchConfig::default()
    };
    let mut simulation = Simulation::from_config(&config);
    let single_segment = simulation.world().map().composite_path().len();
    let mut events = Vec::new();
    simulation
        .apply(Command::AdvanceWave, &mut events)
        .expect("first wave starts");

    while simulation.waves().absolute_wave() <= WAVES_PER_SEGMENT {
        simulation
            .apply(Command::Tick { dt: FRAME }, &mut events)
            .expect("tick succeeds");
        assert!(simulation.now() < Duration::from_secs(6_000), "waves stalled");
    }
    while simulation.world().enemies().is_empty() {
        simulation
            .apply(Command::Tick { dt: FRAME }, &mut events)
            .expect("tick succeeds");
    }

    let composite = simulation.world().map().composite_path().len();
    assert!(composite > single_segment);
    for enemy in simulation.world().enemies().iter() {
        assert_eq!(enemy.path().len(), composite);
    }
}

use std::time::Duration;

use endless_defence_core::{EnemyId, EnemyKind};
use endless_defence_system_movement::Movement;
use endless_defence_world::{GridSpec, World, BRIDGE_LENGTH};
use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const FRAME: Duration = Duration::from_millis(100);

fn walk(
    world: &mut World,
    movement: &mut Movement,
    rng: &mut ChaCha8Rng,
    ticks: u32,
) -> Vec<EnemyId> {
    let mut reached = Vec::new();
    for _ in 0..ticks {
        movement.handle(world.enemies_mut(), FRAME, rng, &mut reached);
    }
    reached
}

#[test]
fn splicing_leaves_in_flight_enemies_where_they_are() {
    let mut world = World::new(99, GridSpec::default());
    let mut movement = Movement::new();
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    let runners: Vec<EnemyId> = [EnemyKind::Basic, EnemyKind::Tank, EnemyKind::Fast]
        .into_iter()
        .map(|kind| world.spawn_enemy(kind, kind.stats()))
        .collect();
    let reached = walk(&mut world, &mut movement, &mut rng, 30);
    assert!(reached.is_empty(), "nobody finishes a segment in three seconds");

    let before: Vec<(Vec3, usize, usize)> = runners
        .iter()
        .map(|id| {
            let enemy = world.enemies().get(*id).expect("runner");
            (enemy.position(), enemy.current_waypoint(), enemy.path().len())
        })
        .collect();

    let extension = world.extend_map();
    let added = extension.bridge.len() + extension.path.len();

    for (id, (position, waypoint, length)) in runners.iter().zip(before) {
        let enemy = world.enemies().get(*id).expect("runner");
        assert_eq!(enemy.position(), position, "splicing moved {id:?}");
        assert_eq!(enemy.current_waypoint(), waypoint, "splicing changed {id:?}'s cursor");
        assert_eq!(enemy.path().len(), length + added);
        assert_eq!(enemy.path(), world.map().composite_path());
    }
}

#[test]
fn spliced_enemies_walk_into_the_new_segment_and_finish_once() {
    let grid = GridSpec::default();
    let mut world = World::new(5, grid);
    let mut movement = Movement::new();
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    let runner = world.spawn_enemy(EnemyKind::Fast, EnemyKind::Fast.stats());
    let _ = walk(&mut world, &mut movement, &mut rng, 20);
    let _ = world.extend_map();

    let reached = walk(&mut world, &mut movement, &mut rng, 2_000);

    assert_eq!(reached, vec![runner], "the runner finishes exactly once");
    let enemy = world.enemies().get(runner).expect("not yet removed");
    assert!(
        enemy.position().z >= grid.depth() + BRIDGE_LENGTH,
        "the runner ended inside the second segment"
    );

    let mut removed = Vec::new();
    world.remove_finished(&mut removed);
    assert_eq!(removed.len(), 1);
    world.remove_finished(&mut removed);
    assert_eq!(removed.len(), 1, "a finished enemy is removed exactly once");
}

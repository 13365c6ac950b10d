#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Path follower that walks enemies along their own waypoint copies.

use std::{f32::consts::TAU, time::Duration};

use endless_defence_core::{EnemyId, StatusKind};
use endless_defence_world::{Enemy, EnemyArena};
use glam::Vec3;
use rand::Rng;

/// Distance at which a waypoint counts as reached.
pub const ARRIVAL_THRESHOLD: f32 = 0.1;

/// Gap to the current waypoint beyond which the enemy snaps back onto its path.
pub const DRIFT_LIMIT: f32 = 2.0;

/// Per-tick probability that a confused enemy picks a new perturbation heading.
pub const CONFUSION_REROLL_CHANCE: f64 = 0.05;

/// Weight of the perturbation heading when blended with the true direction.
pub const CONFUSION_BLEND: f32 = 0.5;

/// Movement system that advances every enemy once per tick.
#[derive(Debug, Default)]
pub struct Movement;

impl Movement {
    /// Creates a new movement system.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Advances all enemies in identifier order, collecting those that reached the end.
    pub fn handle<R>(
        &mut self,
        enemies: &mut EnemyArena,
        dt: Duration,
        rng: &mut R,
        reached_end: &mut Vec<EnemyId>,
    ) where
        R: Rng + ?Sized,
    {
        for enemy in enemies.iter_mut() {
            if advance(enemy, dt, rng) {
                reached_end.push(enemy.id());
            }
        }
    }
}

/// Moves one enemy towards its current waypoint.
///
/// Returns `true` exactly once, on the tick the enemy passes its final
/// waypoint. Frozen or stunned enemies stay put.
pub fn advance<R>(enemy: &mut Enemy, dt: Duration, rng: &mut R) -> bool
where
    R: Rng + ?Sized,
{
    if !enemy.is_alive() || enemy.has_reached_end() {
        return false;
    }
    if enemy.statuses().halts_movement() {
        return false;
    }

    let Some(waypoint) = enemy.path().get(enemy.current_waypoint()).copied() else {
        return enemy.mark_reached_end();
    };

    let mut direction = waypoint - enemy.position();
    if direction.length() > DRIFT_LIMIT {
        tracing::debug!(
            enemy = enemy.id().get(),
            gap = direction.length(),
            "enemy drifted off its path; snapping back"
        );
        enemy.snap_to_previous_waypoint();
        direction = waypoint - enemy.position();
    }

    let distance = direction.length();
    let heading = steer(enemy, direction.normalize_or_zero(), rng);
    let step = (enemy.speed() * dt.as_secs_f32()).min(distance);
    enemy.move_to(enemy.position() + heading * step);

    if enemy.position().distance(waypoint) <= ARRIVAL_THRESHOLD {
        enemy.advance_waypoint();
        if enemy.current_waypoint() == enemy.path().len() {
            return enemy.mark_reached_end();
        }
    }
    false
}

fn steer<R>(enemy: &mut Enemy, heading: Vec3, rng: &mut R) -> Vec3
where
    R: Rng + ?Sized,
{
    if !enemy.statuses().is_active(StatusKind::Confused) {
        enemy.set_confusion_heading(None);
        return heading;
    }

    let perturbation = match enemy.confusion_heading() {
        Some(cached) if !rng.gen_bool(CONFUSION_REROLL_CHANCE) => cached,
        _ => {
            let angle = rng.gen_range(0.0..TAU);
            let fresh = Vec3::new(angle.cos(), 0.0, angle.sin());
            enemy.set_confusion_heading(Some(fresh));
            fresh
        }
    };

    let blended = heading * (1.0 - CONFUSION_BLEND) + perturbation * CONFUSION_BLEND;
    blended.normalize_or_zero()
}

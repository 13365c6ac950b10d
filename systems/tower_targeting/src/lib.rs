#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure target selection for towers.
//!
//! A tower prefers enemies whose kind it is strong against; within the chosen
//! pool it takes the enemy closest to the end of its path, and the lowest
//! identifier breaks any remaining tie. Selection runs from scratch every tick
//! so a tracked target that died or walked out of range is dropped.

use endless_defence_core::{EnemyId, TowerProfile};
use endless_defence_world::{Enemy, EnemyArena, Tower};
use glam::Vec3;

/// Selects the enemy the tower should shoot this tick.
#[must_use]
pub fn select_target(tower: &Tower, enemies: &EnemyArena) -> Option<EnemyId> {
    let profile = tower.profile();
    let mut best: Option<BestCandidate> = None;

    for enemy in enemies.iter() {
        if !is_hittable(profile, enemy) {
            continue;
        }
        if enemy.position().distance(tower.position()) > tower.range() {
            continue;
        }

        let current = BestCandidate {
            prioritized: profile.target_priorities.contains(enemy.kind()),
            remaining: enemy.remaining_distance(),
            enemy: enemy.id(),
        };

        match &mut best {
            Some(existing) => {
                if current.precedes(existing) {
                    *existing = current;
                }
            }
            None => best = Some(current),
        }
    }

    best.map(|candidate| candidate.enemy)
}

/// Next enemy a chained shot hops to from `origin`.
///
/// Only alive, hittable enemies within `radius` that are not in `already_hit`
/// qualify; the nearest wins and the lowest identifier breaks ties.
#[must_use]
pub fn nearest_chain_target(
    profile: &TowerProfile,
    enemies: &EnemyArena,
    origin: Vec3,
    radius: f32,
    already_hit: &[EnemyId],
) -> Option<EnemyId> {
    enemies
        .iter()
        .filter(|enemy| is_hittable(profile, enemy))
        .filter(|enemy| !already_hit.contains(&enemy.id()))
        .map(|enemy| (enemy.position().distance(origin), enemy.id()))
        .filter(|(distance, _)| *distance <= radius)
        .min_by(|left, right| left.0.total_cmp(&right.0).then(left.1.cmp(&right.1)))
        .map(|(_, id)| id)
}

/// Reports whether a tower built from `profile` may shoot `enemy` at all.
#[must_use]
pub fn is_hittable(profile: &TowerProfile, enemy: &Enemy) -> bool {
    enemy.is_alive() && !enemy.has_reached_end() && (profile.hits_flying || !enemy.is_flying())
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BestCandidate {
    prioritized: bool,
    remaining: f32,
    enemy: EnemyId,
}

impl BestCandidate {
    fn precedes(&self, other: &Self) -> bool {
        if self.prioritized != other.prioritized {
            return self.prioritized;
        }

        if self.remaining != other.remaining {
            return self.remaining < other.remaining;
        }

        self.enemy < other.enemy
    }
}

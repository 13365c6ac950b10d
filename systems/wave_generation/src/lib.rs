#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave composition and difficulty scaling.
//!
//! Every number here is a pure function of the absolute wave number, so the
//! same wave always contains the same enemies with the same scaled stats.

use std::time::Duration;

use endless_defence_core::{EnemyKind, EnemyStats, MAX_DAMAGE_RESISTANCE, WAVES_PER_SEGMENT};

/// Delay between two consecutive spawns of a regular enemy group.
pub const REGULAR_SPAWN_DELAY: Duration = Duration::from_millis(800);

/// Delay between two consecutive spawns of a fast enemy group.
pub const FAST_SPAWN_DELAY: Duration = Duration::from_millis(500);

/// Delay before a heavy enemy (tank or boss) spawns.
pub const HEAVY_SPAWN_DELAY: Duration = Duration::from_millis(1_500);

/// One group of identical enemies inside a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnGroup {
    /// Kind of enemy spawned.
    pub kind: EnemyKind,
    /// Number of enemies in the group.
    pub count: u32,
    /// Delay preceding each spawn of the group.
    pub delay: Duration,
}

/// Ordered enemy groups of a wave plus the reward for clearing it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaveComposition {
    groups: Vec<SpawnGroup>,
    reward: u32,
}

impl WaveComposition {
    /// Groups in spawn order.
    #[must_use]
    pub fn groups(&self) -> &[SpawnGroup] {
        &self.groups
    }

    /// Money paid when the wave is cleared.
    #[must_use]
    pub const fn reward(&self) -> u32 {
        self.reward
    }

    /// Total number of enemies across all groups.
    #[must_use]
    pub fn total_enemies(&self) -> u32 {
        self.groups.iter().map(|group| group.count).sum()
    }
}

/// Builds the composition of the provided absolute wave.
#[must_use]
pub fn generate_composition(wave: u32) -> WaveComposition {
    let wave = wave.max(1);
    let mut groups = vec![SpawnGroup {
        kind: EnemyKind::Basic,
        count: 5 + wave / 2,
        delay: REGULAR_SPAWN_DELAY,
    }];

    if wave > 2 {
        groups.push(SpawnGroup {
            kind: EnemyKind::Fast,
            count: (wave - 1) / 2,
            delay: FAST_SPAWN_DELAY,
        });
    }
    if wave > 4 {
        groups.push(SpawnGroup {
            kind: EnemyKind::Tank,
            count: (wave - 3) / 3,
            delay: HEAVY_SPAWN_DELAY,
        });
    }
    if wave > 6 {
        groups.push(SpawnGroup {
            kind: EnemyKind::Flying,
            count: (wave - 5) / 3,
            delay: REGULAR_SPAWN_DELAY,
        });
    }
    if wave % WAVES_PER_SEGMENT == 0 {
        groups.push(SpawnGroup {
            kind: EnemyKind::Boss,
            count: 1,
            delay: HEAVY_SPAWN_DELAY,
        });
    }

    groups.retain(|group| group.count > 0);
    WaveComposition {
        groups,
        reward: 20 + 5 * wave,
    }
}

/// Difficulty multiplier of the provided absolute wave; 1.0 for the first wave.
#[must_use]
pub fn difficulty_multiplier(wave: u32) -> f32 {
    1.0 + 0.1 * wave.saturating_sub(1) as f32
}

/// Stats of a freshly spawned enemy of `kind` in the provided absolute wave.
#[must_use]
pub fn scaled_stats(kind: EnemyKind, wave: u32) -> EnemyStats {
    scale_stats(kind.stats(), difficulty_multiplier(wave))
}

/// Applies a difficulty multiplier to base stats.
#[must_use]
pub fn scale_stats(base: EnemyStats, multiplier: f32) -> EnemyStats {
    EnemyStats {
        health: base.health * multiplier,
        damage: (base.damage as f32 * multiplier.powf(0.8)).round() as u32,
        reward: (base.reward as f32 * multiplier.powf(0.9)).round() as u32,
        resistance: resistance_for(multiplier),
        ..base
    }
}

fn resistance_for(multiplier: f32) -> f32 {
    ((multiplier - 1.0) * 0.08).clamp(0.0, MAX_DAMAGE_RESISTANCE)
}

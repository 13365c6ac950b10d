#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Endless Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and the combat and wave systems. Adapters submit
//! [`Command`] values describing desired mutations, the simulation executes
//! them against the world, and then broadcasts [`Event`] values that
//! renderers, audio, and floating damage numbers react to. Tower and enemy
//! variants are plain enums whose per-variant numbers live in data tables
//! ([`TowerProfile`], [`EnemyStats`]) so every algorithm stays a single,
//! non-virtual code path.

use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of waves that make up a single map segment.
pub const WAVES_PER_SEGMENT: u32 = 10;

/// Upper bound applied to any enemy's damage resistance fraction.
pub const MAX_DAMAGE_RESISTANCE: f32 = 0.4;

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of a map segment in the order segments were appended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(u32);

impl SegmentId {
    /// Creates a new segment identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the segment identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single buildable cell inside a segment grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Elemental affinity carried by a tower's attacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    /// Arrows, shells and other kinetic damage.
    Physical,
    /// Flame damage that tends to ignite targets.
    Fire,
    /// Cold damage that slows or freezes targets.
    Ice,
    /// Electrical damage that arcs between targets.
    Lightning,
    /// Magical damage that disorients targets.
    Arcane,
}

/// Enemy archetypes that waves are composed of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Baseline walker.
    Basic,
    /// Fragile runner.
    Fast,
    /// Slow, armoured walker.
    Tank,
    /// Airborne enemy that ground-only towers cannot hit.
    Flying,
    /// Heavy enemy appended to every tenth wave.
    Boss,
}

impl EnemyKind {
    /// Every enemy kind in declaration order.
    pub const ALL: [EnemyKind; 5] = [
        EnemyKind::Basic,
        EnemyKind::Fast,
        EnemyKind::Tank,
        EnemyKind::Flying,
        EnemyKind::Boss,
    ];

    /// Unscaled statistics for the enemy kind.
    #[must_use]
    pub const fn stats(self) -> EnemyStats {
        match self {
            Self::Basic => EnemyStats {
                health: 30.0,
                speed: 2.0,
                damage: 1,
                reward: 5,
                flying: false,
                heavy: false,
                resistance: 0.0,
            },
            Self::Fast => EnemyStats {
                health: 18.0,
                speed: 3.5,
                damage: 1,
                reward: 6,
                flying: false,
                heavy: false,
                resistance: 0.0,
            },
            Self::Tank => EnemyStats {
                health: 90.0,
                speed: 1.2,
                damage: 2,
                reward: 12,
                flying: false,
                heavy: true,
                resistance: 0.0,
            },
            Self::Flying => EnemyStats {
                health: 24.0,
                speed: 2.6,
                damage: 1,
                reward: 8,
                flying: true,
                heavy: false,
                resistance: 0.0,
            },
            Self::Boss => EnemyStats {
                health: 400.0,
                speed: 0.9,
                damage: 5,
                reward: 60,
                flying: false,
                heavy: true,
                resistance: 0.0,
            },
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Basic => 1 << 0,
            Self::Fast => 1 << 1,
            Self::Tank => 1 << 2,
            Self::Flying => 1 << 3,
            Self::Boss => 1 << 4,
        }
    }
}

/// Statistics used to construct an enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyStats {
    /// Maximum (and starting) health.
    pub health: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Health removed from the player when the enemy reaches the path end.
    pub damage: u32,
    /// Money paid to the player when the enemy is killed.
    pub reward: u32,
    /// Whether the enemy flies over the path.
    pub flying: bool,
    /// Whether the enemy is heavy.
    pub heavy: bool,
    /// Fraction of incoming damage ignored, within `[0, MAX_DAMAGE_RESISTANCE]`.
    pub resistance: f32,
}

/// Compact set of enemy kinds used for matchup tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnemyKindSet(u8);

impl EnemyKindSet {
    /// Set containing no kinds.
    pub const EMPTY: Self = Self(0);

    /// Builds a set from the provided kinds.
    #[must_use]
    pub const fn of(kinds: &[EnemyKind]) -> Self {
        let mut bits = 0;
        let mut index = 0;
        while index < kinds.len() {
            bits |= kinds[index].bit();
            index += 1;
        }
        Self(bits)
    }

    /// Reports whether the set contains the kind.
    #[must_use]
    pub const fn contains(&self, kind: EnemyKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Reports whether the set is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Timed (or instantaneous) conditions a tower can inflict on an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatusKind {
    /// Periodic damage; strength is the damage dealt per burn tick.
    Burning,
    /// Speed multiplied by `1 - strength`.
    Slowed,
    /// Speed forced to zero; dominates [`StatusKind::Slowed`].
    Frozen,
    /// Movement halted without touching speed scaling.
    Stunned,
    /// Movement direction perturbed and speed reduced.
    Confused,
    /// Instantaneous knock-back of `strength` units; never retained.
    Pushed,
}

/// Secondary status effect rolled alongside a tower's direct damage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SecondaryEffect {
    /// Status inflicted on success.
    pub kind: StatusKind,
    /// Probability in `[0, 1]` that the effect is applied per shot.
    pub chance: f32,
    /// How long the effect stays active.
    pub duration: Duration,
    /// Effect-specific magnitude.
    pub strength: f32,
}

/// Parameters for towers whose shots hop between nearby enemies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChainSpec {
    /// Maximum number of hops after the primary target.
    pub max_jumps: u32,
    /// Maximum distance between consecutive chain targets.
    pub hop_radius: f32,
    /// Multiplier applied to the damage on every hop.
    pub damage_reduction: f32,
    /// Multiplier applied to the secondary effect duration for chained targets.
    pub effect_duration_factor: f32,
}

/// Data table describing a tower variant and its per-level growth curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerProfile {
    /// Element reported with every damage event.
    pub element: Element,
    /// Purchase price of a level 1 tower.
    pub cost: u32,
    /// Damage per shot at level 1.
    pub damage: f32,
    /// Targeting radius at level 1 in world units.
    pub range: f32,
    /// Shots per second at level 1.
    pub fire_rate: f32,
    /// Highest attainable level.
    pub max_level: u32,
    /// Damage multiplier applied per upgrade.
    pub damage_growth: f32,
    /// Range multiplier applied per upgrade.
    pub range_growth: f32,
    /// Fire-rate multiplier applied per upgrade.
    pub fire_rate_growth: f32,
    /// Upgrade price factor; the next upgrade costs `cost * factor * level`.
    pub upgrade_cost_factor: f32,
    /// Kinds the tower is strong against and prefers to target.
    pub target_priorities: EnemyKindSet,
    /// Kinds the tower deals reduced damage to.
    pub weak_against: EnemyKindSet,
    /// Optional status effect rolled per shot.
    pub secondary: Option<SecondaryEffect>,
    /// Optional chain behaviour.
    pub chain: Option<ChainSpec>,
    /// Whether flying enemies are valid targets.
    pub hits_flying: bool,
}

/// Types of towers that can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TowerKind {
    /// Cheap single-target physical tower.
    Archer,
    /// Slow, heavy hitter that knocks enemies back; ground only.
    Cannon,
    /// Short-range fire tower that ignites targets.
    Flame,
    /// Ice tower that slows targets.
    Frost,
    /// Ice tower that occasionally freezes targets solid.
    Glacier,
    /// Lightning tower whose shots chain between enemies.
    Tesla,
    /// Long-range arcane tower that confuses targets.
    Arcane,
}

impl TowerKind {
    /// Every tower kind in declaration order.
    pub const ALL: [TowerKind; 7] = [
        TowerKind::Archer,
        TowerKind::Cannon,
        TowerKind::Flame,
        TowerKind::Frost,
        TowerKind::Glacier,
        TowerKind::Tesla,
        TowerKind::Arcane,
    ];

    /// Returns the data table describing the tower variant.
    #[must_use]
    pub const fn profile(self) -> TowerProfile {
        match self {
            Self::Archer => TowerProfile {
                element: Element::Physical,
                cost: 50,
                damage: 10.0,
                range: 5.0,
                fire_rate: 1.0,
                max_level: 5,
                damage_growth: 1.3,
                range_growth: 1.1,
                fire_rate_growth: 1.1,
                upgrade_cost_factor: 0.75,
                target_priorities: EnemyKindSet::of(&[EnemyKind::Fast, EnemyKind::Flying]),
                weak_against: EnemyKindSet::of(&[EnemyKind::Tank]),
                secondary: None,
                chain: None,
                hits_flying: true,
            },
            Self::Cannon => TowerProfile {
                element: Element::Physical,
                cost: 80,
                damage: 25.0,
                range: 4.5,
                fire_rate: 0.5,
                max_level: 5,
                damage_growth: 1.35,
                range_growth: 1.05,
                fire_rate_growth: 1.1,
                upgrade_cost_factor: 0.8,
                target_priorities: EnemyKindSet::of(&[EnemyKind::Tank, EnemyKind::Boss]),
                weak_against: EnemyKindSet::of(&[EnemyKind::Fast]),
                secondary: Some(SecondaryEffect {
                    kind: StatusKind::Pushed,
                    chance: 0.25,
                    duration: Duration::ZERO,
                    strength: 0.6,
                }),
                chain: None,
                hits_flying: false,
            },
            Self::Flame => TowerProfile {
                element: Element::Fire,
                cost: 90,
                damage: 6.0,
                range: 3.5,
                fire_rate: 2.0,
                max_level: 5,
                damage_growth: 1.25,
                range_growth: 1.1,
                fire_rate_growth: 1.1,
                upgrade_cost_factor: 0.75,
                target_priorities: EnemyKindSet::of(&[EnemyKind::Basic]),
                weak_against: EnemyKindSet::of(&[EnemyKind::Boss]),
                secondary: Some(SecondaryEffect {
                    kind: StatusKind::Burning,
                    chance: 0.5,
                    duration: Duration::from_secs(3),
                    strength: 2.0,
                }),
                chain: None,
                hits_flying: true,
            },
            Self::Frost => TowerProfile {
                element: Element::Ice,
                cost: 70,
                damage: 5.0,
                range: 4.5,
                fire_rate: 1.2,
                max_level: 5,
                damage_growth: 1.2,
                range_growth: 1.1,
                fire_rate_growth: 1.1,
                upgrade_cost_factor: 0.7,
                target_priorities: EnemyKindSet::of(&[EnemyKind::Fast]),
                weak_against: EnemyKindSet::of(&[EnemyKind::Tank]),
                secondary: Some(SecondaryEffect {
                    kind: StatusKind::Slowed,
                    chance: 0.6,
                    duration: Duration::from_millis(2_500),
                    strength: 0.4,
                }),
                chain: None,
                hits_flying: true,
            },
            Self::Glacier => TowerProfile {
                element: Element::Ice,
                cost: 140,
                damage: 8.0,
                range: 4.0,
                fire_rate: 0.4,
                max_level: 4,
                damage_growth: 1.25,
                range_growth: 1.1,
                fire_rate_growth: 1.15,
                upgrade_cost_factor: 0.85,
                target_priorities: EnemyKindSet::of(&[EnemyKind::Tank, EnemyKind::Boss]),
                weak_against: EnemyKindSet::of(&[EnemyKind::Flying]),
                secondary: Some(SecondaryEffect {
                    kind: StatusKind::Frozen,
                    chance: 0.3,
                    duration: Duration::from_millis(1_500),
                    strength: 1.0,
                }),
                chain: None,
                hits_flying: true,
            },
            Self::Tesla => TowerProfile {
                element: Element::Lightning,
                cost: 120,
                damage: 14.0,
                range: 5.0,
                fire_rate: 0.8,
                max_level: 5,
                damage_growth: 1.3,
                range_growth: 1.05,
                fire_rate_growth: 1.1,
                upgrade_cost_factor: 0.8,
                target_priorities: EnemyKindSet::of(&[EnemyKind::Flying]),
                weak_against: EnemyKindSet::of(&[EnemyKind::Boss]),
                secondary: Some(SecondaryEffect {
                    kind: StatusKind::Stunned,
                    chance: 0.2,
                    duration: Duration::from_millis(800),
                    strength: 1.0,
                }),
                chain: Some(ChainSpec {
                    max_jumps: 3,
                    hop_radius: 2.5,
                    damage_reduction: 0.7,
                    effect_duration_factor: 0.5,
                }),
                hits_flying: true,
            },
            Self::Arcane => TowerProfile {
                element: Element::Arcane,
                cost: 110,
                damage: 9.0,
                range: 6.0,
                fire_rate: 1.0,
                max_level: 5,
                damage_growth: 1.3,
                range_growth: 1.1,
                fire_rate_growth: 1.1,
                upgrade_cost_factor: 0.75,
                target_priorities: EnemyKindSet::of(&[EnemyKind::Basic, EnemyKind::Fast]),
                weak_against: EnemyKindSet::of(&[EnemyKind::Boss]),
                secondary: Some(SecondaryEffect {
                    kind: StatusKind::Confused,
                    chance: 0.35,
                    duration: Duration::from_secs(3),
                    strength: 1.0,
                }),
                chain: None,
                hits_flying: true,
            },
        }
    }
}

/// Commands that express all permissible match mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided unscaled delta time.
    Tick {
        /// Real time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests placement of a tower at the provided world position.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// World position the tower should snap to.
        position: Vec3,
    },
    /// Requests that an existing tower gains a level.
    UpgradeTower {
        /// Identifier of the tower to upgrade.
        tower: TowerId,
    },
    /// Requests that an existing tower is sold for a partial refund.
    SellTower {
        /// Identifier of the tower to sell.
        tower: TowerId,
    },
    /// Starts the next wave now, or overlays a parallel wave if one is running.
    AdvanceWave,
    /// Changes the factor every tick's delta time is multiplied by.
    SetTimeScale {
        /// New non-negative time scale.
        scale: f32,
    },
    /// Pauses or resumes the simulation.
    SetPaused {
        /// Whether ticks should be skipped.
        paused: bool,
    },
}

/// Events broadcast by the simulation after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Scaled simulation time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a tower was placed.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Type of tower that was placed.
        kind: TowerKind,
        /// World position of the tower.
        position: Vec3,
    },
    /// Confirms that a tower gained a level.
    TowerUpgraded {
        /// Identifier of the tower.
        tower: TowerId,
        /// Level after the upgrade.
        level: u32,
    },
    /// Confirms that a tower was sold.
    TowerSold {
        /// Identifier of the sold tower.
        tower: TowerId,
        /// Money refunded to the player.
        refund: u32,
    },
    /// Reports that an enemy destroyed a tower.
    TowerDestroyed {
        /// Identifier of the destroyed tower.
        tower: TowerId,
        /// Enemy responsible for the destruction.
        by: EnemyId,
    },
    /// Reports that a tower fired at a target.
    TowerFired {
        /// Identifier of the tower.
        tower: TowerId,
        /// Primary target of the shot.
        target: EnemyId,
    },
    /// Reports a single application of damage, for floating damage numbers.
    DamageDealt {
        /// Enemy that took the damage.
        enemy: EnemyId,
        /// World position of the enemy when hit.
        position: Vec3,
        /// Damage applied after resistance.
        amount: f32,
        /// Element of the damage source; `None` for status-effect ticks.
        element: Option<Element>,
    },
    /// Reports that a status effect was applied to an enemy.
    StatusApplied {
        /// Enemy affected.
        enemy: EnemyId,
        /// Status applied.
        kind: StatusKind,
    },
    /// Confirms that the wave manager spawned an enemy.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Kind of enemy spawned.
        kind: EnemyKind,
        /// Spawn position.
        position: Vec3,
    },
    /// Reports that an enemy was killed.
    EnemyDied {
        /// Identifier of the enemy.
        enemy: EnemyId,
        /// Money paid for the kill.
        reward: u32,
    },
    /// Reports that an enemy reached the end of its path.
    EnemyReachedEnd {
        /// Identifier of the enemy.
        enemy: EnemyId,
        /// Health removed from the player.
        damage: u32,
    },
    /// Announces that a wave started.
    WaveStarted {
        /// Match-wide wave number.
        absolute_wave: u32,
        /// Wave number within the current segment.
        segment_wave: u32,
    },
    /// Announces that a parallel wave was overlaid onto the running wave.
    ParallelWaveStarted {
        /// Match-wide number of the wave the overlay was folded into.
        absolute_wave: u32,
    },
    /// Announces that a wave was fully cleared.
    WaveCleared {
        /// Match-wide number of the cleared wave.
        absolute_wave: u32,
        /// Money paid for the clear.
        reward: u32,
    },
    /// Announces that the auto-wave countdown started.
    CountdownStarted {
        /// Time until the next wave starts automatically.
        remaining: Duration,
    },
    /// Announces that a new map segment was appended.
    SegmentExtended {
        /// Identifier of the new segment.
        segment: SegmentId,
    },
    /// Announces that the player ran out of health.
    MatchLost {
        /// Number of waves fully started before the loss.
        absolute_wave: u32,
    },
}

/// Reasons a tower placement request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum PlacementError {
    /// No segment covers the requested position.
    #[error("no map segment covers the requested position")]
    NoSegment,
    /// The position lies outside the resolved segment's grid.
    #[error("position lies outside the segment grid")]
    OutOfBounds,
    /// The enemy path runs through the requested cell.
    #[error("cell is part of the enemy path")]
    PathCell,
    /// The requested cell already holds a tower.
    #[error("cell is already occupied by a tower")]
    Occupied,
    /// The player cannot afford the tower.
    #[error("insufficient funds")]
    InsufficientFunds,
}

/// Reasons a tower upgrade request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum UpgradeError {
    /// No tower with the provided identifier exists.
    #[error("no such tower")]
    MissingTower,
    /// The tower already reached its highest level.
    #[error("tower is already at its maximum level")]
    MaxLevel,
    /// The player cannot afford the upgrade.
    #[error("insufficient funds")]
    InsufficientFunds,
}

/// Reasons a tower sale request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum SellError {
    /// No tower with the provided identifier exists.
    #[error("no such tower")]
    MissingTower,
}

/// Any rejected command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Placement was rejected.
    #[error("placement rejected: {0}")]
    Placement(#[from] PlacementError),
    /// Upgrade was rejected.
    #[error("upgrade rejected: {0}")]
    Upgrade(#[from] UpgradeError),
    /// Sale was rejected.
    #[error("sale rejected: {0}")]
    Sell(#[from] SellError),
    /// The match already ended.
    #[error("the match is over")]
    MatchOver,
}

/// Player-facing counters owned outside the simulation core.
///
/// The core calls into this collaborator to charge purchases, pay rewards and
/// apply leak damage, but never stores the values itself.
pub trait PlayerEconomy {
    /// Money currently available.
    fn money(&self) -> u32;

    /// Attempts to spend `amount`; returns `false` without mutation if unaffordable.
    fn spend_money(&mut self, amount: u32) -> bool;

    /// Credits `amount` to the player.
    fn add_money(&mut self, amount: u32);

    /// Remaining player health.
    fn health(&self) -> u32;

    /// Removes `amount` health from the player, saturating at zero.
    fn apply_damage(&mut self, amount: u32);

    /// Records a kill.
    fn add_kill(&mut self);
}

/// Source of the current time for every timer in the core.
pub trait Clock: std::fmt::Debug {
    /// Time elapsed since the match started.
    fn now(&self) -> Duration;

    /// Informs the clock that `dt` of scaled simulation time elapsed.
    fn advance(&mut self, dt: Duration);
}

/// Clock driven purely by the scaled simulation time fed into it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimulationClock {
    now: Duration,
}

impl SimulationClock {
    /// Creates a clock positioned at the provided instant.
    #[must_use]
    pub const fn starting_at(now: Duration) -> Self {
        Self { now }
    }
}

impl Clock for SimulationClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_set_membership_matches_construction() {
        let set = EnemyKindSet::of(&[EnemyKind::Fast, EnemyKind::Boss]);
        assert!(set.contains(EnemyKind::Fast));
        assert!(set.contains(EnemyKind::Boss));
        assert!(!set.contains(EnemyKind::Basic));
        assert!(EnemyKindSet::EMPTY.is_empty());
    }

    #[test]
    fn tower_profiles_never_prefer_and_penalise_the_same_kind() {
        for kind in TowerKind::ALL {
            let profile = kind.profile();
            for enemy in EnemyKind::ALL {
                assert!(
                    !(profile.target_priorities.contains(enemy)
                        && profile.weak_against.contains(enemy)),
                    "{kind:?} both prefers and is weak against {enemy:?}",
                );
            }
            assert!(profile.max_level >= 1);
            assert!(profile.fire_rate > 0.0);
        }
    }

    #[test]
    fn archer_matches_reference_numbers() {
        let profile = TowerKind::Archer.profile();
        assert_eq!(profile.damage, 10.0);
        assert_eq!(profile.range, 5.0);
        assert_eq!(profile.fire_rate, 1.0);
    }

    #[test]
    fn enemy_stats_start_without_resistance() {
        for kind in EnemyKind::ALL {
            let stats = kind.stats();
            assert_eq!(stats.resistance, 0.0);
            assert!(stats.health > 0.0);
        }
        assert!(EnemyKind::Flying.stats().flying);
        assert!(EnemyKind::Boss.stats().heavy);
    }

    #[test]
    fn simulation_clock_accumulates_advances() {
        let mut clock = SimulationClock::default();
        clock.advance(Duration::from_millis(250));
        clock.advance(Duration::from_millis(750));
        assert_eq!(clock.now(), Duration::from_secs(1));
    }

    #[test]
    fn command_errors_wrap_rejections() {
        let error = CommandError::from(UpgradeError::MaxLevel);
        assert_eq!(
            error.to_string(),
            "upgrade rejected: tower is already at its maximum level"
        );
    }
}

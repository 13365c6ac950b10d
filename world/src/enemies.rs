//! Authoritative enemy state and the arena that owns it.

use std::{collections::BTreeMap, time::Duration};

use endless_defence_core::{EnemyId, EnemyKind, EnemyStats, StatusKind, MAX_DAMAGE_RESISTANCE};
use endless_defence_system_status_effects::{Application, StatusLedger};
use glam::Vec3;

/// Interval between two tower-smashing attempts of a boss.
pub const SIEGE_INTERVAL: Duration = Duration::from_secs(8);

/// Enemy walking its own copy of the waypoint path.
#[derive(Clone, Debug)]
pub struct Enemy {
    id: EnemyId,
    kind: EnemyKind,
    position: Vec3,
    path: Vec<Vec3>,
    // Path length from the first waypoint up to each waypoint.
    cumulative: Vec<f32>,
    current_waypoint: usize,
    speed: f32,
    original_speed: f32,
    health: f32,
    max_health: f32,
    damage: u32,
    reward: u32,
    flying: bool,
    heavy: bool,
    resistance: f32,
    alive: bool,
    reached_end: bool,
    statuses: StatusLedger,
    confusion_heading: Option<Vec3>,
    siege_cooldown: Duration,
}

impl Enemy {
    /// Creates an enemy standing on the first waypoint of `path`.
    #[must_use]
    pub fn spawn(id: EnemyId, kind: EnemyKind, stats: EnemyStats, path: Vec<Vec3>) -> Self {
        debug_assert!(!path.is_empty(), "enemies need at least one waypoint");
        debug_assert!(
            (0.0..=MAX_DAMAGE_RESISTANCE).contains(&stats.resistance),
            "resistance out of range"
        );

        let position = path.first().copied().unwrap_or(Vec3::ZERO);
        let current_waypoint = path.len().min(1);
        let mut cumulative = Vec::with_capacity(path.len());
        append_cumulative(&mut cumulative, &path);
        Self {
            id,
            kind,
            position,
            path,
            cumulative,
            current_waypoint,
            speed: stats.speed,
            original_speed: stats.speed,
            health: stats.health,
            max_health: stats.health,
            damage: stats.damage,
            reward: stats.reward,
            flying: stats.flying,
            heavy: stats.heavy,
            resistance: stats.resistance.clamp(0.0, MAX_DAMAGE_RESISTANCE),
            alive: true,
            reached_end: false,
            statuses: StatusLedger::new(),
            confusion_heading: None,
            siege_cooldown: SIEGE_INTERVAL,
        }
    }

    /// Identifier of the enemy.
    #[must_use]
    pub const fn id(&self) -> EnemyId {
        self.id
    }

    /// Kind of the enemy.
    #[must_use]
    pub const fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Current world position.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// The enemy's own copy of its waypoint path.
    #[must_use]
    pub fn path(&self) -> &[Vec3] {
        &self.path
    }

    /// Index of the waypoint the enemy is walking towards.
    #[must_use]
    pub const fn current_waypoint(&self) -> usize {
        self.current_waypoint
    }

    /// Effective speed after status effects.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Speed the enemy was spawned with.
    #[must_use]
    pub const fn original_speed(&self) -> f32 {
        self.original_speed
    }

    /// Remaining health, never negative.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Health the enemy was spawned with.
    #[must_use]
    pub const fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Health removed from the player when the enemy leaks.
    #[must_use]
    pub const fn damage(&self) -> u32 {
        self.damage
    }

    /// Money paid for killing the enemy.
    #[must_use]
    pub const fn reward(&self) -> u32 {
        self.reward
    }

    /// Whether the enemy flies.
    #[must_use]
    pub const fn is_flying(&self) -> bool {
        self.flying
    }

    /// Whether the enemy is heavy.
    #[must_use]
    pub const fn is_heavy(&self) -> bool {
        self.heavy
    }

    /// Fraction of incoming damage ignored.
    #[must_use]
    pub const fn resistance(&self) -> f32 {
        self.resistance
    }

    /// Whether the enemy is still alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Whether the enemy walked off the end of its path.
    #[must_use]
    pub const fn has_reached_end(&self) -> bool {
        self.reached_end
    }

    /// Read access to the enemy's status ledger.
    #[must_use]
    pub const fn statuses(&self) -> &StatusLedger {
        &self.statuses
    }

    /// Applies post-resistance damage and returns the amount actually removed.
    ///
    /// Dead enemies ignore further damage. Health is clamped to zero, which is
    /// the death transition.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        if !self.alive || amount <= 0.0 {
            return 0.0;
        }

        let applied = amount.min(self.health);
        self.health -= applied;
        if self.health <= 0.0 {
            self.health = 0.0;
            self.alive = false;
        }
        applied
    }

    /// Applies a status effect, performing knock-back for instantaneous pushes.
    pub fn apply_status(&mut self, kind: StatusKind, duration: Duration, strength: f32, now: Duration) {
        if !self.alive {
            return;
        }

        match self.statuses.apply(kind, duration, strength, now) {
            Application::Timed => {}
            Application::Push { distance } => self.push_back(distance),
        }
        self.refresh_speed();
    }

    /// Advances status timers, applying burn damage.
    ///
    /// Returns the burn damage removed from health this call. Expired kinds
    /// are appended to `expired`.
    pub fn update_statuses(&mut self, now: Duration, expired: &mut Vec<StatusKind>) -> f32 {
        let burn = self.statuses.tick(now, expired);
        self.refresh_speed();
        self.take_damage(burn)
    }

    fn refresh_speed(&mut self) {
        self.speed = self.original_speed * self.statuses.speed_factor();
    }

    /// Remaining distance along the path until the end.
    ///
    /// Smaller values mean the enemy is closer to the player's base.
    #[must_use]
    pub fn remaining_distance(&self) -> f32 {
        let Some(next) = self.path.get(self.current_waypoint) else {
            return 0.0;
        };

        let total = self.cumulative.last().copied().unwrap_or(0.0);
        let tail = total - self.cumulative[self.current_waypoint];
        self.position.distance(*next) + tail
    }

    /// Moves the enemy to a new position without touching its waypoint index.
    pub fn move_to(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Advances the waypoint cursor by one.
    pub fn advance_waypoint(&mut self) {
        debug_assert!(
            self.current_waypoint < self.path.len(),
            "waypoint index advanced past the path end"
        );
        self.current_waypoint += 1;
    }

    /// Snaps the enemy back onto the waypoint it last passed.
    ///
    /// Used to recover when the gap to the current waypoint grows implausibly
    /// large, for example right after the path was spliced.
    pub fn snap_to_previous_waypoint(&mut self) {
        let index = self.current_waypoint.saturating_sub(1);
        if let Some(anchor) = self.path.get(index) {
            self.position = *anchor;
        }
    }

    /// Marks the enemy as having reached the end of its path.
    ///
    /// Returns `true` only for the first call.
    pub fn mark_reached_end(&mut self) -> bool {
        if self.reached_end {
            return false;
        }
        self.reached_end = true;
        true
    }

    /// Cached confusion perturbation heading.
    #[must_use]
    pub const fn confusion_heading(&self) -> Option<Vec3> {
        self.confusion_heading
    }

    /// Replaces the cached confusion heading.
    pub fn set_confusion_heading(&mut self, heading: Option<Vec3>) {
        self.confusion_heading = heading;
    }

    /// Appends waypoints to the enemy's own path, leaving position and index untouched.
    pub fn extend_path(&mut self, waypoints: &[Vec3]) {
        self.path.extend_from_slice(waypoints);
        append_cumulative(&mut self.cumulative, &self.path);
    }

    /// Counts down the siege timer of a boss; returns `true` when it is ready.
    pub fn tick_siege(&mut self, dt: Duration) -> bool {
        if self.kind != EnemyKind::Boss || !self.alive {
            return false;
        }
        self.siege_cooldown = self.siege_cooldown.saturating_sub(dt);
        self.siege_cooldown.is_zero()
    }

    /// Restarts the siege timer after a tower was smashed.
    pub fn reset_siege(&mut self) {
        self.siege_cooldown = SIEGE_INTERVAL;
    }

    fn push_back(&mut self, distance: f32) {
        let Some(previous) = self
            .current_waypoint
            .checked_sub(1)
            .and_then(|index| self.path.get(index))
        else {
            return;
        };

        let offset = *previous - self.position;
        let length = offset.length();
        if length <= f32::EPSILON {
            return;
        }
        self.position += offset / length * distance.min(length);
    }
}

/// Arena that owns every live enemy keyed by a stable identifier.
#[derive(Debug, Default)]
pub struct EnemyArena {
    entries: BTreeMap<EnemyId, Enemy>,
    next_enemy_id: u32,
}

impl EnemyArena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an identifier and stores the enemy produced by `build`.
    pub fn spawn_with<F>(&mut self, build: F) -> EnemyId
    where
        F: FnOnce(EnemyId) -> Enemy,
    {
        let id = EnemyId::new(self.next_enemy_id);
        self.next_enemy_id = self.next_enemy_id.saturating_add(1);
        let _ = self.entries.insert(id, build(id));
        id
    }

    /// Looks up an enemy.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.entries.get(&id)
    }

    /// Looks up an enemy mutably.
    pub fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.entries.get_mut(&id)
    }

    /// Iterates enemies in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.entries.values()
    }

    /// Iterates enemies mutably in identifier order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.entries.values_mut()
    }

    /// Number of enemies stored, including those awaiting removal.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of enemies that are alive and still on the path.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.entries
            .values()
            .filter(|enemy| enemy.is_alive() && !enemy.has_reached_end())
            .count()
    }

    /// Removes every dead or leaked enemy, returning them in identifier order.
    pub(crate) fn drain_finished(&mut self, out: &mut Vec<Enemy>) {
        let finished: Vec<EnemyId> = self
            .entries
            .values()
            .filter(|enemy| !enemy.is_alive() || enemy.has_reached_end())
            .map(Enemy::id)
            .collect();
        for id in finished {
            if let Some(enemy) = self.entries.remove(&id) {
                out.push(enemy);
            }
        }
    }
}

/// Extends `cumulative` so it holds one running path length per waypoint.
fn append_cumulative(cumulative: &mut Vec<f32>, path: &[Vec3]) {
    for index in cumulative.len()..path.len() {
        let length = match index.checked_sub(1) {
            Some(previous) => cumulative[previous] + path[previous].distance(path[index]),
            None => 0.0,
        };
        cumulative.push(length);
    }
}

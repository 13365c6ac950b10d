//! Authoritative tower state management utilities.

use std::{collections::BTreeMap, time::Duration};

use endless_defence_core::{
    CellCoord, EnemyId, SegmentId, TowerId, TowerKind, TowerProfile, UpgradeError,
};
use glam::Vec3;

/// Tower stored inside the world.
#[derive(Clone, Debug)]
pub struct Tower {
    id: TowerId,
    kind: TowerKind,
    profile: TowerProfile,
    position: Vec3,
    segment: SegmentId,
    cell: CellCoord,
    level: u32,
    damage: f32,
    range: f32,
    fire_rate: f32,
    cooldown: Duration,
    target: Option<EnemyId>,
    total_spent: u32,
}

impl Tower {
    /// Builds a level 1 tower from its profile; the purchase price counts as spent.
    #[must_use]
    pub fn new(
        id: TowerId,
        kind: TowerKind,
        profile: TowerProfile,
        position: Vec3,
        segment: SegmentId,
        cell: CellCoord,
    ) -> Self {
        Self {
            id,
            kind,
            profile,
            position,
            segment,
            cell,
            level: 1,
            damage: profile.damage,
            range: profile.range,
            fire_rate: profile.fire_rate,
            cooldown: Duration::ZERO,
            target: None,
            total_spent: profile.cost,
        }
    }

    /// Identifier allocated by the world for the tower.
    #[must_use]
    pub const fn id(&self) -> TowerId {
        self.id
    }

    /// Kind of tower that was constructed.
    #[must_use]
    pub const fn kind(&self) -> TowerKind {
        self.kind
    }

    /// Data table the tower was built from.
    #[must_use]
    pub const fn profile(&self) -> &TowerProfile {
        &self.profile
    }

    /// World position of the tower.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Segment hosting the tower.
    #[must_use]
    pub const fn segment(&self) -> SegmentId {
        self.segment
    }

    /// Grid cell occupied by the tower.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Current level, within `1..=max_level`.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Damage per shot at the current level.
    #[must_use]
    pub const fn damage(&self) -> f32 {
        self.damage
    }

    /// Targeting radius at the current level.
    #[must_use]
    pub const fn range(&self) -> f32 {
        self.range
    }

    /// Shots per second at the current level.
    #[must_use]
    pub const fn fire_rate(&self) -> f32 {
        self.fire_rate
    }

    /// Time left until the tower may fire again.
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Enemy the tower is currently tracking.
    #[must_use]
    pub const fn target(&self) -> Option<EnemyId> {
        self.target
    }

    /// Money spent on the tower so far, purchase included.
    #[must_use]
    pub const fn total_spent(&self) -> u32 {
        self.total_spent
    }

    /// Reports whether another upgrade is possible.
    #[must_use]
    pub const fn is_max_level(&self) -> bool {
        self.level >= self.profile.max_level
    }

    /// Price of the next upgrade, or `None` at maximum level.
    #[must_use]
    pub fn next_upgrade_cost(&self) -> Option<u32> {
        if self.is_max_level() {
            return None;
        }
        let cost = self.profile.cost as f32 * self.profile.upgrade_cost_factor * self.level as f32;
        Some(cost.round() as u32)
    }

    /// Refund paid when the tower is sold.
    #[must_use]
    pub fn sell_value(&self, refund_fraction: f32) -> u32 {
        (self.total_spent as f32 * refund_fraction.clamp(0.0, 1.0)).floor() as u32
    }

    /// Raises the level by one after `paid` was charged.
    pub fn upgrade(&mut self, paid: u32) -> Result<u32, UpgradeError> {
        if self.is_max_level() {
            return Err(UpgradeError::MaxLevel);
        }

        self.level += 1;
        self.damage *= self.profile.damage_growth;
        self.range *= self.profile.range_growth;
        self.fire_rate *= self.profile.fire_rate_growth;
        self.total_spent = self.total_spent.saturating_add(paid);
        Ok(self.level)
    }

    /// Counts the cooldown down by `dt` and reports whether the tower may fire.
    pub fn tick_cooldown(&mut self, dt: Duration) -> bool {
        self.cooldown = self.cooldown.saturating_sub(dt);
        self.cooldown.is_zero()
    }

    /// Restarts the cooldown after a shot; leftover time is discarded.
    pub fn reset_cooldown(&mut self) {
        debug_assert!(self.fire_rate > 0.0, "fire rate must stay positive");
        self.cooldown = Duration::from_secs_f32(1.0 / self.fire_rate);
    }

    /// Replaces the tracked target.
    pub fn set_target(&mut self, target: Option<EnemyId>) {
        self.target = target;
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug, Default)]
pub struct TowerRegistry {
    entries: BTreeMap<TowerId, Tower>,
    next_tower_id: u32,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an identifier and stores the tower produced by `build`.
    pub fn insert_with<F>(&mut self, build: F) -> TowerId
    where
        F: FnOnce(TowerId) -> Tower,
    {
        let id = TowerId::new(self.next_tower_id);
        self.next_tower_id = self.next_tower_id.saturating_add(1);
        let _ = self.entries.insert(id, build(id));
        id
    }

    /// Looks up a tower.
    #[must_use]
    pub fn get(&self, id: TowerId) -> Option<&Tower> {
        self.entries.get(&id)
    }

    /// Looks up a tower mutably.
    pub fn get_mut(&mut self, id: TowerId) -> Option<&mut Tower> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: TowerId) -> Option<Tower> {
        self.entries.remove(&id)
    }

    /// Iterates towers in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Tower> {
        self.entries.values()
    }

    /// Iterates towers mutably in identifier order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tower> {
        self.entries.values_mut()
    }

    /// Number of towers stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no tower is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(id: TowerId, kind: TowerKind, column: u32) -> Tower {
        Tower::new(
            id,
            kind,
            kind.profile(),
            Vec3::new(column as f32, 0.0, 0.0),
            SegmentId::new(0),
            CellCoord::new(column, 0),
        )
    }

    fn archer() -> Tower {
        build(TowerId::new(0), TowerKind::Archer, 0)
    }

    #[test]
    fn new_tower_starts_at_level_one_ready_to_fire() {
        let tower = archer();
        assert_eq!(tower.level(), 1);
        assert!(tower.cooldown().is_zero());
        assert_eq!(tower.total_spent(), 50);
        assert_eq!(tower.target(), None);
    }

    #[test]
    fn upgrade_cost_scales_with_level() {
        let mut tower = archer();
        assert_eq!(tower.next_upgrade_cost(), Some(38), "round(50 * 0.75 * 1)");
        let _ = tower.upgrade(38).expect("upgrade");
        assert_eq!(tower.next_upgrade_cost(), Some(75), "round(50 * 0.75 * 2)");
        assert!((tower.damage() - 13.0).abs() < 1e-4);
        assert_eq!(tower.total_spent(), 88);
    }

    #[test]
    fn upgrade_at_max_level_leaves_tower_untouched() {
        let mut tower = archer();
        for _ in 1..tower.profile().max_level {
            let _ = tower.upgrade(0).expect("upgrade below max");
        }
        let damage = tower.damage();

        assert_eq!(tower.upgrade(10), Err(UpgradeError::MaxLevel));
        assert_eq!(tower.level(), tower.profile().max_level);
        assert_eq!(tower.damage(), damage);
        assert_eq!(tower.next_upgrade_cost(), None);
    }

    #[test]
    fn sell_value_floors_the_refund() {
        let mut tower = archer();
        let _ = tower.upgrade(38).expect("upgrade");
        assert_eq!(tower.sell_value(0.7), 61, "floor(88 * 0.7)");
    }

    #[test]
    fn cooldown_resets_to_inverse_fire_rate() {
        let mut tower = archer();
        assert!(tower.tick_cooldown(Duration::from_millis(16)));
        tower.reset_cooldown();
        assert_eq!(tower.cooldown(), Duration::from_secs(1));
        assert!(!tower.tick_cooldown(Duration::from_millis(600)));
        assert!(tower.tick_cooldown(Duration::from_millis(600)));
    }

    #[test]
    fn registry_allocates_sequential_identifiers() {
        let mut registry = TowerRegistry::new();
        let first = registry.insert_with(|id| build(id, TowerKind::Archer, 0));
        let second = registry.insert_with(|id| build(id, TowerKind::Frost, 1));
        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
        assert_eq!(registry.len(), 2);
        assert!(registry.remove(first).is_some());
        assert!(registry.get(first).is_none());
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for Endless Defence.
//!
//! The world owns the enemy arena, the tower registry and the map segment
//! graph. Systems borrow these pieces to compute combat and movement, while
//! structural mutations (spawning, placement, removal, map extension) go
//! through the methods on [`World`] so grid occupancy and enemy paths stay
//! consistent.

mod enemies;
mod segments;
mod towers;

use endless_defence_core::{
    CellCoord, EnemyId, EnemyKind, EnemyStats, PlacementError, SegmentId, TowerId, TowerKind,
};
use glam::Vec3;

pub use enemies::{Enemy, EnemyArena, SIEGE_INTERVAL};
pub use segments::{
    derive_stream_seed, BuildGrid, CellState, Extension, GridSpec, MapSegment, MapSegmentGraph,
    BRIDGE_LENGTH, MAX_WAYPOINT_SPACING,
};
pub use towers::{Tower, TowerRegistry};

/// Legal build site resolved from a world position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Segment hosting the cell.
    pub segment: SegmentId,
    /// Free cell inside the segment grid.
    pub cell: CellCoord,
    /// Centre of the cell; towers snap to it.
    pub position: Vec3,
}

/// Represents the authoritative Endless Defence world state.
#[derive(Debug)]
pub struct World {
    enemies: EnemyArena,
    towers: TowerRegistry,
    map: MapSegmentGraph,
}

impl World {
    /// Creates a world whose first map segment is generated from `seed`.
    #[must_use]
    pub fn new(seed: u64, grid: GridSpec) -> Self {
        Self {
            enemies: EnemyArena::new(),
            towers: TowerRegistry::new(),
            map: MapSegmentGraph::new(seed, grid),
        }
    }

    /// Read access to the enemy arena.
    #[must_use]
    pub const fn enemies(&self) -> &EnemyArena {
        &self.enemies
    }

    /// Mutable access to enemy state for combat and movement systems.
    pub fn enemies_mut(&mut self) -> &mut EnemyArena {
        &mut self.enemies
    }

    /// Read access to the tower registry.
    #[must_use]
    pub const fn towers(&self) -> &TowerRegistry {
        &self.towers
    }

    /// Mutable access to tower state for the combat system.
    pub fn towers_mut(&mut self) -> &mut TowerRegistry {
        &mut self.towers
    }

    /// Splits the world into towers and enemies so both can be borrowed at once.
    pub fn combatants_mut(&mut self) -> (&mut TowerRegistry, &mut EnemyArena) {
        (&mut self.towers, &mut self.enemies)
    }

    /// Read access to the map segment graph.
    #[must_use]
    pub const fn map(&self) -> &MapSegmentGraph {
        &self.map
    }

    /// Spawns an enemy at the head of the composite path with its own path copy.
    pub fn spawn_enemy(&mut self, kind: EnemyKind, stats: EnemyStats) -> EnemyId {
        let path = self.map.composite_path().to_vec();
        self.enemies
            .spawn_with(|id| Enemy::spawn(id, kind, stats, path))
    }

    /// Resolves the free cell under `position`.
    pub fn check_placement(&self, position: Vec3) -> Result<Placement, PlacementError> {
        let (segment, cell) = self.map.locate_free_cell(position)?;
        let center = self
            .map
            .segment(segment)
            .map(|segment| segment.grid().center(cell))
            .unwrap_or(position);
        Ok(Placement {
            segment,
            cell,
            position: center,
        })
    }

    /// Constructs a tower on a previously validated placement.
    pub fn place_tower(&mut self, kind: TowerKind, placement: Placement) -> TowerId {
        let id = self.towers.insert_with(|id| {
            Tower::new(
                id,
                kind,
                kind.profile(),
                placement.position,
                placement.segment,
                placement.cell,
            )
        });
        if let Some(segment) = self.map.segment_mut(placement.segment) {
            segment.grid_mut().set(placement.cell, CellState::Tower(id));
        }
        id
    }

    /// Removes a tower and frees its cell.
    pub fn remove_tower(&mut self, id: TowerId) -> Option<Tower> {
        let Some(tower) = self.towers.remove(id) else {
            tracing::debug!(tower = id.get(), "remove requested for unknown tower");
            return None;
        };
        if let Some(segment) = self.map.segment_mut(tower.segment()) {
            segment.grid_mut().set(tower.cell(), CellState::Open);
        }
        Some(tower)
    }

    /// Appends a segment and splices the new waypoints onto every in-flight enemy.
    pub fn extend_map(&mut self) -> Extension {
        let extension = self.map.extend();
        self.extend_in_flight_paths(&extension);
        tracing::info!(
            segment = extension.segment.get(),
            waypoints = extension.bridge.len() + extension.path.len(),
            "map extended"
        );
        extension
    }

    /// Appends bridge and path waypoints to every alive enemy's own path.
    ///
    /// Positions and waypoint indices are left untouched.
    pub fn extend_in_flight_paths(&mut self, extension: &Extension) {
        let waypoints: Vec<Vec3> = extension.waypoints().copied().collect();
        for enemy in self.enemies.iter_mut().filter(|enemy| enemy.is_alive()) {
            enemy.extend_path(&waypoints);
        }
    }

    /// Removes dead and leaked enemies, appending them to `out` in id order.
    pub fn remove_finished(&mut self, out: &mut Vec<Enemy>) {
        self.enemies.drain_finished(out);
    }

    /// Nearest tower within `radius` of `position`, ties broken by lowest id.
    #[must_use]
    pub fn nearest_tower(&self, position: Vec3, radius: f32) -> Option<TowerId> {
        self.towers
            .iter()
            .map(|tower| (tower.position().distance(position), tower.id()))
            .filter(|(distance, _)| *distance <= radius)
            .min_by(|left, right| left.0.total_cmp(&right.0).then(left.1.cmp(&right.1)))
            .map(|(_, id)| id)
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use endless_defence_core::{EnemyId, EnemyKind, StatusKind, TowerId, TowerKind};
    use glam::Vec3;

    use super::{CellState, World};

    /// Tower occupying the grid cell under `position`, if any.
    #[must_use]
    pub fn tower_at(world: &World, position: Vec3) -> Option<TowerId> {
        let grid = world.map.resolve_segment(position)?.grid();
        match grid.state(grid.cell_at(position)?)? {
            CellState::Tower(id) => Some(id),
            CellState::Open | CellState::Path => None,
        }
    }

    /// Captures a read-only view of the enemies on the map.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let snapshots = world
            .enemies
            .iter()
            .map(|enemy| EnemySnapshot {
                id: enemy.id(),
                kind: enemy.kind(),
                position: enemy.position(),
                health: enemy.health(),
                max_health: enemy.max_health(),
                flying: enemy.is_flying(),
                statuses: enemy.statuses().iter().map(|entry| entry.kind).collect(),
            })
            .collect();
        EnemyView { snapshots }
    }

    /// Captures a read-only view of the towers on the map.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        let snapshots = world
            .towers
            .iter()
            .map(|tower| TowerSnapshot {
                id: tower.id(),
                kind: tower.kind(),
                position: tower.position(),
                level: tower.level(),
                range: tower.range(),
                target: tower.target(),
            })
            .collect();
        TowerView { snapshots }
    }

    /// Read-only snapshot describing all enemies, ordered by identifier.
    #[derive(Clone, Debug)]
    pub struct EnemyView {
        snapshots: Vec<EnemySnapshot>,
    }

    impl EnemyView {
        /// Iterator over the captured enemy snapshots in deterministic order.
        pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        pub fn into_vec(self) -> Vec<EnemySnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single enemy used for rendering.
    #[derive(Clone, Debug, PartialEq)]
    pub struct EnemySnapshot {
        /// Unique identifier assigned to the enemy.
        pub id: EnemyId,
        /// Kind of the enemy.
        pub kind: EnemyKind,
        /// World position.
        pub position: Vec3,
        /// Remaining health.
        pub health: f32,
        /// Health at spawn.
        pub max_health: f32,
        /// Whether the enemy flies.
        pub flying: bool,
        /// Active status kinds.
        pub statuses: Vec<StatusKind>,
    }

    /// Read-only snapshot describing all towers, ordered by identifier.
    #[derive(Clone, Debug)]
    pub struct TowerView {
        snapshots: Vec<TowerSnapshot>,
    }

    impl TowerView {
        /// Iterator over the captured tower snapshots in deterministic order.
        pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        pub fn into_vec(self) -> Vec<TowerSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single tower used for rendering.
    #[derive(Clone, Debug, PartialEq)]
    pub struct TowerSnapshot {
        /// Unique identifier assigned to the tower.
        pub id: TowerId,
        /// Kind of the tower.
        pub kind: TowerKind,
        /// World position.
        pub position: Vec3,
        /// Current level.
        pub level: u32,
        /// Current range.
        pub range: f32,
        /// Enemy currently tracked.
        pub target: Option<EnemyId>,
    }
}

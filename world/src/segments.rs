//! Procedurally appended map segments and the composite enemy path.
//!
//! Segments are laid out back to back along the +Z axis, separated by a
//! bridge gap. Each segment owns a square-cell build grid and a serpentine
//! waypoint path through it; the path of segment `n` is reproducible from the
//! match seed and `n` alone.

use endless_defence_core::{CellCoord, PlacementError, SegmentId, TowerId};
use glam::Vec3;
use rand::{seq::index, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

/// Gap left along Z between the end of one segment and the start of the next.
pub const BRIDGE_LENGTH: f32 = 6.0;

/// Largest distance between two consecutive waypoints of any generated path.
pub const MAX_WAYPOINT_SPACING: f32 = 1.0;

const SEGMENT_STREAM_LABEL: &str = "segment";

/// Dimensions of every segment's build grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridSpec {
    /// Number of cells across the X axis.
    pub columns: u32,
    /// Number of cells along the Z axis.
    pub rows: u32,
    /// Side length of a square cell in world units.
    pub cell_size: f32,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            columns: 12,
            rows: 20,
            cell_size: 1.0,
        }
    }
}

impl GridSpec {
    /// World-space width of a segment.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.cell_size
    }

    /// World-space depth of a segment.
    #[must_use]
    pub fn depth(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }
}

/// Occupancy state of a single build cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellState {
    /// Free for construction.
    Open,
    /// Covered by the enemy path.
    Path,
    /// Occupied by a tower.
    Tower(TowerId),
}

/// Dense grid of build cells anchored at a world-space origin.
#[derive(Clone, Debug)]
pub struct BuildGrid {
    origin: Vec3,
    spec: GridSpec,
    cells: Vec<CellState>,
}

impl BuildGrid {
    fn new(origin: Vec3, spec: GridSpec) -> Self {
        let count = spec.columns as usize * spec.rows as usize;
        Self {
            origin,
            spec,
            cells: vec![CellState::Open; count],
        }
    }

    /// Dimensions of the grid.
    #[must_use]
    pub const fn spec(&self) -> GridSpec {
        self.spec
    }

    /// Cell containing the world position, if any.
    #[must_use]
    pub fn cell_at(&self, position: Vec3) -> Option<CellCoord> {
        let local = position - self.origin;
        if local.x < 0.0 || local.z < 0.0 {
            return None;
        }

        let column = (local.x / self.spec.cell_size).floor() as u32;
        let row = (local.z / self.spec.cell_size).floor() as u32;
        (column < self.spec.columns && row < self.spec.rows).then(|| CellCoord::new(column, row))
    }

    /// World-space centre of a cell.
    #[must_use]
    pub fn center(&self, cell: CellCoord) -> Vec3 {
        let size = self.spec.cell_size;
        self.origin
            + Vec3::new(
                (cell.column() as f32 + 0.5) * size,
                0.0,
                (cell.row() as f32 + 0.5) * size,
            )
    }

    /// State of a cell, or `None` when outside the grid.
    #[must_use]
    pub fn state(&self, cell: CellCoord) -> Option<CellState> {
        self.index(cell).map(|index| self.cells[index])
    }

    /// Iterates every cell with its state in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, CellState)> + '_ {
        let columns = self.spec.columns;
        self.cells.iter().enumerate().map(move |(index, state)| {
            let index = index as u32;
            (CellCoord::new(index % columns, index / columns), *state)
        })
    }

    pub(crate) fn set(&mut self, cell: CellCoord, state: CellState) {
        if let Some(index) = self.index(cell) {
            self.cells[index] = state;
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() >= self.spec.columns || cell.row() >= self.spec.rows {
            return None;
        }
        Some(cell.row() as usize * self.spec.columns as usize + cell.column() as usize)
    }
}

/// A single procedurally generated stretch of the map.
#[derive(Clone, Debug)]
pub struct MapSegment {
    id: SegmentId,
    grid: BuildGrid,
    path: Vec<Vec3>,
    z_start: f32,
    z_end: f32,
    bridge: Option<Vec<Vec3>>,
}

impl MapSegment {
    /// Identifier of the segment.
    #[must_use]
    pub const fn id(&self) -> SegmentId {
        self.id
    }

    /// Build grid of the segment.
    #[must_use]
    pub const fn grid(&self) -> &BuildGrid {
        &self.grid
    }

    pub(crate) fn grid_mut(&mut self) -> &mut BuildGrid {
        &mut self.grid
    }

    /// Waypoints enemies follow through this segment.
    #[must_use]
    pub fn path(&self) -> &[Vec3] {
        &self.path
    }

    /// Half-open Z range `[start, end)` covered by the segment.
    #[must_use]
    pub const fn z_range(&self) -> (f32, f32) {
        (self.z_start, self.z_end)
    }

    /// Bridge towards the next segment, present once this segment was superseded.
    #[must_use]
    pub fn bridge(&self) -> Option<&[Vec3]> {
        self.bridge.as_deref()
    }

    fn contains_z(&self, z: f32) -> bool {
        z >= self.z_start && z < self.z_end
    }
}

/// Waypoints appended to the map by a single extension.
#[derive(Clone, Debug, PartialEq)]
pub struct Extension {
    /// Identifier of the new segment.
    pub segment: SegmentId,
    /// Waypoints joining the previous tail to the new head, both excluded.
    pub bridge: Vec<Vec3>,
    /// Waypoints of the new segment.
    pub path: Vec<Vec3>,
}

impl Extension {
    /// Bridge followed by the new path, in walking order.
    pub fn waypoints(&self) -> impl Iterator<Item = &Vec3> {
        self.bridge.iter().chain(self.path.iter())
    }
}

/// Ordered collection of segments; segments are appended and never removed.
#[derive(Clone, Debug)]
pub struct MapSegmentGraph {
    seed: u64,
    spec: GridSpec,
    segments: Vec<MapSegment>,
    composite: Vec<Vec3>,
}

impl MapSegmentGraph {
    /// Creates the graph with its first segment already generated.
    #[must_use]
    pub fn new(seed: u64, spec: GridSpec) -> Self {
        debug_assert!(spec.columns > 0 && spec.rows > 0, "grid must not be empty");
        debug_assert!(spec.cell_size > 0.0, "cells must have a positive size");

        let first = generate_segment(seed, spec, 0, None);
        let composite = first.path.clone();
        Self {
            seed,
            spec,
            segments: vec![first],
            composite,
        }
    }

    /// Appends a new segment and bridges the previous tail to its head.
    pub fn extend(&mut self) -> Extension {
        let index = self.segments.len() as u32;
        let previous_exit = self
            .segments
            .last()
            .and_then(|segment| segment.path.last().copied());
        let segment = generate_segment(self.seed, self.spec, index, previous_exit);

        let bridge = match (previous_exit, segment.path.first()) {
            (Some(tail), Some(head)) => bridge_between(tail, *head),
            _ => Vec::new(),
        };
        if let Some(superseded) = self.segments.last_mut() {
            superseded.bridge = Some(bridge.clone());
        }

        let extension = Extension {
            segment: segment.id,
            bridge,
            path: segment.path.clone(),
        };
        self.composite.extend(extension.waypoints().copied());
        self.segments.push(segment);
        extension
    }

    /// All segment paths joined by their bridges, used for new spawns.
    #[must_use]
    pub fn composite_path(&self) -> &[Vec3] {
        &self.composite
    }

    /// Segment whose Z range contains the position.
    #[must_use]
    pub fn resolve_segment(&self, position: Vec3) -> Option<&MapSegment> {
        self.segments
            .iter()
            .find(|segment| segment.contains_z(position.z))
    }

    /// Resolves the build cell under a position and checks that it is free.
    pub fn locate_free_cell(
        &self,
        position: Vec3,
    ) -> Result<(SegmentId, CellCoord), PlacementError> {
        let segment = self
            .resolve_segment(position)
            .ok_or(PlacementError::NoSegment)?;
        let cell = segment
            .grid
            .cell_at(position)
            .ok_or(PlacementError::OutOfBounds)?;
        match segment.grid.state(cell) {
            Some(CellState::Open) => Ok((segment.id, cell)),
            Some(CellState::Path) => Err(PlacementError::PathCell),
            Some(CellState::Tower(_)) => Err(PlacementError::Occupied),
            None => Err(PlacementError::OutOfBounds),
        }
    }

    /// Segment with the provided identifier.
    #[must_use]
    pub fn segment(&self, id: SegmentId) -> Option<&MapSegment> {
        self.segments.get(id.get() as usize)
    }

    pub(crate) fn segment_mut(&mut self, id: SegmentId) -> Option<&mut MapSegment> {
        self.segments.get_mut(id.get() as usize)
    }

    /// All segments in creation order.
    #[must_use]
    pub fn segments(&self) -> &[MapSegment] {
        &self.segments
    }
}

/// Derives an independent 64-bit seed for the labelled random stream.
#[must_use]
pub fn derive_stream_seed(base: u64, label: &str, index: u64) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(label.as_bytes());
    hasher.update(index.to_le_bytes());
    finalize_seed(hasher)
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

fn generate_segment(
    seed: u64,
    spec: GridSpec,
    index: u32,
    previous_exit: Option<Vec3>,
) -> MapSegment {
    let mut rng = ChaCha8Rng::seed_from_u64(derive_stream_seed(
        seed,
        SEGMENT_STREAM_LABEL,
        u64::from(index),
    ));

    let z_start = index as f32 * (spec.depth() + BRIDGE_LENGTH);
    let origin = Vec3::new(-spec.width() * 0.5, 0.0, z_start);
    let mut grid = BuildGrid::new(origin, spec);

    let corners = serpentine_corners(&mut rng, spec, previous_exit.is_none());
    let corner_points: Vec<Vec3> = corners.iter().map(|cell| grid.center(*cell)).collect();
    let spacing = MAX_WAYPOINT_SPACING.min(spec.cell_size);
    let path = densify(&corner_points, spacing);

    for waypoint in &path {
        if let Some(cell) = grid.cell_at(*waypoint) {
            grid.set(cell, CellState::Path);
        }
    }

    MapSegment {
        id: SegmentId::new(index),
        grid,
        path,
        z_start,
        z_end: z_start + spec.depth(),
        bridge: None,
    }
}

fn serpentine_corners(rng: &mut ChaCha8Rng, spec: GridSpec, centered_entry: bool) -> Vec<CellCoord> {
    let (low, high) = if spec.columns >= 3 {
        (1, spec.columns - 1)
    } else {
        (0, spec.columns)
    };
    let mut column = if centered_entry {
        spec.columns / 2
    } else {
        rng.gen_range(low..high)
    };

    // Turn rows stay clear of the entry and exit rows so every leg has length.
    let candidate_rows = spec.rows.saturating_sub(3);
    let turns = if candidate_rows == 0 {
        0
    } else {
        rng.gen_range(2..=4).min(candidate_rows)
    };
    let mut turn_rows: Vec<u32> = index::sample(rng, candidate_rows as usize, turns as usize)
        .into_iter()
        .map(|offset| offset as u32 + 1)
        .collect();
    turn_rows.sort_unstable();

    let mut corners = vec![CellCoord::new(column, 0)];
    for row in turn_rows {
        corners.push(CellCoord::new(column, row));
        column = rng.gen_range(low..high);
        corners.push(CellCoord::new(column, row));
    }
    corners.push(CellCoord::new(column, spec.rows - 1));
    corners
}

fn bridge_between(tail: Vec3, head: Vec3) -> Vec<Vec3> {
    let middle = (tail.z + head.z) * 0.5;
    let corners = [
        tail,
        Vec3::new(tail.x, tail.y, middle),
        Vec3::new(head.x, head.y, middle),
        head,
    ];
    let mut bridge = densify(&corners, MAX_WAYPOINT_SPACING);
    let _ = bridge.remove(0);
    let _ = bridge.pop();
    bridge
}

/// Resamples a polyline so no two consecutive points are further than `spacing` apart.
fn densify(corners: &[Vec3], spacing: f32) -> Vec<Vec3> {
    let Some(first) = corners.first() else {
        return Vec::new();
    };

    let mut points = vec![*first];
    for pair in corners.windows(2) {
        let length = pair[0].distance(pair[1]);
        if length <= f32::EPSILON {
            continue;
        }
        let steps = (length / spacing).ceil().max(1.0) as u32;
        for step in 1..=steps {
            points.push(pair[0].lerp(pair[1], step as f32 / steps as f32));
        }
    }
    points
}

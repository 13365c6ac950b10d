#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Placement selection: pick a tower kind, hover a position, then confirm or cancel.
//!
//! The builder never mutates the world. Confirming a legal, affordable preview
//! emits [`Command::PlaceTower`]; cancelling simply drops the selection.

use endless_defence_core::{CellCoord, Command, PlacementError, TowerKind};
use endless_defence_world::{query, World};
use glam::Vec3;

/// Declarative placement preview describing a potential tower construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementPreview {
    /// Kind of tower proposed for placement.
    pub kind: TowerKind,
    /// Position the tower would snap to, or the raw cursor when no cell resolves.
    pub position: Vec3,
    /// Cell the tower would occupy, when one resolves.
    pub cell: Option<CellCoord>,
    /// Purchase price of the tower.
    pub cost: u32,
    /// Reason the placement would be rejected, if any.
    pub rejection: Option<PlacementError>,
}

impl PlacementPreview {
    /// Indicates whether the preview represents a valid, affordable placement.
    #[must_use]
    pub const fn placeable(&self) -> bool {
        self.rejection.is_none()
    }
}

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BuilderInput {
    /// Indicates whether the player confirmed a placement on this frame.
    pub confirm_action: bool,
    /// Indicates whether the player abandoned the current selection.
    pub cancel_action: bool,
    /// Indicates whether the player asked to sell the hovered tower.
    pub sell_action: bool,
    /// World position currently hovered by the cursor.
    pub cursor: Option<Vec3>,
}

/// Placement selection state machine.
#[derive(Clone, Debug, Default)]
pub struct Builder {
    selected: Option<TowerKind>,
}

impl Builder {
    /// Creates a builder with nothing selected.
    #[must_use]
    pub const fn new() -> Self {
        Self { selected: None }
    }

    /// Selects the tower kind to place next.
    pub fn select(&mut self, kind: TowerKind) {
        self.selected = Some(kind);
    }

    /// Kind currently selected for placement.
    #[must_use]
    pub const fn selected(&self) -> Option<TowerKind> {
        self.selected
    }

    /// Drops the current selection without side effects.
    pub fn cancel(&mut self) {
        self.selected = None;
    }

    /// Previews the selected tower at `cursor` for a player holding `money`.
    #[must_use]
    pub fn preview(&self, world: &World, money: u32, cursor: Vec3) -> Option<PlacementPreview> {
        let kind = self.selected?;
        let cost = kind.profile().cost;
        let preview = match world.check_placement(cursor) {
            Ok(site) => PlacementPreview {
                kind,
                position: site.position,
                cell: Some(site.cell),
                cost,
                rejection: (money < cost).then_some(PlacementError::InsufficientFunds),
            },
            Err(error) => PlacementPreview {
                kind,
                position: cursor,
                cell: None,
                cost,
                rejection: Some(error),
            },
        };
        Some(preview)
    }

    /// Translates the frame's input into placement or sale commands.
    pub fn handle(&mut self, world: &World, money: u32, input: BuilderInput, out: &mut Vec<Command>) {
        if input.cancel_action {
            self.cancel();
            return;
        }

        let Some(cursor) = input.cursor else {
            return;
        };

        if input.confirm_action {
            if let Some(preview) = self.preview(world, money, cursor) {
                if preview.placeable() {
                    out.push(Command::PlaceTower {
                        kind: preview.kind,
                        position: preview.position,
                    });
                    self.selected = None;
                }
            }
        }

        if input.sell_action {
            if let Some(tower) = query::tower_at(world, cursor) {
                out.push(Command::SellTower { tower });
            }
        }
    }
}

use alloc::vec::Vec;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// What the player can see of a cell. Covered cells never leak their occupant.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellView {
    #[default]
    Covered,
    Flagged,
    Revealed { hint: u8, occupant: Occupant },
}

impl From<&Cell> for CellView {
    fn from(cell: &Cell) -> Self {
        if cell.flagged {
            Self::Flagged
        } else if cell.covered {
            Self::Covered
        } else {
            Self::Revealed {
                hint: cell.hint,
                occupant: cell.occupant,
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub position: Coord2,
    pub health: i32,
    pub max_health: i32,
    pub coins: CellCount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyView {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub origin: Coord2,
    pub cells: Footprint,
    pub health: i32,
    pub stunned: bool,
    /// At least one footprint cell is uncovered.
    pub revealed: bool,
}

/// Read-only picture of a session for rendering or serialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub level: u8,
    pub size: Coord,
    pub exit: Coord2,
    pub coins_required: CellCount,
    pub player: PlayerView,
    /// Only enemies with at least one uncovered cell.
    pub enemies: Vec<EnemyView>,
    pub cells: Array2<CellView>,
    pub shake: u8,
}

impl Snapshot {
    pub fn from_world(world: &World, shake: u8) -> Self {
        let grid = world.grid();
        let player = world.player();

        let enemies = world
            .enemies()
            .iter()
            .filter(|enemy| enemy.is_alive())
            .map(|enemy| {
                let cells = enemy.occupied_cells();
                let revealed = cells.iter().any(|&pos| grid.valid(pos) && !grid[pos].covered);
                EnemyView {
                    id: enemy.id(),
                    kind: enemy.kind(),
                    origin: enemy.origin(),
                    cells,
                    health: enemy.health(),
                    stunned: enemy.is_stunned(),
                    revealed,
                }
            })
            .filter(|view| view.revealed)
            .collect();

        let size = grid.size();
        let cells = Array2::from_shape_fn((size, size).to_nd_index(), |(x, y)| {
            CellView::from(&grid[(x as Coord, y as Coord)])
        });

        Self {
            phase: world.phase(),
            level: world.level(),
            size,
            exit: world.exit(),
            coins_required: world.coins_required(),
            player: PlayerView {
                position: player.position(),
                health: player.health(),
                max_health: player.max_health(),
                coins: player.coins(),
            },
            enemies,
            cells,
            shake,
        }
    }

    pub fn cell(&self, coords: Coord2) -> Option<CellView> {
        self.cells.get(coords.to_nd_index()).copied()
    }
}

use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::*;

/// Valid transitions:
/// - Playing -> Won
/// - Playing -> Lost
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Playing,
    Won,
    Lost,
}

impl Phase {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Everything a turn mutates: the board, the player, the enemies and the phase.
#[derive(Clone, Debug, PartialEq)]
pub struct World {
    pub(crate) grid: Grid,
    pub(crate) player: Player,
    pub(crate) enemies: Vec<Enemy>,
    pub(crate) phase: Phase,
    pub(crate) level: u8,
    pub(crate) coins_required: CellCount,
    pub(crate) ids: IdAllocator,
}

impl World {
    pub fn new(player: Player) -> Self {
        Self {
            grid: Grid::new(1),
            player,
            enemies: Vec::new(),
            phase: Phase::Playing,
            level: 0,
            coins_required: 0,
            ids: IdAllocator::default(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.enemies.iter().find(|enemy| enemy.id() == id)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn coins_required(&self) -> CellCount {
        self.coins_required
    }

    /// Bottom-right cell that completes the level once enough coins are held.
    pub fn exit(&self) -> Coord2 {
        let last = self.grid.size().saturating_sub(1);
        (last, last)
    }

    /// Swaps in a fresh level, puts the player on the spawn cell and opens it.
    pub(crate) fn load_level(
        &mut self,
        level: Level,
        index: u8,
        config: &GameConfig,
        events: &mut Vec<GameEvent>,
    ) {
        let Level { grid, enemies, .. } = level;
        let coins_on_board = grid.count_cells(|cell| cell.occupant == Occupant::Coin);

        self.grid = grid;
        self.enemies = enemies;
        self.level = index;
        self.coins_required = config.coins_required.min(coins_on_board);
        self.player.enter_level();

        let size = self.grid.size();
        log::debug!(
            "Loaded level {} of size {}, {} enemies, {} coins required",
            index,
            size,
            self.enemies.len(),
            self.coins_required
        );
        events.push(GameEvent::LevelLoaded { size });

        let outcome = self.grid.reveal(self.player.position(), events);
        self.stun_exposed(&outcome, events);
    }

    /// Stuns every enemy a reveal just uncovered.
    pub(crate) fn stun_exposed(&mut self, outcome: &RevealOutcome, events: &mut Vec<GameEvent>) {
        for &id in &outcome.exposed {
            if let Some(enemy) = self.enemies.iter_mut().find(|enemy| enemy.id() == id) {
                if enemy.stun() {
                    events.push(GameEvent::Stunned { entity: id });
                }
            }
        }
    }

    pub(crate) fn purge_dead(&mut self) {
        self.enemies.retain(|enemy| enemy.is_alive());
    }

    /// Checks that grid enemy markers and live enemy footprints describe the same cells.
    pub fn markers_consistent(&self) -> bool {
        let mut footprint_cells = 0usize;
        for enemy in self.enemies.iter().filter(|enemy| enemy.is_alive()) {
            for pos in enemy.occupied_cells() {
                if !self.grid.valid(pos) || self.grid[pos].occupant != Occupant::Enemy(enemy.id()) {
                    return false;
                }
                footprint_cells += 1;
            }
        }
        let marked = self
            .grid
            .count_cells(|cell| cell.occupant.enemy().is_some());
        usize::from(marked) == footprint_cells
    }

    /// Checks every stored hint against a fresh neighbor count.
    pub fn hints_consistent(&self) -> bool {
        self.grid
            .iter_cells()
            .all(|(coords, cell)| cell.hint == self.grid.occupied_neighbors(coords))
    }
}

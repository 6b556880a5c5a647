use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::iter;
use core::ops::{BitOr, BitOrAssign, Index};
use hashbrown::HashSet;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// What sits on a cell. Enemy cells carry the id of the enemy whose footprint covers them.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occupant {
    #[default]
    Empty,
    Bomb,
    Coin,
    Enemy(EntityId),
}

impl Occupant {
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }

    pub const fn enemy(self) -> Option<EntityId> {
        match self {
            Self::Enemy(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub occupant: Occupant,
    pub covered: bool,
    /// Number of occupied cells among the 8 neighbors.
    pub hint: u8,
    pub flagged: bool,
}

impl Cell {
    /// An uncovered empty cell with no occupied neighbor opens everything around it.
    pub const fn opens_neighbors(&self) -> bool {
        !self.covered && self.occupant.is_empty() && self.hint == 0
    }

    const fn is_revealable(&self) -> bool {
        self.covered && !self.flagged
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            occupant: Occupant::Empty,
            covered: true,
            hint: 0,
            flagged: false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

impl MarkOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Changed => true,
        }
    }
}

/// Result of uncovering cells: how many were opened and which enemies were exposed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RevealOutcome {
    pub revealed: CellCount,
    pub exposed: SmallVec<[EntityId; 2]>,
}

impl RevealOutcome {
    pub fn has_update(&self) -> bool {
        self.revealed > 0
    }
}

impl BitOrAssign for RevealOutcome {
    fn bitor_assign(&mut self, rhs: Self) {
        self.revealed += rhs.revealed;
        for id in rhs.exposed {
            if !self.exposed.contains(&id) {
                self.exposed.push(id);
            }
        }
    }
}

/// Used to merge outcomes of several reveals
impl BitOr for RevealOutcome {
    type Output = RevealOutcome;

    fn bitor(mut self, rhs: Self) -> Self::Output {
        self |= rhs;
        self
    }
}

/// Square board of cells with incrementally maintained hints.
///
/// Occupants only change through [`Grid::place`] and [`Grid::remove`], which apply exactly one
/// hint delta to the neighborhood, so hints never need a full recount.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    cells: Array2<Cell>,
}

impl Grid {
    pub fn new(size: Coord) -> Self {
        let size = size.max(1);
        Self {
            cells: Array2::default((size, size).to_nd_index()),
        }
    }

    pub fn size(&self) -> Coord {
        self.cells.dim().0.try_into().unwrap_or(Coord::MAX)
    }

    pub fn bounds(&self) -> Coord2 {
        let size = self.size();
        (size, size)
    }

    pub fn total_cells(&self) -> CellCount {
        mult(self.size(), self.size())
    }

    pub fn valid(&self, (x, y): Coord2) -> bool {
        let size = self.size();
        x < size && y < size
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if self.valid(coords) {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn get(&self, coords: Coord2) -> Result<&Cell> {
        let coords = self.validate_coords(coords)?;
        Ok(&self.cells[coords.to_nd_index()])
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.cells.iter_neighbors(coords)
    }

    pub fn iter_cells(&self) -> impl Iterator<Item = (Coord2, &Cell)> {
        self.cells
            .indexed_iter()
            .map(|((x, y), cell)| ((x as Coord, y as Coord), cell))
    }

    pub fn count_cells(&self, predicate: impl Fn(&Cell) -> bool) -> CellCount {
        self.cells
            .iter()
            .filter(|cell| predicate(cell))
            .count()
            .try_into()
            .unwrap_or(CellCount::MAX)
    }

    /// Applies `delta` to the hint of every valid neighbor of `coords`.
    pub fn adjust_hints(&mut self, coords: Coord2, delta: i8) {
        for pos in self.iter_neighbors(coords) {
            let cell = self.cell_mut(pos);
            debug_assert!(
                cell.hint.checked_add_signed(delta).is_some(),
                "hint underflow at {pos:?}"
            );
            cell.hint = cell.hint.saturating_add_signed(delta);
        }
    }

    /// Puts `occupant` on an empty cell and bumps the surrounding hints.
    pub fn place(&mut self, coords: Coord2, occupant: Occupant) -> Result<()> {
        let coords = self.validate_coords(coords)?;
        if !self[coords].occupant.is_empty() {
            return Err(GameError::Occupied);
        }
        if occupant.is_empty() {
            return Ok(());
        }
        self.cell_mut(coords).occupant = occupant;
        self.adjust_hints(coords, 1);
        Ok(())
    }

    /// Clears the cell, returning what was there. Hints drop only when something was removed.
    pub fn remove(&mut self, coords: Coord2) -> Occupant {
        if !self.valid(coords) {
            return Occupant::Empty;
        }
        let previous = core::mem::take(&mut self.cell_mut(coords).occupant);
        if !previous.is_empty() {
            self.adjust_hints(coords, -1);
        }
        previous
    }

    /// Uncovers a cell, flood-filling outward when it has nothing around it.
    ///
    /// Uncovered, flagged and out-of-bounds cells are left alone, so repeated calls are no-ops.
    pub fn reveal(&mut self, coords: Coord2, events: &mut Vec<GameEvent>) -> RevealOutcome {
        let mut outcome = RevealOutcome::default();
        if !self.valid(coords) || !self[coords].is_revealable() {
            return outcome;
        }

        self.uncover(coords, events, &mut outcome);
        log::debug!("Reveal at {:?}, hint: {}", coords, self[coords].hint);

        if self[coords].opens_neighbors() {
            self.flood_from(coords, events, &mut outcome);
        }
        outcome
    }

    /// Uncovers a cell even when flagged, without flooding.
    pub fn force_reveal(&mut self, coords: Coord2, events: &mut Vec<GameEvent>) -> RevealOutcome {
        let mut outcome = RevealOutcome::default();
        if self.valid(coords) && self[coords].covered {
            self.uncover(coords, events, &mut outcome);
        }
        outcome
    }

    /// Re-runs the flood around `coords` after an occupant there was removed.
    ///
    /// Flooding only happens the moment a cell is first uncovered, so an open cell whose hint
    /// just dropped to zero has to be expanded here.
    pub fn check_cascade(&mut self, coords: Coord2, events: &mut Vec<GameEvent>) -> RevealOutcome {
        let mut outcome = RevealOutcome::default();
        if !self.valid(coords) {
            return outcome;
        }

        for pos in iter::once(coords).chain(self.iter_neighbors(coords)) {
            if self[pos].opens_neighbors() {
                log::trace!("Cascade from {:?}", pos);
                self.flood_from(pos, events, &mut outcome);
            }
        }
        outcome
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        let coords = self.validate_coords(coords)?;
        let cell = self.cell_mut(coords);
        if !cell.covered {
            return Ok(MarkOutcome::NoChange);
        }
        cell.flagged = !cell.flagged;
        Ok(MarkOutcome::Changed)
    }

    /// Recounts occupied neighbors from scratch, only meant for checking the stored hint.
    pub fn occupied_neighbors(&self, coords: Coord2) -> u8 {
        self.iter_neighbors(coords)
            .filter(|&pos| !self[pos].occupant.is_empty())
            .count()
            .try_into()
            .unwrap_or(u8::MAX)
    }

    fn uncover(&mut self, coords: Coord2, events: &mut Vec<GameEvent>, outcome: &mut RevealOutcome) {
        let cell = self.cell_mut(coords);
        cell.covered = false;
        cell.flagged = false;
        if let Some(id) = cell.occupant.enemy() {
            if !outcome.exposed.contains(&id) {
                outcome.exposed.push(id);
            }
        }
        outcome.revealed += 1;
        events.push(GameEvent::revealed(coords));
    }

    fn flood_from(&mut self, origin: Coord2, events: &mut Vec<GameEvent>, outcome: &mut RevealOutcome) {
        let mut visited = HashSet::new();
        visited.insert(origin);
        let mut to_visit: VecDeque<_> = self
            .iter_neighbors(origin)
            .filter(|&pos| self[pos].is_revealable())
            .collect();

        while let Some(visit_coords) = to_visit.pop_front() {
            if !visited.insert(visit_coords) {
                continue;
            }

            // skip flagged or already opened cells
            if !self[visit_coords].is_revealable() {
                continue;
            }

            self.uncover(visit_coords, events, outcome);
            log::trace!(
                "Flood opened cell at {:?}, hint: {}",
                visit_coords,
                self[visit_coords].hint
            );

            if self[visit_coords].opens_neighbors() {
                to_visit.extend(
                    self.iter_neighbors(visit_coords)
                        .filter(|&pos| self[pos].is_revealable())
                        .filter(|pos| !visited.contains(pos)),
                );
            }
        }
    }

    fn cell_mut(&mut self, coords: Coord2) -> &mut Cell {
        &mut self.cells[coords.to_nd_index()]
    }
}

impl Index<Coord2> for Grid {
    type Output = Cell;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(size: Coord, occupants: &[(Coord2, Occupant)]) -> Grid {
        let mut grid = Grid::new(size);
        for &(coords, occupant) in occupants {
            grid.place(coords, occupant).unwrap();
        }
        grid
    }

    fn assert_hints_consistent(grid: &Grid) {
        for (coords, cell) in grid.iter_cells() {
            assert_eq!(cell.hint, grid.occupied_neighbors(coords), "hint at {coords:?}");
        }
    }

    #[test]
    fn place_and_remove_keep_hints_in_sync() {
        let mut grid = grid_with(
            4,
            &[
                ((0, 0), Occupant::Bomb),
                ((1, 1), Occupant::Coin),
                ((3, 3), Occupant::Enemy(EntityId(1))),
            ],
        );
        assert_hints_consistent(&grid);
        assert_eq!(grid[(1, 0)].hint, 2);
        assert_eq!(grid[(0, 0)].hint, 1);

        assert_eq!(grid.remove((1, 1)), Occupant::Coin);
        assert_hints_consistent(&grid);
        assert_eq!(grid[(1, 0)].hint, 1);

        assert_eq!(grid.remove((1, 1)), Occupant::Empty);
        assert_hints_consistent(&grid);
    }

    #[test]
    fn place_rejects_occupied_and_invalid_cells() {
        let mut grid = grid_with(3, &[((1, 1), Occupant::Bomb)]);
        assert_eq!(grid.place((1, 1), Occupant::Coin), Err(GameError::Occupied));
        assert_eq!(grid.place((3, 0), Occupant::Coin), Err(GameError::InvalidCoords));
        assert_eq!(grid.get((0, 3)), Err(GameError::InvalidCoords));
        assert_hints_consistent(&grid);
    }

    #[test]
    fn reveal_flood_fill_stops_at_hints() {
        let mut grid = grid_with(5, &[((4, 4), Occupant::Bomb)]);
        let mut events = Vec::new();

        let outcome = grid.reveal((0, 0), &mut events);

        assert_eq!(outcome.revealed, 24);
        assert_eq!(events.len(), 24);
        assert!(grid[(4, 4)].covered);
        for coords in [(3, 3), (3, 4), (4, 3)] {
            assert!(!grid[coords].covered);
            assert_eq!(grid[coords].hint, 1);
        }
        assert_eq!(grid.count_cells(|cell| cell.covered), 1);
    }

    #[test]
    fn reveal_is_idempotent() {
        let mut grid = grid_with(5, &[((2, 2), Occupant::Bomb)]);
        let mut events = Vec::new();

        grid.reveal((0, 0), &mut events);
        let after_first = grid.clone();
        let outcome = grid.reveal((0, 0), &mut events);

        assert!(!outcome.has_update());
        assert_eq!(grid, after_first);
    }

    #[test]
    fn flood_fill_skips_flagged_cells() {
        let mut grid = Grid::new(4);
        let mut events = Vec::new();
        grid.toggle_flag((2, 2)).unwrap();

        grid.reveal((0, 0), &mut events);

        assert!(grid[(2, 2)].covered);
        assert!(grid[(2, 2)].flagged);
        assert_eq!(grid.count_cells(|cell| cell.covered), 1);
    }

    #[test]
    fn flagged_cell_cannot_be_revealed_but_can_be_forced() {
        let mut grid = Grid::new(3);
        let mut events = Vec::new();
        grid.toggle_flag((1, 1)).unwrap();

        assert!(!grid.reveal((1, 1), &mut events).has_update());
        assert!(grid.force_reveal((1, 1), &mut events).has_update());
        assert!(!grid[(1, 1)].covered);
        assert!(!grid[(1, 1)].flagged);
        assert_eq!(grid.count_cells(|cell| cell.covered), 8);
    }

    #[test]
    fn flagging_uncovered_cell_is_noop() {
        let mut grid = Grid::new(3);
        let mut events = Vec::new();
        grid.reveal((0, 0), &mut events);

        assert_eq!(grid.toggle_flag((1, 1)).unwrap(), MarkOutcome::NoChange);
        assert!(!grid[(1, 1)].flagged);
    }

    #[test]
    fn reveal_reports_exposed_enemy() {
        let mut grid = grid_with(3, &[((1, 1), Occupant::Enemy(EntityId(7)))]);
        let mut events = Vec::new();

        let outcome = grid.reveal((1, 1), &mut events);

        assert_eq!(outcome.exposed.as_slice(), &[EntityId(7)]);
        assert_eq!(events, [GameEvent::Revealed { x: 1, y: 1 }]);
    }

    #[test]
    fn cascade_reopens_after_removal() {
        let mut grid = grid_with(5, &[((4, 4), Occupant::Bomb), ((2, 2), Occupant::Coin)]);
        let mut events = Vec::new();

        grid.reveal((0, 0), &mut events);
        assert!(grid[(2, 2)].covered);
        assert_eq!(grid[(1, 1)].hint, 1);

        grid.remove((2, 2));
        assert_eq!(grid[(1, 1)].hint, 0);
        assert!(grid[(2, 2)].covered);

        let outcome = grid.check_cascade((2, 2), &mut events);

        assert!(outcome.has_update());
        assert!(!grid[(2, 2)].covered);
        assert_eq!(grid.count_cells(|cell| cell.covered), 1);
        assert_hints_consistent(&grid);
    }

    #[test]
    fn cascade_leaves_flagged_cells_covered() {
        let mut grid = grid_with(5, &[((2, 2), Occupant::Coin)]);
        let mut events = Vec::new();
        grid.toggle_flag((2, 1)).unwrap();

        grid.reveal((0, 0), &mut events);
        assert_eq!(grid.count_cells(|cell| cell.covered), 2);

        grid.remove((2, 2));
        let outcome = grid.check_cascade((2, 2), &mut events);

        assert!(outcome.has_update());
        assert!(!grid[(2, 2)].covered);
        assert!(grid[(2, 1)].covered);
        assert!(grid[(2, 1)].flagged);
        assert_eq!(grid.count_cells(|cell| cell.covered), 1);
        assert!(!events.contains(&GameEvent::Revealed { x: 2, y: 1 }));
    }

    #[test]
    fn cascade_without_zero_neighbors_does_nothing() {
        let mut grid = grid_with(3, &[((0, 0), Occupant::Bomb), ((2, 2), Occupant::Bomb)]);
        let mut events = Vec::new();
        grid.reveal((1, 1), &mut events);

        let outcome = grid.check_cascade((1, 1), &mut events);

        assert!(!outcome.has_update());
        assert_eq!(events.len(), 1);
    }
}

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Single coordinate axis used for board width, height, and positions.
pub type Coord = u8;

/// Count type used for occupant counts and total-cell counts.
pub type CellCount = u16;

/// Two-dimensional coordinates `(x, y)`, `x` grows right and `y` grows down.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

pub const fn manhattan(a: Coord2, b: Coord2) -> u16 {
    a.0.abs_diff(b.0) as u16 + a.1.abs_diff(b.1) as u16
}

pub const fn chebyshev(a: Coord2, b: Coord2) -> u8 {
    let dx = a.0.abs_diff(b.0);
    let dy = a.1.abs_diff(b.1);
    if dx > dy { dx } else { dy }
}

/// Orthogonal step direction. `ALL` is the fixed tie-break order used by enemy pathing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    pub const fn delta(self) -> (isize, isize) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Moves `coords` one cell, returning a value only when it stays inside `bounds`.
    pub fn step(self, coords: Coord2, bounds: Coord2) -> Option<Coord2> {
        apply_delta(coords, self.delta(), bounds)
    }
}

pub trait NeighborIterExt {
    fn iter_neighbors(&self, index: Coord2) -> NeighborIter;
}

impl<T> NeighborIterExt for Array2<T> {
    fn iter_neighbors(&self, index: Coord2) -> NeighborIter {
        let dim = self.dim();
        let size = (
            dim.0.try_into().unwrap_or(Coord::MAX),
            dim.1.try_into().unwrap_or(Coord::MAX),
        );
        NeighborIter::new(index, size)
    }
}

const DISPLACEMENTS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Applies `delta` to `coords`, returning a value only when it remains in bounds.
fn apply_delta(coords: Coord2, delta: (isize, isize), bounds: Coord2) -> Option<Coord2> {
    let (x, y) = coords;
    let (dx, dy) = delta;
    let (max_x, max_y) = bounds;

    let next_x = x.checked_add_signed(dx.try_into().ok()?)?;
    if next_x >= max_x {
        return None;
    }

    let next_y = y.checked_add_signed(dy.try_into().ok()?)?;
    if next_y >= max_y {
        return None;
    }

    Some((next_x, next_y))
}

/// The up-to-8 in-bounds cells at Chebyshev distance 1, the center excluded.
#[derive(Debug)]
pub struct NeighborIter {
    center: Coord2,
    bounds: Coord2,
    index: u8,
}

impl NeighborIter {
    pub fn new(center: Coord2, bounds: Coord2) -> Self {
        Self {
            center,
            bounds,
            index: 0,
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if usize::from(self.index) >= DISPLACEMENTS.len() {
                return None;
            }

            let next_item =
                apply_delta(self.center, DISPLACEMENTS[self.index as usize], self.bounds);
            self.index += 1;

            if next_item.is_some() {
                return next_item;
            }
        }
    }
}

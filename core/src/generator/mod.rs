use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::*;

pub use blueprint::*;
pub use random::*;

mod blueprint;
mod random;

/// Produces fresh levels for the session.
pub trait LevelGenerator {
    fn generate(&mut self, size: Coord, ids: &mut IdAllocator) -> Level;
}

/// Pseudo-random source the generator draws from.
pub trait RandomSource {
    /// Uniform value in `0..n`, `0` when `n` is zero.
    fn uniform(&mut self, n: u32) -> u32;
}

/// Adapts any [`rand::Rng`] to [`RandomSource`].
#[derive(Clone, Debug)]
pub struct RngSource<R>(pub R);

impl RngSource<rand::rngs::SmallRng> {
    pub fn seeded(seed: u64) -> Self {
        use rand::SeedableRng;
        Self(rand::rngs::SmallRng::seed_from_u64(seed))
    }
}

impl<R: rand::Rng> RandomSource for RngSource<R> {
    fn uniform(&mut self, n: u32) -> u32 {
        if n == 0 { 0 } else { self.0.random_range(0..n) }
    }
}

/// Hands out enemy ids, monotonic for the whole session so ids never repeat across levels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            next: EntityId::PLAYER.0 + 1,
        }
    }
}

impl IdAllocator {
    pub fn peek(&self) -> EntityId {
        EntityId(self.next)
    }

    pub fn next_id(&mut self) -> EntityId {
        let id = self.peek();
        self.next = self.next.wrapping_add(1).max(1);
        id
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub placed: CellCount,
    pub requested: CellCount,
}

impl Tally {
    pub const fn is_complete(&self) -> bool {
        self.placed >= self.requested
    }
}

/// How many of each item the generator managed to place.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementReport {
    pub bombs: Tally,
    pub coins: Tally,
    pub enemies: Tally,
}

impl PlacementReport {
    pub fn is_complete(&self) -> bool {
        self.bombs.is_complete() && self.coins.is_complete() && self.enemies.is_complete()
    }

    /// One [`GameError::GenerationExhausted`] per item that fell short.
    pub fn shortfalls(&self) -> impl Iterator<Item = GameError> {
        [
            (Placement::Bomb, self.bombs),
            (Placement::Coin, self.coins),
            (Placement::Enemy, self.enemies),
        ]
        .into_iter()
        .filter(|(_, tally)| !tally.is_complete())
        .map(|(item, tally)| GameError::GenerationExhausted {
            item,
            placed: tally.placed,
            requested: tally.requested,
        })
    }

    pub(crate) fn warn_shortfalls(&self, size: Coord) {
        for err in self.shortfalls() {
            log::warn!("Level of size {} is under-populated: {}", size, err);
        }
    }
}

/// A freshly generated board with its enemies, markers already written to the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Level {
    pub grid: Grid,
    pub enemies: Vec<Enemy>,
    pub report: PlacementReport,
}

use core::fmt;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

pub use enemy::*;
pub use player::*;

mod enemy;
mod player;

/// Cells covered by an entity, at most 2×2.
pub type Footprint = SmallVec<[Coord2; 4]>;

/// Unique identifier for any entity in a session.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Reserved identifier for the player.
    pub const PLAYER: Self = Self(0);
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Capabilities shared by the player and every enemy kind.
pub trait Actor {
    fn id(&self) -> EntityId;

    fn health(&self) -> i32;

    fn is_alive(&self) -> bool;

    /// Returns `true` when this damage is what killed the actor.
    fn take_damage(&mut self, amount: i32) -> bool;

    fn occupied_cells(&self) -> Footprint;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Basic,
    Brute,
    Ogre,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 3] = [Self::Basic, Self::Brute, Self::Ogre];

    pub const fn policy(self) -> MovePolicy {
        match self {
            Self::Basic => MovePolicy {
                cadence: 1,
                footprint: 1,
                health: 1,
                contact_damage: 1,
            },
            Self::Brute => MovePolicy {
                cadence: 2,
                footprint: 1,
                health: 1,
                contact_damage: 1,
            },
            Self::Ogre => MovePolicy {
                cadence: 5,
                footprint: 2,
                health: 20,
                contact_damage: 3,
            },
        }
    }
}

/// Parameters of the shared enemy step algorithm.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePolicy {
    /// Acts on every `cadence`-th invocation.
    pub cadence: u8,
    /// Side of the square footprint.
    pub footprint: u8,
    pub health: i32,
    /// Damage dealt to the player on a hit.
    pub contact_damage: i32,
}

impl MovePolicy {
    /// Footprint whose top-left cell is `origin`, or `None` if any cell leaves `bounds`.
    pub fn footprint_at(&self, (x, y): Coord2, (max_x, max_y): Coord2) -> Option<Footprint> {
        let mut cells = Footprint::new();
        for dy in 0..self.footprint {
            for dx in 0..self.footprint {
                let cx = x.checked_add(dx).filter(|&cx| cx < max_x)?;
                let cy = y.checked_add(dy).filter(|&cy| cy < max_y)?;
                cells.push((cx, cy));
            }
        }
        Some(cells)
    }
}

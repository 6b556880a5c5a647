use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::*;

/// Discrete change produced while resolving a turn, in the order it happened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Revealed { x: Coord, y: Coord },
    Damaged { entity: EntityId, amount: i32 },
    Died { entity: EntityId, cells: Footprint },
    CoinCollected { x: Coord, y: Coord },
    BombDetonated { x: Coord, y: Coord },
    PhaseChanged { phase: Phase },
    LevelLoaded { size: Coord },
    Moved { entity: EntityId, from: Coord2, to: Coord2 },
    Stunned { entity: EntityId },
}

impl GameEvent {
    pub const fn revealed((x, y): Coord2) -> Self {
        Self::Revealed { x, y }
    }

    pub const fn coin_collected((x, y): Coord2) -> Self {
        Self::CoinCollected { x, y }
    }

    pub const fn bomb_detonated((x, y): Coord2) -> Self {
        Self::BombDetonated { x, y }
    }
}

/// Everything a presentation layer needs to replay one resolved turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnReport {
    pub events: Vec<GameEvent>,
    pub phase: Phase,
    /// Strongest screen-shake request raised during the turn, 0 when calm.
    pub shake: u8,
    /// Set when the action was dropped without changing anything.
    pub rejected: Option<GameError>,
}

impl TurnReport {
    pub fn rejected(phase: Phase, error: GameError) -> Self {
        Self {
            events: Vec::new(),
            phase,
            shake: 0,
            rejected: Some(error),
        }
    }

    pub fn has_update(&self) -> bool {
        self.rejected.is_none()
    }

    pub fn revealed_cells(&self) -> impl Iterator<Item = Coord2> + '_ {
        self.events.iter().filter_map(|event| match *event {
            GameEvent::Revealed { x, y } => Some((x, y)),
            _ => None,
        })
    }
}

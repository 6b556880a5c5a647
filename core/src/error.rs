use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::CellCount;

/// Kind of item the level generator places.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    Bomb,
    Coin,
    Enemy,
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Target cell is flagged")]
    FlaggedTarget,
    #[error("Only covered cells can be flagged")]
    NothingToFlag,
    #[error("Cell is already occupied")]
    Occupied,
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
    #[error("Placed only {placed} of {requested} {item:?} before running out of attempts")]
    GenerationExhausted {
        item: Placement,
        placed: CellCount,
        requested: CellCount,
    },
}

impl GameError {
    /// Whether this error describes a rejected player action, which is absorbed as a no-op.
    pub const fn is_invalid_action(self) -> bool {
        matches!(
            self,
            Self::InvalidCoords | Self::FlaggedTarget | Self::NothingToFlag | Self::AlreadyEnded
        )
    }
}

pub type Result<T> = core::result::Result<T, GameError>;

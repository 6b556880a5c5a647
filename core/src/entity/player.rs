use serde::{Deserialize, Serialize};
use smallvec::smallvec;

use super::*;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    position: Coord2,
    health: i32,
    max_health: i32,
    coins: CellCount,
}

impl Player {
    pub fn new(health: i32) -> Self {
        let health = health.max(1);
        Self {
            position: (0, 0),
            health,
            max_health: health,
            coins: 0,
        }
    }

    pub fn position(&self) -> Coord2 {
        self.position
    }

    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    pub fn coins(&self) -> CellCount {
        self.coins
    }

    pub(crate) fn move_to(&mut self, position: Coord2) {
        self.position = position;
    }

    pub(crate) fn collect_coin(&mut self) {
        self.coins = self.coins.saturating_add(1);
    }

    /// Back to the spawn cell with an empty purse, health carries over between levels.
    pub(crate) fn enter_level(&mut self) {
        self.position = (0, 0);
        self.coins = 0;
    }
}

impl Actor for Player {
    fn id(&self) -> EntityId {
        EntityId::PLAYER
    }

    fn health(&self) -> i32 {
        self.health
    }

    fn is_alive(&self) -> bool {
        self.health > 0
    }

    fn take_damage(&mut self, amount: i32) -> bool {
        let was_alive = self.is_alive();
        self.health = self.health.saturating_sub(amount);
        was_alive && !self.is_alive()
    }

    fn occupied_cells(&self) -> Footprint {
        smallvec![self.position]
    }
}

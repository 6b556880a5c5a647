use serde::{Deserialize, Serialize};

use crate::*;

/// Rules of a run. Every field has a default, so partial config files are fine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub seed: u64,
    /// Side of the first level's board.
    pub start_size: Coord,
    /// How much the board grows with each completed level.
    pub size_step: Coord,
    /// Number of levels; finishing the last one wins the run.
    pub levels: u8,
    /// Coins needed before the exit cell completes a level.
    pub coins_required: CellCount,
    pub player_health: i32,
    pub attack_damage: i32,
    /// Damage the player takes from stepping on a bomb.
    pub player_bomb_damage: i32,
    /// Damage an enemy takes from stepping on a bomb.
    pub enemy_bomb_damage: i32,
    pub generation: GenerationConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            start_size: 13,
            size_step: 3,
            levels: 4,
            coins_required: 3,
            player_health: 3,
            attack_damage: 1,
            player_bomb_damage: 1,
            enemy_bomb_damage: 10,
            generation: GenerationConfig::default(),
        }
    }
}

impl GameConfig {
    /// Clamps values into ranges the simulation can work with.
    pub fn normalized(mut self) -> Self {
        self.levels = self.levels.max(1);
        self.start_size = self.start_size.max(1);
        let max_step = (Coord::MAX - self.start_size) / self.levels.saturating_sub(1).max(1);
        self.size_step = self.size_step.min(max_step);
        self.player_health = self.player_health.max(1);
        self.attack_damage = self.attack_damage.max(0);
        self.player_bomb_damage = self.player_bomb_damage.max(0);
        self.enemy_bomb_damage = self.enemy_bomb_damage.max(0);
        self.generation = self.generation.normalized();
        self
    }

    /// Board side for the zero-based `level`.
    pub fn level_size(&self, level: u8) -> Coord {
        self.start_size
            .saturating_add(self.size_step.saturating_mul(level))
    }

    pub fn is_final_level(&self, level: u8) -> bool {
        level.saturating_add(1) >= self.levels
    }
}

/// Densities and limits used by [`RandomLevelGenerator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Bombs as a percentage of the board area, rounded down.
    pub bomb_percent: u8,
    /// Enemies as a percentage of the board area, rounded down.
    pub enemy_percent: u8,
    pub coin_count: CellCount,
    /// Chance that an enemy is an ogre.
    pub ogre_percent: u8,
    /// Chance that a non-ogre enemy is a brute rather than a basic one.
    pub brute_percent: u8,
    /// Side of the empty square around the spawn cell in the top-left corner.
    pub spawn_zone: Coord,
    /// Side of the empty square around the exit cell in the bottom-right corner.
    pub exit_zone: Coord,
    /// Sampling attempts per placement pass before giving up.
    pub max_attempts: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            bomb_percent: 9,
            enemy_percent: 3,
            coin_count: 3,
            ogre_percent: 10,
            brute_percent: 30,
            spawn_zone: 3,
            exit_zone: 3,
            max_attempts: 5000,
        }
    }
}

impl GenerationConfig {
    pub fn normalized(mut self) -> Self {
        self.bomb_percent = self.bomb_percent.min(100);
        self.enemy_percent = self.enemy_percent.min(100);
        self.ogre_percent = self.ogre_percent.min(100);
        self.brute_percent = self.brute_percent.min(100);
        self
    }

    pub fn bomb_count(&self, size: Coord) -> CellCount {
        percent_of_area(size, self.bomb_percent)
    }

    pub fn enemy_count(&self, size: Coord) -> CellCount {
        percent_of_area(size, self.enemy_percent)
    }
}

fn percent_of_area(size: Coord, percent: u8) -> CellCount {
    let area = u32::from(mult(size, size));
    (area * u32::from(percent) / 100)
        .try_into()
        .unwrap_or(CellCount::MAX)
}

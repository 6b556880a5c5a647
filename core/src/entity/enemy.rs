use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use super::*;

/// Mutable view of the world handed to an enemy for one step.
pub struct StepContext<'a> {
    pub grid: &'a mut Grid,
    pub events: &'a mut Vec<GameEvent>,
    /// Player position as of this moment of the turn.
    pub player: Coord2,
    /// Damage taken per bomb stepped on.
    pub bomb_damage: i32,
    /// Strongest shake requested during the step.
    pub shake: u8,
}

impl<'a> StepContext<'a> {
    pub fn new(
        grid: &'a mut Grid,
        events: &'a mut Vec<GameEvent>,
        player: Coord2,
        bomb_damage: i32,
    ) -> Self {
        Self {
            grid,
            events,
            player,
            bomb_damage,
            shake: 0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Player came close to a covered enemy, which popped out and is now stunned.
    SelfRevealed,
    /// Not this enemy's cadence tick.
    Waiting,
    /// Scheduled action spent recovering from a stun.
    Stunned,
    /// Still fully covered and the player is not adjacent.
    Hidden,
    /// No legal step exists.
    Blocked,
    Moved,
    /// Tried to step onto the player, dealing this much damage.
    HitPlayer(i32),
    /// Walked onto a bomb and did not survive.
    Died,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enemy {
    id: EntityId,
    kind: EnemyKind,
    origin: Coord2,
    health: i32,
    alive: bool,
    stunned: bool,
    ticks: u32,
}

impl Enemy {
    pub fn new(id: EntityId, kind: EnemyKind, origin: Coord2) -> Self {
        Self {
            id,
            kind,
            origin,
            health: kind.policy().health,
            alive: true,
            stunned: false,
            ticks: 0,
        }
    }

    pub fn kind(&self) -> EnemyKind {
        self.kind
    }

    pub fn policy(&self) -> MovePolicy {
        self.kind.policy()
    }

    pub fn origin(&self) -> Coord2 {
        self.origin
    }

    pub fn is_stunned(&self) -> bool {
        self.stunned
    }

    /// Marks the enemy as freshly revealed, returning `true` if it was not stunned already.
    pub fn stun(&mut self) -> bool {
        let changed = self.alive && !self.stunned;
        if self.alive {
            self.stunned = true;
        }
        changed
    }

    /// Writes this enemy's markers onto the grid, all or nothing.
    pub fn spawn(&self, grid: &mut Grid) -> Result<()> {
        let cells = self
            .policy()
            .footprint_at(self.origin, grid.bounds())
            .ok_or(GameError::InvalidCoords)?;
        if cells.iter().any(|&pos| !grid[pos].occupant.is_empty()) {
            return Err(GameError::Occupied);
        }
        for pos in cells {
            grid.place(pos, Occupant::Enemy(self.id))?;
        }
        Ok(())
    }

    /// Removes this enemy's markers from the grid, returning the cells it occupied.
    pub fn clear_markers(&self, grid: &mut Grid) -> Footprint {
        let mut cleared = Footprint::new();
        for pos in self.occupied_cells() {
            if grid.valid(pos) && grid[pos].occupant == Occupant::Enemy(self.id) {
                grid.remove(pos);
                cleared.push(pos);
            }
        }
        cleared
    }

    /// Takes one turn: reveal check, cadence, stun recovery, then a greedy step toward the player.
    pub fn step(&mut self, ctx: &mut StepContext<'_>) -> StepOutcome {
        if !self.alive {
            return StepOutcome::Waiting;
        }

        self.ticks = self.ticks.wrapping_add(1);
        let cells = self.occupied_cells();

        if self.reveal_check(&cells, ctx) {
            return StepOutcome::SelfRevealed;
        }

        if self.ticks % u32::from(self.policy().cadence.max(1)) != 0 {
            return StepOutcome::Waiting;
        }

        if self.stunned {
            self.stunned = false;
            log::debug!("Enemy {} recovers from stun", self.id);
            return StepOutcome::Stunned;
        }

        if cells.iter().all(|&pos| ctx.grid[pos].covered) {
            return StepOutcome::Hidden;
        }

        let Some((origin, target)) = self.choose_step(ctx) else {
            return StepOutcome::Blocked;
        };

        if target.contains(&ctx.player) {
            log::debug!("Enemy {} hits the player", self.id);
            return StepOutcome::HitPlayer(self.policy().contact_damage);
        }

        self.advance(&cells, origin, &target, ctx)
    }

    fn reveal_check(&mut self, cells: &Footprint, ctx: &mut StepContext<'_>) -> bool {
        let near = cells
            .iter()
            .any(|&pos| ctx.grid[pos].covered && chebyshev(pos, ctx.player) <= 1);
        if !near {
            return false;
        }

        for &pos in cells {
            ctx.grid.force_reveal(pos, ctx.events);
        }
        self.stunned = true;
        ctx.events.push(GameEvent::Stunned { entity: self.id });
        log::debug!("Enemy {} revealed itself at {:?}", self.id, self.origin);
        true
    }

    /// Picks the orthogonal step minimizing Manhattan distance to the player, first direction wins ties.
    fn choose_step(&self, ctx: &StepContext<'_>) -> Option<(Coord2, Footprint)> {
        let bounds = ctx.grid.bounds();
        let policy = self.policy();
        let mut best: Option<(u16, Coord2, Footprint)> = None;

        for direction in Direction::ALL {
            let Some(origin) = direction.step(self.origin, bounds) else {
                continue;
            };
            let Some(target) = policy.footprint_at(origin, bounds) else {
                continue;
            };
            if !target.iter().all(|&pos| self.can_enter(pos, ctx)) {
                continue;
            }

            let distance = target
                .iter()
                .map(|&pos| manhattan(pos, ctx.player))
                .min()
                .unwrap_or(u16::MAX);
            if best.as_ref().is_none_or(|(best_distance, ..)| distance < *best_distance) {
                best = Some((distance, origin, target));
            }
        }

        best.map(|(_, origin, target)| (origin, target))
    }

    fn can_enter(&self, pos: Coord2, ctx: &StepContext<'_>) -> bool {
        if pos == ctx.player {
            return true;
        }
        let cell = ctx.grid[pos];
        if cell.flagged {
            return false;
        }
        match cell.occupant {
            Occupant::Empty | Occupant::Bomb => true,
            Occupant::Coin => false,
            Occupant::Enemy(other) => other == self.id,
        }
    }

    /// Moves the footprint, clearing cells it leaves and marking cells it enters.
    fn advance(
        &mut self,
        cells: &Footprint,
        origin: Coord2,
        target: &Footprint,
        ctx: &mut StepContext<'_>,
    ) -> StepOutcome {
        let entering: Footprint = target
            .iter()
            .copied()
            .filter(|pos| !cells.contains(pos))
            .collect();
        let leaving: Footprint = cells
            .iter()
            .copied()
            .filter(|pos| !target.contains(pos))
            .collect();

        let mut detonated = Footprint::new();
        for &pos in &entering {
            if ctx.grid[pos].occupant == Occupant::Bomb {
                ctx.grid.remove(pos);
                ctx.events.push(GameEvent::bomb_detonated(pos));
                ctx.grid.force_reveal(pos, ctx.events);
                detonated.push(pos);
            }
        }

        if !detonated.is_empty() {
            let damage = ctx.bomb_damage.saturating_mul(detonated.len() as i32);
            ctx.shake = ctx.shake.max(ENEMY_BOMB_SHAKE);
            ctx.events.push(GameEvent::Damaged {
                entity: self.id,
                amount: damage,
            });
            if self.take_damage(damage) {
                let cleared = self.clear_markers(ctx.grid);
                log::debug!("Enemy {} blew up at {:?}", self.id, origin);
                ctx.events.push(GameEvent::Died {
                    entity: self.id,
                    cells: cleared.clone(),
                });
                for &pos in cleared.iter().chain(&detonated) {
                    ctx.grid.check_cascade(pos, ctx.events);
                }
                return StepOutcome::Died;
            }
        }

        for &pos in &leaving {
            ctx.grid.remove(pos);
        }
        for &pos in &entering {
            if let Err(err) = ctx.grid.place(pos, Occupant::Enemy(self.id)) {
                log::warn!("Enemy {} could not enter {:?}: {}", self.id, pos, err);
            }
            ctx.grid.force_reveal(pos, ctx.events);
        }

        let from = self.origin;
        self.origin = origin;
        ctx.events.push(GameEvent::Moved {
            entity: self.id,
            from,
            to: origin,
        });

        for &pos in leaving.iter().chain(&detonated) {
            ctx.grid.check_cascade(pos, ctx.events);
        }
        StepOutcome::Moved
    }
}

pub(crate) const ENEMY_BOMB_SHAKE: u8 = 10;

impl Actor for Enemy {
    fn id(&self) -> EntityId {
        self.id
    }

    fn health(&self) -> i32 {
        self.health
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn take_damage(&mut self, amount: i32) -> bool {
        if !self.alive {
            return false;
        }
        self.health = self.health.saturating_sub(amount);
        if self.health <= 0 {
            self.alive = false;
            self.stunned = false;
            return true;
        }
        false
    }

    fn occupied_cells(&self) -> Footprint {
        let (x, y) = self.origin;
        let side = self.policy().footprint;
        let mut cells = Footprint::new();
        for dy in 0..side {
            for dx in 0..side {
                cells.push((x.saturating_add(dx), y.saturating_add(dy)));
            }
        }
        cells
    }
}

use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Move(Direction),
    /// Melee swing at the adjacent cell in this direction.
    Attack(Direction),
    ToggleFlag(Coord2),
}

const PLAYER_HIT_SHAKE: u8 = 20;
const PLAYER_BOMB_SHAKE: u8 = 30;
const ATTACK_KILL_SHAKE: u8 = 5;

/// Resolves a single turn against a [`World`], collecting the events it produces.
///
/// Validation happens before anything is touched, so a rejected action leaves the world as it was.
pub struct TurnEngine<'a, G> {
    world: &'a mut World,
    config: &'a GameConfig,
    generator: &'a mut G,
    events: Vec<GameEvent>,
    shake: u8,
}

impl<'a, G: LevelGenerator> TurnEngine<'a, G> {
    pub fn new(world: &'a mut World, config: &'a GameConfig, generator: &'a mut G) -> Self {
        Self {
            world,
            config,
            generator,
            events: Vec::new(),
            shake: 0,
        }
    }

    /// Loads the first level of a run.
    pub fn start_run(mut self) -> TurnReport {
        self.load_level(0);
        self.finish()
    }

    pub fn resolve_turn(mut self, action: Action) -> Result<TurnReport> {
        self.validate(action)?;
        log::debug!("Resolving {:?} on level {}", action, self.world.level);

        let level_done = match action {
            Action::Move(direction) => self.move_player(direction)?,
            Action::Attack(direction) => {
                self.attack(direction)?;
                false
            }
            Action::ToggleFlag(coords) => {
                self.world.grid.toggle_flag(coords)?;
                false
            }
        };

        if level_done {
            self.complete_level();
        } else if !self.world.phase.is_finished() {
            self.step_enemies();
        }

        self.world.purge_dead();
        Ok(self.finish())
    }

    fn validate(&self, action: Action) -> Result<()> {
        if self.world.phase.is_finished() {
            return Err(GameError::AlreadyEnded);
        }
        match action {
            Action::Move(direction) | Action::Attack(direction) => {
                self.target(direction).map(|_| ())
            }
            Action::ToggleFlag(coords) => {
                let cell = self.world.grid.get(coords)?;
                if cell.covered {
                    Ok(())
                } else {
                    Err(GameError::NothingToFlag)
                }
            }
        }
    }

    fn target(&self, direction: Direction) -> Result<Coord2> {
        let grid = &self.world.grid;
        let target = direction
            .step(self.world.player.position(), grid.bounds())
            .ok_or(GameError::InvalidCoords)?;
        if grid[target].flagged {
            return Err(GameError::FlaggedTarget);
        }
        Ok(target)
    }

    /// Returns `true` when the move completed the level.
    fn move_player(&mut self, direction: Direction) -> Result<bool> {
        let target = self.target(direction)?;

        if let Some(id) = self.world.grid[target].occupant.enemy() {
            let outcome = self.world.grid.reveal(target, &mut self.events);
            self.world.stun_exposed(&outcome, &mut self.events);
            let damage = self
                .world
                .enemy(id)
                .map_or(0, |enemy| enemy.policy().contact_damage);
            log::debug!("Player bumped into enemy {} at {:?}", id, target);
            self.hurt_player(damage, PLAYER_HIT_SHAKE);
            return Ok(false);
        }

        let from = self.world.player.position();
        self.world.player.move_to(target);
        self.events.push(GameEvent::Moved {
            entity: EntityId::PLAYER,
            from,
            to: target,
        });

        let mut outcome = RevealOutcome::default();
        match self.world.grid[target].occupant {
            Occupant::Bomb => {
                self.world.grid.remove(target);
                self.events.push(GameEvent::bomb_detonated(target));
                outcome |= self.world.grid.force_reveal(target, &mut self.events);
                log::debug!("Player stepped on a bomb at {:?}", target);
                self.hurt_player(self.config.player_bomb_damage, PLAYER_BOMB_SHAKE);
                outcome |= self.world.grid.check_cascade(target, &mut self.events);
            }
            Occupant::Coin => {
                self.world.grid.remove(target);
                self.world.player.collect_coin();
                self.events.push(GameEvent::coin_collected(target));
                outcome |= self.world.grid.check_cascade(target, &mut self.events);
            }
            Occupant::Empty | Occupant::Enemy(_) => {}
        }
        outcome |= self.world.grid.reveal(target, &mut self.events);
        self.world.stun_exposed(&outcome, &mut self.events);

        let player = &self.world.player;
        Ok(!self.world.phase.is_finished()
            && target == self.world.exit()
            && player.coins() >= self.world.coins_required)
    }

    fn attack(&mut self, direction: Direction) -> Result<()> {
        let target = self.target(direction)?;

        let outcome = self.world.grid.reveal(target, &mut self.events);
        self.world.stun_exposed(&outcome, &mut self.events);

        let Some(id) = self.world.grid[target].occupant.enemy() else {
            log::debug!("Attack at {:?} hit nothing", target);
            return Ok(());
        };

        let damage = self.config.attack_damage;
        let world = &mut *self.world;
        let Some(enemy) = world.enemies.iter_mut().find(|enemy| enemy.id() == id) else {
            log::warn!("Marker at {:?} points to unknown enemy {}", target, id);
            return Ok(());
        };

        self.events.push(GameEvent::Damaged { entity: id, amount: damage });
        if !enemy.take_damage(damage) {
            return Ok(());
        }

        let cleared = enemy.clear_markers(&mut world.grid);
        log::debug!("Player killed enemy {} at {:?}", id, target);
        self.events.push(GameEvent::Died {
            entity: id,
            cells: cleared.clone(),
        });
        self.shake = self.shake.max(ATTACK_KILL_SHAKE);

        let mut outcome = RevealOutcome::default();
        for &pos in &cleared {
            outcome |= world.grid.check_cascade(pos, &mut self.events);
        }
        world.stun_exposed(&outcome, &mut self.events);
        Ok(())
    }

    fn complete_level(&mut self) {
        let level = self.world.level;
        if self.config.is_final_level(level) {
            log::debug!("Final level {} completed", level);
            self.set_phase(Phase::Won);
        } else {
            self.load_level(level.saturating_add(1));
        }
    }

    fn load_level(&mut self, index: u8) {
        let size = self.config.level_size(index);
        let level = self.generator.generate(size, &mut self.world.ids);
        self.world
            .load_level(level, index, self.config, &mut self.events);
    }

    /// Every live enemy steps once in list order; stops as soon as the player is dead.
    fn step_enemies(&mut self) {
        for index in 0..self.world.enemies.len() {
            if self.world.phase.is_finished() {
                break;
            }

            let world = &mut *self.world;
            let enemy = &mut world.enemies[index];
            if !enemy.is_alive() {
                continue;
            }

            let mut ctx = StepContext::new(
                &mut world.grid,
                &mut self.events,
                world.player.position(),
                self.config.enemy_bomb_damage,
            );
            let outcome = enemy.step(&mut ctx);
            let shake = ctx.shake;
            log::trace!("Enemy {} step: {:?}", enemy.id(), outcome);

            self.shake = self.shake.max(shake);
            if let StepOutcome::HitPlayer(damage) = outcome {
                self.hurt_player(damage, PLAYER_HIT_SHAKE);
            }
        }
    }

    fn hurt_player(&mut self, amount: i32, shake: u8) {
        if amount <= 0 {
            return;
        }
        self.shake = self.shake.max(shake);
        self.events.push(GameEvent::Damaged {
            entity: EntityId::PLAYER,
            amount,
        });
        if self.world.player.take_damage(amount) {
            log::debug!("Player died on level {}", self.world.level);
            self.set_phase(Phase::Lost);
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.world.phase != phase {
            self.world.phase = phase;
            self.events.push(GameEvent::PhaseChanged { phase });
        }
    }

    fn finish(self) -> TurnReport {
        TurnReport {
            events: self.events,
            phase: self.world.phase,
            shake: self.shake,
            rejected: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::collections::VecDeque;
    use alloc::vec;

    use super::*;

    /// Hands out prepared blueprints in order, then empty boards.
    struct Script(VecDeque<Blueprint>);

    impl LevelGenerator for Script {
        fn generate(&mut self, size: Coord, ids: &mut IdAllocator) -> Level {
            let mut blueprint = self.0.pop_front().unwrap_or_else(|| Blueprint::new(size));
            blueprint.generate(size, ids)
        }
    }

    struct Harness {
        world: World,
        config: GameConfig,
        generator: Script,
    }

    impl Harness {
        fn new(config: GameConfig, blueprints: Vec<Blueprint>) -> Self {
            let mut harness = Self {
                world: World::new(Player::new(config.player_health)),
                config,
                generator: Script(blueprints.into()),
            };
            TurnEngine::new(&mut harness.world, &harness.config, &mut harness.generator).start_run();
            harness
        }

        fn turn(&mut self, action: Action) -> Result<TurnReport> {
            TurnEngine::new(&mut self.world, &self.config, &mut self.generator).resolve_turn(action)
        }

        fn play(&mut self, action: Action) -> TurnReport {
            let report = self.turn(action).unwrap();
            assert!(self.world.hints_consistent());
            assert!(self.world.markers_consistent());
            report
        }
    }

    fn single(blueprint: Blueprint) -> Harness {
        Harness::new(GameConfig::default(), vec![blueprint])
    }

    #[test]
    fn start_opens_spawn_cell() {
        let harness = single(Blueprint::new(5).bomb((4, 4)));

        assert_eq!(harness.world.level(), 0);
        assert_eq!(harness.world.grid().count_cells(|cell| cell.covered), 1);
        assert_eq!(harness.world.coins_required(), 0);
    }

    #[test]
    fn approaching_covered_enemy_reveals_and_stuns_it() {
        let mut harness = single(Blueprint::new(5).enemy(EnemyKind::Basic, (2, 2)));
        let id = EntityId(1);
        assert!(harness.world.grid()[(2, 2)].covered);

        harness.play(Action::Move(Direction::Right));
        assert!(harness.world.grid()[(2, 2)].covered);

        let report = harness.play(Action::Move(Direction::Down));
        assert_eq!(harness.world.player().position(), (1, 1));
        assert!(!harness.world.grid()[(2, 2)].covered);
        assert!(report.events.contains(&GameEvent::Stunned { entity: id }));
        assert!(harness.world.enemy(id).unwrap().is_stunned());

        // stun is spent without moving
        let report = harness.play(Action::Attack(Direction::Left));
        let enemy = harness.world.enemy(id).unwrap();
        assert_eq!(enemy.origin(), (2, 2));
        assert!(!enemy.is_stunned());
        assert_eq!(harness.world.player().health(), 3);
        assert!(!report.events.iter().any(|event| matches!(event, GameEvent::Moved { entity, .. } if *entity == id)));
    }

    #[test]
    fn attack_kills_basic_enemy_and_cascades() {
        let mut harness = single(Blueprint::new(5).enemy(EnemyKind::Basic, (1, 0)));
        assert_eq!(harness.world.grid().count_cells(|cell| cell.covered), 24);
        assert_eq!(harness.world.grid()[(0, 0)].hint, 1);

        let report = harness.play(Action::Attack(Direction::Right));

        let id = EntityId(1);
        assert!(report.events.contains(&GameEvent::Stunned { entity: id }));
        assert!(report.events.contains(&GameEvent::Damaged { entity: id, amount: 1 }));
        assert!(report.events.contains(&GameEvent::Died {
            entity: id,
            cells: smallvec::smallvec![(1, 0)],
        }));
        assert_eq!(report.shake, ATTACK_KILL_SHAKE);
        assert_eq!(harness.world.grid()[(1, 0)].occupant, Occupant::Empty);
        assert_eq!(harness.world.grid()[(0, 0)].hint, 0);
        assert_eq!(harness.world.grid().count_cells(|cell| cell.covered), 0);
        assert!(harness.world.enemies().is_empty());
    }

    #[test]
    fn rejected_actions_change_nothing() {
        let mut harness = single(Blueprint::new(4).coin((1, 0)));
        harness.play(Action::ToggleFlag((1, 0)));
        let before = harness.world.clone();

        assert_eq!(harness.turn(Action::Move(Direction::Up)), Err(GameError::InvalidCoords));
        assert_eq!(harness.turn(Action::Move(Direction::Right)), Err(GameError::FlaggedTarget));
        assert_eq!(harness.turn(Action::Attack(Direction::Right)), Err(GameError::FlaggedTarget));
        assert_eq!(harness.turn(Action::ToggleFlag((0, 0))), Err(GameError::NothingToFlag));
        assert_eq!(harness.turn(Action::ToggleFlag((9, 0))), Err(GameError::InvalidCoords));
        assert_eq!(harness.world, before);

        harness.play(Action::ToggleFlag((1, 0)));
        assert!(!harness.world.grid()[(1, 0)].flagged);
    }

    #[test]
    fn stepping_on_bomb_hurts_and_opens_board() {
        let mut harness = single(Blueprint::new(4).bomb((1, 0)));

        let report = harness.play(Action::Move(Direction::Right));

        assert!(report.events.contains(&GameEvent::BombDetonated { x: 1, y: 0 }));
        assert!(report.events.contains(&GameEvent::Damaged {
            entity: EntityId::PLAYER,
            amount: 1,
        }));
        assert_eq!(report.shake, PLAYER_BOMB_SHAKE);
        assert_eq!(harness.world.player().health(), 2);
        assert_eq!(harness.world.grid().count_cells(|cell| cell.covered), 0);
    }

    #[test]
    fn exit_loads_next_level_then_wins() {
        let config = GameConfig {
            levels: 2,
            ..Default::default()
        };
        let mut harness = Harness::new(
            config,
            vec![Blueprint::new(3).coin((1, 0)), Blueprint::new(4)],
        );
        assert_eq!(harness.world.coins_required(), 1);

        let report = harness.play(Action::Move(Direction::Right));
        assert!(report.events.contains(&GameEvent::CoinCollected { x: 1, y: 0 }));
        assert_eq!(harness.world.player().coins(), 1);

        harness.play(Action::Move(Direction::Right));
        harness.play(Action::Move(Direction::Down));
        let report = harness.play(Action::Move(Direction::Down));

        assert!(report.events.contains(&GameEvent::LevelLoaded { size: 4 }));
        assert_eq!(harness.world.level(), 1);
        assert_eq!(harness.world.player().position(), (0, 0));
        assert_eq!(harness.world.player().coins(), 0);
        assert_eq!(harness.world.phase(), Phase::Playing);

        for direction in [Direction::Right; 3].into_iter().chain([Direction::Down; 2]) {
            harness.play(Action::Move(direction));
        }
        let report = harness.play(Action::Move(Direction::Down));

        assert_eq!(report.phase, Phase::Won);
        assert!(report.events.contains(&GameEvent::PhaseChanged { phase: Phase::Won }));
        assert_eq!(harness.turn(Action::Move(Direction::Up)), Err(GameError::AlreadyEnded));
    }

    #[test]
    fn exit_without_coins_does_nothing() {
        let mut harness = single(Blueprint::new(3).coin((0, 2)));

        for direction in [Direction::Right, Direction::Right, Direction::Down, Direction::Down] {
            harness.play(Action::Move(direction));
        }

        assert_eq!(harness.world.player().position(), (2, 2));
        assert_eq!(harness.world.level(), 0);
        assert_eq!(harness.world.phase(), Phase::Playing);
    }

    #[test]
    fn enemy_hit_can_end_the_run() {
        let config = GameConfig {
            player_health: 1,
            ..Default::default()
        };
        let mut harness = Harness::new(config, vec![Blueprint::new(4).enemy(EnemyKind::Basic, (2, 0))]);

        harness.play(Action::Move(Direction::Right));
        harness.play(Action::Attack(Direction::Left));
        let report = harness.play(Action::Attack(Direction::Left));

        assert_eq!(report.phase, Phase::Lost);
        assert_eq!(report.shake, PLAYER_HIT_SHAKE);
        assert!(report.events.contains(&GameEvent::PhaseChanged { phase: Phase::Lost }));
        assert!(!harness.world.player().is_alive());
        assert_eq!(harness.turn(Action::Attack(Direction::Left)), Err(GameError::AlreadyEnded));
    }

    #[test]
    fn bumping_into_enemy_costs_contact_damage() {
        let mut harness = single(Blueprint::new(4).enemy(EnemyKind::Brute, (1, 0)));

        let report = harness.play(Action::Move(Direction::Right));

        assert_eq!(harness.world.player().position(), (0, 0));
        assert_eq!(harness.world.player().health(), 2);
        assert_eq!(report.shake, PLAYER_HIT_SHAKE);
        assert!(report.events.contains(&GameEvent::Stunned { entity: EntityId(1) }));
        assert!(harness.world.enemy(EntityId(1)).unwrap().is_stunned());
    }

    #[test]
    fn one_attack_kills_a_brute() {
        let mut harness = single(Blueprint::new(5).enemy(EnemyKind::Brute, (1, 0)));
        let id = EntityId(1);

        let report = harness.play(Action::Attack(Direction::Right));

        assert!(report.events.contains(&GameEvent::Damaged { entity: id, amount: 1 }));
        assert!(report.events.contains(&GameEvent::Died {
            entity: id,
            cells: smallvec::smallvec![(1, 0)],
        }));
        assert!(harness.world.enemy(id).is_none());
        assert_eq!(harness.world.grid()[(1, 0)].occupant, Occupant::Empty);
        assert_eq!(harness.world.grid().count_cells(|cell| cell.covered), 0);
    }
}

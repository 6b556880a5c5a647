use rand::rngs::SmallRng;

use crate::*;

/// Generator used by [`GameSession::new`].
pub type DefaultGenerator = RandomLevelGenerator<RngSource<SmallRng>>;

/// One run of the game: owns the world, the rules and the level generator.
#[derive(Clone, Debug)]
pub struct GameSession<G = DefaultGenerator> {
    config: GameConfig,
    generator: G,
    world: World,
    shake: u8,
}

impl GameSession {
    /// Seeded from `config.seed`, so equal configs play out identically.
    pub fn new(config: GameConfig) -> Self {
        let config = config.normalized();
        let generator =
            RandomLevelGenerator::new(RngSource::seeded(config.seed), config.generation.clone());
        Self::with_generator(config, generator)
    }
}

impl<G: LevelGenerator> GameSession<G> {
    pub fn with_generator(config: GameConfig, generator: G) -> Self {
        let config = config.normalized();
        let mut session = Self {
            world: World::new(Player::new(config.player_health)),
            config,
            generator,
            shake: 0,
        };
        session.restart();
        session
    }

    /// Starts over from the first level with a fresh player. Enemy ids keep counting up.
    pub fn restart(&mut self) -> TurnReport {
        let ids = self.world.ids;
        self.world = World {
            ids,
            ..World::new(Player::new(self.config.player_health))
        };
        log::debug!("Starting a new run");
        let report = TurnEngine::new(&mut self.world, &self.config, &mut self.generator).start_run();
        self.shake = report.shake;
        report
    }

    /// Resolves one turn. Illegal actions come back as an empty report carrying the reason.
    pub fn apply_action(&mut self, action: Action) -> TurnReport {
        self.try_action(action).unwrap_or_else(|err| {
            if err.is_invalid_action() {
                log::debug!("Ignoring {:?}: {}", action, err);
            } else {
                log::warn!("Turn for {:?} failed: {}", action, err);
            }
            TurnReport::rejected(self.world.phase(), err)
        })
    }

    pub fn try_action(&mut self, action: Action) -> Result<TurnReport> {
        let report =
            TurnEngine::new(&mut self.world, &self.config, &mut self.generator).resolve_turn(action)?;
        self.shake = report.shake;
        Ok(report)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_world(&self.world, self.shake)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn phase(&self) -> Phase {
        self.world.phase()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }
}

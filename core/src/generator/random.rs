use super::*;

/// Rejection-sampling generator: keeps drawing uniform cells and drops the ones that are
/// occupied or inside the spawn and exit corners, with a bounded number of attempts per pass.
#[derive(Clone, Debug)]
pub struct RandomLevelGenerator<S> {
    source: S,
    config: GenerationConfig,
}

impl<S: RandomSource> RandomLevelGenerator<S> {
    pub fn new(source: S, config: GenerationConfig) -> Self {
        Self {
            source,
            config: config.normalized(),
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    fn sample(&mut self, size: Coord) -> Coord2 {
        let size = u32::from(size);
        let y = self.source.uniform(size);
        let x = self.source.uniform(size);
        (x as Coord, y as Coord)
    }

    fn is_reserved(&self, (x, y): Coord2, size: Coord) -> bool {
        let spawn = self.config.spawn_zone;
        let exit_start = size.saturating_sub(self.config.exit_zone);
        let in_spawn = x < spawn && y < spawn;
        let in_exit = self.config.exit_zone > 0 && x >= exit_start && y >= exit_start;
        in_spawn || in_exit
    }

    fn roll_kind(&mut self) -> EnemyKind {
        if self.source.uniform(100) < u32::from(self.config.ogre_percent) {
            EnemyKind::Ogre
        } else if self.source.uniform(100) < u32::from(self.config.brute_percent) {
            EnemyKind::Brute
        } else {
            EnemyKind::Basic
        }
    }

    fn scatter(&mut self, grid: &mut Grid, requested: CellCount, occupant: Occupant) -> Tally {
        let size = grid.size();
        let mut tally = Tally {
            placed: 0,
            requested,
        };
        let mut attempts = 0;

        while tally.placed < requested && attempts < self.config.max_attempts {
            attempts += 1;
            let coords = self.sample(size);
            if self.is_reserved(coords, size) {
                continue;
            }
            if grid.place(coords, occupant).is_ok() {
                tally.placed += 1;
            }
        }

        log::trace!(
            "Placed {}/{} {:?} in {} attempts",
            tally.placed,
            requested,
            occupant,
            attempts
        );
        tally
    }

    fn populate(
        &mut self,
        grid: &mut Grid,
        requested: CellCount,
        ids: &mut IdAllocator,
    ) -> (Vec<Enemy>, Tally) {
        let size = grid.size();
        let mut enemies = Vec::new();
        let mut tally = Tally {
            placed: 0,
            requested,
        };
        let mut attempts = 0;
        let mut kind = self.roll_kind();

        while tally.placed < requested && attempts < self.config.max_attempts {
            attempts += 1;
            let origin = self.sample(size);
            let Some(cells) = kind.policy().footprint_at(origin, grid.bounds()) else {
                continue;
            };
            if cells.iter().any(|&pos| self.is_reserved(pos, size)) {
                continue;
            }

            let enemy = Enemy::new(ids.peek(), kind, origin);
            if enemy.spawn(grid).is_ok() {
                ids.next_id();
                log::trace!("Spawned {:?} {} at {:?}", kind, enemy.id(), origin);
                enemies.push(enemy);
                tally.placed += 1;
                kind = self.roll_kind();
            }
        }

        (enemies, tally)
    }
}

impl<S: RandomSource> LevelGenerator for RandomLevelGenerator<S> {
    fn generate(&mut self, size: Coord, ids: &mut IdAllocator) -> Level {
        let mut grid = Grid::new(size);
        let size = grid.size();

        let bombs = self.scatter(&mut grid, self.config.bomb_count(size), Occupant::Bomb);
        let coins = self.scatter(&mut grid, self.config.coin_count, Occupant::Coin);
        let (enemies, enemy_tally) = self.populate(&mut grid, self.config.enemy_count(size), ids);

        let report = PlacementReport {
            bombs,
            coins,
            enemies: enemy_tally,
        };
        report.warn_shortfalls(size);
        log::debug!("Generated level of size {}: {:?}", size, report);

        Level {
            grid,
            enemies,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(seed: u64, size: Coord, config: GenerationConfig) -> Level {
        let mut generator = RandomLevelGenerator::new(RngSource::seeded(seed), config);
        generator.generate(size, &mut IdAllocator::default())
    }

    fn in_corners((x, y): Coord2, size: Coord) -> bool {
        (x < 3 && y < 3) || (x >= size - 3 && y >= size - 3)
    }

    #[test]
    fn thirteen_board_has_exact_counts_outside_corners() {
        for seed in 0..20 {
            let level = generate(seed, 13, GenerationConfig::default());
            let grid = &level.grid;

            assert_eq!(grid.count_cells(|cell| cell.occupant == Occupant::Bomb), 15);
            assert_eq!(grid.count_cells(|cell| cell.occupant == Occupant::Coin), 3);
            assert_eq!(level.report.bombs.placed, 15);
            assert_eq!(level.report.coins.placed, 3);
            for (coords, cell) in grid.iter_cells() {
                if !cell.occupant.is_empty() {
                    assert!(!in_corners(coords, 13), "seed {seed}: {coords:?} in corner");
                }
            }
        }
    }

    #[test]
    fn hints_match_occupants() {
        let level = generate(3, 16, GenerationConfig::default());
        for (coords, cell) in level.grid.iter_cells() {
            assert_eq!(cell.hint, level.grid.occupied_neighbors(coords));
        }
    }

    #[test]
    fn enemy_markers_match_footprints() {
        let config = GenerationConfig {
            ogre_percent: 50,
            enemy_percent: 5,
            ..Default::default()
        };
        let level = generate(11, 19, config);

        let mut footprint_cells = 0;
        for enemy in &level.enemies {
            for pos in enemy.occupied_cells() {
                assert_eq!(level.grid[pos].occupant, Occupant::Enemy(enemy.id()));
                footprint_cells += 1;
            }
        }
        let marked = level
            .grid
            .count_cells(|cell| cell.occupant.enemy().is_some());
        assert_eq!(usize::from(marked), footprint_cells);
    }

    #[test]
    fn tiny_board_terminates_with_shortfall() {
        // only (3, 0) and (0, 3) lie outside both corners
        let level = generate(5, 4, GenerationConfig::default());

        assert!(!level.report.is_complete());
        assert_eq!(level.report.bombs.placed, 1);
        assert_eq!(level.report.coins.placed, 1);
        assert_eq!(level.report.shortfalls().count(), 1);
    }

    #[test]
    fn same_seed_same_level() {
        let a = generate(9, 13, GenerationConfig::default());
        let b = generate(9, 13, GenerationConfig::default());
        assert_eq!(a, b);
    }
}

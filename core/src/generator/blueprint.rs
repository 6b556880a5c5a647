use super::*;

/// Hand-written level layout, useful for puzzles, tutorials and tests.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub size: Coord,
    pub bombs: Vec<Coord2>,
    pub coins: Vec<Coord2>,
    pub enemies: Vec<(EnemyKind, Coord2)>,
}

impl Blueprint {
    pub fn new(size: Coord) -> Self {
        Self {
            size,
            bombs: Vec::new(),
            coins: Vec::new(),
            enemies: Vec::new(),
        }
    }

    pub fn bomb(mut self, coords: Coord2) -> Self {
        self.bombs.push(coords);
        self
    }

    pub fn coin(mut self, coords: Coord2) -> Self {
        self.coins.push(coords);
        self
    }

    pub fn enemy(mut self, kind: EnemyKind, origin: Coord2) -> Self {
        self.enemies.push((kind, origin));
        self
    }

    /// Builds the layout, failing on the first item that is out of bounds or overlaps another.
    pub fn build(&self, ids: &mut IdAllocator) -> Result<Level> {
        self.lay_out(ids, true)
    }

    fn lay_out(&self, ids: &mut IdAllocator, strict: bool) -> Result<Level> {
        let mut grid = Grid::new(self.size);
        let mut report = PlacementReport::default();

        let items = [
            (&self.bombs, Occupant::Bomb, &mut report.bombs),
            (&self.coins, Occupant::Coin, &mut report.coins),
        ];
        for (coords_list, occupant, tally) in items {
            for &coords in coords_list {
                tally.requested += 1;
                match grid.place(coords, occupant) {
                    Ok(()) => tally.placed += 1,
                    Err(err) if strict => return Err(err),
                    Err(_) => {}
                }
            }
        }

        let mut enemies = Vec::with_capacity(self.enemies.len());
        for &(kind, origin) in &self.enemies {
            report.enemies.requested += 1;
            let enemy = Enemy::new(ids.peek(), kind, origin);
            match enemy.spawn(&mut grid) {
                Ok(()) => {
                    ids.next_id();
                    enemies.push(enemy);
                    report.enemies.placed += 1;
                }
                Err(err) if strict => return Err(err),
                Err(_) => {}
            }
        }

        report.warn_shortfalls(grid.size());
        Ok(Level {
            grid,
            enemies,
            report,
        })
    }
}

impl LevelGenerator for Blueprint {
    /// Always lays out this blueprint at its own size, skipping items that do not fit.
    fn generate(&mut self, _size: Coord, ids: &mut IdAllocator) -> Level {
        self.lay_out(ids, false).unwrap_or_else(|err| {
            log::error!("Blueprint layout failed: {}", err);
            Level {
                grid: Grid::new(self.size),
                enemies: Vec::new(),
                report: PlacementReport::default(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_places_everything() {
        let mut ids = IdAllocator::default();
        let level = Blueprint::new(6)
            .bomb((5, 5))
            .coin((0, 5))
            .enemy(EnemyKind::Basic, (3, 3))
            .enemy(EnemyKind::Ogre, (0, 0))
            .build(&mut ids)
            .unwrap();

        assert!(level.report.is_complete());
        assert_eq!(level.enemies.len(), 2);
        assert_eq!(level.grid[(3, 3)].occupant, Occupant::Enemy(EntityId(1)));
        assert_eq!(level.grid[(1, 1)].occupant, Occupant::Enemy(EntityId(2)));
        assert_eq!(level.grid[(4, 4)].hint, 2);
        assert_eq!(ids.peek(), EntityId(3));
    }

    #[test]
    fn build_rejects_overlap() {
        let blueprint = Blueprint::new(4)
            .bomb((1, 1))
            .enemy(EnemyKind::Ogre, (0, 0));

        let result = blueprint.build(&mut IdAllocator::default());

        assert_eq!(result.map(|_| ()), Err(GameError::Occupied));
    }

    #[test]
    fn generate_keeps_what_fits() {
        let mut blueprint = Blueprint::new(4)
            .bomb((1, 1))
            .coin((9, 9))
            .enemy(EnemyKind::Basic, (3, 3));

        let level = blueprint.generate(4, &mut IdAllocator::default());

        assert_eq!(level.report.bombs.placed, 1);
        assert_eq!(level.report.coins.placed, 0);
        assert_eq!(level.enemies.len(), 1);
    }
}

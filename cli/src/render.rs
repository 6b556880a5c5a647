use minedelve_core::{CellView, EnemyKind, GameEvent, Occupant, Snapshot, TurnReport};

fn enemy_glyph(kind: EnemyKind) -> char {
    match kind {
        EnemyKind::Basic => 'g',
        EnemyKind::Brute => 'B',
        EnemyKind::Ogre => 'O',
    }
}

/// Draws the board as text, one row per line, with a status line on top.
pub fn board(snapshot: &Snapshot) -> String {
    let player = &snapshot.player;
    let mut out = format!(
        "level {} | hp {}/{} | coins {}/{} | {:?}\n",
        snapshot.level + 1,
        player.health,
        player.max_health,
        player.coins,
        snapshot.coins_required,
        snapshot.phase
    );

    for y in 0..snapshot.size {
        for x in 0..snapshot.size {
            let coords = (x, y);
            let glyph = if coords == player.position {
                '@'
            } else {
                match snapshot.cell(coords) {
                    Some(CellView::Covered) | None => '#',
                    Some(CellView::Flagged) => 'F',
                    Some(CellView::Revealed { occupant, hint }) => match occupant {
                        Occupant::Bomb => '*',
                        Occupant::Coin => '$',
                        Occupant::Enemy(id) => snapshot
                            .enemies
                            .iter()
                            .find(|enemy| enemy.id == id)
                            .map_or('?', |enemy| enemy_glyph(enemy.kind)),
                        Occupant::Empty if coords == snapshot.exit => 'E',
                        Occupant::Empty if hint == 0 => '.',
                        Occupant::Empty => char::from_digit(u32::from(hint), 10).unwrap_or('+'),
                    },
                }
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}

pub fn event(event: &GameEvent) -> Option<String> {
    Some(match event {
        GameEvent::Revealed { .. } => return None,
        GameEvent::Damaged { entity, amount } => format!("{entity} takes {amount} damage"),
        GameEvent::Died { entity, .. } => format!("{entity} dies"),
        GameEvent::CoinCollected { x, y } => format!("coin collected at ({x}, {y})"),
        GameEvent::BombDetonated { x, y } => format!("bomb goes off at ({x}, {y})"),
        GameEvent::PhaseChanged { phase } => format!("game is now {phase:?}"),
        GameEvent::LevelLoaded { size } => format!("entering a {size}x{size} level"),
        GameEvent::Moved { .. } => return None,
        GameEvent::Stunned { entity } => format!("{entity} is stunned"),
    })
}

/// One line per notable thing in the turn, each ending in a newline.
pub fn report(report: &TurnReport) -> String {
    let count = report.revealed_cells().count();
    let rejected = report.rejected.map(|err| format!("rejected: {err}"));
    let revealed = (count > 0).then(|| format!("revealed {count} cells"));
    let shake = (report.shake > 0).then(|| format!("*shake {}*", report.shake));

    rejected
        .into_iter()
        .chain(revealed)
        .chain(report.events.iter().filter_map(event))
        .chain(shake)
        .map(|line| line + "\n")
        .collect()
}

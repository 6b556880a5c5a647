use anyhow::{Context, bail};
use minedelve_core::{Action, Coord, Direction};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Play(Action),
    Show,
    Restart,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  move <up|down|left|right>    (or just w/a/s/d)
  attack <up|down|left|right>  (directions also take w/a/s/d)
  flag <x> <y>
  show
  restart
  quit";

fn parse_direction(word: Option<&str>) -> anyhow::Result<Direction> {
    Ok(match word {
        Some("up" | "w") => Direction::Up,
        Some("down" | "s") => Direction::Down,
        Some("left" | "a") => Direction::Left,
        Some("right" | "d") => Direction::Right,
        Some(other) => bail!("unknown direction {other:?}"),
        None => bail!("missing direction"),
    })
}

fn parse_coord(word: Option<&str>, axis: &str) -> anyhow::Result<Coord> {
    let word = word.with_context(|| format!("missing {axis} coordinate"))?;
    word.parse()
        .with_context(|| format!("invalid {axis} coordinate {word:?}"))
}

/// Parses one input line, `Ok(None)` for blank lines.
pub fn parse(line: &str) -> anyhow::Result<Option<Command>> {
    let mut words = line.split_whitespace().map(str::to_ascii_lowercase);
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let mut arg = || words.next();

    let command = match head.as_str() {
        "w" => Command::Play(Action::Move(Direction::Up)),
        "a" => Command::Play(Action::Move(Direction::Left)),
        "s" => Command::Play(Action::Move(Direction::Down)),
        "d" => Command::Play(Action::Move(Direction::Right)),
        "move" | "m" => Command::Play(Action::Move(parse_direction(arg().as_deref())?)),
        "attack" | "hit" => Command::Play(Action::Attack(parse_direction(arg().as_deref())?)),
        "flag" | "f" => {
            let x = parse_coord(arg().as_deref(), "x")?;
            let y = parse_coord(arg().as_deref(), "y")?;
            Command::Play(Action::ToggleFlag((x, y)))
        }
        "show" | "look" => Command::Show,
        "restart" => Command::Restart,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => bail!("unknown command {other:?}, try `help`"),
    };
    Ok(Some(command))
}

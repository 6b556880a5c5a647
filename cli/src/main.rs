use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use minedelve_core::{Coord, GameConfig, GameSession};

use command::Command;

mod command;
mod render;

#[derive(Parser, Debug)]
#[command(version, about = "Sweep, fight and delve through a minefield", long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Force a seed instead of the configured one
    #[arg(short, long)]
    seed: Option<u64>,

    /// Side of the first level's board
    #[arg(long)]
    size: Option<Coord>,

    /// TOML file with game rules, missing fields use defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print turn reports and snapshots as JSON lines
    #[arg(long)]
    json: bool,
}

fn load_config(args: &Args) -> anyhow::Result<GameConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(size) = args.size {
        config.start_size = size;
    }
    Ok(config)
}

struct Frontend<W> {
    out: W,
    json: bool,
}

impl<W: Write> Frontend<W> {
    fn show(&mut self, session: &GameSession) -> anyhow::Result<()> {
        let snapshot = session.snapshot();
        if self.json {
            serde_json::to_writer(&mut self.out, &snapshot)?;
            writeln!(self.out)?;
        } else {
            write!(self.out, "{}", render::board(&snapshot))?;
        }
        Ok(())
    }

    fn report(&mut self, report: &minedelve_core::TurnReport) -> anyhow::Result<()> {
        if self.json {
            serde_json::to_writer(&mut self.out, report)?;
            writeln!(self.out)?;
        } else {
            write!(self.out, "{}", render::report(report))?;
        }
        Ok(())
    }

    fn note(&mut self, message: impl std::fmt::Display) -> anyhow::Result<()> {
        if !self.json {
            writeln!(self.out, "{message}")?;
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let config = load_config(&args)?;
    log::debug!("config: {:?}", config);

    let mut session = GameSession::new(config);
    let stdout = io::stdout();
    let mut frontend = Frontend {
        out: stdout.lock(),
        json: args.json,
    };
    frontend.show(&session)?;

    for line in io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        let command = match command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                frontend.note(format_args!("{err:#}"))?;
                continue;
            }
        };

        match command {
            Command::Play(action) => {
                let report = session.apply_action(action);
                frontend.report(&report)?;
                if report.has_update() {
                    frontend.show(&session)?;
                }
            }
            Command::Show => frontend.show(&session)?,
            Command::Restart => {
                let report = session.restart();
                frontend.report(&report)?;
                frontend.show(&session)?;
            }
            Command::Help => frontend.note(command::HELP)?,
            Command::Quit => break,
        }
        frontend.out.flush()?;
    }

    log::debug!("bye");
    Ok(())
}

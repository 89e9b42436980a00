// SPDX-License-Identifier: MIT OR Apache-2.0

//! goscore - score a Go position from the command line
//!
//! Reads a board diagram, optionally asks a GTP engine which stones are
//! dead, applies manual corrections and prints the board with territory
//! and the score breakdown.

mod render;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use goscore_core::config::load_rules;
use goscore_core::gtp::GtpClient;
use goscore_core::{
    Board, Color, Coord, EngineBridge, Game, HalfPoints, RulesPreset, ScoreSession, ScoringRules,
};
use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Command-line arguments
#[derive(Parser, Debug)]
#[clap(name = "goscore", about = "Score a Go position", version)]
struct Args {
    /// Board diagram file (`-` reads stdin). `X` black, `O` white, `.` empty;
    /// the first line is the top row.
    diagram: PathBuf,

    /// Rules file (TOML)
    #[clap(long)]
    config: Option<PathBuf>,

    /// Rule set to start from when no rules file is given
    #[clap(long, value_enum, default_value = "chinese")]
    rules: Rules,

    /// Komi, overriding the rules
    #[clap(long, allow_hyphen_values = true)]
    komi: Option<f64>,

    /// Number of handicap stones Black received
    #[clap(long, default_value = "0")]
    handicap: u8,

    /// Prisoners taken by Black during play
    #[clap(long, default_value = "0")]
    captures_black: u32,

    /// Prisoners taken by White during play
    #[clap(long, default_value = "0")]
    captures_white: u32,

    /// Flip life/death of the group at this vertex (repeatable)
    #[clap(long = "toggle", value_name = "VERTEX")]
    toggles: Vec<Coord>,

    /// GTP engine command used to estimate dead stones
    #[clap(long)]
    engine: Option<String>,

    /// Extra arguments for the engine (repeatable)
    #[clap(long = "engine-arg", allow_hyphen_values = true)]
    engine_args: Vec<String>,

    /// Seconds to wait for the engine
    #[clap(long, default_value = "30")]
    engine_timeout: u64,

    /// Also print the territory estimate
    #[clap(long)]
    influence: bool,

    /// Print the score as JSON
    #[clap(long)]
    json: bool,

    /// Enable debug logging
    #[clap(long)]
    debug: bool,
}

/// Rule set names
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Rules {
    /// Area scoring, 7.5 komi
    Chinese,
    /// Territory scoring, 6.5 komi
    Japanese,
    /// Area scoring, 7.5 komi, handicap minus one
    Aga,
}

impl From<Rules> for RulesPreset {
    fn from(rules: Rules) -> Self {
        match rules {
            Rules::Chinese => RulesPreset::Chinese,
            Rules::Japanese => RulesPreset::Japanese,
            Rules::Aga => RulesPreset::Aga,
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_rules(args: &Args) -> Result<ScoringRules> {
    let mut rules = match &args.config {
        Some(path) => load_rules(path)?,
        None => ScoringRules::preset(args.rules.into()),
    };
    if let Some(komi) = args.komi {
        let komi = HalfPoints::try_from(komi).context("Invalid --komi")?;
        rules = rules.with_komi(komi);
    }
    Ok(rules)
}

fn read_diagram(path: &Path) -> Result<Board> {
    let mut text = String::new();
    if path.as_os_str() == "-" {
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read diagram from stdin")?;
    } else {
        text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read diagram: {}", path.display()))?;
    }
    Board::from_diagram(&text).with_context(|| format!("Invalid diagram: {}", path.display()))
}

/// Ask the engine for dead stones and feed its answer to the session.
///
/// Failures end up on the score rather than aborting the run.
fn ask_engine(args: &Args, program: &str, session: &mut ScoreSession, game: &mut Game) -> Result<()> {
    let (ticket, request) = session.begin_dead_stone_query(game)?;

    let answer = GtpClient::spawn(program, &args.engine_args)
        .map_err(|e| format!("failed to start {program}: {e}"))
        .and_then(|client| EngineBridge::spawn(client).map_err(|e| e.to_string()))
        .and_then(|bridge| {
            bridge.submit(ticket, request).map_err(|e| e.to_string())?;
            bridge
                .recv_timeout(Duration::from_secs(args.engine_timeout))
                .map_err(|e| e.to_string())
        });

    match answer {
        Ok(response) => {
            session.complete_with_response(game, response);
        }
        Err(message) => {
            session.complete_dead_stone_query(game, ticket, Err(message));
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let rules = resolve_rules(&args)?;
    let board = read_diagram(&args.diagram)?;
    tracing::info!(size = board.size(), "loaded diagram");

    let mut game = Game::from_position(board, Color::Black);
    game.set_handicap(args.handicap);
    game.set_captures(args.captures_black, args.captures_white);

    let mut session = ScoreSession::new(rules);
    session.enable(&mut game)?;

    match &args.engine {
        Some(program) => ask_engine(&args, program, &mut session, &mut game)?,
        None => {
            session.calculate(&mut game)?;
        }
    }

    // Each group is flipped once, however many of its stones were named
    let mut toggled = HashSet::new();
    for &vertex in &args.toggles {
        if !vertex.is_valid(game.board().size()) {
            return Err(anyhow!("{vertex} is off the board"));
        }
        if game.board().get(vertex).is_some() && !toggled.insert(game.board().region_id_at(vertex)) {
            continue;
        }
        let state = session.toggle_dead_stone_state_of_group(&mut game, vertex)?;
        tracing::debug!(%vertex, ?state, "toggled");
    }

    if args.influence {
        session.refresh_territory_statistics(&mut game);
    }

    let score = session.score();
    if args.json {
        println!("{}", serde_json::to_string_pretty(score)?);
    } else {
        print!("{}", render::render_board(game.board()));
        if args.influence {
            println!();
            print!("{}", render::render_influence(game.board()));
        }
        println!();
        print!("{}", render::render_score(score));
    }
    Ok(())
}

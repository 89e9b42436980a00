// SPDX-License-Identifier: MIT OR Apache-2.0

//! Score calculation from a classified board
//!
//! Stone, territory and prisoner counts are integers. Komi and totals are
//! kept in half points so that comparing the two totals is exact.

use crate::config::ScoringRules;
use crate::game::Game;
use crate::region::StoneGroupState;
use crate::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use thiserror::Error;

/// How the final count is made
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringSystem {
    /// Stones on the board plus surrounded empty points (Chinese style)
    #[default]
    Area,
    /// Surrounded empty points plus prisoners (Japanese style)
    Territory,
}

/// How many points White receives for Black's handicap stones
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandicapCompensation {
    /// Nothing
    #[default]
    None,
    /// One point per handicap stone
    Full,
    /// One point per handicap stone after the first
    MinusOne,
}

impl HandicapCompensation {
    /// Compensation for a handicap. A handicap below two is an ordinary game.
    pub fn points(self, handicap: u8) -> u32 {
        let handicap = u32::from(handicap);
        if handicap < 2 {
            return 0;
        }
        match self {
            HandicapCompensation::None => 0,
            HandicapCompensation::Full => handicap,
            HandicapCompensation::MinusOne => handicap - 1,
        }
    }
}

/// The komi value could not be represented
#[derive(Debug, Error, Clone, PartialEq)]
#[error("komi {0} is not a multiple of 0.5")]
pub struct InvalidKomi(pub f64);

/// A score value counted in half points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct HalfPoints(i32);

impl HalfPoints {
    /// Zero points
    pub const ZERO: HalfPoints = HalfPoints(0);

    /// A value given in half points
    pub const fn from_halves(halves: i32) -> Self {
        HalfPoints(halves)
    }

    /// A whole number of points
    pub fn points(points: u32) -> Self {
        HalfPoints(points as i32 * 2)
    }

    /// Number of half points
    pub fn halves(self) -> i32 {
        self.0
    }

    /// Whether the value has a fractional half
    pub fn has_half(self) -> bool {
        self.0 % 2 != 0
    }

    /// Value as a float, for display and interchange only
    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 2.0
    }
}

impl TryFrom<f64> for HalfPoints {
    type Error = InvalidKomi;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        let doubled = value * 2.0;
        if !doubled.is_finite() || doubled.fract() != 0.0 || doubled.abs() > f64::from(i32::MAX) {
            return Err(InvalidKomi(value));
        }
        Ok(HalfPoints(doubled as i32))
    }
}

impl From<HalfPoints> for f64 {
    fn from(value: HalfPoints) -> f64 {
        value.as_f64()
    }
}

impl Add for HalfPoints {
    type Output = HalfPoints;

    fn add(self, rhs: HalfPoints) -> HalfPoints {
        HalfPoints(self.0 + rhs.0)
    }
}

impl Sub for HalfPoints {
    type Output = HalfPoints;

    fn sub(self, rhs: HalfPoints) -> HalfPoints {
        HalfPoints(self.0 - rhs.0)
    }
}

impl fmt::Display for HalfPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let whole = self.0.abs() / 2;
        if self.has_half() {
            write!(f, "{sign}{whole}.5")
        } else {
            write!(f, "{sign}{whole}")
        }
    }
}

/// Outcome of a score calculation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    /// Nothing has been calculated
    #[default]
    None,
    /// Black is ahead by the given margin
    BlackHasWon(HalfPoints),
    /// White is ahead by the given margin
    WhiteHasWon(HalfPoints),
    /// Both totals are equal
    Tie,
}

impl GameResult {
    /// The winning color, if any
    pub fn winner(&self) -> Option<Color> {
        match self {
            GameResult::BlackHasWon(_) => Some(Color::Black),
            GameResult::WhiteHasWon(_) => Some(Color::White),
            GameResult::Tie | GameResult::None => None,
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameResult::None => f.write_str("?"),
            GameResult::BlackHasWon(margin) => write!(f, "B+{margin}"),
            GameResult::WhiteHasWon(margin) => write!(f, "W+{margin}"),
            GameResult::Tie => f.write_str("Draw"),
        }
    }
}

/// Score snapshot of a game.
///
/// Created once per game and recalculated whenever marks change. The flags
/// mirror the state of the owning [`crate::ScoreSession`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub scoring_system: ScoringSystem,
    /// Added to White's total
    pub komi: HalfPoints,
    pub handicap: u8,
    /// Credited to White
    pub handicap_compensation: u32,

    /// Prisoners taken during play
    pub captured_by_black: u32,
    pub captured_by_white: u32,
    /// Stones marked dead at the end
    pub dead_black: u32,
    pub dead_white: u32,
    /// Empty points plus points vacated by dead stones
    pub territory_black: u32,
    pub territory_white: u32,
    /// Stones staying on the board (alive or seki)
    pub alive_black: u32,
    pub alive_white: u32,

    pub total_black: HalfPoints,
    pub total_white: HalfPoints,
    pub result: GameResult,

    pub moves_played: u32,
    pub stones_played_black: u32,
    pub stones_played_white: u32,
    pub passes_played_black: u32,
    pub passes_played_white: u32,

    pub scoring_enabled: bool,
    pub calculation_in_progress: bool,
    pub asking_engine_for_dead_stones: bool,
    pub last_calculation_had_error: bool,
    pub last_error_message: Option<String>,
}

impl Score {
    /// An empty score for a game played under `rules`
    pub fn new(rules: &ScoringRules) -> Self {
        Self {
            scoring_system: rules.scoring_system,
            komi: rules.komi,
            ..Self::default()
        }
    }

    /// Recount everything from the board's current classification.
    ///
    /// Never fails: inconsistent territory sets
    /// `last_calculation_had_error` and leaves the decision to the caller.
    pub fn calculate(&mut self, game: &Game, rules: &ScoringRules) {
        let board = game.board();
        let stats = game.statistics();

        self.scoring_system = rules.scoring_system;
        self.komi = rules.komi;
        self.handicap = game.handicap();
        self.handicap_compensation = rules.handicap_compensation.points(game.handicap());

        self.captured_by_black = stats.captured_by_black;
        self.captured_by_white = stats.captured_by_white;
        self.moves_played = stats.moves_played;
        self.stones_played_black = stats.stones_played_black;
        self.stones_played_white = stats.stones_played_white;
        self.passes_played_black = stats.passes_played_black;
        self.passes_played_white = stats.passes_played_white;

        let mut dead = [0u32; 2];
        let mut alive = [0u32; 2];
        let mut territory = [0u32; 2];
        let mut inconsistent = 0usize;
        for (_, region) in board.regions() {
            let size = region.size() as u32;
            match (region.color(), region.group_state()) {
                (Some(color), StoneGroupState::Dead) => dead[slot(color)] += size,
                (Some(color), _) => alive[slot(color)] += size,
                (None, _) => {}
            }
            if let Some(owner) = region.territory_color() {
                territory[slot(owner)] += size;
            }
            if region.is_territory_inconsistent() {
                inconsistent += 1;
            }
        }

        self.dead_black = dead[0];
        self.dead_white = dead[1];
        self.alive_black = alive[0];
        self.alive_white = alive[1];
        self.territory_black = territory[0];
        self.territory_white = territory[1];

        let (black, white) = match self.scoring_system {
            ScoringSystem::Area => (
                self.alive_black + self.territory_black,
                self.alive_white + self.territory_white,
            ),
            ScoringSystem::Territory => (
                self.territory_black + self.captured_by_black + self.dead_white,
                self.territory_white + self.captured_by_white + self.dead_black,
            ),
        };
        self.total_black = HalfPoints::points(black);
        self.total_white =
            HalfPoints::points(white + self.handicap_compensation) + self.komi;

        self.result = match self.total_black.cmp(&self.total_white) {
            std::cmp::Ordering::Greater => GameResult::BlackHasWon(self.total_black - self.total_white),
            std::cmp::Ordering::Less => GameResult::WhiteHasWon(self.total_white - self.total_black),
            std::cmp::Ordering::Equal => GameResult::Tie,
        };

        if inconsistent > 0 {
            self.last_calculation_had_error = true;
            self.last_error_message = Some(format!(
                "{inconsistent} region(s) have inconsistent dead stone markings"
            ));
        } else {
            self.last_calculation_had_error = false;
            self.last_error_message = None;
        }

        tracing::debug!(
            black = %self.total_black,
            white = %self.total_white,
            result = %self.result,
            "score calculated"
        );
    }
}

fn slot(color: Color) -> usize {
    match color {
        Color::Black => 0,
        Color::White => 1,
    }
}

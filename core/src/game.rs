// SPDX-License-Identifier: MIT OR Apache-2.0

//! Game state: board, move history and the counters scoring needs

use crate::board::{Board, BoardSize};
use crate::rules::{find_captures, RuleValidator};
use crate::{Color, Coord, GameError, Move};
use serde::{Deserialize, Serialize};

/// Counters accumulated during play
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayStatistics {
    /// Stones captured by Black
    pub captured_by_black: u32,
    /// Stones captured by White
    pub captured_by_white: u32,
    pub moves_played: u32,
    pub stones_played_black: u32,
    pub stones_played_white: u32,
    pub passes_played_black: u32,
    pub passes_played_white: u32,
}

impl PlayStatistics {
    fn record(&mut self, color: Color, mv: &Move, captured: u32) {
        self.moves_played += 1;
        match (color, mv) {
            (Color::Black, Move::Place(_)) => {
                self.stones_played_black += 1;
                self.captured_by_black += captured;
            }
            (Color::White, Move::Place(_)) => {
                self.stones_played_white += 1;
                self.captured_by_white += captured;
            }
            (Color::Black, Move::Pass) => self.passes_played_black += 1,
            (Color::White, Move::Pass) => self.passes_played_white += 1,
            (_, Move::Resign) => {}
        }
    }
}

/// Fixed handicap placement on star points.
///
/// Returns `None` if `count` is outside 2..=9 or the board has too few
/// star points (sizes below 15 have no side points, 7x7 allows four stones).
pub fn handicap_points(size: BoardSize, count: u8) -> Option<Vec<Coord>> {
    let n = size.get();
    let max = match n {
        7 => 4,
        9..=13 => 5,
        _ => 9,
    };
    if !(2..=max).contains(&count) {
        return None;
    }

    let edge = if n >= 13 { 3 } else { 2 };
    let far = n - 1 - edge;
    let mid = n / 2;

    // Corners
    let upper_left = Coord::new(edge, far);
    let upper_right = Coord::new(far, far);
    let lower_left = Coord::new(edge, edge);
    let lower_right = Coord::new(far, edge);

    // Sides
    let mid_left = Coord::new(edge, mid);
    let mid_right = Coord::new(far, mid);
    let top = Coord::new(mid, far);
    let bottom = Coord::new(mid, edge);

    // Center
    let center = Coord::new(mid, mid);

    let corners = vec![upper_right, lower_left, lower_right, upper_left];
    let points = match count {
        2..=4 => corners[..count as usize].to_vec(),
        5 => [corners, vec![center]].concat(),
        6 => [corners, vec![mid_left, mid_right]].concat(),
        7 => [corners, vec![mid_left, mid_right, center]].concat(),
        8 => [corners, vec![mid_left, mid_right, top, bottom]].concat(),
        _ => [corners, vec![mid_left, mid_right, top, bottom, center]].concat(),
    };
    Some(points)
}

/// Represents the current state of a Go game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    /// The board with its region partition
    board: Board,
    /// The player whose turn it is
    current_player: Color,
    /// History of moves
    moves: Vec<Move>,
    /// Number of consecutive passes
    pass_count: u8,
    /// Number of handicap stones Black started with
    handicap: u8,
    /// Point the player to move may not retake
    ko: Option<Coord>,
    /// Set when a player resigned
    resigned: Option<Color>,
    stats: PlayStatistics,
}

impl Game {
    /// Create a new game with the specified board size
    pub fn new(size: BoardSize) -> Self {
        Self::from_position(Board::new(size), Color::Black)
    }

    /// Create a new game with handicap stones already placed; White moves
    /// first
    pub fn with_handicap(size: BoardSize, handicap: u8) -> Result<Self, GameError> {
        if handicap < 2 {
            return Ok(Self::new(size));
        }
        let points = handicap_points(size, handicap).ok_or(GameError::InvalidHandicap {
            handicap,
            size: size.get(),
        })?;

        let mut board = Board::new(size);
        for coord in points {
            board.place_stone(coord, Color::Black);
        }
        let mut game = Self::from_position(board, Color::White);
        game.handicap = handicap;
        Ok(game)
    }

    /// Start from a set-up position, e.g. a diagram
    pub fn from_position(board: Board, to_move: Color) -> Self {
        Self {
            board,
            current_player: to_move,
            moves: Vec::new(),
            pass_count: 0,
            handicap: 0,
            ko: None,
            resigned: None,
            stats: PlayStatistics::default(),
        }
    }

    /// Record prisoners taken before the position was set up
    pub fn set_captures(&mut self, by_black: u32, by_white: u32) {
        self.stats.captured_by_black = by_black;
        self.stats.captured_by_white = by_white;
    }

    /// Declare the handicap of a set-up position
    pub fn set_handicap(&mut self, handicap: u8) {
        self.handicap = handicap;
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn current_player(&self) -> Color {
        self.current_player
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn handicap(&self) -> u8 {
        self.handicap
    }

    pub fn ko_point(&self) -> Option<Coord> {
        self.ko
    }

    pub fn statistics(&self) -> &PlayStatistics {
        &self.stats
    }

    /// Apply a move to the game state and return the captured stones
    pub fn apply_move(&mut self, mv: Move) -> Result<Vec<Coord>, GameError> {
        if self.is_game_over() {
            return Err(GameError::GameOver);
        }

        let color = self.current_player;
        let mut captured = Vec::new();
        match mv {
            Move::Place(coord) => {
                RuleValidator::new(&self.board, self.ko).check_move(coord, color)?;

                self.board.place_stone(coord, color);
                for group in find_captures(&self.board, coord) {
                    captured.extend(self.board.capture_region(group));
                }

                // A single stone that took a single stone and now sits in
                // atari can be retaken at once: that is a ko.
                let own = self.board.region_id_at(coord);
                self.ko = if captured.len() == 1
                    && self.board.region(own).size() == 1
                    && self.board.liberties(own) == 1
                {
                    Some(captured[0])
                } else {
                    None
                };
                self.pass_count = 0;
            }
            Move::Pass => {
                self.pass_count += 1;
                self.ko = None;
            }
            Move::Resign => {
                self.resigned = Some(color);
            }
        }

        if !captured.is_empty() {
            tracing::debug!(player = ?color, count = captured.len(), "stones captured");
        }

        // Record the move
        self.stats.record(color, &mv, captured.len() as u32);
        self.moves.push(mv);

        // Switch player
        self.current_player = color.opposite();

        Ok(captured)
    }

    /// Check if the game is over
    pub fn is_game_over(&self) -> bool {
        // Game ends after two consecutive passes or resignation
        self.pass_count >= 2 || self.resigned.is_some()
    }

    /// The player who resigned, if any
    pub fn resigned(&self) -> Option<Color> {
        self.resigned
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Go Scoring Core - Board Regions and End-of-Game Scoring
//!
//! This crate provides:
//! - A fixed-size board of points with an incrementally maintained
//!   partition into connected regions (empty areas and stone groups)
//! - Game rules and validation on top of the region partition
//! - Life/death marking and territory classification
//! - Area and territory score calculation with exact half-point komi
//! - A scoring session state machine with an asynchronous dead-stone query
//!   to an external engine (GTP)
//! - CBOR serialization helpers for game and session state

#![deny(unsafe_code)]
#![deny(clippy::all)]

pub mod board;
pub mod cbor;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod game;
pub mod gtp;
pub mod influence;
pub mod region;
pub mod rules;
pub mod scoring;
pub mod session;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use board::{Board, BoardSize, Point};
pub use classifier::MarkMode;
pub use config::{RulesPreset, ScoringRules};
pub use engine::{DeadStoneEstimator, DeadStoneRequest, EngineBridge, QueryTicket};
pub use game::{Game, PlayStatistics};
pub use region::{Occupancy, Region, RegionId, StoneGroupState};
pub use scoring::{GameResult, HalfPoints, HandicapCompensation, Score, ScoringSystem};
pub use session::{QueryOutcome, ScoreSession, ScoringEvent, ScoringState, SessionError, SessionSnapshot};

/// Player color in a Go game (Black or White)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    /// Black player (traditionally goes first)
    Black,
    /// White player
    White,
}

impl Color {
    /// Returns the opposite color
    pub fn opposite(&self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Single-letter GTP name
    pub fn gtp_letter(&self) -> char {
        match self {
            Color::Black => 'B',
            Color::White => 'W',
        }
    }
}

/// Board coordinate representing a position.
///
/// `(0, 0)` is the vertex `A1`, the lower left corner as seen by the players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// X coordinate (column)
    pub x: u8,
    /// Y coordinate (row, counted from the bottom edge)
    pub y: u8,
}

impl Coord {
    /// Create a new coordinate
    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Check if coordinate is valid for a board of given size
    pub fn is_valid(&self, board_size: u8) -> bool {
        self.x < board_size && self.y < board_size
    }

    /// Get adjacent (neighboring) coordinates in the four cardinal directions
    /// that lie on a board of the given size
    pub fn adjacent_coords(&self, board_size: u8) -> Vec<Coord> {
        let mut neighbors = Vec::with_capacity(4);

        // Left
        if self.x > 0 {
            neighbors.push(Coord::new(self.x - 1, self.y));
        }

        // Right
        if self.x + 1 < board_size {
            neighbors.push(Coord::new(self.x + 1, self.y));
        }

        // Down
        if self.y > 0 {
            neighbors.push(Coord::new(self.x, self.y - 1));
        }

        // Up
        if self.y + 1 < board_size {
            neighbors.push(Coord::new(self.x, self.y + 1));
        }

        neighbors
    }
}

/// Column letter for a zero-based column index (A-T, skipping I)
pub fn column_letter(x: u8) -> char {
    if x < 8 {
        (b'A' + x) as char
    } else {
        (b'A' + x + 1) as char
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letter(self.x), self.y as u32 + 1)
    }
}

impl FromStr for Coord {
    type Err = GameError;

    /// Parse a vertex such as `D4` or `q16`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let letter = chars
            .next()
            .ok_or_else(|| GameError::InvalidVertex(s.to_string()))?
            .to_ascii_uppercase();

        if !letter.is_ascii_uppercase() || letter == 'I' {
            return Err(GameError::InvalidVertex(s.to_string()));
        }

        let x = if letter < 'I' {
            letter as u8 - b'A'
        } else {
            letter as u8 - b'A' - 1
        };

        let row: u8 = chars
            .as_str()
            .parse()
            .map_err(|_| GameError::InvalidVertex(s.to_string()))?;
        if row == 0 || row > 25 {
            return Err(GameError::InvalidVertex(s.to_string()));
        }

        Ok(Coord::new(x, row - 1))
    }
}

/// Represents a move in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Move {
    /// Place a stone at the specified coordinate
    Place(Coord),
    /// Pass the turn
    Pass,
    /// Resign the game
    Resign,
}

/// Errors that can occur during game play
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    /// The coordinate is outside the board
    #[error("Invalid coordinate")]
    InvalidCoordinate,

    /// The vertex text could not be parsed
    #[error("Invalid vertex: {0:?}")]
    InvalidVertex(String),

    /// The board size is not one of the supported sizes
    #[error("Unsupported board size {0} (expected 7, 9, 11, 13, 15, 17 or 19)")]
    UnsupportedBoardSize(u8),

    /// The position is already occupied
    #[error("Position already occupied")]
    OccupiedPosition,

    /// The move violates the ko rule
    #[error("Move violates ko rule")]
    KoViolation,

    /// The move would result in self-capture (suicide)
    #[error("Move would result in self-capture")]
    SelfCapture,

    /// No more moves are accepted
    #[error("Game has already ended")]
    GameOver,

    /// The handicap cannot be placed on this board
    #[error("Handicap of {handicap} stones is not possible on a {size}x{size} board")]
    InvalidHandicap {
        /// Requested number of stones
        handicap: u8,
        /// Board size
        size: u8,
    },

    /// A position diagram could not be parsed
    #[error("Invalid diagram: {0}")]
    InvalidDiagram(String),
}

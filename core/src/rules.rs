// SPDX-License-Identifier: MIT OR Apache-2.0

//! Game rules and validation logic

use crate::{board::Board, region::RegionId, Color, Coord, GameError};

/// Validates moves before they reach the region builder, which trusts its
/// callers completely
pub struct RuleValidator<'a> {
    /// The board being checked
    board: &'a Board,
    /// Point the player to move may not retake this turn
    ko: Option<Coord>,
}

impl<'a> RuleValidator<'a> {
    /// Create a new rules validator
    pub fn new(board: &'a Board, ko: Option<Coord>) -> Self {
        Self { board, ko }
    }

    /// Check if a move is valid
    pub fn check_move(&self, coord: Coord, color: Color) -> Result<(), GameError> {
        // Basic validation
        if !coord.is_valid(self.board.size()) {
            return Err(GameError::InvalidCoordinate);
        }

        if self.board.get(coord).is_some() {
            return Err(GameError::OccupiedPosition);
        }

        if self.ko == Some(coord) {
            tracing::debug!("Ko violation detected at {}", coord);
            return Err(GameError::KoViolation);
        }

        // A move is suicide unless it keeps a liberty, connects to a friendly
        // group with another liberty, or takes an enemy group's last one.
        let mut breathes = false;
        for neighbor in self.board.adjacent_coords(coord) {
            match self.board.get(neighbor) {
                None => breathes = true,
                Some(stone) => {
                    let liberties = self.board.liberties(self.board.region_id_at(neighbor));
                    if (stone == color && liberties > 1) || (stone != color && liberties == 1) {
                        breathes = true;
                    }
                }
            }
            if breathes {
                break;
            }
        }

        if !breathes {
            return Err(GameError::SelfCapture);
        }
        Ok(())
    }
}

/// Enemy groups left without liberties next to a stone that was just placed
pub fn find_captures(board: &Board, last_move: Coord) -> Vec<RegionId> {
    let Some(color) = board.get(last_move) else {
        return Vec::new();
    };
    let opponent = color.opposite();

    let mut captures = Vec::new();
    for neighbor in board.adjacent_coords(last_move) {
        if board.get(neighbor) == Some(opponent) {
            let group = board.region_id_at(neighbor);
            if board.liberties(group) == 0 && !captures.contains(&group) {
                captures.push(group);
            }
        }
    }
    captures
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! CBOR serialization helpers for game and scoring state
//!
//! A game archive holds the board with its region partition and every
//! scoring mark. Lazily cached region fields are not stored; they are
//! recomputed on first use after loading.

use crate::game::Game;
use crate::session::SessionSnapshot;

/// Serialize a game to CBOR
pub fn serialize_game(game: &Game) -> Vec<u8> {
    match serde_cbor::to_vec(game) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!("Failed to serialize game: {}", err);
            Vec::new()
        }
    }
}

/// Deserialize a game from CBOR
pub fn deserialize_game(data: &[u8]) -> Option<Game> {
    if data.is_empty() {
        return None;
    }

    match serde_cbor::from_slice::<Game>(data) {
        Ok(game) => {
            let board = game.board();
            if board.points().len() != board.board_size().points() {
                tracing::error!(
                    "Archived board has {} points for size {}",
                    board.points().len(),
                    board.size()
                );
                return None;
            }
            if let Err(violation) = game.board().verify_partition() {
                tracing::error!("Archived board has a broken partition: {}", violation);
                return None;
            }
            Some(game)
        }
        Err(err) => {
            tracing::error!("Failed to deserialize game: {}", err);
            None
        }
    }
}

/// Serialize a scoring session snapshot to CBOR
pub fn serialize_session(snapshot: &SessionSnapshot) -> Vec<u8> {
    match serde_cbor::to_vec(snapshot) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!("Failed to serialize scoring session: {}", err);
            Vec::new()
        }
    }
}

/// Deserialize a scoring session snapshot from CBOR
pub fn deserialize_session(data: &[u8]) -> Option<SessionSnapshot> {
    if data.is_empty() {
        return None;
    }

    match serde_cbor::from_slice(data) {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            tracing::error!("Failed to deserialize scoring session: {}", err);
            None
        }
    }
}

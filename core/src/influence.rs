// SPDX-License-Identifier: MIT OR Apache-2.0

//! Territory statistics: a rough ownership estimate per point

use crate::board::Board;
use crate::region::StoneGroupState;
use crate::Color;

/// How far a stone projects influence
const RADIUS: i32 = 3;

/// Estimate ownership of every point, in board index order.
///
/// Each value lies in [-1, 1]; positive leans Black. Stones radiate
/// influence that decreases with distance; stones of dead groups radiate
/// for the opponent. A point with no stone in range scores 0.
pub fn estimate(board: &Board) -> Vec<f32> {
    let n = board.size() as i32;
    let mut sources: Vec<(i32, i32, Color)> = Vec::new();
    for (_, region) in board.regions() {
        let Some(color) = region.color() else { continue };
        let owner = if region.group_state() == StoneGroupState::Dead {
            color.opposite()
        } else {
            color
        };
        for &idx in region.point_indices() {
            let idx = idx as i32;
            sources.push((idx % n, idx / n, owner));
        }
    }

    board
        .points()
        .iter()
        .map(|point| {
            let (x, y) = (i32::from(point.coord().x), i32::from(point.coord().y));
            let mut black = 0i32;
            let mut white = 0i32;
            for &(sx, sy, owner) in &sources {
                let radius = (sx - x).abs().max((sy - y).abs());
                if radius > RADIUS {
                    continue;
                }
                // Closer stones weigh more; a stone on the point itself most
                let weight = RADIUS + 1 - radius;
                match owner {
                    Color::Black => black += weight,
                    Color::White => white += weight,
                }
            }
            if black + white == 0 {
                0.0
            } else {
                (black - white) as f32 / (black + white) as f32
            }
        })
        .collect()
}

/// Recompute and store the statistics on the board's points
pub fn update(board: &mut Board) {
    let values = estimate(board);
    board.set_territory_statistics(&values);
}

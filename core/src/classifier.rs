// SPDX-License-Identifier: MIT OR Apache-2.0

//! Life/death marking of stone groups and territory classification
//!
//! Marks always apply to a whole region: one stone cannot be dead while the
//! rest of its group lives.

use crate::board::Board;
use crate::region::{RegionId, StoneGroupState};
use crate::{Color, Coord};
use serde::{Deserialize, Serialize};

/// Which state a toggle cycles through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkMode {
    /// Alive -> Dead -> Alive
    #[default]
    DeadStones,
    /// Alive -> Seki -> Alive
    Seki,
}

/// Summary of one classification pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    /// Regions whose territory could not be decided consistently
    pub inconsistent_regions: usize,
}

impl Classification {
    /// Whether every region was classified without contradiction
    pub fn is_consistent(&self) -> bool {
        self.inconsistent_regions == 0
    }
}

/// Put every region into scoring mode with undecided groups
pub fn enter_scoring_mode(board: &mut Board) {
    for (_, region) in board.regions_mut() {
        region.scoring_mode = true;
        region.group_state = StoneGroupState::Undefined;
        region.territory_color = None;
        region.territory_inconsistent = false;
    }
}

/// Drop all marks and territory and leave scoring mode
pub fn leave_scoring_mode(board: &mut Board) {
    for (_, region) in board.regions_mut() {
        region.scoring_mode = false;
        region.group_state = StoneGroupState::Undefined;
        region.territory_color = None;
        region.territory_inconsistent = false;
    }
}

/// Flip the state of one stone group and return the new state.
///
/// An undecided group counts as alive, so the first toggle marks it dead
/// (or seki).
///
/// # Panics
///
/// Panics if `id` is not a stone group.
pub fn toggle_dead_stone_state_of_group(board: &mut Board, id: RegionId, mode: MarkMode) -> StoneGroupState {
    let region = board.region_mut(id);
    assert!(region.is_stone_group(), "cannot mark empty region {id:?}");

    region.group_state = match (mode, region.group_state) {
        (MarkMode::DeadStones, StoneGroupState::Dead) => StoneGroupState::Alive,
        (MarkMode::DeadStones, _) => StoneGroupState::Dead,
        (MarkMode::Seki, StoneGroupState::Seki) => StoneGroupState::Alive,
        (MarkMode::Seki, _) => StoneGroupState::Seki,
    };
    region.group_state
}

/// Replace all marks with a dead-stone list, e.g. an engine estimate.
///
/// Every group containing a listed point is dead, every other group alive.
/// Listed points without a stone are ignored. Returns the number of groups
/// marked dead.
pub fn apply_dead_stones(board: &mut Board, dead: &[Coord]) -> usize {
    let size = board.size();
    let mut dead_groups: Vec<RegionId> = Vec::new();
    for &coord in dead {
        if !coord.is_valid(size) || board.get(coord).is_none() {
            tracing::warn!(%coord, "dead stone list names a point without a stone");
            continue;
        }
        let id = board.region_id_at(coord);
        if !dead_groups.contains(&id) {
            dead_groups.push(id);
        }
    }

    for (id, region) in board.regions_mut() {
        if region.is_stone_group() {
            region.group_state = if dead_groups.contains(&id) {
                StoneGroupState::Dead
            } else {
                StoneGroupState::Alive
            };
        }
    }
    dead_groups.len()
}

/// Resolve undecided groups to alive, then assign a territory color to
/// every empty region and every dead group.
///
/// An empty region belongs to a color when all of its neighbouring groups
/// vote for that color: alive groups for their own color, dead groups for
/// the opponent. Regions touching a seki group or with split votes are
/// neutral, and so is open space that reaches all four edges of the board.
/// A split vote involving a dead group is flagged as inconsistent.
pub fn classify(board: &mut Board) -> Classification {
    for (_, region) in board.regions_mut() {
        if region.is_stone_group() && region.group_state == StoneGroupState::Undefined {
            region.group_state = StoneGroupState::Alive;
        }
    }

    let mut verdicts: Vec<(RegionId, Option<Color>, bool)> = Vec::new();

    for (id, region) in board.regions() {
        if region.is_stone_group() {
            continue;
        }
        let vote = tally_votes(board, id);
        let verdict = if vote.seki || vote.conflict {
            (None, vote.conflict && vote.dead)
        } else if touches_every_edge(board, id) {
            (None, false)
        } else {
            (vote.claim, false)
        };
        verdicts.push((id, verdict.0, verdict.1));
    }

    for &(id, color, inconsistent) in &verdicts {
        let region = board.region_mut(id);
        region.territory_color = color;
        region.territory_inconsistent = inconsistent;
    }

    // Dead groups are captured by the other side unless the space around
    // them is contested.
    let mut dead_verdicts: Vec<(RegionId, Option<Color>, bool)> = Vec::new();
    for (id, region) in board.regions() {
        let Some(color) = region.color() else { continue };
        if region.group_state != StoneGroupState::Dead {
            continue;
        }
        let contested = board.adjacent_regions(id).iter().any(|&adj| {
            let neighbour = board.region(adj);
            neighbour.territory_inconsistent
                || (neighbour.color() == Some(color.opposite())
                    && neighbour.group_state == StoneGroupState::Dead)
        });
        if contested {
            dead_verdicts.push((id, None, true));
        } else {
            dead_verdicts.push((id, Some(color.opposite()), false));
        }
    }
    for (_, region) in board.regions_mut() {
        if region.is_stone_group() && region.group_state != StoneGroupState::Dead {
            region.territory_color = None;
            region.territory_inconsistent = false;
        }
    }
    for &(id, color, inconsistent) in &dead_verdicts {
        let region = board.region_mut(id);
        region.territory_color = color;
        region.territory_inconsistent = inconsistent;
    }

    let inconsistent_regions = board
        .regions()
        .filter(|(_, r)| r.territory_inconsistent)
        .count();
    if inconsistent_regions > 0 {
        tracing::warn!(inconsistent_regions, "territory marking is inconsistent");
    }
    Classification {
        inconsistent_regions,
    }
}

/// Whether no wall separates the region from any side of the board
fn touches_every_edge(board: &Board, id: RegionId) -> bool {
    let last = board.size() - 1;
    let (mut left, mut right, mut bottom, mut top) = (false, false, false, false);
    for &idx in board.region(id).point_indices() {
        let coord = board.coord(idx);
        left |= coord.x == 0;
        right |= coord.x == last;
        bottom |= coord.y == 0;
        top |= coord.y == last;
    }
    left && right && bottom && top
}

#[derive(Default)]
struct Votes {
    claim: Option<Color>,
    conflict: bool,
    dead: bool,
    seki: bool,
}

fn tally_votes(board: &Board, empty: RegionId) -> Votes {
    let mut votes = Votes::default();
    for &adj in board.adjacent_regions(empty) {
        let group = board.region(adj);
        let Some(color) = group.color() else { continue };
        let vote = match group.group_state {
            StoneGroupState::Seki => {
                votes.seki = true;
                continue;
            }
            StoneGroupState::Dead => {
                votes.dead = true;
                color.opposite()
            }
            StoneGroupState::Alive | StoneGroupState::Undefined => color,
        };
        match votes.claim {
            None => votes.claim = Some(vote),
            Some(claim) if claim != vote => votes.conflict = true,
            Some(_) => {}
        }
    }
    votes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(vertex: &str) -> Coord {
        vertex.parse().unwrap()
    }

    fn split_board() -> Board {
        Board::from_diagram(
            "
            ..X.O..
            ..X.O..
            ..X.O..
            ..X.O..
            ..X.O..
            ..X.O..
            ..X.O..
            ",
        )
        .unwrap()
    }

    #[test]
    fn walls_claim_their_side() {
        let mut board = split_board();
        enter_scoring_mode(&mut board);
        let result = classify(&mut board);
        assert!(result.is_consistent());
        assert_eq!(board.region_at(c("A1")).territory_color(), Some(Color::Black));
        assert_eq!(board.region_at(c("G1")).territory_color(), Some(Color::White));
        // Dame between the walls
        assert_eq!(board.region_at(c("D4")).territory_color(), None);
        assert!(!board.region_at(c("D4")).is_territory_inconsistent());
        assert_eq!(board.region_at(c("C4")).group_state(), StoneGroupState::Alive);
    }

    #[test]
    fn dead_wall_hands_space_to_opponent() {
        let mut board = split_board();
        enter_scoring_mode(&mut board);
        let black = board.region_id_at(c("C1"));
        assert_eq!(
            toggle_dead_stone_state_of_group(&mut board, black, MarkMode::DeadStones),
            StoneGroupState::Dead
        );
        let result = classify(&mut board);
        // The left side now touches only a dead black group: white's
        assert_eq!(board.region_at(c("A1")).territory_color(), Some(Color::White));
        assert_eq!(board.region_at(c("C1")).territory_color(), Some(Color::White));
        assert_eq!(board.region_at(c("D1")).territory_color(), Some(Color::White));
        assert!(result.is_consistent());
    }

    #[test]
    fn dead_group_next_to_its_own_live_group_is_inconsistent() {
        let mut board = Board::from_diagram(
            "
            .......
            .......
            .......
            O.O....
            .......
            .......
            .......
            ",
        )
        .unwrap();
        enter_scoring_mode(&mut board);
        let dead = board.region_id_at(c("A4"));
        toggle_dead_stone_state_of_group(&mut board, dead, MarkMode::DeadStones);
        let result = classify(&mut board);
        assert!(!result.is_consistent());
        assert!(board.region_at(c("B4")).is_territory_inconsistent());
        assert_eq!(board.region_at(c("B4")).territory_color(), None);
        assert!(board.region_at(c("A4")).is_territory_inconsistent());
    }

    #[test]
    fn seki_makes_neighbouring_space_dame() {
        let mut board = split_board();
        enter_scoring_mode(&mut board);
        let white = board.region_id_at(c("E1"));
        assert_eq!(
            toggle_dead_stone_state_of_group(&mut board, white, MarkMode::Seki),
            StoneGroupState::Seki
        );
        classify(&mut board);
        assert_eq!(board.region_at(c("G1")).territory_color(), None);
        assert_eq!(board.region_at(c("A1")).territory_color(), Some(Color::Black));
        assert_eq!(
            toggle_dead_stone_state_of_group(&mut board, white, MarkMode::Seki),
            StoneGroupState::Alive
        );
    }

    #[test]
    fn lone_stone_claims_nothing() {
        let mut board = Board::with_size(9).unwrap();
        board.place_stone(c("E5"), Color::Black);
        enter_scoring_mode(&mut board);
        classify(&mut board);
        assert_eq!(board.region_at(c("A1")).territory_color(), None);
        assert!(!board.region_at(c("A1")).is_territory_inconsistent());
    }

    #[test]
    fn edge_wall_encloses_the_rest_of_the_board() {
        let mut board = Board::with_size(9).unwrap();
        for row in 1..=9 {
            board.place_stone(c(&format!("B{row}")), Color::Black);
        }
        enter_scoring_mode(&mut board);
        classify(&mut board);
        assert_eq!(board.region_at(c("A1")).territory_color(), Some(Color::Black));
        assert_eq!(board.region_at(c("J9")).territory_color(), Some(Color::Black));
    }

    #[test]
    fn seki_beside_a_dead_group_is_plain_dame() {
        let mut board = split_board();
        enter_scoring_mode(&mut board);
        let black = board.region_id_at(c("C1"));
        toggle_dead_stone_state_of_group(&mut board, black, MarkMode::Seki);
        let white = board.region_id_at(c("E1"));
        toggle_dead_stone_state_of_group(&mut board, white, MarkMode::DeadStones);
        let result = classify(&mut board);
        assert_eq!(board.region_at(c("D4")).territory_color(), None);
        assert!(!board.region_at(c("D4")).is_territory_inconsistent());
        assert!(result.is_consistent());
    }

    #[test]
    fn dead_stone_list_replaces_marks() {
        let mut board = split_board();
        enter_scoring_mode(&mut board);
        let white = board.region_id_at(c("E1"));
        toggle_dead_stone_state_of_group(&mut board, white, MarkMode::DeadStones);

        let marked = apply_dead_stones(&mut board, &[c("C7"), c("A1")]);
        assert_eq!(marked, 1);
        assert_eq!(board.region_at(c("C1")).group_state(), StoneGroupState::Dead);
        assert_eq!(board.region_at(c("E1")).group_state(), StoneGroupState::Alive);
    }

    #[test]
    fn classification_is_repeatable() {
        let mut board = split_board();
        enter_scoring_mode(&mut board);
        let black = board.region_id_at(c("C1"));
        toggle_dead_stone_state_of_group(&mut board, black, MarkMode::DeadStones);
        classify(&mut board);
        let first: Vec<_> = board
            .regions()
            .map(|(id, r)| (id, r.territory_color(), r.is_territory_inconsistent()))
            .collect();
        classify(&mut board);
        let second: Vec<_> = board
            .regions()
            .map(|(id, r)| (id, r.territory_color(), r.is_territory_inconsistent()))
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn leaving_scoring_mode_clears_marks() {
        let mut board = split_board();
        enter_scoring_mode(&mut board);
        let black = board.region_id_at(c("C1"));
        toggle_dead_stone_state_of_group(&mut board, black, MarkMode::DeadStones);
        classify(&mut board);
        leave_scoring_mode(&mut board);
        for (_, region) in board.regions() {
            assert!(!region.is_scoring_mode());
            assert_eq!(region.group_state(), StoneGroupState::Undefined);
            assert_eq!(region.territory_color(), None);
        }
    }
}

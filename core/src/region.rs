// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connected regions of the board and their incremental maintenance
//!
//! Every point belongs to exactly one region: a maximal 4-connected set of
//! points that are either all empty or all occupied by stones of one color.
//! Placing or removing a stone only touches the regions around the changed
//! point; a flood fill bounded by the affected region decides whether a
//! region split, and neighbouring regions of the same class are merged.
//!
//! Regions live in an arena and are referenced by [`RegionId`]. Points hold
//! the id of their region as a lookup reference only.

use crate::board::Board;
use crate::{Color, Coord};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use std::cell::OnceCell;
use std::collections::{HashSet, VecDeque};
use thiserror::Error;

/// Handle of a region inside a board's region arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(u32);

impl RegionId {
    /// Marks a point that is between two regions during a mutation
    const DETACHED: RegionId = RegionId(u32::MAX);

    /// Slot index in the arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a region is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occupancy {
    /// Empty intersections
    Empty,
    /// Stones of one color
    Stone(Color),
}

impl Occupancy {
    /// Occupancy class of a single point
    pub fn of(stone: Option<Color>) -> Self {
        match stone {
            Some(color) => Occupancy::Stone(color),
            None => Occupancy::Empty,
        }
    }

    /// Stone color, if this is a stone group
    pub fn color(&self) -> Option<Color> {
        match self {
            Occupancy::Stone(color) => Some(*color),
            Occupancy::Empty => None,
        }
    }
}

/// Life/death state of a stone group while scoring
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum StoneGroupState {
    /// Not yet decided
    #[default]
    Undefined = 0,
    /// Stays on the board
    Alive = 1,
    /// Removed as prisoners when counting
    Dead = 2,
    /// Mutual life, neither side can capture
    Seki = 3,
}

/// A maximal connected set of points sharing the same occupancy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    occupancy: Occupancy,
    /// Member point indices, unordered
    points: Vec<usize>,
    #[serde(skip)]
    liberties: OnceCell<usize>,
    #[serde(skip)]
    adjacent: OnceCell<Vec<RegionId>>,
    pub(crate) scoring_mode: bool,
    pub(crate) group_state: StoneGroupState,
    pub(crate) territory_color: Option<Color>,
    pub(crate) territory_inconsistent: bool,
}

impl Region {
    pub(crate) fn new(occupancy: Occupancy, points: Vec<usize>) -> Self {
        Self {
            occupancy,
            points,
            liberties: OnceCell::new(),
            adjacent: OnceCell::new(),
            scoring_mode: false,
            group_state: StoneGroupState::Undefined,
            territory_color: None,
            territory_inconsistent: false,
        }
    }

    /// A region of the same class and scoring state holding other points
    fn split_off(&self, points: Vec<usize>) -> Self {
        Self {
            occupancy: self.occupancy,
            points,
            liberties: OnceCell::new(),
            adjacent: OnceCell::new(),
            scoring_mode: self.scoring_mode,
            group_state: self.group_state,
            territory_color: self.territory_color,
            territory_inconsistent: self.territory_inconsistent,
        }
    }

    fn invalidate(&mut self) {
        self.liberties.take();
        self.adjacent.take();
    }

    /// What the region is made of
    pub fn occupancy(&self) -> Occupancy {
        self.occupancy
    }

    /// Stone color, `None` for empty regions
    pub fn color(&self) -> Option<Color> {
        self.occupancy.color()
    }

    /// Whether this region is a group of stones
    pub fn is_stone_group(&self) -> bool {
        matches!(self.occupancy, Occupancy::Stone(_))
    }

    /// Number of points in the region
    pub fn size(&self) -> usize {
        self.points.len()
    }

    /// Member point indices (see [`Board::points`])
    pub fn point_indices(&self) -> &[usize] {
        &self.points
    }

    /// Whether the region takes part in an active scoring session
    pub fn is_scoring_mode(&self) -> bool {
        self.scoring_mode
    }

    /// Life/death state, meaningful only in scoring mode
    pub fn group_state(&self) -> StoneGroupState {
        self.group_state
    }

    /// Whose territory the region's points count as
    pub fn territory_color(&self) -> Option<Color> {
        self.territory_color
    }

    /// Set when neighbouring marks disagree about who owns this region
    pub fn is_territory_inconsistent(&self) -> bool {
        self.territory_inconsistent
    }
}

/// Slot storage for regions with id reuse
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionArena {
    slots: Vec<Option<Region>>,
    free: Vec<u32>,
}

impl RegionArena {
    pub(crate) fn insert(&mut self, region: Region) -> RegionId {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Some(region);
                RegionId(slot)
            }
            None => {
                self.slots.push(Some(region));
                RegionId(self.slots.len() as u32 - 1)
            }
        }
    }

    fn remove(&mut self, id: RegionId) -> Region {
        let region = self.slots[id.index()]
            .take()
            .unwrap_or_else(|| panic!("region {id:?} does not exist"));
        self.free.push(id.0);
        region
    }

    fn get(&self, id: RegionId) -> Option<&Region> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: RegionId) -> Option<&mut Region> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    fn iter(&self) -> impl Iterator<Item = (RegionId, &Region)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|r| (RegionId(i as u32), r)))
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = (RegionId, &mut Region)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|r| (RegionId(i as u32), r)))
    }
}

/// A broken partition invariant found by [`Board::verify_partition`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("partition violated: {0}")]
pub struct PartitionViolation(pub String);

impl Board {
    /// Region lookup.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not name a live region of this board.
    pub fn region(&self, id: RegionId) -> &Region {
        self.regions
            .get(id)
            .unwrap_or_else(|| panic!("region {id:?} does not exist"))
    }

    pub(crate) fn region_mut(&mut self, id: RegionId) -> &mut Region {
        self.regions
            .get_mut(id)
            .unwrap_or_else(|| panic!("region {id:?} does not exist"))
    }

    /// Id of the region containing `coord`
    pub fn region_id_at(&self, coord: Coord) -> RegionId {
        self.points[self.index(coord)].region
    }

    /// The region containing `coord`
    pub fn region_at(&self, coord: Coord) -> &Region {
        self.region(self.region_id_at(coord))
    }

    /// All live regions
    pub fn regions(&self) -> impl Iterator<Item = (RegionId, &Region)> {
        self.regions.iter()
    }

    pub(crate) fn regions_mut(&mut self) -> impl Iterator<Item = (RegionId, &mut Region)> {
        self.regions.iter_mut()
    }

    /// Ids of all stone groups
    pub fn stone_groups(&self) -> Vec<RegionId> {
        self.regions
            .iter()
            .filter(|(_, r)| r.is_stone_group())
            .map(|(id, _)| id)
            .collect()
    }

    /// Coordinates of the points in a region
    pub fn region_coords(&self, id: RegionId) -> Vec<Coord> {
        self.region(id)
            .points
            .iter()
            .map(|&idx| self.coord(idx))
            .collect()
    }

    /// Number of distinct empty points adjacent to a stone group.
    ///
    /// Cached on the region until a mutation next to it; empty regions have
    /// no liberties.
    pub fn liberties(&self, id: RegionId) -> usize {
        let region = self.region(id);
        *region.liberties.get_or_init(|| self.count_liberties(region))
    }

    fn count_liberties(&self, region: &Region) -> usize {
        if !region.is_stone_group() {
            return 0;
        }
        let mut liberties = HashSet::new();
        for &p in &region.points {
            for n in self.neighbors(p) {
                if self.points[n].stone().is_none() {
                    liberties.insert(n);
                }
            }
        }
        liberties.len()
    }

    /// Regions sharing at least one edge with `id`, sorted by id
    pub fn adjacent_regions(&self, id: RegionId) -> &[RegionId] {
        let region = self.region(id);
        region.adjacent.get_or_init(|| {
            let mut adjacent: Vec<RegionId> = region
                .points
                .iter()
                .flat_map(|&p| self.neighbors(p))
                .map(|n| self.points[n].region)
                .filter(|&r| r != id)
                .collect();
            adjacent.sort_unstable();
            adjacent.dedup();
            adjacent
        })
    }

    /// Put a stone on an empty point and update the partition.
    ///
    /// The point leaves its empty region (which may split in two or more
    /// pieces) and joins every adjacent group of the same color. Captures
    /// are not resolved here; see [`Board::capture_region`].
    ///
    /// # Panics
    ///
    /// Panics if the point is occupied. Legality is the caller's job.
    pub fn place_stone(&mut self, coord: Coord, color: Color) {
        let idx = self.index(coord);
        assert!(
            self.points[idx].stone().is_none(),
            "place_stone: {coord} is already occupied"
        );

        let empty = self.points[idx].region;
        self.points[idx].set_stone(Some(color));
        let mut changed = self.detach_point(empty, idx);
        changed.push(self.attach_point(idx));
        self.invalidate_around(&changed);

        tracing::trace!(%coord, ?color, "stone placed");
    }

    /// Take a stone off the board and update the partition.
    ///
    /// The point joins every adjacent empty region; the stone group it left
    /// is split if the point was a bridge and deleted if it was the last
    /// stone.
    ///
    /// # Panics
    ///
    /// Panics if the point is empty.
    pub fn remove_stone(&mut self, coord: Coord) {
        let idx = self.index(coord);
        assert!(
            self.points[idx].stone().is_some(),
            "remove_stone: {coord} is empty"
        );

        let group = self.points[idx].region;
        self.points[idx].set_stone(None);
        let mut changed = self.detach_point(group, idx);
        changed.push(self.attach_point(idx));
        self.invalidate_around(&changed);

        tracing::trace!(%coord, "stone removed");
    }

    /// Remove a whole stone group in one step and return its coordinates.
    ///
    /// The vacated points become one empty region merged with every empty
    /// region they touch.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a stone group.
    pub fn capture_region(&mut self, id: RegionId) -> Vec<Coord> {
        assert!(
            self.region(id).is_stone_group(),
            "capture_region: {id:?} is not a stone group"
        );

        let group = self.regions.remove(id);
        let vacated = self.regions.insert(Region::new(Occupancy::Empty, group.points.clone()));
        for &p in &group.points {
            self.points[p].set_stone(None);
            self.points[p].region = vacated;
        }

        let mut merge = vec![vacated];
        for &p in &group.points {
            for n in self.neighbors(p) {
                let r = self.points[n].region;
                if self.points[n].stone().is_none() && !merge.contains(&r) {
                    merge.push(r);
                }
            }
        }
        let merged = self.merge_regions(merge);
        self.invalidate_around(&[merged]);

        let coords: Vec<Coord> = group.points.iter().map(|&p| self.coord(p)).collect();
        tracing::debug!(stones = coords.len(), color = ?group.color(), "group captured");
        coords
    }

    /// Drop `idx` from region `id`, splitting the rest if it fell apart.
    /// Returns the ids of the surviving pieces.
    fn detach_point(&mut self, id: RegionId, idx: usize) -> Vec<RegionId> {
        self.points[idx].region = RegionId::DETACHED;
        let region = self.region_mut(id);
        region.points.retain(|&p| p != idx);
        if region.points.is_empty() {
            self.regions.remove(id);
            return Vec::new();
        }

        let seeds: Vec<usize> = self
            .neighbors(idx)
            .filter(|&n| self.points[n].region == id)
            .collect();
        if seeds.len() < 2 {
            return vec![id];
        }

        // The rest stays connected iff one flood fill reaches every seed.
        let mut visited = HashSet::new();
        let first = self.collect_component(seeds[0], id, &mut visited);
        if seeds.iter().all(|s| visited.contains(s)) {
            return vec![id];
        }

        let mut pieces = vec![id];
        for &seed in &seeds[1..] {
            if visited.contains(&seed) {
                continue;
            }
            let component = self.collect_component(seed, id, &mut visited);
            let piece = self.region(id).split_off(component);
            let piece_id = self.regions.insert(piece);
            let members = self.region(piece_id).points.clone();
            for p in members {
                self.points[p].region = piece_id;
            }
            pieces.push(piece_id);
        }
        self.region_mut(id).points = first;

        tracing::debug!(region = ?id, pieces = pieces.len(), "region split");
        pieces
    }

    /// Breadth-first traversal over points labelled `label`
    fn collect_component(&self, start: usize, label: RegionId, visited: &mut HashSet<usize>) -> Vec<usize> {
        let mut component = vec![start];
        let mut queue = VecDeque::from([start]);
        visited.insert(start);

        while let Some(p) = queue.pop_front() {
            for n in self.neighbors(p) {
                if self.points[n].region == label && visited.insert(n) {
                    component.push(n);
                    queue.push_back(n);
                }
            }
        }
        component
    }

    /// Give a detached point a region: a new singleton merged with every
    /// adjacent region of the same occupancy
    fn attach_point(&mut self, idx: usize) -> RegionId {
        let occupancy = Occupancy::of(self.points[idx].stone());
        let single = self.regions.insert(Region::new(occupancy, vec![idx]));
        self.points[idx].region = single;

        let mut merge = vec![single];
        for n in self.neighbors(idx) {
            let r = self.points[n].region;
            if Occupancy::of(self.points[n].stone()) == occupancy && !merge.contains(&r) {
                merge.push(r);
            }
        }
        self.merge_regions(merge)
    }

    /// Union regions of the same occupancy into the largest of them
    fn merge_regions(&mut self, ids: Vec<RegionId>) -> RegionId {
        let target = ids
            .iter()
            .copied()
            .max_by_key(|&id| self.region(id).size())
            .unwrap_or_else(|| panic!("merge_regions: nothing to merge"));

        if ids.len() > 1 {
            tracing::trace!(into = ?target, count = ids.len(), "merging regions");
        }

        for id in ids.into_iter().filter(|&id| id != target) {
            let absorbed = self.regions.remove(id);
            debug_assert_eq!(absorbed.occupancy, self.region(target).occupancy);
            for &p in &absorbed.points {
                self.points[p].region = target;
            }
            self.region_mut(target).points.extend(absorbed.points);
        }
        target
    }

    /// Drop cached liberties/adjacency of the changed regions and of every
    /// region touching them
    fn invalidate_around(&mut self, changed: &[RegionId]) {
        let mut stale: HashSet<RegionId> = changed.iter().copied().collect();
        for &id in changed {
            for &p in &self.region(id).points {
                stale.extend(self.neighbors(p).map(|n| self.points[n].region));
            }
        }
        for id in stale {
            self.region_mut(id).invalidate();
        }
    }

    /// Recompute the partition from scratch and compare it with the
    /// incrementally maintained one, including cached liberties.
    pub fn verify_partition(&self) -> Result<(), PartitionViolation> {
        let violation = |msg: String| Err(PartitionViolation(msg));

        let expected = self.board_size().points();
        if self.points.len() != expected {
            return violation(format!("board has {} points, expected {expected}", self.points.len()));
        }
        let n = self.size();
        for (p, point) in self.points.iter().enumerate() {
            let coord = Coord::new((p % n as usize) as u8, (p / n as usize) as u8);
            if point.coord() != coord {
                return violation(format!("point {p} claims to be {}", point.coord()));
            }
        }

        let mut listed = vec![false; self.points.len()];
        let mut covered = 0;
        for (id, region) in self.regions.iter() {
            if region.points.is_empty() {
                return violation(format!("{id:?} is empty"));
            }
            covered += region.size();

            for &p in &region.points {
                if p >= listed.len() || std::mem::replace(&mut listed[p], true) {
                    return violation(format!("{id:?} lists point {p} out of range or twice"));
                }
                if self.points[p].region != id {
                    return violation(format!(
                        "{} is listed in {id:?} but points to {:?}",
                        self.coord(p),
                        self.points[p].region
                    ));
                }
                if Occupancy::of(self.points[p].stone()) != region.occupancy {
                    return violation(format!("{} does not match {id:?} occupancy", self.coord(p)));
                }
            }

            let mut visited = HashSet::new();
            if self.collect_component(region.points[0], id, &mut visited).len() != region.size() {
                return violation(format!("{id:?} is not connected"));
            }

            if let Some(&cached) = region.liberties.get() {
                let actual = self.count_liberties(region);
                if cached != actual {
                    return violation(format!("{id:?} caches {cached} liberties, has {actual}"));
                }
            }
        }
        if covered != self.points.len() {
            return violation(format!("regions cover {covered} of {} points", self.points.len()));
        }

        for (p, point) in self.points.iter().enumerate() {
            for n in self.neighbors(p) {
                if point.region != self.points[n].region
                    && point.stone() == self.points[n].stone()
                {
                    return violation(format!(
                        "{} and {} share a class but not a region",
                        self.coord(p),
                        self.coord(n)
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(vertex: &str) -> Coord {
        vertex.parse().unwrap()
    }

    #[test]
    fn placing_splits_empty_region() {
        let mut board = Board::with_size(7).unwrap();
        for y in 0..7 {
            board.place_stone(Coord::new(3, y), Color::Black);
        }
        // Wall down the D column: two empty halves and one group
        assert_eq!(board.regions().count(), 3);
        assert_ne!(board.region_id_at(c("A1")), board.region_id_at(c("G1")));
        assert_eq!(board.region_at(c("D4")).size(), 7);
        board.verify_partition().unwrap();
    }

    #[test]
    fn placing_merges_friendly_groups() {
        let mut board = Board::with_size(9).unwrap();
        board.place_stone(c("C3"), Color::Black);
        board.place_stone(c("E3"), Color::Black);
        assert_ne!(board.region_id_at(c("C3")), board.region_id_at(c("E3")));
        board.place_stone(c("D3"), Color::Black);
        assert_eq!(board.region_id_at(c("C3")), board.region_id_at(c("E3")));
        assert_eq!(board.region_at(c("D3")).size(), 3);
        assert_eq!(board.liberties(board.region_id_at(c("D3"))), 8);
        board.verify_partition().unwrap();
    }

    #[test]
    fn liberties_follow_neighbouring_moves() {
        let mut board = Board::with_size(9).unwrap();
        board.place_stone(c("E5"), Color::Black);
        let group = board.region_id_at(c("E5"));
        assert_eq!(board.liberties(group), 4);
        board.place_stone(c("E6"), Color::White);
        assert_eq!(board.liberties(board.region_id_at(c("E5"))), 3);
        board.remove_stone(c("E6"));
        assert_eq!(board.liberties(board.region_id_at(c("E5"))), 4);
        board.verify_partition().unwrap();
    }

    #[test]
    fn removing_bridge_stone_splits_group() {
        let mut board = Board::with_size(9).unwrap();
        for v in ["C3", "D3", "E3"] {
            board.place_stone(c(v), Color::White);
        }
        board.remove_stone(c("D3"));
        assert_ne!(board.region_id_at(c("C3")), board.region_id_at(c("E3")));
        assert_eq!(board.region_at(c("C3")).size(), 1);
        board.verify_partition().unwrap();
    }

    #[test]
    fn capture_region_merges_empty_space() {
        let mut board = Board::from_diagram(
            "
            .......
            .......
            ..X....
            .XOX...
            ..X....
            .......
            .......
            ",
        )
        .unwrap();
        let white = board.region_id_at(c("C4"));
        assert_eq!(board.liberties(white), 0);
        let captured = board.capture_region(white);
        assert_eq!(captured, vec![c("C4")]);
        assert_eq!(board.get(c("C4")), None);
        // The vacated point is an isolated eye-shaped empty region
        assert_eq!(board.region_at(c("C4")).size(), 1);
        assert_eq!(board.liberties(board.region_id_at(c("B4"))), 4);
        board.verify_partition().unwrap();
    }

    #[test]
    fn adjacent_regions_are_cached_and_refreshed() {
        let mut board = Board::with_size(7).unwrap();
        board.place_stone(c("A1"), Color::Black);
        let black = board.region_id_at(c("A1"));
        let empty = board.region_id_at(c("B1"));
        assert_eq!(board.adjacent_regions(black), &[empty]);

        board.place_stone(c("B1"), Color::White);
        let white = board.region_id_at(c("B1"));
        let adjacent = board.adjacent_regions(board.region_id_at(c("A1"))).to_vec();
        assert!(adjacent.contains(&white));
        assert_eq!(adjacent.len(), 2);
    }

    #[test]
    #[should_panic(expected = "already occupied")]
    fn placing_on_occupied_point_panics() {
        let mut board = Board::with_size(9).unwrap();
        board.place_stone(c("E5"), Color::Black);
        board.place_stone(c("E5"), Color::White);
    }

    #[test]
    #[should_panic(expected = "is empty")]
    fn removing_from_empty_point_panics() {
        let mut board = Board::with_size(9).unwrap();
        board.remove_stone(c("E5"));
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Board representation: a fixed grid of points partitioned into regions

use crate::region::{Occupancy, Region, RegionArena, RegionId};
use crate::{Color, Coord, GameError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Edge length of a square board. Only odd sizes from 7 to 19 are playable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct BoardSize(u8);

impl BoardSize {
    /// All supported edge lengths
    pub const SUPPORTED: [u8; 7] = [7, 9, 11, 13, 15, 17, 19];

    /// Validate a board size
    pub fn new(size: u8) -> Result<Self, GameError> {
        if Self::SUPPORTED.contains(&size) {
            Ok(Self(size))
        } else {
            Err(GameError::UnsupportedBoardSize(size))
        }
    }

    /// Edge length
    pub fn get(self) -> u8 {
        self.0
    }

    /// Number of intersections on the board
    pub fn points(self) -> usize {
        self.0 as usize * self.0 as usize
    }

    /// Star points (hoshi) for this board size.
    ///
    /// Corner star points sit on the 3rd line below 13x13 and on the 4th line
    /// from 13x13 upwards. Every size has a centre point; side points only
    /// exist from 15x15 upwards.
    pub fn star_points(self) -> Vec<Coord> {
        let n = self.0;
        let edge = if n >= 13 { 3 } else { 2 };
        let far = n - 1 - edge;
        let mid = n / 2;

        let mut points = vec![
            Coord::new(edge, edge),
            Coord::new(far, edge),
            Coord::new(edge, far),
            Coord::new(far, far),
            Coord::new(mid, mid),
        ];
        if n >= 15 {
            points.extend([
                Coord::new(edge, mid),
                Coord::new(far, mid),
                Coord::new(mid, edge),
                Coord::new(mid, far),
            ]);
        }
        points
    }
}

impl TryFrom<u8> for BoardSize {
    type Error = GameError;

    fn try_from(size: u8) -> Result<Self, Self::Error> {
        Self::new(size)
    }
}

impl From<BoardSize> for u8 {
    fn from(size: BoardSize) -> u8 {
        size.0
    }
}

/// A single intersection of the board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    coord: Coord,
    stone: Option<Color>,
    star_point: bool,
    /// Influence estimate in [-1, 1], positive values favour Black
    territory_statistics: f32,
    /// Lookup reference only; the region owns the membership
    pub(crate) region: RegionId,
}

impl Point {
    /// The vertex of this point
    pub fn coord(&self) -> Coord {
        self.coord
    }

    /// The stone on this point, if any
    pub fn stone(&self) -> Option<Color> {
        self.stone
    }

    /// Whether this is a star point (hoshi)
    pub fn is_star_point(&self) -> bool {
        self.star_point
    }

    /// Last influence estimate for this point
    pub fn territory_statistics(&self) -> f32 {
        self.territory_statistics
    }

    /// The region this point currently belongs to
    pub fn region(&self) -> RegionId {
        self.region
    }

    pub(crate) fn set_stone(&mut self, stone: Option<Color>) {
        self.stone = stone;
    }
}

/// Represents the Go board with stones, empty positions and the region
/// partition derived from them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    /// Size of the board
    size: BoardSize,
    /// Positions on the board, row by row starting at A1
    pub(crate) points: Vec<Point>,
    /// Connected regions covering every point exactly once
    pub(crate) regions: RegionArena,
}

impl Board {
    /// Create a new empty board with the specified size.
    ///
    /// The whole board starts out as a single empty region.
    pub fn new(size: BoardSize) -> Self {
        let n = size.get();
        let mut regions = RegionArena::default();
        let all = regions.insert(Region::new(Occupancy::Empty, (0..size.points()).collect()));
        let stars = size.star_points();

        let points = (0..size.points())
            .map(|idx| {
                let coord = Coord::new((idx % n as usize) as u8, (idx / n as usize) as u8);
                Point {
                    coord,
                    stone: None,
                    star_point: stars.contains(&coord),
                    territory_statistics: 0.0,
                    region: all,
                }
            })
            .collect();

        Self {
            size,
            points,
            regions,
        }
    }

    /// Create a new empty board, validating the edge length
    pub fn with_size(size: u8) -> Result<Self, GameError> {
        Ok(Self::new(BoardSize::new(size)?))
    }

    /// Get the size of the board
    pub fn size(&self) -> u8 {
        self.size.get()
    }

    /// Get the validated board size
    pub fn board_size(&self) -> BoardSize {
        self.size
    }

    /// Convert a coordinate to a point index
    pub(crate) fn index(&self, coord: Coord) -> usize {
        debug_assert!(coord.is_valid(self.size()), "{coord:?} is off the board");
        (coord.y as usize) * (self.size() as usize) + (coord.x as usize)
    }

    /// Convert a point index back to a coordinate
    pub(crate) fn coord(&self, idx: usize) -> Coord {
        self.points[idx].coord
    }

    /// Indices of the (up to four) points adjacent to `idx`
    pub(crate) fn neighbors(&self, idx: usize) -> impl Iterator<Item = usize> {
        let n = self.size() as usize;
        let (x, y) = (idx % n, idx / n);
        let mut out = [usize::MAX; 4];
        if x > 0 {
            out[0] = idx - 1;
        }
        if x + 1 < n {
            out[1] = idx + 1;
        }
        if y > 0 {
            out[2] = idx - n;
        }
        if y + 1 < n {
            out[3] = idx + n;
        }
        out.into_iter().filter(|&i| i != usize::MAX)
    }

    /// Get the point at the specified coordinate
    pub fn point(&self, coord: Coord) -> Option<&Point> {
        if !coord.is_valid(self.size()) {
            return None;
        }
        Some(&self.points[self.index(coord)])
    }

    /// All points, row by row starting at A1
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Get the stone at the specified coordinate
    pub fn get(&self, coord: Coord) -> Option<Color> {
        self.point(coord).and_then(Point::stone)
    }

    /// Get adjacent coordinates (up, down, left, right)
    pub fn adjacent_coords(&self, coord: Coord) -> Vec<Coord> {
        coord.adjacent_coords(self.size())
    }

    /// Count stones of specified color on the board
    pub fn count_stones_for(&self, color: Color) -> usize {
        self.points.iter().filter(|p| p.stone == Some(color)).count()
    }

    /// Coordinates of all stones of the given color
    pub fn stones_of(&self, color: Color) -> Vec<Coord> {
        self.points
            .iter()
            .filter(|p| p.stone == Some(color))
            .map(|p| p.coord)
            .collect()
    }

    /// Replace the influence estimate of every point.
    ///
    /// `values` is indexed like [`Board::points`].
    pub(crate) fn set_territory_statistics(&mut self, values: &[f32]) {
        for (point, value) in self.points.iter_mut().zip(values) {
            point.territory_statistics = *value;
        }
    }

    /// Build a board from an ASCII diagram.
    ///
    /// The first non-blank line is the top row. `X`/`B`/`#` are black
    /// stones, `O`/`W` white stones, `.`/`+`/`-` empty points; whitespace is
    /// ignored.
    pub fn from_diagram(diagram: &str) -> Result<Self, GameError> {
        let rows: Vec<Vec<char>> = diagram
            .lines()
            .map(|line| line.chars().filter(|c| !c.is_whitespace()).collect::<Vec<_>>())
            .filter(|row| !row.is_empty())
            .collect();

        let n = u8::try_from(rows.len())
            .map_err(|_| GameError::InvalidDiagram(format!("{} rows", rows.len())))?;
        let size = BoardSize::new(n)?;
        let mut board = Board::new(size);

        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != n as usize {
                return Err(GameError::InvalidDiagram(format!(
                    "row {} has {} points, expected {}",
                    row_idx + 1,
                    row.len(),
                    n
                )));
            }
            let y = n - 1 - row_idx as u8;
            for (x, symbol) in row.iter().enumerate() {
                let coord = Coord::new(x as u8, y);
                match symbol.to_ascii_uppercase() {
                    'X' | 'B' | '#' => board.place_stone(coord, Color::Black),
                    'O' | 'W' => board.place_stone(coord, Color::White),
                    '.' | '+' | '-' => {}
                    other => {
                        return Err(GameError::InvalidDiagram(format!(
                            "unknown symbol {other:?} at {coord}"
                        )))
                    }
                }
            }
        }

        Ok(board)
    }

    /// Render the stones as a diagram readable by [`Board::from_diagram`]
    pub fn to_diagram(&self) -> String {
        let n = self.size();
        let mut out = String::with_capacity(self.points.len() + n as usize);
        for y in (0..n).rev() {
            for x in 0..n {
                out.push(match self.get(Coord::new(x, y)) {
                    Some(Color::Black) => 'X',
                    Some(Color::White) => 'O',
                    None => '.',
                });
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_diagram())
    }
}

//! The discrete coordinate space snakes move on.
//!
//! A [Grid] is either bounded, where leaving it is lethal, or wrapping, where
//! each edge continues on the opposite one.

use crate::types::{Move, Vector};
use serde::{Deserialize, Serialize};

/// A cell on the grid
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    #[allow(missing_docs)]
    pub x: i32,
    #[allow(missing_docs)]
    pub y: i32,
}

impl Position {
    #[allow(missing_docs)]
    pub const fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// offset this position, without any bounds handling
    pub fn add_vec(&self, v: Vector) -> Position {
        Position {
            x: self.x + v.x,
            y: self.y + v.y,
        }
    }

    /// squared straight-line distance, enough for ranking
    pub fn distance_squared(&self, other: Position) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    /// straight-line distance
    pub fn distance(&self, other: Position) -> f64 {
        (self.distance_squared(other) as f64).sqrt()
    }

    /// manhattan distance
    pub fn manhattan(&self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Result of stepping off a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// the step stayed on the grid (always the case on wrapping grids)
    Inside(Position),
    /// the step left a bounded grid. Carries the wrapped cell for snakes
    /// that may pass through walls
    OutOfBounds(Position),
}

impl Step {
    /// the cell on the grid, `None` if the step left a bounded grid
    pub fn inside(self) -> Option<Position> {
        match self {
            Step::Inside(p) => Some(p),
            Step::OutOfBounds(_) => None,
        }
    }
}

/// Dimensions and topology of the playing field
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Grid {
    /// number of columns, x in `[0, cols)`
    pub cols: u32,
    /// number of rows, y in `[0, rows)`
    pub rows: u32,
    /// whether the edges wrap around
    pub wrapping: bool,
}

impl Default for Grid {
    fn default() -> Self {
        Grid {
            cols: 30,
            rows: 30,
            wrapping: false,
        }
    }
}

impl Grid {
    #[allow(missing_docs)]
    pub fn new(cols: u32, rows: u32, wrapping: bool) -> Self {
        Grid {
            cols,
            rows,
            wrapping,
        }
    }

    /// total number of cells
    pub fn area(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    #[allow(missing_docs)]
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.cols as i32 && pos.y >= 0 && pos.y < self.rows as i32
    }

    /// maps any coordinate back onto the grid, continuing on the opposite edge
    pub fn wrap(&self, pos: Position) -> Position {
        Position {
            x: pos.x.rem_euclid(self.cols as i32),
            y: pos.y.rem_euclid(self.rows as i32),
        }
    }

    /// computes the cell reached by moving one step from `pos`
    pub fn advance(&self, pos: Position, mv: Move) -> Step {
        let next = pos.add_vec(mv.to_vector());
        if self.contains(next) {
            Step::Inside(next)
        } else if self.wrapping {
            Step::Inside(self.wrap(next))
        } else {
            Step::OutOfBounds(self.wrap(next))
        }
    }

    /// the on-grid neighbours of a cell together with the move that reaches each
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = (Move, Position)> + '_ {
        Move::all()
            .into_iter()
            .filter_map(move |mv| self.advance(pos, mv).inside().map(|p| (mv, p)))
    }

    /// iterates every cell, row by row
    pub fn cells(&self) -> impl Iterator<Item = Position> {
        let (cols, rows) = (self.cols as i32, self.rows as i32);
        (0..rows).flat_map(move |y| (0..cols).map(move |x| Position { x, y }))
    }

    /// index of an on-grid cell in row-major order
    pub fn index_of(&self, pos: Position) -> usize {
        debug_assert!(self.contains(pos));
        pos.y as usize * self.cols as usize + pos.x as usize
    }
}

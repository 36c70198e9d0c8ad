//! various small types shared by every part of the simulation
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A vector with which to do positional math
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vector {
    /// x offset
    pub x: i32,
    /// y offset
    pub y: i32,
}

/// Represents a move. The grid uses screen coordinates, so `Up` decreases y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    #[allow(missing_docs)]
    Up,
    #[allow(missing_docs)]
    Down,
    #[allow(missing_docs)]
    Left,
    #[allow(missing_docs)]
    Right,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Left => write!(f, "left"),
            Move::Right => write!(f, "right"),
            Move::Up => write!(f, "up"),
            Move::Down => write!(f, "down"),
        }
    }
}

impl Move {
    /// convert this move to a vector
    pub fn to_vector(self) -> Vector {
        match self {
            Move::Left => Vector { x: -1, y: 0 },
            Move::Right => Vector { x: 1, y: 0 },
            Move::Up => Vector { x: 0, y: -1 },
            Move::Down => Vector { x: 0, y: 1 },
        }
    }

    /// create a Move from a unit vector, `None` for anything else
    pub fn from_vector(vector: Vector) -> Option<Self> {
        match vector {
            Vector { x: -1, y: 0 } => Some(Self::Left),
            Vector { x: 1, y: 0 } => Some(Self::Right),
            Vector { x: 0, y: -1 } => Some(Self::Up),
            Vector { x: 0, y: 1 } => Some(Self::Down),
            _ => None,
        }
    }

    /// returns all possible moves, in a fixed order
    pub fn all() -> [Move; 4] {
        [Move::Up, Move::Down, Move::Left, Move::Right]
    }

    /// the move pointing the other way
    pub fn reverse(self) -> Move {
        match self {
            Move::Up => Move::Down,
            Move::Down => Move::Up,
            Move::Left => Move::Right,
            Move::Right => Move::Left,
        }
    }

    /// checks if a given move is the exact reverse of this move. e.g. Up is opposite to Down,
    /// but not to Left
    pub fn is_opposite(&self, other: Move) -> bool {
        let a = self.to_vector();
        let b = other.to_vector();
        a.x == -b.x && a.y == -b.y
    }
}

/// token to represent a snake, the index of the snake in its round
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnakeId(pub u8);

impl SnakeId {
    /// convert this snake ID to a usize
    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SnakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "snake#{}", self.0)
    }
}

/// Who steers a snake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Controller {
    /// directions arrive through `Round::set_direction`
    Human,
    /// directions come from the pathfinding controller every tick
    Ai,
}

impl Controller {
    #[allow(missing_docs)]
    pub fn is_ai(&self) -> bool {
        matches!(self, Controller::Ai)
    }
}

/// Instruments to be used with the tick loop
pub trait TickInstruments: std::fmt::Debug {
    /// called with the wall time spent in one logic tick
    fn observe_tick(&self, duration: Duration);
}

/// Instruments that throw every observation away
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInstruments;

impl TickInstruments for NoopInstruments {
    fn observe_tick(&self, _duration: Duration) {}
}

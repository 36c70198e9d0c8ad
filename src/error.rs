//! Errors surfaced by the core. Everything that happens inside a running round
//! is state, not an error; only configuration and persistence can fail.
use thiserror::Error;

use crate::grid::Grid;
use crate::types::SnakeId;

/// Reasons a round refuses to start
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("grid must have at least one column and one row, got {cols}x{rows}")]
    #[allow(missing_docs)]
    EmptyGrid { cols: u32, rows: u32 },
    #[error("grid sides are limited to {max} cells, got {cols}x{rows}")]
    #[allow(missing_docs)]
    GridTooLarge { cols: u32, rows: u32, max: u32 },
    #[error("board grid {actual:?} does not match the configured grid {expected:?}")]
    #[allow(missing_docs)]
    BoardGrid { expected: Grid, actual: Grid },
    #[error("board holds {actual} snakes but {expected} controllers are configured")]
    #[allow(missing_docs)]
    BoardSnakeCount { expected: usize, actual: usize },
    #[error("snake at index {index} carries id {id}, ids must match turn order")]
    #[allow(missing_docs)]
    SnakeIdMismatch { index: usize, id: SnakeId },
    #[error("a round needs at least one snake")]
    #[allow(missing_docs)]
    NoSnakes,
    #[error("{mode} mode expects {expected} snakes, got {actual}")]
    #[allow(missing_docs)]
    SnakeCountForMode {
        mode: String,
        expected: String,
        actual: usize,
    },
    #[error("snake {index} would spawn outside the {cols}x{rows} grid")]
    #[allow(missing_docs)]
    SpawnOutOfBounds { index: usize, cols: u32, rows: u32 },
    #[error("snakes {first} and {second} would spawn on top of each other")]
    #[allow(missing_docs)]
    OverlappingSpawns { first: usize, second: usize },
    #[error("base tick interval must be positive, got {0}ms")]
    #[allow(missing_docs)]
    TickInterval(f64),
    #[error("time limit must be positive, got {0}ms")]
    #[allow(missing_docs)]
    TimeLimit(f64),
    #[error("tuning value `{name}` is out of range: {value}")]
    #[allow(missing_docs)]
    Tuning { name: &'static str, value: f64 },
    #[error("could not parse round config: {0}")]
    #[allow(missing_docs)]
    Parse(#[from] serde_json::Error),
}

/// Failures of the score persistence boundary
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("score storage unavailable: {0}")]
    #[allow(missing_docs)]
    Io(#[from] std::io::Error),
    #[error("score storage is corrupt: {0}")]
    #[allow(missing_docs)]
    Format(#[from] serde_json::Error),
}

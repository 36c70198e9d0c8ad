#![deny(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs
)]
//! Deterministic simulation core for a multi-snake arcade game.
//!
//! A [Round] owns every entity on the grid and is driven by wall-clock deltas
//! through [Round::tick]; each logic tick moves the snakes in turn order (AI
//! snakes pick their move with [ai::decide] first), then resolves collisions
//! and feeding. Rendering, audio and input live outside the crate and talk to
//! the round through its command and query surface:
//!
//! ```
//! use snake_arena_core::{Features, Mode, Move, RoundConfig, Session};
//!
//! let session = Session::new(RoundConfig {
//!     seed: Some(7),
//!     ..Default::default()
//! });
//! let mut round = session
//!     .init_round(Mode::VersusAi, Features::default(), 2)
//!     .expect("the default grid fits two snakes");
//! round.set_direction(0, Move::Right);
//! round.tick(150.0);
//! assert_eq!(round.ticks(), 1);
//! assert_eq!(round.snakes()[0].head().x, 6);
//! ```

pub mod ai;
pub mod board;
pub mod config;
pub mod error;
pub mod food;
pub mod grid;
pub mod round;
pub mod rules;
pub mod scheduler;
pub mod session;
pub mod snake;
pub mod types;

pub use config::{Features, Mode, RoundConfig, Tuning};
pub use error::{ConfigError, StoreError};
pub use grid::Position;
pub use round::{Round, RoundEvent, RoundSummary, Snapshot};
pub use rules::Outcome;
pub use session::{JsonFileStore, ScoreStore, Session};
pub use types::{Controller, Move, SnakeId};

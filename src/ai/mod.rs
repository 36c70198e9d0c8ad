//! The AI controller.
//!
//! Each tick an AI snake picks its next turn in priority order:
//!
//! 1. stuck detection, which may switch it to exploring a random target
//! 2. while exploring, the shortest path to that target
//! 3. the shortest path to the closest reachable food
//! 4. the safe move with the most open space around it
//! 5. otherwise it keeps going and takes its chances
//!
//! The controller only reads the board; its scratch state lives in the
//! snake's [AiMemory].
pub mod pathing;

use fxhash::FxHashSet;
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, trace};

use crate::board::Board;
use crate::config::Tuning;
use crate::grid::Position;
use crate::types::{Move, SnakeId};
use pathing::{bfs, flood_fill, is_safe, is_safe_cell, move_towards};

/// What an AI snake is currently up to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiState {
    /// heading for the closest reachable food
    Pursuing,
    /// breaking out of a small area by walking to a far target
    Exploring {
        #[allow(missing_docs)]
        target: Position,
    },
    /// no food reachable, maximizing open space
    Wandering,
}

impl Default for AiState {
    fn default() -> Self {
        AiState::Pursuing
    }
}

/// Per-snake AI scratch state
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AiMemory {
    #[allow(missing_docs)]
    pub state: AiState,
    /// where the head was when the current stuck window started
    pub region_center: Option<Position>,
    /// time spent within the stuck radius of `region_center`
    pub stuck_ms: f64,
}

impl AiMemory {
    #[allow(missing_docs)]
    pub fn is_exploring(&self) -> bool {
        matches!(self.state, AiState::Exploring { .. })
    }

    /// Feeds the head position of this tick into the stuck detector. Returns
    /// true when the snake has lingered long enough to start exploring.
    fn observe(&mut self, head: Position, tick_ms: f64, tuning: &Tuning) -> bool {
        let center = match self.region_center {
            Some(center) => center,
            None => {
                self.region_center = Some(head);
                self.stuck_ms = 0.0;
                return false;
            }
        };

        if head.distance(center) > tuning.stuck_radius {
            self.region_center = Some(head);
            self.stuck_ms = 0.0;
            if self.is_exploring() {
                self.state = AiState::Pursuing;
            }
            return false;
        }

        self.stuck_ms += tick_ms;
        self.stuck_ms > tuning.stuck_threshold_ms && !self.is_exploring()
    }

    fn settle(&mut self, state: AiState) {
        if !self.is_exploring() {
            self.state = state;
        }
    }
}

/// Why the controller chose what it chose
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reason {
    /// walking toward the exploration target
    Exploring(Position),
    /// walking toward the food at this cell
    Food(Position),
    /// no food reachable, this move had the given flood fill count
    Space(usize),
    /// every move is deadly, the current direction is kept
    NoSafeMove,
}

/// The outcome of one controller evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    /// the turn to request, `None` to keep the current direction
    pub mv: Option<Move>,
    #[allow(missing_docs)]
    pub reason: Reason,
}

/// Chooses the next move for snake `id` and updates its memory.
///
/// `tick_ms` is the duration of the current tick, used by the stuck timer.
pub fn decide<R: Rng + ?Sized>(
    board: &Board,
    id: SnakeId,
    memory: &mut AiMemory,
    tuning: &Tuning,
    tick_ms: f64,
    rng: &mut R,
) -> Decision {
    let snake = match board.snake(id) {
        Some(snake) if snake.is_alive() => snake,
        _ => {
            return Decision {
                mv: None,
                reason: Reason::NoSafeMove,
            }
        }
    };
    let head = snake.head();
    let grid = &board.grid;
    let blocked = board.blocked_cells(id);

    if memory.observe(head, tick_ms, tuning) {
        let region_center = memory.region_center.unwrap_or(head);
        let target = exploration_target(board, id, head, &blocked, region_center, tuning, rng);
        debug!(snake = %id, ?target, "stuck, exploring");
        memory.state = AiState::Exploring { target };
        memory.stuck_ms = 0.0;
    }

    if let AiState::Exploring { target } = memory.state {
        if head.distance(target) <= tuning.arrival_distance {
            trace!(snake = %id, ?target, "exploration target reached");
            memory.state = AiState::Pursuing;
        } else if let Some(mv) = bfs(grid, &blocked, head, target)
            .and_then(|path| path.first().copied())
            .and_then(|step| move_towards(grid, head, step))
        {
            return Decision {
                mv: Some(mv),
                reason: Reason::Exploring(target),
            };
        }
    }

    let by_distance = board
        .active_food()
        .map(|f| f.position)
        .sorted_by_key(|p| head.distance_squared(*p));
    for food in by_distance {
        let first_step = bfs(grid, &blocked, head, food).and_then(|path| path.first().copied());
        if let Some(mv) = first_step.and_then(|step| move_towards(grid, head, step)) {
            memory.settle(AiState::Pursuing);
            trace!(snake = %id, ?food, %mv, "pursuing food");
            return Decision {
                mv: Some(mv),
                reason: Reason::Food(food),
            };
        }
    }

    memory.settle(AiState::Wandering);
    let mut candidates = Move::all()
        .into_iter()
        .filter(|mv| !mv.is_opposite(snake.direction()))
        .filter_map(|mv| {
            let step = grid.advance(head, mv);
            if is_safe(board, id, step) {
                step.inside().map(|p| (mv, p))
            } else {
                None
            }
        })
        .collect_vec();
    candidates.shuffle(rng);

    let mut best: Option<(Move, usize)> = None;
    for (mv, cell) in candidates {
        let space = flood_fill(grid, &blocked, cell, tuning.flood_fill_cap);
        if best.map_or(true, |(_, most)| space > most) {
            best = Some((mv, space));
        }
    }

    match best {
        Some((mv, space)) => {
            trace!(snake = %id, %mv, space, "no food reachable, taking open space");
            Decision {
                mv: Some(mv),
                reason: Reason::Space(space),
            }
        }
        None => {
            trace!(snake = %id, "no safe move");
            Decision {
                mv: None,
                reason: Reason::NoSafeMove,
            }
        }
    }
}

/// A random cell outside the current region that the snake could stand on
/// and can reach from `head`. Falls back to any random cell when the probes
/// run out.
fn exploration_target<R: Rng + ?Sized>(
    board: &Board,
    id: SnakeId,
    head: Position,
    blocked: &FxHashSet<Position>,
    region_center: Position,
    tuning: &Tuning,
    rng: &mut R,
) -> Position {
    let grid = &board.grid;
    let mut random_cell = || {
        Position::new(
            rng.gen_range(0..grid.cols as i32),
            rng.gen_range(0..grid.rows as i32),
        )
    };
    for _ in 0..tuning.exploration_attempts {
        let candidate = random_cell();
        if candidate.distance(region_center) > tuning.stuck_radius
            && is_safe_cell(board, id, candidate)
            && bfs(grid, blocked, head, candidate).is_some()
        {
            return candidate;
        }
    }
    random_cell()
}

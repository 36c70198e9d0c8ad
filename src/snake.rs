//! Per-snake state machine: movement, growth queueing, invincibility and
//! direction arbitration.
use std::collections::VecDeque;

use serde::Serialize;

use crate::ai::AiMemory;
use crate::config::INITIAL_SNAKE_LENGTH;
use crate::grid::{Grid, Position, Step};
use crate::types::{Controller, Move, SnakeId};

/// Why a snake died
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// left a bounded grid
    Wall,
    /// ran into its own body
    SelfCollision,
    #[allow(missing_docs)]
    Obstacle,
    /// ran into the given snake
    Snake(SnakeId),
}

/// Lifecycle of a snake. `Dead` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnakeStatus {
    #[allow(missing_docs)]
    Alive,
    #[allow(missing_docs)]
    Dead(DeathCause),
}

/// What happened when a snake took its step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveResult {
    /// the head entered a new cell
    Moved,
    /// the snake left a bounded grid without invincibility and is now dead
    HitWall,
    /// dead snakes do not move
    Skipped,
}

/// Rolling streak of quick successive eats
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Combo {
    count: u32,
    last_eat_ms: Option<f64>,
}

impl Combo {
    /// records an eat at `now_ms` and returns the streak length including it
    pub fn register(&mut self, now_ms: f64, window_ms: f64) -> u32 {
        self.count = match self.last_eat_ms {
            Some(last) if now_ms - last < window_ms => self.count + 1,
            _ => 1,
        };
        self.last_eat_ms = Some(now_ms);
        self.count
    }

    #[allow(missing_docs)]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// simulation time of the last eat
    pub fn last_eat_ms(&self) -> Option<f64> {
        self.last_eat_ms
    }
}

/// A snake. The body is ordered head first and is never shorter than
/// [INITIAL_SNAKE_LENGTH].
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    #[allow(missing_docs)]
    pub id: SnakeId,
    #[allow(missing_docs)]
    pub controller: Controller,
    body: VecDeque<Position>,
    direction: Move,
    pending_direction: Move,
    grow_pending: u32,
    invincible_ms: Option<f64>,
    status: SnakeStatus,
    /// points collected this round
    pub score: u32,
    combo: Combo,
    /// scratch state for AI snakes, `None` for human ones
    pub ai: Option<AiMemory>,
}

impl Snake {
    /// A straight snake of `length` segments with its head at `head`, the body
    /// trailing behind the direction of travel
    pub fn new(
        id: SnakeId,
        controller: Controller,
        head: Position,
        direction: Move,
        length: usize,
    ) -> Self {
        let back = direction.reverse().to_vector();
        let mut body = VecDeque::with_capacity(length.max(1));
        let mut tail = head;
        body.push_back(tail);
        for _ in 1..length {
            tail = tail.add_vec(back);
            body.push_back(tail);
        }
        Self::from_body(id, controller, body, direction)
    }

    /// The round-start snake: length 3, heading up
    pub fn spawn(id: SnakeId, controller: Controller, head: Position) -> Self {
        Self::new(id, controller, head, Move::Up, INITIAL_SNAKE_LENGTH)
    }

    /// Builds a snake from explicit segments, head first
    pub fn from_body(
        id: SnakeId,
        controller: Controller,
        body: impl IntoIterator<Item = Position>,
        direction: Move,
    ) -> Self {
        let body: VecDeque<Position> = body.into_iter().collect();
        debug_assert!(!body.is_empty());
        Snake {
            id,
            controller,
            body,
            direction,
            pending_direction: direction,
            grow_pending: 0,
            invincible_ms: None,
            status: SnakeStatus::Alive,
            score: 0,
            combo: Combo::default(),
            ai: if controller.is_ai() {
                Some(AiMemory::default())
            } else {
                None
            },
        }
    }

    #[allow(missing_docs)]
    pub fn head(&self) -> Position {
        self.body[0]
    }

    /// segments from head to tail
    pub fn body(&self) -> &VecDeque<Position> {
        &self.body
    }

    /// number of segments; the length of the snake is its body
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// a snake always has a head, kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// direction used by the last step
    pub fn direction(&self) -> Move {
        self.direction
    }

    /// direction that will be committed on the next step
    pub fn pending_direction(&self) -> Move {
        self.pending_direction
    }

    #[allow(missing_docs)]
    pub fn grow_pending(&self) -> u32 {
        self.grow_pending
    }

    #[allow(missing_docs)]
    pub fn status(&self) -> SnakeStatus {
        self.status
    }

    #[allow(missing_docs)]
    pub fn is_alive(&self) -> bool {
        self.status == SnakeStatus::Alive
    }

    #[allow(missing_docs)]
    pub fn is_dead(&self) -> bool {
        !self.is_alive()
    }

    #[allow(missing_docs)]
    pub fn is_invincible(&self) -> bool {
        self.invincible_ms.is_some()
    }

    /// milliseconds of invincibility left, zero when not invincible
    pub fn invincible_remaining_ms(&self) -> f64 {
        self.invincible_ms.unwrap_or(0.0)
    }

    #[allow(missing_docs)]
    pub fn combo(&self) -> &Combo {
        &self.combo
    }

    pub(crate) fn combo_mut(&mut self) -> &mut Combo {
        &mut self.combo
    }

    /// Queues a turn. The exact reverse of the current direction is dropped
    /// here, so it can never be committed. Returns whether the turn was taken.
    pub fn set_direction(&mut self, mv: Move) -> bool {
        if self.direction.is_opposite(mv) {
            return false;
        }
        self.pending_direction = mv;
        true
    }

    /// adds `n` segments, one per step
    pub fn grow(&mut self, n: u32) {
        self.grow_pending += n;
    }

    /// drops up to `n` tail segments right away, never below the initial
    /// length. Returns how many were removed.
    pub fn shrink(&mut self, n: usize) -> usize {
        let removable = self.body.len().saturating_sub(INITIAL_SNAKE_LENGTH);
        let removed = n.min(removable);
        for _ in 0..removed {
            self.body.pop_back();
        }
        removed
    }

    /// starts (or restarts) an invincibility window
    pub fn make_invincible(&mut self, duration_ms: f64) {
        self.invincible_ms = Some(duration_ms);
    }

    /// marks the snake dead, the first cause sticks
    pub fn die(&mut self, cause: DeathCause) {
        if self.is_alive() {
            self.status = SnakeStatus::Dead(cause);
        }
    }

    /// checks if any segment, head included, is on `pos`
    pub fn occupies(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    /// checks if any non-head segment is on `pos`
    pub fn body_contains_excluding_head(&self, pos: Position) -> bool {
        self.body.iter().skip(1).any(|p| *p == pos)
    }

    /// One step of the state machine: commit the queued turn, move the head,
    /// grow or drag the tail, and run down invincibility by `tick_ms`.
    pub fn advance(&mut self, grid: &Grid, tick_ms: f64) -> MoveResult {
        if self.is_dead() {
            return MoveResult::Skipped;
        }

        self.direction = self.pending_direction;

        let new_head = match grid.advance(self.head(), self.direction) {
            Step::Inside(p) => p,
            Step::OutOfBounds(wrapped) if self.is_invincible() => wrapped,
            Step::OutOfBounds(_) => {
                self.die(DeathCause::Wall);
                return MoveResult::HitWall;
            }
        };

        self.body.push_front(new_head);
        if self.grow_pending > 0 {
            self.grow_pending -= 1;
        } else {
            self.body.pop_back();
        }

        if let Some(remaining) = self.invincible_ms {
            let remaining = remaining - tick_ms;
            self.invincible_ms = if remaining <= 0.0 {
                None
            } else {
                Some(remaining)
            };
        }

        MoveResult::Moved
    }
}

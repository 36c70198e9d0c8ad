//! The round aggregate: owns the board, the scheduler and the random stream,
//! and exposes the command and query surface collaborators drive.
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, instrument, trace};

use crate::ai;
use crate::board::Board;
use crate::config::{Mode, RoundConfig};
use crate::error::ConfigError;
use crate::food::{Food, FoodKind};
use crate::grid::Position;
use crate::rules::{evaluate_outcome, resolve_collisions, resolve_feeding, Outcome};
use crate::scheduler::TickScheduler;
use crate::snake::{DeathCause, MoveResult, Snake, SnakeStatus};
use crate::types::{Controller, Move, NoopInstruments, SnakeId, TickInstruments};

/// Something that happened during a tick, for audio and UI collaborators
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum RoundEvent {
    /// a snake ate the food at `position`
    FoodEaten {
        #[allow(missing_docs)]
        snake: SnakeId,
        #[allow(missing_docs)]
        kind: FoodKind,
        #[allow(missing_docs)]
        position: Position,
        /// points awarded for this eat, bonuses included
        points: u32,
        /// streak length including this eat
        combo: u32,
    },
    #[allow(missing_docs)]
    SnakeDied { snake: SnakeId, cause: DeathCause },
    /// emitted exactly once per round
    RoundEnded(RoundSummary),
}

/// Final numbers of a round, handed to the session for scoring
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundSummary {
    #[allow(missing_docs)]
    pub mode: Mode,
    #[allow(missing_docs)]
    pub outcome: Outcome,
    /// score of the snake at index 0
    pub primary_score: u32,
    #[allow(missing_docs)]
    pub primary_length: usize,
    /// logic ticks run
    pub ticks: u64,
    /// simulated time, the sum of all tick intervals
    pub elapsed_ms: f64,
    /// every snake's score in turn order
    pub scores: Vec<u32>,
}

/// Read-only view of one snake inside a [Snapshot]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct SnakeView {
    pub id: SnakeId,
    pub controller: Controller,
    /// head first
    pub body: Vec<Position>,
    pub direction: Move,
    pub length: usize,
    pub score: u32,
    pub status: SnakeStatus,
    /// zero when not invincible
    pub invincible_ms: f64,
    pub combo: u32,
}

impl From<&Snake> for SnakeView {
    fn from(snake: &Snake) -> Self {
        SnakeView {
            id: snake.id,
            controller: snake.controller,
            body: snake.body().iter().copied().collect(),
            direction: snake.direction(),
            length: snake.len(),
            score: snake.score,
            status: snake.status(),
            invincible_ms: snake.invincible_remaining_ms(),
            combo: snake.combo().count(),
        }
    }
}

/// Everything a renderer or a network peer needs to draw the round
#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct Snapshot {
    pub cols: u32,
    pub rows: u32,
    pub wrapping: bool,
    pub snakes: Vec<SnakeView>,
    /// active food only
    pub food: Vec<Food>,
    pub obstacles: Vec<Position>,
    pub time_left_ms: Option<f64>,
    pub paused: bool,
    pub outcome: Option<Outcome>,
    pub ticks: u64,
}

impl Snapshot {
    /// the snapshot as a json document
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// One round of the game
#[derive(Debug)]
pub struct Round {
    config: RoundConfig,
    board: Board,
    scheduler: TickScheduler,
    rng: SmallRng,
    clock_ms: f64,
    ticks: u64,
    time_left_ms: Option<f64>,
    paused: bool,
    summary: Option<RoundSummary>,
    /// events raised outside a tick, handed out by the next `tick` call
    pending_events: Vec<RoundEvent>,
}

impl Round {
    /// Validates `config`, spawns the snakes, places obstacles when enabled
    /// and puts the first food on the board.
    pub fn new(config: RoundConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = seeded_rng(config.seed);
        let spawns = config.spawn_points();
        let tuning = &config.tuning;

        let mut board = Board::new(config.grid(), config.features.obstacles);
        for (index, (head, controller)) in spawns.iter().zip(&config.controllers).enumerate() {
            board
                .snakes
                .push(Snake::spawn(SnakeId(index as u8), *controller, *head));
        }
        if config.features.obstacles {
            board.place_obstacles(
                &mut rng,
                config.obstacle_count,
                tuning.obstacle_attempts,
                tuning.obstacle_clearance,
                &spawns,
            );
        }
        board.spawn_food(&mut rng, tuning.food_spawn_attempts);

        debug!(
            mode = %config.mode,
            snakes = board.snakes.len(),
            obstacles = board.obstacles.len(),
            "round started"
        );
        Ok(Self::assemble(config, board, rng))
    }

    /// Starts a round from a prepared board instead of the standard layout.
    /// The board's entities are used as they are. Its grid must be the
    /// configured one and it must hold one snake per controller, each
    /// carrying its index as id.
    pub fn from_board(config: RoundConfig, board: Board) -> Result<Self, ConfigError> {
        config.validate()?;
        if board.grid != config.grid() {
            return Err(ConfigError::BoardGrid {
                expected: config.grid(),
                actual: board.grid,
            });
        }
        if board.snakes.len() != config.controllers.len() {
            return Err(ConfigError::BoardSnakeCount {
                expected: config.controllers.len(),
                actual: board.snakes.len(),
            });
        }
        if let Some((index, snake)) = board
            .snakes
            .iter()
            .enumerate()
            .find(|(index, snake)| snake.id.as_usize() != *index)
        {
            return Err(ConfigError::SnakeIdMismatch {
                index,
                id: snake.id,
            });
        }
        let rng = seeded_rng(config.seed);
        Ok(Self::assemble(config, board, rng))
    }

    fn assemble(config: RoundConfig, board: Board, rng: SmallRng) -> Self {
        let mut scheduler = TickScheduler::new(config.base_tick_ms, config.max_catch_up_ticks);
        if let Some(primary) = board.snakes.first() {
            scheduler.recompute(primary.len(), &config.tuning);
        }
        let time_left_ms = config.features.time_limit.then(|| config.time_limit_ms);
        Round {
            config,
            board,
            scheduler,
            rng,
            clock_ms: 0.0,
            ticks: 0,
            time_left_ms,
            paused: false,
            summary: None,
            pending_events: vec![],
        }
    }

    /// Requests a turn for the snake at `index`. Reversals, unknown indices and
    /// dead snakes are ignored; returns whether the turn was queued.
    pub fn set_direction(&mut self, index: usize, mv: Move) -> bool {
        match self.board.snakes.get_mut(index) {
            Some(snake) if snake.is_alive() => snake.set_direction(mv),
            _ => false,
        }
    }

    /// Feeds `delta_ms` of wall-clock time into the round and runs the logic
    /// ticks it pays for.
    pub fn tick(&mut self, delta_ms: f64) -> Vec<RoundEvent> {
        self.tick_instrumented(delta_ms, &NoopInstruments)
    }

    /// Like [Round::tick], reporting the duration of every logic tick
    pub fn tick_instrumented<I: TickInstruments>(
        &mut self,
        delta_ms: f64,
        instruments: &I,
    ) -> Vec<RoundEvent> {
        let mut events = std::mem::take(&mut self.pending_events);
        if self.is_over() || self.paused {
            return events;
        }
        self.scheduler.accumulate(delta_ms);
        for _ in 0..self.scheduler.max_catch_up_ticks() {
            let interval_ms = match self.scheduler.take_tick() {
                Some(interval_ms) => interval_ms,
                None => break,
            };
            let start = Instant::now();
            self.logic_tick(interval_ms, &mut events);
            instruments.observe_tick(start.elapsed());
            if self.is_over() {
                break;
            }
        }
        events
    }

    #[instrument(level = "trace", skip_all)]
    fn logic_tick(&mut self, interval_ms: f64, events: &mut Vec<RoundEvent>) {
        self.ticks += 1;

        if let Some(left) = self.time_left_ms.as_mut() {
            *left -= interval_ms;
            if *left <= 0.0 {
                *left = 0.0;
                self.finish(Outcome::TimeUp, events);
                return;
            }
        }

        let grid = self.board.grid;
        for i in 0..self.board.snakes.len() {
            if self.board.snakes[i].is_dead() {
                continue;
            }
            let id = self.board.snakes[i].id;

            if let Some(mut memory) = self.board.snakes[i].ai.take() {
                let decision = ai::decide(
                    &self.board,
                    id,
                    &mut memory,
                    &self.config.tuning,
                    interval_ms,
                    &mut self.rng,
                );
                trace!(snake = %id, ?decision, "ai decision");
                let snake = &mut self.board.snakes[i];
                snake.ai = Some(memory);
                if let Some(mv) = decision.mv {
                    snake.set_direction(mv);
                }
            }

            if self.board.snakes[i].advance(&grid, interval_ms) == MoveResult::HitWall {
                debug!(snake = %id, "snake hit the wall");
                events.push(RoundEvent::SnakeDied {
                    snake: id,
                    cause: DeathCause::Wall,
                });
            }
        }

        self.clock_ms += interval_ms;
        let tuning = &self.config.tuning;
        resolve_collisions(&mut self.board, tuning, events);
        resolve_feeding(&mut self.board, tuning, self.clock_ms, &mut self.rng, events);

        if let Some(outcome) = evaluate_outcome(&self.board, self.config.mode) {
            self.finish(outcome, events);
            return;
        }

        if let Some(primary) = self.board.snakes.first() {
            self.scheduler.recompute(primary.len(), &self.config.tuning);
        }

        if self.board.active_food_count() < self.config.food_target
            && self.rng.gen_bool(self.config.tuning.food_spawn_chance)
        {
            self.board
                .spawn_food(&mut self.rng, self.config.tuning.food_spawn_attempts);
        }
    }

    fn finish(&mut self, outcome: Outcome, events: &mut Vec<RoundEvent>) -> Option<RoundSummary> {
        if self.summary.is_some() {
            return None;
        }
        let primary = &self.board.snakes[0];
        let summary = RoundSummary {
            mode: self.config.mode,
            outcome,
            primary_score: primary.score,
            primary_length: primary.len(),
            ticks: self.ticks,
            elapsed_ms: self.clock_ms,
            scores: self.board.snakes.iter().map(|s| s.score).collect(),
        };
        debug!(?outcome, ticks = self.ticks, score = summary.primary_score, "round ended");
        self.summary = Some(summary.clone());
        events.push(RoundEvent::RoundEnded(summary.clone()));
        Some(summary)
    }

    /// freezes the round; wall-clock time passed while paused is dropped
    pub fn pause(&mut self) {
        self.paused = true;
    }

    #[allow(missing_docs)]
    pub fn resume(&mut self) {
        self.paused = false;
    }

    #[allow(missing_docs)]
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// adds the boost time to the accumulator so the next tick comes sooner
    pub fn boost(&mut self) {
        if !self.paused && !self.is_over() {
            self.scheduler.accumulate(self.config.tuning.boost_ms);
        }
    }

    /// Ends the round right away. Only the first call that actually ends the
    /// round returns its summary; a round that is already over yields `None`.
    /// The `RoundEnded` event is returned by the next `tick` call.
    pub fn stop_round(&mut self) -> Option<RoundSummary> {
        let mut events = vec![];
        let summary = self.finish(Outcome::Aborted, &mut events);
        self.pending_events.extend(events);
        summary
    }

    #[allow(missing_docs)]
    pub fn snakes(&self) -> &[Snake] {
        &self.board.snakes
    }

    /// active food
    pub fn food(&self) -> impl Iterator<Item = &Food> {
        self.board.active_food()
    }

    #[allow(missing_docs)]
    pub fn obstacles(&self) -> &[Position] {
        &self.board.obstacles
    }

    /// remaining countdown, `None` without the time limit feature
    pub fn time_left_ms(&self) -> Option<f64> {
        self.time_left_ms
    }

    #[allow(missing_docs)]
    pub fn outcome(&self) -> Option<Outcome> {
        self.summary.as_ref().map(|s| s.outcome)
    }

    /// the summary, once the round is over
    pub fn summary(&self) -> Option<&RoundSummary> {
        self.summary.as_ref()
    }

    #[allow(missing_docs)]
    pub fn is_over(&self) -> bool {
        self.summary.is_some()
    }

    #[allow(missing_docs)]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// duration of the next logic tick
    pub fn tick_interval_ms(&self) -> f64 {
        self.scheduler.interval_ms()
    }

    /// logic ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[allow(missing_docs)]
    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    #[allow(missing_docs)]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// a serializable copy of the current state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            cols: self.board.grid.cols,
            rows: self.board.grid.rows,
            wrapping: self.board.grid.wrapping,
            snakes: self.board.snakes.iter().map(SnakeView::from).collect(),
            food: self.board.active_food().copied().collect(),
            obstacles: self.board.obstacles.clone(),
            time_left_ms: self.time_left_ms,
            paused: self.paused,
            outcome: self.outcome(),
            ticks: self.ticks,
        }
    }
}

fn seeded_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Features;
    use crate::grid::Grid;

    fn config(cols: u32, rows: u32, controllers: Vec<Controller>) -> RoundConfig {
        RoundConfig {
            cols,
            rows,
            controllers,
            seed: Some(42),
            ..Default::default()
        }
    }

    fn lone_snake_round(snake: Snake, grid: Grid) -> Round {
        let mut board = Board::new(grid, false);
        let controller = snake.controller;
        board.snakes.push(snake);
        Round::from_board(config(grid.cols, grid.rows, vec![controller]), board)
            .expect("valid round")
    }

    #[test]
    fn test_wall_kills_without_invincibility() {
        let snake = Snake::new(
            SnakeId(0),
            Controller::Human,
            Position::new(0, 5),
            Move::Left,
            3,
        );
        let mut round = lone_snake_round(snake, Grid::new(10, 10, false));
        let events = round.tick(150.0);
        assert!(round.snakes()[0].is_dead());
        assert_eq!(
            events[0],
            RoundEvent::SnakeDied {
                snake: SnakeId(0),
                cause: DeathCause::Wall
            }
        );
        assert_eq!(round.outcome(), Some(Outcome::Defeat));
        assert!(matches!(events.last(), Some(RoundEvent::RoundEnded(_))));
    }

    #[test]
    fn test_invincible_snakes_wrap() {
        let mut snake = Snake::new(
            SnakeId(0),
            Controller::Human,
            Position::new(0, 5),
            Move::Left,
            3,
        );
        snake.make_invincible(1000.0);
        let mut round = lone_snake_round(snake, Grid::new(10, 10, false));
        round.tick(150.0);
        assert!(round.snakes()[0].is_alive());
        assert_eq!(round.snakes()[0].head(), Position::new(9, 5));
        assert_eq!(round.outcome(), None);
    }

    #[test]
    fn test_ai_reaches_food_below_its_tail() {
        let grid = Grid::new(20, 20, false);
        let mut board = Board::new(grid, false);
        board
            .snakes
            .push(Snake::spawn(SnakeId(0), Controller::Ai, Position::new(10, 10)));
        board
            .food
            .push(Food::new(Position::new(10, 13), FoodKind::Normal));
        let mut config = config(20, 20, vec![Controller::Ai]);
        config.food_target = 1;
        let mut round = Round::from_board(config, board).expect("valid round");

        let mut eaten = false;
        for _ in 0..28 {
            let events = round.tick(150.0);
            assert!(round.snakes()[0].is_alive());
            if events.iter().any(|e| {
                matches!(
                    e,
                    RoundEvent::FoodEaten { position, .. } if *position == Position::new(10, 13)
                )
            }) {
                eaten = true;
                break;
            }
        }
        assert!(eaten);
        assert_eq!(round.snakes()[0].score, 10);
    }

    #[test]
    fn test_pause_discards_delta() {
        let mut round = Round::new(config(30, 30, vec![Controller::Human])).expect("valid round");
        round.pause();
        assert!(round.tick(10_000.0).is_empty());
        assert_eq!(round.ticks(), 0);
        round.boost();

        round.resume();
        round.tick(100.0);
        assert_eq!(round.ticks(), 0);
        round.tick(60.0);
        assert_eq!(round.ticks(), 1);
        assert_eq!(round.snakes()[0].head(), Position::new(5, 4));

        round.toggle_pause();
        assert!(round.is_paused());
    }

    #[test]
    fn test_catch_up_is_capped() {
        let mut round = Round::new(config(30, 30, vec![Controller::Human])).expect("valid round");
        round.tick(10_000.0);
        assert_eq!(round.ticks(), 5);
        assert_eq!(round.snakes()[0].head(), Position::new(5, 0));
        assert!(round.snakes()[0].is_alive());
    }

    #[test]
    fn test_interval_shrinks_with_length() {
        let snake = Snake::new(
            SnakeId(0),
            Controller::Human,
            Position::new(15, 5),
            Move::Right,
            11,
        );
        let mut round = lone_snake_round(snake, Grid::new(30, 30, false));
        assert_eq!(round.tick_interval_ms(), 120.0);
        round.tick(120.0);
        assert_eq!(round.ticks(), 1);
        assert_eq!(round.tick_interval_ms(), 120.0);
    }

    #[test]
    fn test_time_limit_ends_before_moving() {
        let mut config = config(30, 30, vec![Controller::Human]);
        config.features = Features {
            time_limit: true,
            ..Default::default()
        };
        config.time_limit_ms = 300.0;
        let mut round = Round::new(config).expect("valid round");

        round.tick(150.0);
        assert_eq!(round.time_left_ms(), Some(150.0));
        assert_eq!(round.snakes()[0].head(), Position::new(5, 4));

        let events = round.tick(150.0);
        assert_eq!(round.time_left_ms(), Some(0.0));
        assert_eq!(round.outcome(), Some(Outcome::TimeUp));
        assert_eq!(round.snakes()[0].head(), Position::new(5, 4));
        assert!(matches!(
            events.as_slice(),
            [RoundEvent::RoundEnded(RoundSummary {
                outcome: Outcome::TimeUp,
                ..
            })]
        ));
    }

    #[test]
    fn test_stop_round_is_idempotent() {
        let mut round = Round::new(config(30, 30, vec![Controller::Human])).expect("valid round");
        let summary = round.stop_round().expect("first stop ends the round");
        assert_eq!(summary.outcome, Outcome::Aborted);
        assert_eq!(round.stop_round(), None);
        assert_eq!(
            round.tick(1000.0),
            vec![RoundEvent::RoundEnded(summary.clone())]
        );
        assert!(round.tick(1000.0).is_empty());
        assert_eq!(round.ticks(), 0);
        assert_eq!(round.summary(), Some(&summary));
    }

    #[test]
    fn test_stopping_a_paused_round_still_reports_the_end() {
        let mut round = Round::new(config(30, 30, vec![Controller::Human])).expect("valid round");
        round.pause();
        round.stop_round();
        assert!(matches!(
            round.tick(150.0).as_slice(),
            [RoundEvent::RoundEnded(RoundSummary {
                outcome: Outcome::Aborted,
                ..
            })]
        ));
    }

    #[test]
    fn test_from_board_rejects_inconsistent_boards() {
        let grid = Grid::new(20, 20, false);
        let config = config(20, 20, vec![Controller::Human, Controller::Ai]);
        let config = RoundConfig {
            mode: Mode::VersusAi,
            ..config
        };

        let mut board = Board::new(grid, false);
        board
            .snakes
            .push(Snake::spawn(SnakeId(3), Controller::Human, Position::new(5, 5)));
        board
            .snakes
            .push(Snake::spawn(SnakeId(0), Controller::Ai, Position::new(5, 10)));
        assert!(matches!(
            Round::from_board(config.clone(), board.clone()),
            Err(ConfigError::SnakeIdMismatch { index: 0, .. })
        ));

        board.snakes[0].id = SnakeId(0);
        board.snakes[1].id = SnakeId(1);
        assert!(Round::from_board(config.clone(), board.clone()).is_ok());

        let mut small = board.clone();
        small.grid = Grid::new(10, 10, false);
        assert!(matches!(
            Round::from_board(config.clone(), small),
            Err(ConfigError::BoardGrid { .. })
        ));

        let mut wrapping = board.clone();
        wrapping.grid = Grid::new(20, 20, true);
        assert!(matches!(
            Round::from_board(config.clone(), wrapping),
            Err(ConfigError::BoardGrid { .. })
        ));

        let mut lonely = board;
        lonely.snakes.pop();
        assert!(matches!(
            Round::from_board(config, lonely),
            Err(ConfigError::BoardSnakeCount {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_food_tops_up_to_target() {
        let grid = Grid::new(30, 30, false);
        let mut board = Board::new(grid, false);
        board
            .snakes
            .push(Snake::spawn(SnakeId(0), Controller::Human, Position::new(5, 25)));
        let mut config = config(30, 30, vec![Controller::Human]);
        config.tuning.food_spawn_chance = 1.0;
        let target = config.food_target;
        let mut round = Round::from_board(config, board).expect("valid round");

        for tick in 1..=20 {
            round.tick(150.0);
            assert!(round.snakes()[0].is_alive());
            let count = round.food().count();
            assert!(count <= target, "{} food on tick {}", count, tick);
            assert_eq!(count, tick.min(target));
        }
    }

    #[test]
    fn test_food_top_up_never_overshoots() {
        let mut config = RoundConfig::for_mode(Mode::Multi, Features::default(), 4);
        config.controllers = vec![Controller::Ai; 4];
        config.seed = Some(21);
        let target = config.food_target;
        let mut round = Round::new(config).expect("valid round");

        for _ in 0..1500 {
            round.tick(150.0);
            assert!(round.food().count() <= target);
            if round.is_over() {
                break;
            }
        }
    }

    #[test]
    fn test_set_direction() {
        let mut round = Round::new(config(30, 30, vec![Controller::Human])).expect("valid round");
        assert!(!round.set_direction(0, Move::Down));
        assert!(!round.set_direction(3, Move::Left));
        assert!(round.set_direction(0, Move::Left));
        round.tick(150.0);
        assert_eq!(round.snakes()[0].head(), Position::new(4, 5));
    }

    #[test]
    fn test_ai_rounds_keep_invariants() {
        let mut config = RoundConfig::for_mode(Mode::Multi, Features::default(), 4);
        config.controllers = vec![Controller::Ai; 4];
        config.features.obstacles = true;
        config.seed = Some(7);
        let mut round = Round::new(config).expect("valid round");
        assert!(!round.obstacles().is_empty());

        for _ in 0..400 {
            round.tick(150.0);
            for snake in round.snakes() {
                assert!(snake.len() >= 3);
                assert_eq!(snake.len(), snake.body().len());
            }
            let food = round.food().map(|f| f.position).collect::<Vec<_>>();
            let mut unique = food.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(food.len(), unique.len());
            assert!(food.iter().all(|p| !round.obstacles().contains(p)));
            if round.is_over() {
                break;
            }
        }
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut round = Round::new(config(30, 30, vec![Controller::Human])).expect("valid round");
        round.tick(150.0);
        let snapshot = round.snapshot();
        assert_eq!(snapshot.snakes.len(), 1);
        assert_eq!(snapshot.snakes[0].length, 3);
        assert_eq!(snapshot.ticks, 1);
        let json = snapshot.to_json().expect("snapshot serializes");
        assert!(json.contains("\"snakes\""));
        assert!(json.contains("\"outcome\":null"));
    }
}

//! Collision and feeding resolution, run once per tick after every snake has
//! moved, plus the round-over check.
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::board::Board;
use crate::config::{Mode, Tuning};
use crate::food::{Effect, FoodKind};
use crate::round::RoundEvent;
use crate::snake::DeathCause;
use crate::types::Controller;

/// How a round ended, from the primary snake's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// the primary snake outlived every opponent
    Victory,
    /// the primary snake died
    Defeat,
    /// the countdown ran out
    TimeUp,
    /// stopped from outside before any other ending
    Aborted,
}

/// Kills snakes whose heads ran into themselves, an obstacle or another live
/// snake. Snakes are checked in turn order and a snake killed earlier in the
/// pass no longer counts as an obstacle for later ones. Invincible snakes are
/// immune. A human snake that gets run into earns the kill bonus.
pub fn resolve_collisions(board: &mut Board, tuning: &Tuning, events: &mut Vec<RoundEvent>) {
    for i in 0..board.snakes.len() {
        let snake = &board.snakes[i];
        if snake.is_dead() || snake.is_invincible() {
            continue;
        }
        let head = snake.head();

        let cause = if snake.body_contains_excluding_head(head) {
            Some(DeathCause::SelfCollision)
        } else if board.is_obstacle(head) {
            Some(DeathCause::Obstacle)
        } else {
            board
                .snakes
                .iter()
                .enumerate()
                .find(|(j, other)| *j != i && other.is_alive() && other.occupies(head))
                .map(|(_, other)| DeathCause::Snake(other.id))
        };

        if let Some(cause) = cause {
            let id = board.snakes[i].id;
            board.snakes[i].die(cause);
            debug!(snake = %id, ?cause, "snake died");
            events.push(RoundEvent::SnakeDied { snake: id, cause });

            if let DeathCause::Snake(killer) = cause {
                let killer = &mut board.snakes[killer.as_usize()];
                if killer.controller == Controller::Human {
                    killer.score += tuning.kill_bonus;
                }
            }
        }
    }
}

/// Points for eating `kind` at `length` with a streak of `combo` eats
pub fn points_for(kind: FoodKind, length: usize, combo: u32, tuning: &Tuning) -> u32 {
    let mut points = kind.score();
    if kind == FoodKind::Normal {
        points += tuning.length_bonus(length);
    }
    if combo >= tuning.combo_threshold {
        points += tuning.combo_bonus;
    }
    points
}

/// Lets every live snake eat the active food under its head: score it, apply
/// its effect and put a replacement on the board. Eaten food is purged at the
/// end of the pass.
pub fn resolve_feeding<R: Rng + ?Sized>(
    board: &mut Board,
    tuning: &Tuning,
    now_ms: f64,
    rng: &mut R,
    events: &mut Vec<RoundEvent>,
) {
    for i in 0..board.snakes.len() {
        if board.snakes[i].is_dead() {
            continue;
        }
        let head = board.snakes[i].head();
        let eaten = board
            .food
            .iter()
            .position(|food| food.active && food.position == head);
        let index = match eaten {
            Some(index) => index,
            None => continue,
        };
        board.food[index].active = false;
        let food = board.food[index];

        let snake = &mut board.snakes[i];
        let combo = snake.combo_mut().register(now_ms, tuning.combo_window_ms);
        let points = points_for(food.kind, snake.len(), combo, tuning);
        snake.score += points;

        match food.effect() {
            Effect::Grow => snake.grow(1),
            Effect::Shrink => {
                if snake.len() > 3 {
                    snake.shrink(1);
                }
            }
            Effect::Invincible => snake.make_invincible(tuning.invincible_ms),
        }

        debug!(snake = %snake.id, kind = ?food.kind, points, combo, "food eaten");
        events.push(RoundEvent::FoodEaten {
            snake: snake.id,
            kind: food.kind,
            position: food.position,
            points,
            combo,
        });

        board.spawn_food(rng, tuning.food_spawn_attempts);
    }
    board.purge_inactive_food();
}

/// Checks whether the round is over.
///
/// Single mode ends once nobody is left alive. With opponents the round is
/// lost when the primary snake (index 0) dies and won when it is the sole
/// survivor.
pub fn evaluate_outcome(board: &Board, mode: Mode) -> Option<Outcome> {
    let primary = board.snakes.first()?;
    let alive = board.live_snakes().count();
    match mode {
        Mode::Single => {
            if alive == 0 {
                Some(Outcome::Defeat)
            } else {
                None
            }
        }
        Mode::VersusAi | Mode::Multi => {
            if primary.is_dead() {
                Some(Outcome::Defeat)
            } else if alive == 1 {
                Some(Outcome::Victory)
            } else {
                None
            }
        }
    }
}

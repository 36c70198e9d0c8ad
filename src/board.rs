//! The entity registry: snakes, food and obstacles as sibling collections.
//!
//! Nothing on the board references anything else; every relation between
//! entities is a positional query answered here.
use fxhash::FxHashSet;
use rand::seq::IteratorRandom;
use rand::Rng;
use std::fmt;
use tracing::warn;

use crate::food::{Food, FoodKind};
use crate::grid::{Grid, Position};
use crate::snake::Snake;
use crate::types::SnakeId;

/// All entities of a round
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    #[allow(missing_docs)]
    pub grid: Grid,
    /// in turn order, index 0 is the primary snake
    pub snakes: Vec<Snake>,
    #[allow(missing_docs)]
    pub food: Vec<Food>,
    #[allow(missing_docs)]
    pub obstacles: Vec<Position>,
    /// obstacles only block when the feature is on
    pub obstacles_enabled: bool,
}

impl Board {
    /// an empty board
    pub fn new(grid: Grid, obstacles_enabled: bool) -> Self {
        Board {
            grid,
            snakes: vec![],
            food: vec![],
            obstacles: vec![],
            obstacles_enabled,
        }
    }

    #[allow(missing_docs)]
    pub fn snake(&self, id: SnakeId) -> Option<&Snake> {
        self.snakes.get(id.as_usize())
    }

    #[allow(missing_docs)]
    pub fn live_snakes(&self) -> impl Iterator<Item = &Snake> {
        self.snakes.iter().filter(|s| s.is_alive())
    }

    #[allow(missing_docs)]
    pub fn active_food(&self) -> impl Iterator<Item = &Food> {
        self.food.iter().filter(|f| f.active)
    }

    #[allow(missing_docs)]
    pub fn active_food_count(&self) -> usize {
        self.active_food().count()
    }

    /// checks for an obstacle, always false when obstacles are disabled
    pub fn is_obstacle(&self, pos: Position) -> bool {
        self.obstacles_enabled && self.obstacles.contains(&pos)
    }

    /// checks if any snake, alive or dead, has a segment on `pos`
    pub fn is_snake_cell(&self, pos: Position) -> bool {
        self.snakes.iter().any(|s| s.occupies(pos))
    }

    /// checks if a live snake other than `except` has a segment on `pos`
    pub fn is_other_live_snake_cell(&self, except: SnakeId, pos: Position) -> bool {
        self.live_snakes()
            .filter(|s| s.id != except)
            .any(|s| s.occupies(pos))
    }

    /// cells the given snake cannot path through: its own body, every other
    /// live snake and enabled obstacles
    pub fn blocked_cells(&self, for_snake: SnakeId) -> FxHashSet<Position> {
        let mut blocked = FxHashSet::default();
        for snake in self.snakes.iter() {
            if snake.id == for_snake || snake.is_alive() {
                blocked.extend(snake.body().iter().copied());
            }
        }
        if self.obstacles_enabled {
            blocked.extend(self.obstacles.iter().copied());
        }
        blocked
    }

    /// a cell food may appear on: no snake, no obstacle, no active food
    pub fn is_free_for_food(&self, pos: Position) -> bool {
        self.grid.contains(pos)
            && !self.is_snake_cell(pos)
            && !self.obstacles.contains(&pos)
            && !self.active_food().any(|f| f.position == pos)
    }

    /// Picks a cell for new food: random probes first, then a uniform pick
    /// among the free cells. `None` when the board is full.
    pub fn find_food_cell<R: Rng + ?Sized>(&self, rng: &mut R, attempts: u32) -> Option<Position> {
        for _ in 0..attempts {
            let pos = Position::new(
                rng.gen_range(0..self.grid.cols as i32),
                rng.gen_range(0..self.grid.rows as i32),
            );
            if self.is_free_for_food(pos) {
                return Some(pos);
            }
        }
        self.grid
            .cells()
            .filter(|p| self.is_free_for_food(*p))
            .choose(rng)
    }

    /// Adds one food of a random kind. Returns the new food, if there was room.
    pub fn spawn_food<R: Rng + ?Sized>(&mut self, rng: &mut R, attempts: u32) -> Option<Food> {
        let kind = FoodKind::random(rng);
        match self.find_food_cell(rng, attempts) {
            Some(position) => {
                let food = Food::new(position, kind);
                self.food.push(food);
                Some(food)
            }
            None => {
                warn!("no free cell left for food");
                None
            }
        }
    }

    /// drops eaten food
    pub fn purge_inactive_food(&mut self) {
        self.food.retain(|f| f.active);
    }

    /// Scatters up to `count` obstacles. Cells within `clearance` (Chebyshev,
    /// exclusive) of a spawn point and already used cells are skipped; an
    /// obstacle that finds no cell within `attempts` probes is left out.
    pub fn place_obstacles<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        count: usize,
        attempts: u32,
        clearance: i32,
        spawn_points: &[Position],
    ) {
        self.obstacles.clear();
        for _ in 0..count {
            let mut placed = None;
            for _ in 0..attempts {
                let pos = Position::new(
                    rng.gen_range(0..self.grid.cols as i32),
                    rng.gen_range(0..self.grid.rows as i32),
                );
                let near_spawn = spawn_points
                    .iter()
                    .any(|s| (pos.x - s.x).abs() < clearance && (pos.y - s.y).abs() < clearance);
                if near_spawn || self.obstacles.contains(&pos) || self.is_snake_cell(pos) {
                    continue;
                }
                placed = Some(pos);
                break;
            }
            if let Some(pos) = placed {
                self.obstacles.push(pos);
            }
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        for y in 0..self.grid.rows as i32 {
            for x in 0..self.grid.cols as i32 {
                let position = Position { x, y };
                if self.live_snakes().any(|s| s.head() == position) {
                    write!(f, "H")?;
                } else if self.live_snakes().any(|s| s.occupies(position)) {
                    write!(f, "s")?;
                } else if self.active_food().any(|food| food.position == position) {
                    write!(f, "f")?;
                } else if self.is_obstacle(position) {
                    write!(f, "#")?;
                } else {
                    write!(f, ".")?;
                }
                write!(f, " ")?;
            }
            writeln!(f)?;
        }
        for snake in self.snakes.iter() {
            write!(
                f,
                "({} len: {} score: {} head: {:?} {:?}) ",
                snake.id,
                snake.len(),
                snake.score,
                snake.head(),
                snake.status()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snake::DeathCause;
    use crate::types::Controller;
    use rand::{rngs::SmallRng, SeedableRng};

    fn board_with_snakes() -> Board {
        let mut board = Board::new(Grid::new(10, 10, false), true);
        board
            .snakes
            .push(Snake::spawn(SnakeId(0), Controller::Human, Position::new(2, 2)));
        board
            .snakes
            .push(Snake::spawn(SnakeId(1), Controller::Ai, Position::new(7, 2)));
        board
    }

    #[test]
    fn test_blocked_cells_skip_dead_snakes() {
        let mut board = board_with_snakes();
        board.obstacles.push(Position::new(0, 0));
        let blocked = board.blocked_cells(SnakeId(0));
        assert!(blocked.contains(&Position::new(2, 4)));
        assert!(blocked.contains(&Position::new(7, 3)));
        assert!(blocked.contains(&Position::new(0, 0)));

        board.snakes[1].die(DeathCause::Wall);
        let blocked = board.blocked_cells(SnakeId(0));
        assert!(!blocked.contains(&Position::new(7, 3)));
        assert!(!board.is_other_live_snake_cell(SnakeId(0), Position::new(7, 3)));
    }

    #[test]
    fn test_food_never_spawns_on_occupied_cells() {
        let mut board = board_with_snakes();
        board.obstacles.push(Position::new(5, 5));
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..50 {
            let food = board.spawn_food(&mut rng, 100).expect("room left");
            assert!(!board.is_snake_cell(food.position));
            assert!(!board.obstacles.contains(&food.position));
        }
        let mut seen = FxHashSet::default();
        assert!(board.active_food().all(|f| seen.insert(f.position)));
    }

    #[test]
    fn test_full_board_spawns_nothing() {
        let mut board = Board::new(Grid::new(1, 3, false), false);
        board
            .snakes
            .push(Snake::spawn(SnakeId(0), Controller::Human, Position::new(0, 0)));
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(board.spawn_food(&mut rng, 10), None);
    }

    #[test]
    fn test_obstacles_keep_clear_of_spawns() {
        let mut board = Board::new(Grid::new(30, 30, false), true);
        let mut rng = SmallRng::seed_from_u64(3);
        let spawns = [Position::new(5, 5), Position::new(25, 25)];
        board.place_obstacles(&mut rng, 20, 100, 5, &spawns);
        assert_eq!(board.obstacles.len(), 20);
        for obstacle in board.obstacles.iter() {
            for spawn in spawns.iter() {
                assert!(
                    (obstacle.x - spawn.x).abs() >= 5 || (obstacle.y - spawn.y).abs() >= 5
                );
            }
        }
        let unique: FxHashSet<_> = board.obstacles.iter().collect();
        assert_eq!(unique.len(), 20);
    }

    #[test]
    fn test_display_marks_entities() {
        let mut board = board_with_snakes();
        board.food.push(Food::new(Position::new(0, 9), FoodKind::Normal));
        let rendered = board.to_string();
        assert!(rendered.contains('H'));
        assert!(rendered.contains('f'));
    }
}

//! Grid searches used by the AI: shortest paths, open-space estimates and the
//! one-step safety test.
use fxhash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

use crate::board::Board;
use crate::grid::{Grid, Position, Step};
use crate::types::{Move, SnakeId};

/// Breadth-first search from `start` to `target` over 4-neighbour cells.
///
/// Blocked cells are never entered, the target included. Walls stop the
/// search unless the grid wraps. Returns the cells to walk through, excluding
/// `start` and ending with `target`, or `None` when no route exists within
/// `cols * rows` expansions.
pub fn bfs(
    grid: &Grid,
    blocked: &FxHashSet<Position>,
    start: Position,
    target: Position,
) -> Option<Vec<Position>> {
    if start == target {
        return Some(vec![]);
    }
    if blocked.contains(&target) || !grid.contains(target) {
        return None;
    }

    let max_expansions = grid.area();
    let mut came_from: FxHashMap<Position, Position> = FxHashMap::default();
    let mut queue = VecDeque::with_capacity(64);
    queue.push_back(start);
    came_from.insert(start, start);

    let mut expansions = 0;
    while let Some(current) = queue.pop_front() {
        expansions += 1;
        if expansions > max_expansions {
            return None;
        }
        for (_, next) in grid.neighbors(current) {
            if came_from.contains_key(&next) || blocked.contains(&next) {
                continue;
            }
            came_from.insert(next, current);
            if next == target {
                return Some(walk_back(&came_from, start, target));
            }
            queue.push_back(next);
        }
    }
    None
}

fn walk_back(
    came_from: &FxHashMap<Position, Position>,
    start: Position,
    target: Position,
) -> Vec<Position> {
    let mut path = vec![target];
    let mut current = target;
    while let Some(&previous) = came_from.get(&current) {
        if previous == start {
            break;
        }
        path.push(previous);
        current = previous;
    }
    path.reverse();
    path
}

/// Counts the free cells reachable from `start`, `start` included, stopping
/// once `cap` cells have been counted. A blocked start has no space.
pub fn flood_fill(grid: &Grid, blocked: &FxHashSet<Position>, start: Position, cap: usize) -> usize {
    if cap == 0 || blocked.contains(&start) || !grid.contains(start) {
        return 0;
    }
    let mut seen = FxHashSet::default();
    let mut queue = VecDeque::new();
    seen.insert(start);
    queue.push_back(start);
    let mut count = 0;
    while let Some(current) = queue.pop_front() {
        count += 1;
        if count >= cap {
            break;
        }
        for (_, next) in grid.neighbors(current) {
            if !blocked.contains(&next) && seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    count
}

/// The move that takes `from` onto the adjacent cell `to`, wrapping included
pub fn move_towards(grid: &Grid, from: Position, to: Position) -> Option<Move> {
    grid.neighbors(from)
        .find(|(_, p)| *p == to)
        .map(|(mv, _)| mv)
}

/// Whether snake `id` could enter the cell reached by `step` without dying:
/// on the grid, off its own body, off every other live snake and off enabled
/// obstacles
pub fn is_safe(board: &Board, id: SnakeId, step: Step) -> bool {
    let pos = match step {
        Step::Inside(pos) => pos,
        Step::OutOfBounds(_) => return false,
    };
    is_safe_cell(board, id, pos)
}

/// [is_safe] for a cell already known to be on the grid
pub fn is_safe_cell(board: &Board, id: SnakeId, pos: Position) -> bool {
    let own_body = board.snake(id).map_or(false, |s| s.occupies(pos));
    !own_body && !board.is_other_live_snake_cell(id, pos) && !board.is_obstacle(pos)
}

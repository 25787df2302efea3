/// Entities: the digging actor and the discrete commands that drive it.

use super::grid::Grid;
use super::rules;

/// Movement direction. One cell per command, no diagonals.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Cell offset (dx, dy); y grows downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

/// One buffered command: a direction plus the dig-only modifier.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct QueuedInput {
    pub direction: Direction,
    pub dig_only: bool,
}

/// Something the actor can pick up.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Collectible {
    Gem,
}

/// What a single move attempt did. All-false means nothing happened.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MoveResult {
    pub moved: bool,
    pub collected: Option<Collectible>,
    pub pushed: bool,
    pub dug_dirt: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub x: i32,
    pub y: i32,
    pub alive: bool,
}

impl Actor {
    pub fn new(x: i32, y: i32) -> Self {
        Actor { x, y, alive: true }
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Attempt one step. May dig, collect or push, mutating the grid.
    pub fn step(&mut self, direction: Direction, grid: &mut Grid, dig_only: bool) -> MoveResult {
        let result = rules::resolve_move(grid, self.x, self.y, direction, dig_only);
        if result.moved {
            let (dx, dy) = direction.delta();
            self.x += dx;
            self.y += dy;
        }
        result
    }

    pub fn die(&mut self) {
        self.alive = false;
    }
}

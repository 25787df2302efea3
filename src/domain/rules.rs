/// Actor movement rules: truth-table driven.
///
/// `plan_move` is pure: it decides what a command would do.
/// `resolve_move` applies that plan to the grid.
///
/// ## Move Truth Table
///
/// Evaluated against the single target cell (x+dx, y+dy), first match wins.
/// ┌──────────────────────────────────────────┬────────────────────────────┐
/// │ Target / condition                        │ Outcome                     │
/// ├──────────────────────────────────────────┼────────────────────────────┤
/// │ out of bounds                             │ Blocked                     │
/// │ Dirt                                      │ Dig (move in unless digOnly)│
/// │ Gem, !digOnly                             │ Collect + move in           │
/// │ Boulder, horizontal, !digOnly, !falling,  │ Push + move in              │
/// │   cell beyond is Empty                    │                             │
/// │ Empty or Exit, !digOnly                   │ Walk                        │
/// │ anything else (Wall, digOnly on non-dirt, │ Blocked                     │
/// │   vertical/falling/obstructed push)       │                             │
/// └──────────────────────────────────────────┴────────────────────────────┘

use super::entity::{Collectible, Direction, MoveResult};
use super::grid::Grid;
use super::tile::{Tile, TileKind};

/// What a command would do. Produced by `plan_move`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Plan {
    Blocked,
    /// Clear the dirt at `at`; `enter` = actor follows into the cell.
    Dig { at: (i32, i32), enter: bool },
    Collect { at: (i32, i32) },
    /// Boulder at `from` slides to `to`, actor takes `from`.
    Push { from: (i32, i32), to: (i32, i32) },
    Walk { to: (i32, i32) },
}

/// Can the actor step into (x, y) without pushing? (Ignores dig-only.)
#[cfg_attr(not(test), allow(dead_code))]
pub fn can_enter(grid: &Grid, x: i32, y: i32) -> bool {
    matches!(
        grid.get(x, y).map(Tile::kind),
        Some(TileKind::Empty | TileKind::Dirt | TileKind::Gem | TileKind::Exit)
    )
}

/// Could the boulder at (x, y) be pushed one cell in `direction`?
pub fn can_push(grid: &Grid, x: i32, y: i32, direction: Direction) -> bool {
    if !direction.is_horizontal() {
        return false;
    }
    match grid.get(x, y) {
        Some(Tile::Boulder { falling: false }) => {
            let (dx, _) = direction.delta();
            grid.is_empty(x + dx, y)
        }
        _ => false,
    }
}

/// Decide what moving from (x, y) in `direction` would do.
pub fn plan_move(grid: &Grid, x: i32, y: i32, direction: Direction, dig_only: bool) -> Plan {
    let (dx, dy) = direction.delta();
    let (nx, ny) = (x + dx, y + dy);

    let tile = match grid.get(nx, ny) {
        Some(t) => t,
        None => return Plan::Blocked,
    };

    match tile.kind() {
        TileKind::Dirt => Plan::Dig { at: (nx, ny), enter: !dig_only },
        _ if dig_only => Plan::Blocked,
        TileKind::Gem => Plan::Collect { at: (nx, ny) },
        TileKind::Boulder if can_push(grid, nx, ny, direction) => {
            Plan::Push { from: (nx, ny), to: (nx + dx, ny) }
        }
        TileKind::Empty | TileKind::Exit => Plan::Walk { to: (nx, ny) },
        _ => Plan::Blocked,
    }
}

/// Apply a move to the grid. The caller relocates the actor when
/// `moved` is set; the destination is always one cell in `direction`.
pub fn resolve_move(grid: &mut Grid, x: i32, y: i32, direction: Direction, dig_only: bool) -> MoveResult {
    match plan_move(grid, x, y, direction, dig_only) {
        Plan::Blocked => MoveResult::default(),
        Plan::Dig { at, enter } => {
            grid.remove(at.0, at.1);
            MoveResult { moved: enter, dug_dirt: true, ..MoveResult::default() }
        }
        Plan::Collect { at } => {
            grid.remove(at.0, at.1);
            MoveResult { moved: true, collected: Some(Collectible::Gem), ..MoveResult::default() }
        }
        Plan::Push { from, to } => {
            if grid.move_tile(from, to) {
                MoveResult { moved: true, pushed: true, ..MoveResult::default() }
            } else {
                MoveResult::default()
            }
        }
        Plan::Walk { .. } => MoveResult { moved: true, ..MoveResult::default() },
    }
}

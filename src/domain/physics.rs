/// Loose-object physics: gravity and roll-off for boulders and gems.
///
/// ## Step order
///
/// One call to `step` advances every loose object by at most one cell.
/// Rows are scanned from the second-to-last row upward, columns left to
/// right. The bottom row is never scanned: nothing can be beneath it.
///
/// A per-step `populated` grid records every cell that just received an
/// object. Those cells are skipped for the rest of the step, so an
/// object can never fall twice in one step and an object that just
/// arrived is not re-evaluated.
///
/// ## Per-object rule
///
///   1. Fall. Cell below is Empty: move down, mark `falling`.
///   2. Otherwise a falling object has landed: clear `falling`.
///   3. Roll. Only when resting on a rounded tile (Wall, Boulder, Gem):
///        left  if left and below-left are both Empty,
///        else right if right and below-right are both Empty.
///      Left always wins a tie.
///
/// Out-of-bounds neighbours behave as walls for every check except
/// roundedness: the border is not something an object can roll off.
///
/// ## Danger
///
/// `is_dangerous(x, y)` is the only crush primitive: the tile directly
/// above is mid-fall.

use super::grid::Grid;
use super::tile::TileKind;

/// Roll direction chosen by `should_roll`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Roll {
    Left,
    Right,
}

impl Roll {
    fn dx(self) -> i32 {
        match self {
            Roll::Left => -1,
            Roll::Right => 1,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Motion {
    Fall,
    Roll(Roll),
    /// Was falling, stopped this step. `from == to`.
    Land,
}

/// One change made by a physics step, in processing order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Change {
    pub from: (i32, i32),
    pub to: (i32, i32),
    pub kind: TileKind,
    pub motion: Motion,
}

// ══════════════════════════════════════════════════════════════
// Queries
// ══════════════════════════════════════════════════════════════

/// Would the object at (x, y) fall? (Cell below is Empty.)
#[inline]
pub fn should_fall(grid: &Grid, x: i32, y: i32) -> bool {
    grid.is_empty(x, y + 1)
}

/// Which way, if any, would the object at (x, y) roll?
pub fn should_roll(grid: &Grid, x: i32, y: i32) -> Option<Roll> {
    if !grid.is_rounded(x, y + 1) {
        return None;
    }
    if grid.is_empty(x - 1, y) && grid.is_empty(x - 1, y + 1) {
        return Some(Roll::Left);
    }
    if grid.is_empty(x + 1, y) && grid.is_empty(x + 1, y + 1) {
        return Some(Roll::Right);
    }
    None
}

/// Is something falling onto (x, y)?
#[inline]
pub fn is_dangerous(grid: &Grid, x: i32, y: i32) -> bool {
    grid.get(x, y - 1).map_or(false, |t| t.is_falling())
}

// ══════════════════════════════════════════════════════════════
// Step
// ══════════════════════════════════════════════════════════════

/// Advance all loose objects by one discrete step.
/// Returns every change in the order it was applied.
pub fn step(grid: &mut Grid) -> Vec<Change> {
    let width = grid.width();
    let height = grid.height();
    let mut changes = Vec::new();
    if height < 2 {
        return changes;
    }

    // populated[y * width + x]: an object moved into (x, y) this step
    let mut populated = vec![false; width * height];
    let mark = |populated: &mut Vec<bool>, x: i32, y: i32| {
        populated[y as usize * width + x as usize] = true;
    };

    for y in (0..height as i32 - 1).rev() {
        for x in 0..width as i32 {
            if populated[y as usize * width + x as usize] {
                continue;
            }
            let tile = match grid.get(x, y) {
                Some(t) if t.is_loose() => t,
                _ => continue,
            };
            let kind = tile.kind();

            if should_fall(grid, x, y) {
                grid.move_tile((x, y), (x, y + 1));
                grid.set_falling(x, y + 1, true);
                mark(&mut populated, x, y + 1);
                changes.push(Change { from: (x, y), to: (x, y + 1), kind, motion: Motion::Fall });
                continue;
            }

            if tile.is_falling() {
                grid.set_falling(x, y, false);
                changes.push(Change { from: (x, y), to: (x, y), kind, motion: Motion::Land });
            }

            if let Some(dir) = should_roll(grid, x, y) {
                let tx = x + dir.dx();
                grid.move_tile((x, y), (tx, y));
                mark(&mut populated, tx, y);
                changes.push(Change { from: (x, y), to: (tx, y), kind, motion: Motion::Roll(dir) });
            }
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::Tile;

    fn grid_from(rows: &[&str]) -> Grid {
        Grid::parse(&rows.join("\n"), rows[0].len(), rows.len()).unwrap()
    }

    // ── should_fall ──

    #[test]
    fn falls_over_empty() {
        let g = grid_from(&["#####", "# O #", "#   #", "#####"]);
        assert!(should_fall(&g, 2, 1));
    }

    #[test]
    fn rests_on_dirt_and_wall() {
        let g = grid_from(&["#####", "# O #", "# : #", "#####"]);
        assert!(!should_fall(&g, 2, 1));
        let g = grid_from(&["#####", "# O #", "#####"]);
        assert!(!should_fall(&g, 2, 1));
    }

    #[test]
    fn bottom_row_never_falls() {
        let g = grid_from(&["O"]);
        assert!(!should_fall(&g, 0, 0));
    }

    // ── should_roll ──

    #[test]
    fn rolls_left_off_boulder() {
        let g = grid_from(&["#####", "# O #", "# O #", "#####"]);
        assert_eq!(should_roll(&g, 2, 1), Some(Roll::Left));
    }

    #[test]
    fn rolls_right_when_left_blocked() {
        let g = grid_from(&["#####", "#:O #", "# O #", "#####"]);
        assert_eq!(should_roll(&g, 2, 1), Some(Roll::Right));
    }

    #[test]
    fn no_roll_when_both_sides_blocked() {
        let g = grid_from(&["#####", "#:O:#", "# O #", "#####"]);
        assert_eq!(should_roll(&g, 2, 1), None);
    }

    #[test]
    fn rolls_off_wall_and_gem() {
        let g = grid_from(&["#####", "# O #", "# # #", "#   #", "#####"]);
        assert_eq!(should_roll(&g, 2, 1), Some(Roll::Left));
        let g = grid_from(&["#####", "# O #", "# * #", "#####"]);
        assert_eq!(should_roll(&g, 2, 1), Some(Roll::Left));
    }

    #[test]
    fn no_roll_on_dirt() {
        let g = grid_from(&["#####", "# O #", "# : #", "#####"]);
        assert_eq!(should_roll(&g, 2, 1), None);
    }

    #[test]
    fn no_roll_when_below_side_filled() {
        // Left is open but below-left is dirt; right is open and clear.
        let g = grid_from(&["#####", "# O #", "#:O #", "#####"]);
        assert_eq!(should_roll(&g, 2, 1), Some(Roll::Right));
    }

    #[test]
    fn border_blocks_roll() {
        let g = grid_from(&["O ", "O "]);
        assert_eq!(should_roll(&g, 0, 0), Some(Roll::Right));
        let g = grid_from(&["O", "O"]);
        assert_eq!(should_roll(&g, 0, 0), None);
    }

    // ── step: falling ──

    #[test]
    fn boulder_falls_one_cell() {
        let mut g = grid_from(&["#####", "# O #", "#   #", "#####"]);
        step(&mut g);
        assert!(g.is_empty(2, 1));
        assert_eq!(g.get(2, 2), Some(Tile::Boulder { falling: true }));
    }

    #[test]
    fn gem_falls_one_cell() {
        let mut g = grid_from(&["#####", "# * #", "#   #", "#####"]);
        step(&mut g);
        assert!(g.is_empty(2, 1));
        assert_eq!(g.get(2, 2), Some(Tile::Gem { falling: true }));
    }

    #[test]
    fn falls_only_one_cell_per_step() {
        let mut g = grid_from(&["# O #", "#   #", "#   #", "#   #", "#####"]);
        step(&mut g);
        assert!(g.is_boulder(2, 1));
        assert!(g.is_empty(2, 2));
        step(&mut g);
        assert!(g.is_boulder(2, 2));
    }

    #[test]
    fn falling_flag_cleared_on_landing() {
        let mut g = grid_from(&["#####", "# O #", "#   #", "#:#:#", "#####"]);
        step(&mut g);
        assert_eq!(g.get(2, 2), Some(Tile::Boulder { falling: true }));
        let changes = step(&mut g);
        assert_eq!(g.get(2, 2), Some(Tile::Boulder { falling: false }));
        assert!(changes.iter().any(|c| c.motion == Motion::Land && c.to == (2, 2)));
    }

    #[test]
    fn fall_beats_roll() {
        // Rounded tile diagonally, but empty directly beneath.
        let mut g = grid_from(&["#####", "# O #", "#   #", "#O O#", "#####"]);
        step(&mut g);
        assert!(g.is_boulder(2, 2));
        assert!(g.is_empty(1, 1));
        assert!(g.is_empty(3, 1));
    }

    #[test]
    fn stack_falls_together_without_double_move() {
        let mut g = grid_from(&["# O #", "# O #", "#   #", "#   #", "#####"]);
        step(&mut g);
        // Lower boulder moved 1 to row 2, upper moved into vacated row 1.
        assert!(g.is_empty(2, 0));
        assert!(g.is_boulder(2, 1));
        assert!(g.is_boulder(2, 2));
        assert!(g.is_empty(2, 3));
    }

    // ── step: rolling ──

    #[test]
    fn rolls_left_on_tie() {
        let mut g = grid_from(&["#####", "# O #", "# O #", "#####"]);
        step(&mut g);
        assert!(g.is_boulder(1, 1));
        assert!(g.is_empty(2, 1));
    }

    #[test]
    fn rolled_object_not_reprocessed_in_same_step() {
        // Rolls right into (3,1); (3,2) is empty, but the boulder must not
        // fall again when the scan reaches column 3 of the same row.
        let mut g = grid_from(&["#####", "#:O #", "#:O #", "#####"]);
        let changes = step(&mut g);
        assert!(g.is_boulder(3, 1));
        assert!(g.is_empty(3, 2));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].motion, Motion::Roll(Roll::Right));
    }

    // ── Idempotence on settled grids ──

    #[test]
    fn settled_grid_is_unchanged() {
        let mut g = grid_from(&["#####", "#:O:#", "#:O:#", "#####"]);
        let before = g.clone();
        assert!(step(&mut g).is_empty());
        assert_eq!(g, before);
        assert!(step(&mut g).is_empty());
        assert_eq!(g, before);
    }

    #[test]
    fn falling_never_set_on_fixed_tiles() {
        let mut g = grid_from(&["O*O*", "    ", "*O# ", "::::", "####"]);
        for _ in 0..10 {
            step(&mut g);
            for row in g.rows() {
                for t in row {
                    if !t.is_loose() {
                        assert!(!t.is_falling());
                    }
                }
            }
        }
    }

    // ── Danger ──

    #[test]
    fn danger_after_fall_then_safe_after_landing() {
        // Boulder falls into (2,1); target cell (2,2) is a dirt "player" spot.
        let mut g = grid_from(&["# O #", "#   #", "# : #", "#####"]);
        step(&mut g);
        assert!(is_dangerous(&g, 2, 2));
        step(&mut g);
        assert!(!is_dangerous(&g, 2, 2));
    }

    #[test]
    fn resting_boulder_is_not_dangerous() {
        let g = grid_from(&["# O #", "#   #", "#####"]);
        assert!(!is_dangerous(&g, 2, 1));
        assert!(!is_dangerous(&g, 2, 0)); // above is out of bounds
    }
}

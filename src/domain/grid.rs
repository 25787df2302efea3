/// Tile store: a fixed-size rectangular array of tiles.
///
/// All reads and writes are bounds-checked. Anything outside
/// `[0,width) x [0,height)` reads as `None` and every classification
/// query answers `false` there, so callers treat the border exactly
/// like a wall without special cases.
///
/// Coordinates are `i32`: `x - 1` on column 0 is just another
/// out-of-bounds query.

use crate::error::LevelError;

use super::tile::{Tile, TileKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Tile>,
}

impl Grid {
    /// Build from a newline-delimited glyph layout. The layout must be
    /// exactly `height` rows of exactly `width` glyphs.
    pub fn parse(layout: &str, width: usize, height: usize) -> Result<Self, LevelError> {
        let rows: Vec<&str> = layout.lines().collect();
        if rows.len() != height {
            return Err(LevelError::RowCount { expected: height, found: rows.len() });
        }

        let mut cells = Vec::with_capacity(width * height);
        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(LevelError::RowWidth { row: y, expected: width, found });
            }
            cells.extend(row.chars().map(Tile::from_glyph));
        }

        Ok(Grid { width, height, cells })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<Tile> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Write a tile. No-op out of bounds.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, tile: Tile) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = tile;
        }
    }

    fn kind_at(&self, x: i32, y: i32) -> Option<TileKind> {
        self.get(x, y).map(Tile::kind)
    }

    pub fn is_empty(&self, x: i32, y: i32) -> bool {
        self.kind_at(x, y) == Some(TileKind::Empty)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_dirt(&self, x: i32, y: i32) -> bool {
        self.kind_at(x, y) == Some(TileKind::Dirt)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        self.kind_at(x, y) == Some(TileKind::Wall)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_boulder(&self, x: i32, y: i32) -> bool {
        self.kind_at(x, y) == Some(TileKind::Boulder)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_gem(&self, x: i32, y: i32) -> bool {
        self.kind_at(x, y) == Some(TileKind::Gem)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_exit(&self, x: i32, y: i32) -> bool {
        self.kind_at(x, y) == Some(TileKind::Exit)
    }

    /// Can a resting object roll off the top of (x, y)? False out of bounds.
    pub fn is_rounded(&self, x: i32, y: i32) -> bool {
        self.get(x, y).map_or(false, Tile::is_rounded)
    }

    /// Clear a cell to Empty.
    pub fn remove(&mut self, x: i32, y: i32) {
        self.set(x, y, Tile::Empty);
    }

    /// Set or clear the falling flag of a loose object. Other tiles are untouched.
    pub fn set_falling(&mut self, x: i32, y: i32, falling: bool) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = self.cells[i].with_falling(falling);
        }
    }

    /// Relocate the tile at `from` (falling flag included) into `to`.
    ///
    /// Happens only if `from` is in bounds and `to` is Empty; then `from`
    /// becomes Empty. Otherwise neither cell changes. Returns whether the
    /// move happened.
    pub fn move_tile(&mut self, from: (i32, i32), to: (i32, i32)) -> bool {
        let (Some(src), Some(dst)) = (self.index(from.0, from.1), self.index(to.0, to.1)) else {
            return false;
        };
        if src == dst || self.cells[dst] != Tile::Empty {
            return false;
        }
        self.cells[dst] = self.cells[src];
        self.cells[src] = Tile::Empty;
        true
    }

    /// Full scan. End-of-level bookkeeping only, not per tick.
    pub fn count_gems(&self) -> usize {
        self.cells.iter().filter(|t| t.kind() == TileKind::Gem).count()
    }

    /// Row slices, top to bottom (for rendering).
    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> {
        self.cells.chunks(self.width.max(1))
    }
}

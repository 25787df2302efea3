/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.
///
/// `falling` only exists on loose objects (Boulder, Gem): a falling wall
/// or a falling empty cell cannot be constructed.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Empty,
    Dirt,                       // Diggable, not rounded
    Wall,                       // Indestructible, rounded
    Boulder { falling: bool },  // Loose, pushable
    Gem { falling: bool },      // Loose, collectible
    Exit,
}

/// Payload-free view of a tile, for matching and serialization.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TileKind {
    Empty,
    Dirt,
    Wall,
    Boulder,
    Gem,
    Exit,
}

impl Tile {
    pub const BOULDER: Tile = Tile::Boulder { falling: false };
    pub const GEM: Tile = Tile::Gem { falling: false };

    pub fn kind(self) -> TileKind {
        match self {
            Tile::Empty => TileKind::Empty,
            Tile::Dirt => TileKind::Dirt,
            Tile::Wall => TileKind::Wall,
            Tile::Boulder { .. } => TileKind::Boulder,
            Tile::Gem { .. } => TileKind::Gem,
            Tile::Exit => TileKind::Exit,
        }
    }

    /// Is this tile mid-drop? Always false for anything but a loose object.
    pub fn is_falling(self) -> bool {
        matches!(self, Tile::Boulder { falling: true } | Tile::Gem { falling: true })
    }

    /// Subject to gravity and rolling?
    pub fn is_loose(self) -> bool {
        matches!(self, Tile::Boulder { .. } | Tile::Gem { .. })
    }

    /// Can a resting loose object roll off the top of this tile?
    pub fn is_rounded(self) -> bool {
        matches!(self, Tile::Wall | Tile::Boulder { .. } | Tile::Gem { .. })
    }

    /// Same tile with its falling flag replaced. Non-loose tiles are returned unchanged.
    pub fn with_falling(self, falling: bool) -> Tile {
        match self {
            Tile::Boulder { .. } => Tile::Boulder { falling },
            Tile::Gem { .. } => Tile::Gem { falling },
            other => other,
        }
    }

    /// Map a layout glyph to a tile.
    /// The player-start marker and unknown glyphs are plain empty cells.
    pub fn from_glyph(c: char) -> Tile {
        match c {
            ':' => Tile::Dirt,
            '#' => Tile::Wall,
            'O' => Tile::BOULDER,
            '*' => Tile::GEM,
            'E' => Tile::Exit,
            _ => Tile::Empty, // ' ', '@'
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn glyph(self) -> char {
        match self.kind() {
            TileKind::Empty => ' ',
            TileKind::Dirt => ':',
            TileKind::Wall => '#',
            TileKind::Boulder => 'O',
            TileKind::Gem => '*',
            TileKind::Exit => 'E',
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falling_only_on_loose_objects() {
        for t in [Tile::Empty, Tile::Dirt, Tile::Wall, Tile::Exit] {
            assert!(!t.with_falling(true).is_falling());
            assert_eq!(t.with_falling(true), t);
        }
        assert!(Tile::BOULDER.with_falling(true).is_falling());
        assert!(Tile::GEM.with_falling(true).is_falling());
    }

    #[test]
    fn rounded_tiles() {
        assert!(Tile::Wall.is_rounded());
        assert!(Tile::BOULDER.is_rounded());
        assert!(Tile::GEM.is_rounded());
        assert!(!Tile::Dirt.is_rounded());
        assert!(!Tile::Empty.is_rounded());
        assert!(!Tile::Exit.is_rounded());
    }

    #[test]
    fn glyph_table() {
        assert_eq!(Tile::from_glyph(' '), Tile::Empty);
        assert_eq!(Tile::from_glyph(':'), Tile::Dirt);
        assert_eq!(Tile::from_glyph('#'), Tile::Wall);
        assert_eq!(Tile::from_glyph('O'), Tile::BOULDER);
        assert_eq!(Tile::from_glyph('*'), Tile::GEM);
        assert_eq!(Tile::from_glyph('E'), Tile::Exit);
        assert_eq!(Tile::from_glyph('@'), Tile::Empty);
        for c in [' ', ':', '#', 'O', '*', 'E'] {
            assert_eq!(Tile::from_glyph(c).glyph(), c);
        }
    }
}

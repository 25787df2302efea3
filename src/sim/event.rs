/// Events emitted during a simulation tick.
/// The presentation layer consumes these for sound and status text.

use crate::domain::tile::TileKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// The actor entered a new cell.
    Moved { x: i32, y: i32 },
    DugDirt { x: i32, y: i32 },
    GemCollected { x: i32, y: i32 },
    /// A boulder was pushed into (x, y).
    BoulderPushed { x: i32, y: i32 },
    /// A falling object came to rest at (x, y).
    ObjectLanded { x: i32, y: i32, kind: TileKind },
    ExitOpened,
    PlayerCrushed { x: i32, y: i32 },
    TimeUp,
    LevelComplete { score: u32 },
}

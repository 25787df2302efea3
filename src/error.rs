/// Error types for the fallible edges of the game: level loading and
/// high-score persistence. The simulation itself never fails.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("layout has {found} rows, expected {expected}")]
    RowCount { expected: usize, found: usize },

    #[error("layout row {row} has {found} cells, expected {expected}")]
    RowWidth { row: usize, expected: usize, found: usize },

    #[error("{what} ({x},{y}) is outside the {width}x{height} grid")]
    OutOfBounds { what: &'static str, x: i32, y: i32, width: usize, height: usize },

    #[error("player start ({x},{y}) is not an open cell")]
    BlockedStart { x: i32, y: i32 },

    #[error("could not read {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("bad level pack {}: {source}", path.display())]
    Parse { path: PathBuf, source: toml::de::Error },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("leaderboard I/O on {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("leaderboard encoding: {0}")]
    Json(#[from] serde_json::Error),
}

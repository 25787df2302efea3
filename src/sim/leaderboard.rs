/// High-score table, persisted as JSON.
///
/// An explicit store: `main` owns one `Leaderboard` and passes it where
/// needed. Entries are kept sorted by score, descending, and capped at
/// `MAX_ENTRIES`. A tie keeps the older entry ahead of the newer one.
///
/// A missing file is an empty board. So is a corrupt one: the damage is
/// logged and the next save overwrites it.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub const MAX_ENTRIES: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScore {
    pub name: String,
    pub score: u32,
    /// Level index the score was earned on.
    pub level: usize,
    /// Seconds since the UNIX epoch.
    pub completed_at: u64,
}

#[derive(Debug)]
pub struct Leaderboard {
    path: PathBuf,
    entries: Vec<HighScore>,
}

impl Leaderboard {
    /// Read the board at `path`. Never fails: unreadable data is an empty board.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match read_entries(&path) {
            Ok(entries) => entries,
            Err(StoreError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                vec![]
            }
            Err(e) => {
                log::warn!("leaderboard unreadable, starting empty: {e}");
                vec![]
            }
        };

        let mut board = Leaderboard { path, entries };
        board.normalize();
        board
    }

    pub fn save(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .map_err(|source| StoreError::Io { path: dir.to_path_buf(), source })?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, json)
            .map_err(|source| StoreError::Io { path: self.path.clone(), source })
    }

    /// Drop every entry and persist the empty board.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.entries.clear();
        self.save()
    }

    /// Insert a score. Returns its 1-based rank if it made the table.
    /// The table is persisted either way a change happens; a failed
    /// write is logged and the in-memory board stays authoritative.
    pub fn record_score(&mut self, name: &str, score: u32, level: usize) -> Option<usize> {
        let pos = self.entries.iter().position(|e| e.score < score).unwrap_or(self.entries.len());
        if pos >= MAX_ENTRIES {
            return None;
        }

        self.entries.insert(pos, HighScore {
            name: name.to_string(),
            score,
            level,
            completed_at: now_secs(),
        });
        self.entries.truncate(MAX_ENTRIES);

        if let Err(e) = self.save() {
            log::warn!("could not save leaderboard: {e}");
        }
        Some(pos + 1)
    }

    pub fn top(&self, count: usize) -> &[HighScore] {
        &self.entries[..count.min(self.entries.len())]
    }

    /// Would `score` enter the table? A tie with the last entry does not.
    pub fn would_rank(&self, score: u32) -> bool {
        match self.entries.last() {
            Some(last) if self.entries.len() >= MAX_ENTRIES => score > last.score,
            _ => true,
        }
    }

    pub fn best(&self) -> Option<&HighScore> {
        self.entries.first()
    }

    /// Best score recorded on one level.
    pub fn best_for_level(&self, level: usize) -> Option<&HighScore> {
        self.entries.iter().find(|e| e.level == level)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hand-edited files may be unsorted or oversized.
    fn normalize(&mut self) {
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(MAX_ENTRIES);
    }
}

fn read_entries(path: &Path) -> Result<Vec<HighScore>, StoreError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;
    Ok(serde_json::from_str(&text)?)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

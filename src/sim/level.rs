/// Level definitions and pack loading.
///
/// ## Sources (list order):
///   1. Built-in embedded levels (always present)
///   2. `*.toml` level packs in the configured `levels_dir`, by file name
///
/// ## Pack format (TOML):
///   ```toml
///   name = "Pack Name"
///   author = "someone"            # optional
///
///   [[level]]
///   name = "Level 1"
///   width = 20
///   height = 12
///   gems_required = 3
///   time_limit = 120              # seconds, 0 = no countdown
///   player_start = { x = 1, y = 1 }
///   exit_pos = { x = 18, y = 10 }
///   grid = """
///   ####################
///   ...
///   """
///   ```
///
/// Every level is validated on load. An invalid level is skipped with a
/// warning; the rest of its pack still loads.
///
/// ## Tile legend:
///   ' ' = Empty     ':' = Dirt      '#' = Wall
///   'O' = Boulder   '*' = Gem       'E' = Exit
///   '@' = Player start marker (an empty cell)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::grid::Grid;
use crate::error::LevelError;

/// A grid coordinate as written in level files.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn pair(self) -> (i32, i32) {
        (self.x, self.y)
    }
}

/// One playable level, as authored.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct LevelDef {
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub gems_required: u32,
    /// Countdown in seconds. 0 disables the countdown.
    #[serde(default)]
    pub time_limit: u32,
    pub grid: String,
    pub player_start: Position,
    pub exit_pos: Position,
}

/// A named group of levels.
#[derive(Clone, Debug)]
pub struct LevelPack {
    pub name: String,
    pub author: String,
    pub levels: Vec<LevelDef>,
}

#[derive(Deserialize)]
struct PackFile {
    name: String,
    #[serde(default)]
    author: String,
    #[serde(default, rename = "level")]
    levels: Vec<LevelDef>,
}

// ══════════════════════════════════════════════════════════════
// Validation
// ══════════════════════════════════════════════════════════════

impl LevelDef {
    /// Parse and validate the layout.
    ///
    /// Checks the dimensions, that start and exit lie inside the grid,
    /// and that the start cell is open.
    pub fn build_grid(&self) -> Result<Grid, LevelError> {
        let grid = Grid::parse(&self.grid, self.width, self.height)?;

        for (what, pos) in [("player start", self.player_start), ("exit", self.exit_pos)] {
            if !grid.in_bounds(pos.x, pos.y) {
                return Err(LevelError::OutOfBounds {
                    what,
                    x: pos.x,
                    y: pos.y,
                    width: self.width,
                    height: self.height,
                });
            }
        }

        let Position { x, y } = self.player_start;
        if !grid.is_empty(x, y) {
            return Err(LevelError::BlockedStart { x, y });
        }

        Ok(grid)
    }
}

// ══════════════════════════════════════════════════════════════
// Loading
// ══════════════════════════════════════════════════════════════

/// Embedded levels followed by every pack in `levels_dir`.
pub fn load_all(levels_dir: &Path) -> Vec<LevelPack> {
    let mut packs = vec![embedded_pack()];
    packs.extend(scan_packs(levels_dir));
    packs
}

/// Load every `*.toml` pack in `dir`, sorted by file name.
/// Unreadable packs and packs with no valid level are skipped.
pub fn scan_packs(dir: &Path) -> Vec<LevelPack> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            log::debug!("no level packs in {}: {e}", dir.display());
            return vec![];
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |x| x == "toml"))
        .collect();
    paths.sort();

    let mut packs = vec![];
    for path in paths {
        match load_pack(&path) {
            Ok(pack) if pack.levels.is_empty() => {
                log::warn!("level pack {} has no playable levels", path.display());
            }
            Ok(pack) => {
                log::debug!("loaded pack '{}' ({} levels)", pack.name, pack.levels.len());
                packs.push(pack);
            }
            Err(e) => log::warn!("skipping level pack: {e}"),
        }
    }
    packs
}

pub fn load_pack(path: &Path) -> Result<LevelPack, LevelError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| LevelError::Io { path: path.to_path_buf(), source })?;
    parse_pack(&text, path)
}

/// Parse pack text. `path` is only used in messages.
pub fn parse_pack(text: &str, path: &Path) -> Result<LevelPack, LevelError> {
    let file: PackFile = toml::from_str(text)
        .map_err(|source| LevelError::Parse { path: path.to_path_buf(), source })?;

    let mut levels = Vec::with_capacity(file.levels.len());
    for (i, def) in file.levels.into_iter().enumerate() {
        match def.build_grid() {
            Ok(_) => levels.push(def),
            Err(e) => log::warn!("{}: level {} '{}' skipped: {e}", path.display(), i + 1, def.name),
        }
    }

    Ok(LevelPack { name: file.name, author: file.author, levels })
}

// ══════════════════════════════════════════════════════════════
// Embedded levels
// ══════════════════════════════════════════════════════════════

pub fn embedded_pack() -> LevelPack {
    LevelPack {
        name: "Built-in Levels".to_string(),
        author: "Excavation".to_string(),
        levels: embedded_levels(),
    }
}

fn embedded_levels() -> Vec<LevelDef> {
    vec![
        make_embedded("Level 1 - First Dig", 3, 120, (18, 10), &[
            "####################",
            "#@:::::::::::::::::#",
            "#::::O:::::*:::::::#",
            "#:::::::::::::O::::#",
            "#::*:::::O:::::::::#",
            "#::::::::::::::*:::#",
            "#:::O::::::::::::::#",
            "#:::::::*::::::O:::#",
            "#::::::::::::::::::#",
            "#:::::O:::::*::::::#",
            "#:::::::::::::::::E#",
            "####################",
        ]),
        make_embedded("Level 2 - Rockfall", 5, 120, (17, 10), &[
            "####################",
            "#@ :O:O:::O:O::*:O:#",
            "#::::::::::::::::::#",
            "#:*:::  ::*:::: :::#",
            "#::O::  ::O:::: :*:#",
            "#:::::::::::::: :::#",
            "#::##########::::::#",
            "#::::*:::O:::::O:::#",
            "#:O:::::::::*::::::#",
            "#::::::O:::::::::*:#",
            "#:*::::::::::::::E:#",
            "####################",
        ]),
        make_embedded("Level 3 - The Cavern", 6, 150, (18, 10), &[
            "####################",
            "#@:::O:::::::O:::*:#",
            "#::::::  O O  :::::#",
            "#:*::::  * *  :::O:#",
            "#::::::  :::  :::::#",
            "#:O:::::::::::::*::#",
            "#::::#########:::::#",
            "#::*:: OOO  *:::O::#",
            "#::::: ::::  ::::::#",
            "#:O::::::*:::::*:::#",
            "#:::::::::::::O:::E#",
            "####################",
        ]),
        make_embedded("Level 4 - Pressure", 8, 100, (1, 10), &[
            "####################",
            "#@:O:*:O:*:O:*:O:*:#",
            "#::::::::::::::::::#",
            "#O:O:O:O:O:O:O:O:O:#",
            "#:*:::*:::*:::*::::#",
            "#::::::::::::::::::#",
            "#####:######:#####:#",
            "#:*::O:::*::O::*:::#",
            "#::::::::::::::::::#",
            "#:O:*:::O:::*:::O::#",
            "#E:::::::::::::::::#",
            "####################",
        ]),
    ]
}

/// Player start is read from the '@' marker.
fn make_embedded(name: &str, gems_required: u32, time_limit: u32, exit: (i32, i32), map: &[&str]) -> LevelDef {
    let player_start = map.iter()
        .enumerate()
        .find_map(|(y, row)| row.find('@').map(|x| Position { x: x as i32, y: y as i32 }))
        .unwrap_or(Position { x: 0, y: 0 });

    LevelDef {
        name: name.to_string(),
        width: map.first().map_or(0, |r| r.len()),
        height: map.len(),
        gems_required,
        time_limit,
        grid: map.join("\n"),
        player_start,
        exit_pos: Position { x: exit.0, y: exit.1 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const PACK: &str = r#"
name = "Test Pack"
author = "tester"

[[level]]
name = "Tiny"
width = 5
height = 3
gems_required = 1
time_limit = 30
player_start = { x = 1, y = 1 }
exit_pos = { x = 3, y = 1 }
grid = """
#####
#@*E#
#####
"""

[[level]]
name = "Too Wide"
width = 4
height = 3
gems_required = 0
player_start = { x = 1, y = 1 }
exit_pos = { x = 2, y = 1 }
grid = """
#####
#@ E#
#####
"""
"#;

    #[test]
    fn embedded_levels_are_valid() {
        let pack = embedded_pack();
        assert!(!pack.levels.is_empty());
        for def in &pack.levels {
            let grid = def.build_grid().unwrap_or_else(|e| panic!("{}: {e}", def.name));
            assert!(grid.count_gems() as u32 >= def.gems_required, "{}", def.name);
            assert!(grid.is_exit(def.exit_pos.x, def.exit_pos.y), "{}", def.name);
        }
    }

    #[test]
    fn parses_pack_and_skips_invalid_level() {
        let pack = parse_pack(PACK, Path::new("test.toml")).unwrap();
        assert_eq!(pack.name, "Test Pack");
        assert_eq!(pack.author, "tester");
        assert_eq!(pack.levels.len(), 1);
        let tiny = &pack.levels[0];
        assert_eq!(tiny.name, "Tiny");
        assert_eq!(tiny.time_limit, 30);
        assert_eq!(tiny.player_start, Position { x: 1, y: 1 });
        let grid = tiny.build_grid().unwrap();
        assert!(grid.is_gem(2, 1));
    }

    #[test]
    fn time_limit_defaults_to_zero() {
        let text = "name = \"p\"\n[[level]]\nname = \"a\"\nwidth = 2\nheight = 1\ngems_required = 0\n\
                    player_start = { x = 0, y = 0 }\nexit_pos = { x = 1, y = 0 }\ngrid = \"@E\"\n";
        let pack = parse_pack(text, Path::new("p.toml")).unwrap();
        assert_eq!(pack.levels[0].time_limit, 0);
    }

    #[test]
    fn malformed_pack_is_parse_error() {
        let err = parse_pack("name = ", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, LevelError::Parse { .. }));
    }

    #[test]
    fn rejects_out_of_bounds_exit() {
        let mut def = embedded_pack().levels[0].clone();
        def.exit_pos = Position { x: 20, y: 3 };
        assert!(matches!(def.build_grid(), Err(LevelError::OutOfBounds { what: "exit", .. })));
    }

    #[test]
    fn rejects_blocked_start() {
        let mut def = embedded_pack().levels[0].clone();
        def.player_start = Position { x: 0, y: 0 };
        assert!(matches!(def.build_grid(), Err(LevelError::BlockedStart { x: 0, y: 0 })));
    }

    #[test]
    fn scan_reads_toml_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.toml"), PACK.replace("Test Pack", "Second")).unwrap();
        fs::write(dir.path().join("a.toml"), PACK.replace("Test Pack", "First")).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("broken.toml"), "[[level]]\nname = 3").unwrap();

        let packs = scan_packs(dir.path());
        let names: Vec<_> = packs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["First", "Second"]);
    }

    #[test]
    fn load_all_starts_with_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let packs = load_all(&dir.path().join("missing"));
        assert_eq!(packs.len(), 1);
        assert_eq!(packs[0].name, "Built-in Levels");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_pack(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, LevelError::Io { .. }));
    }

    #[test]
    fn shipped_pack_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("levels/caverns.toml");
        let pack = load_pack(&path).unwrap();
        assert_eq!(pack.levels.len(), 2);
        for def in &pack.levels {
            let grid = def.build_grid().unwrap();
            assert!(grid.count_gems() as u32 >= def.gems_required, "{}", def.name);
        }
    }
}

/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD or
/// `~/.local/share/excavation`. Every key has a default, so a missing
/// file, a missing section or a single missing key all degrade cleanly.

use serde::Deserialize;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".local/share/excavation";

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub scoring: ScoringConfig,
    pub sound: SoundConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
    pub leaderboard_file: PathBuf,
    pub player_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimingConfig {
    /// Milliseconds between simulation ticks.
    pub tick_rate_ms: u64,
}

/// Point values awarded by the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoringConfig {
    pub gem: u32,
    /// Per whole second left on the clock at the winning moment.
    pub time_bonus: u32,
    /// Every gem present at level start was collected.
    pub perfect_clear: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            gem: default_gem(),
            time_bonus: default_time_bonus(),
            perfect_clear: default_perfect_clear(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SoundConfig {
    pub enabled: bool,
    /// Master volume, 0.0 to 1.0.
    pub volume: f32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub dig_only: Vec<String>,
    pub pause: Vec<String>,
    pub restart: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    scoring: TomlScoring,
    #[serde(default)]
    sound: TomlSound,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlScoring {
    #[serde(default = "default_gem")]
    gem: u32,
    #[serde(default = "default_time_bonus")]
    time_bonus: u32,
    #[serde(default = "default_perfect_clear")]
    perfect_clear: u32,
}

#[derive(Deserialize, Debug)]
struct TomlSound {
    #[serde(default = "default_sound_enabled")]
    enabled: bool,
    #[serde(default = "default_volume")]
    volume: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_dig_only")]
    dig_only: Vec<String>,
    #[serde(default = "default_pause")]
    pause: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_leaderboard_file")]
    leaderboard_file: String,
    #[serde(default = "default_player_name")]
    player_name: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 200 } // 5 simulation steps per second

fn default_gem() -> u32 { 100 }
fn default_time_bonus() -> u32 { 10 }
fn default_perfect_clear() -> u32 { 500 }

fn default_sound_enabled() -> bool { true }
fn default_volume() -> f32 { 0.3 }

fn default_dig_only() -> Vec<String> { vec!["L1".into(), "R1".into()] }
fn default_pause() -> Vec<String> { vec!["Select".into()] }
fn default_restart() -> Vec<String> { vec!["Y".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_cancel() -> Vec<String> { vec!["B".into()] }

fn default_levels_dir() -> String { "levels".into() }
fn default_leaderboard_file() -> String { "leaderboard.json".into() }
fn default_player_name() -> String { "PLAYER".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming { tick_rate_ms: default_tick_rate() }
    }
}

impl Default for TomlScoring {
    fn default() -> Self {
        TomlScoring {
            gem: default_gem(),
            time_bonus: default_time_bonus(),
            perfect_clear: default_perfect_clear(),
        }
    }
}

impl Default for TomlSound {
    fn default() -> Self {
        TomlSound { enabled: default_sound_enabled(), volume: default_volume() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            dig_only: default_dig_only(),
            pause: default_pause(),
            restart: default_restart(),
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            leaderboard_file: default_leaderboard_file(),
            player_name: default_player_name(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from the first `config.toml` found in the candidate dirs.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::resolve(toml_cfg, &search_dirs, &data_dir())
    }

    /// Parse config text directly. Relative paths resolve against `base`.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn parse(text: &str, base: &Path) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(Self::resolve(toml_cfg, &[base.to_path_buf()], base))
    }

    fn resolve(cfg: TomlConfig, search_dirs: &[PathBuf], data_dir: &Path) -> Self {
        // Levels: first candidate dir that actually has the folder.
        let levels_dir_str = &cfg.general.levels_dir;
        let levels_dir = if Path::new(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        // Leaderboard: relative names live in the writable data dir.
        let board = PathBuf::from(&cfg.general.leaderboard_file);
        let leaderboard_file = if board.is_absolute() { board } else { data_dir.join(board) };

        let player_name = match cfg.general.player_name.trim() {
            "" => default_player_name(),
            name => name.to_string(),
        };

        GameConfig {
            timing: TimingConfig { tick_rate_ms: cfg.timing.tick_rate_ms.max(1) },
            scoring: ScoringConfig {
                gem: cfg.scoring.gem,
                time_bonus: cfg.scoring.time_bonus,
                perfect_clear: cfg.scoring.perfect_clear,
            },
            sound: SoundConfig {
                enabled: cfg.sound.enabled,
                volume: cfg.sound.volume.clamp(0.0, 1.0),
            },
            gamepad: GamepadConfig {
                dig_only: cfg.gamepad.dig_only,
                pause: cfg.gamepad.pause,
                restart: cfg.gamepad.restart,
                confirm: cfg.gamepad.confirm,
                cancel: cfg.gamepad.cancel,
            },
            levels_dir,
            leaderboard_file,
            player_name,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // Resolve symlinks so data is found next to the real binary.
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(APP_DIR);
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// A writable directory for persistent data.
/// Exe dir for portable installs, else XDG data home, else CWD.
pub fn data_dir() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // System installs (/usr/games/...) won't be writable.
            let probe = parent.join(".write_test_excavation");
            if std::fs::write(&probe, "").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return parent.to_path_buf();
            }
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(APP_DIR);
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => {
                    log::debug!("loaded config from {}", path.display());
                    return cfg;
                }
                Err(e) => {
                    log::warn!("config.toml parse error, using defaults: {e}");
                    return TomlConfig::default();
                }
            },
            Err(e) => log::warn!("could not read {}: {e}", path.display()),
        }
    }
    TomlConfig::default()
}

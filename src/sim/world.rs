/// World: the simulation controller's state for one level attempt.
///
/// ## Grid layers
///
///   - `base_grid`: the level as loaded. **Never mutated** after load.
///   - `grid`     : the live grid (digging, pickups, physics).
///
/// `restart` resets `grid = base_grid.clone()`, so restarting can
/// never fail once a level has been built.
///
/// ## Status machine
///
///   Playing ⇄ Paused
///   Playing → Won | Dead   (terminal until `restart`)
///
/// The tick protocol itself lives in `sim::step`.

use std::collections::VecDeque;

use crate::config::ScoringConfig;
use crate::domain::entity::{Actor, Direction, QueuedInput};
use crate::domain::grid::Grid;
use crate::error::LevelError;

use super::event::GameEvent;
use super::level::LevelDef;
use super::step;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    Playing,
    Paused,
    Won,
    Dead,
}

impl Status {
    pub fn is_over(self) -> bool {
        matches!(self, Status::Won | Status::Dead)
    }
}

/// Read-only view handed to observers (renderer, result screen).
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
    pub status: Status,
    pub level: usize,
    pub level_name: &'a str,
    pub gems_collected: u32,
    pub gems_required: u32,
    pub time_remaining: f64,
    pub score: u32,
    pub exit: (i32, i32),
    pub exit_open: bool,
    pub player: (i32, i32),
    /// False once crushed. A time-out leaves the actor alive.
    pub player_alive: bool,
    pub grid: &'a Grid,
}

pub struct World {
    // ── Level ──
    pub def: LevelDef,
    /// Pristine grid. Never mutated after construction.
    base_grid: Grid,
    pub grid: Grid,
    /// Gems present when the level was built (perfect-clear target).
    pub gems_total: u32,

    // ── Entities ──
    pub actor: Actor,
    pub queue: VecDeque<QueuedInput>,

    // ── Tracking ──
    pub status: Status,
    pub level: usize,
    pub gems_collected: u32,
    pub gems_required: u32,
    pub time_remaining: f64,
    pub score: u32,
    pub exit: (i32, i32),
    pub exit_open: bool,
    /// Actor position as last published by a tick.
    pub player: (i32, i32),

    pub scoring: ScoringConfig,
}

// ── Construction ──

impl World {
    /// Build a fresh attempt at `def`. Fails only on an invalid level.
    pub fn new(level: usize, def: LevelDef, scoring: ScoringConfig) -> Result<Self, LevelError> {
        let base_grid = def.build_grid()?;
        let start = def.player_start.pair();
        let gems_total = base_grid.count_gems() as u32;

        log::debug!("level {level} '{}': {gems_total} gems, {} required", def.name, def.gems_required);

        Ok(World {
            grid: base_grid.clone(),
            base_grid,
            gems_total,
            actor: Actor::new(start.0, start.1),
            queue: VecDeque::new(),
            status: Status::Playing,
            level,
            gems_collected: 0,
            gems_required: def.gems_required,
            time_remaining: f64::from(def.time_limit),
            score: 0,
            exit: def.exit_pos.pair(),
            exit_open: false,
            player: start,
            scoring,
            def,
        })
    }
}

// ── Command surface ──

impl World {
    /// Buffer one command. Dropped unless Playing.
    pub fn queue_input(&mut self, direction: Direction, dig_only: bool) {
        if self.status != Status::Playing {
            return;
        }
        self.queue.push_back(QueuedInput { direction, dig_only });
    }

    pub fn pause(&mut self) {
        if self.status == Status::Playing {
            self.status = Status::Paused;
            log::debug!("paused");
        }
    }

    pub fn resume(&mut self) {
        if self.status == Status::Paused {
            self.status = Status::Playing;
            log::debug!("resumed");
        }
    }

    /// Rebuild grid, actor and tracking from the level as loaded.
    /// Allowed from any status.
    pub fn restart(&mut self) {
        let start = self.def.player_start.pair();
        self.grid = self.base_grid.clone();
        self.actor = Actor::new(start.0, start.1);
        self.queue.clear();
        self.status = Status::Playing;
        self.gems_collected = 0;
        self.gems_required = self.def.gems_required;
        self.time_remaining = f64::from(self.def.time_limit);
        self.score = 0;
        self.exit = self.def.exit_pos.pair();
        self.exit_open = false;
        self.player = start;
        log::debug!("level {} restarted", self.level);
    }

    pub fn tick(&mut self) -> Vec<GameEvent> {
        step::tick(self)
    }

    pub fn update_time(&mut self, delta_ms: f64) -> Vec<GameEvent> {
        step::update_time(self, delta_ms)
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            status: self.status,
            level: self.level,
            level_name: &self.def.name,
            gems_collected: self.gems_collected,
            gems_required: self.gems_required,
            time_remaining: self.time_remaining,
            score: self.score,
            exit: self.exit,
            exit_open: self.exit_open,
            player: self.player,
            player_alive: self.actor.alive,
            grid: &self.grid,
        }
    }
}

// ── Queries ──

impl World {
    pub fn is_player_at_exit(&self) -> bool {
        self.actor.position() == self.exit
    }

    pub fn pending_inputs(&self) -> usize {
        self.queue.len()
    }
}

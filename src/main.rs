/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::File;
use std::time::{Duration, Instant};

use config::GameConfig;
use domain::entity::Direction;
use sim::event::GameEvent;
use sim::leaderboard::Leaderboard;
use sim::level::{self, LevelDef};
use sim::world::{Status, World};
use ui::gamepad::{Action, GamepadState};
use ui::input::{Command, InputState};
use ui::renderer::{Renderer, View};
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Moves buffered ahead of the simulation. Key auto-repeat beyond this is dropped.
const INPUT_BUFFER: usize = 2;

const LOG_FILE: &str = "excavation.log";

fn main() {
    init_logging();

    let config = GameConfig::load();
    let mut levels: Vec<LevelDef> = Vec::new();
    for pack in level::load_all(&config.levels_dir) {
        log::info!("pack '{}' by {}: {} levels", pack.name, pack.author, pack.levels.len());
        levels.extend(pack.levels);
    }

    let mut board = Leaderboard::load(&config.leaderboard_file);
    if std::env::args().any(|a| a == "--reset-scores") {
        match board.reset() {
            Ok(()) => log::info!("leaderboard cleared"),
            Err(e) => eprintln!("Could not reset leaderboard: {e}"),
        }
    }
    let sound = if config.sound.enabled { SoundEngine::new(config.sound.volume) } else { None };

    let mut app = App::new(config, levels, board);
    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        log::error!("terminal init failed: {e}");
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut app, &mut renderer, sound.as_ref());

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Excavation!");
    if let Some(best) = app.board.best() {
        println!("High score: {} ({})", best.score, best.name);
    }
}

/// Log to a file in the data dir; stderr would corrupt the raw-mode screen.
fn init_logging() {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match File::create(config::data_dir().join(LOG_FILE)) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(_) => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    let _ = builder.format_timestamp_secs().try_init();
}

// ── Screens ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Screen {
    Title { cursor: usize },
    Playing,
    Result { rank: Option<usize> },
}

#[derive(PartialEq, Eq, Debug)]
enum Flow {
    Continue,
    Quit,
}

struct App {
    config: GameConfig,
    levels: Vec<LevelDef>,
    names: Vec<String>,
    board: Leaderboard,
    screen: Screen,
    world: Option<World>,
}

impl App {
    fn new(config: GameConfig, levels: Vec<LevelDef>, board: Leaderboard) -> Self {
        let names = levels.iter().map(|l| l.name.clone()).collect();
        App { config, levels, names, board, screen: Screen::Title { cursor: 0 }, world: None }
    }

    fn start_level(&mut self, index: usize) {
        let Some(def) = self.levels.get(index) else { return };
        match World::new(index, def.clone(), self.config.scoring) {
            Ok(world) => {
                log::info!("starting level {index}: {}", def.name);
                self.world = Some(world);
                self.screen = Screen::Playing;
            }
            Err(e) => log::error!("level {index} cannot be played: {e}"),
        }
    }

    fn to_title(&mut self) {
        let cursor = self.world.as_ref().map_or(0, |w| w.level);
        self.world = None;
        self.screen = Screen::Title { cursor };
    }

    fn retry(&mut self) {
        if let Some(world) = self.world.as_mut() {
            world.restart();
            self.screen = Screen::Playing;
        }
    }

    fn has_next(&self) -> bool {
        self.world.as_ref().is_some_and(|w| w.level + 1 < self.levels.len())
    }

    fn handle(&mut self, cmd: Command) -> Flow {
        if cmd == Command::Quit {
            return Flow::Quit;
        }

        match self.screen {
            Screen::Title { cursor } => match cmd {
                Command::Move { direction: Direction::Up, .. } => {
                    self.screen = Screen::Title { cursor: cursor.saturating_sub(1) };
                }
                Command::Move { direction: Direction::Down, .. } => {
                    let last = self.levels.len().saturating_sub(1);
                    self.screen = Screen::Title { cursor: (cursor + 1).min(last) };
                }
                Command::Confirm => self.start_level(cursor),
                Command::Back => return Flow::Quit,
                _ => {}
            },

            Screen::Playing => {
                let Some(world) = self.world.as_mut() else {
                    self.to_title();
                    return Flow::Continue;
                };
                match cmd {
                    Command::Move { direction, dig_only } => {
                        if world.pending_inputs() < INPUT_BUFFER {
                            world.queue_input(direction, dig_only);
                        }
                    }
                    Command::Pause => match world.status {
                        Status::Paused => world.resume(),
                        _ => world.pause(),
                    },
                    Command::Restart => world.restart(),
                    Command::Back => self.to_title(),
                    _ => {}
                }
            }

            Screen::Result { .. } => {
                let Some((won, level)) = self.world.as_ref().map(|w| (w.status == Status::Won, w.level)) else {
                    self.to_title();
                    return Flow::Continue;
                };
                let has_next = self.has_next();
                match cmd {
                    Command::Confirm if won && has_next => self.start_level(level + 1),
                    Command::Confirm if won => self.to_title(),
                    Command::Confirm | Command::Restart => self.retry(),
                    Command::Back => self.to_title(),
                    _ => {}
                }
            }
        }
        Flow::Continue
    }

    /// Feed simulation events to sound, and move to the result screen
    /// once the attempt is over.
    fn on_events(&mut self, events: &[GameEvent], sound: Option<&SoundEngine>) {
        if let Some(sfx) = sound {
            sfx.play_events(events);
        }

        let Some(world) = self.world.as_ref() else { return };
        if self.screen != Screen::Playing || !world.status.is_over() {
            return;
        }

        let rank = match world.status {
            Status::Won if self.board.would_rank(world.score) => self.board.record_score(&self.config.player_name, world.score, world.level),
            _ => None,
        };
        if let Some(r) = rank {
            log::info!("score {} ranked #{r}", world.score);
        }
        self.screen = Screen::Result { rank };
    }

    fn view(&self) -> View<'_> {
        match (self.screen, self.world.as_ref()) {
            (Screen::Playing, Some(world)) => View::Playing { snap: world.snapshot() },
            (Screen::Result { rank }, Some(world)) => View::Result {
                snap: world.snapshot(),
                rank,
                has_next: self.has_next(),
                board: &self.board,
            },
            _ => View::Title {
                levels: &self.names,
                cursor: match self.screen {
                    Screen::Title { cursor } => cursor,
                    _ => 0,
                },
                board: &self.board,
            },
        }
    }
}

fn game_loop(
    app: &mut App,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&app.config.gamepad);

    let tick_rate = Duration::from_millis(app.config.timing.tick_rate_ms);
    let mut last_tick = Instant::now();
    let mut last_frame = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        let mut commands = kb.commands().to_vec();
        commands.extend(gamepad_commands(&gp));

        for cmd in commands {
            if cmd == Command::Redraw {
                renderer.invalidate();
                continue;
            }
            if app.handle(cmd) == Flow::Quit {
                return Ok(());
            }
        }

        // Real-time clock, independent of the tick rate
        let now = Instant::now();
        let delta_ms = now.duration_since(last_frame).as_secs_f64() * 1000.0;
        last_frame = now;

        if app.screen == Screen::Playing {
            if let Some(world) = app.world.as_mut() {
                let events = world.update_time(delta_ms);
                app.on_events(&events, sound);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
            if app.screen == Screen::Playing {
                if let Some(world) = app.world.as_mut() {
                    let events = world.tick();
                    app.on_events(&events, sound);
                }
            }
        }

        renderer.render(&app.view())?;
        std::thread::sleep(FRAME_SLEEP);
    }
}

fn gamepad_commands(gp: &GamepadState) -> Vec<Command> {
    let mut out = Vec::new();
    if let Some(direction) = gp.direction_pressed() {
        out.push(Command::Move { direction, dig_only: gp.held(Action::DigOnly) });
    }
    let actions = [
        (Action::Pause, Command::Pause),
        (Action::Restart, Command::Restart),
        (Action::Confirm, Command::Confirm),
        (Action::Cancel, Command::Back),
    ];
    out.extend(actions.into_iter().filter(|(a, _)| gp.pressed(*a)).map(|(_, c)| c));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::embedded_pack;

    fn app() -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = GameConfig::parse("", dir.path()).unwrap();
        config.player_name = "TESTER".to_string();
        let board = Leaderboard::load(dir.path().join("scores.json"));
        let levels = embedded_pack().levels;
        (dir, App::new(config, levels, board))
    }

    fn mv(direction: Direction) -> Command {
        Command::Move { direction, dig_only: false }
    }

    #[test]
    fn title_cursor_is_clamped() {
        let (_dir, mut a) = app();
        a.handle(mv(Direction::Up));
        assert_eq!(a.screen, Screen::Title { cursor: 0 });
        for _ in 0..10 {
            a.handle(mv(Direction::Down));
        }
        assert_eq!(a.screen, Screen::Title { cursor: a.levels.len() - 1 });
    }

    #[test]
    fn confirm_starts_selected_level() {
        let (_dir, mut a) = app();
        a.handle(mv(Direction::Down));
        a.handle(Command::Confirm);
        assert_eq!(a.screen, Screen::Playing);
        assert_eq!(a.world.as_ref().map(|w| w.level), Some(1));
    }

    #[test]
    fn moves_are_buffered_up_to_limit() {
        let (_dir, mut a) = app();
        a.handle(Command::Confirm);
        for _ in 0..5 {
            a.handle(mv(Direction::Right));
        }
        assert_eq!(a.world.as_ref().map(|w| w.pending_inputs()), Some(INPUT_BUFFER));
    }

    #[test]
    fn pause_toggles() {
        let (_dir, mut a) = app();
        a.handle(Command::Confirm);
        a.handle(Command::Pause);
        assert_eq!(a.world.as_ref().map(|w| w.status), Some(Status::Paused));
        a.handle(Command::Pause);
        assert_eq!(a.world.as_ref().map(|w| w.status), Some(Status::Playing));
    }

    #[test]
    fn back_returns_to_title_on_same_level() {
        let (_dir, mut a) = app();
        a.handle(mv(Direction::Down));
        a.handle(mv(Direction::Down));
        a.handle(Command::Confirm);
        a.handle(Command::Back);
        assert_eq!(a.screen, Screen::Title { cursor: 2 });
        assert!(a.world.is_none());
        assert_eq!(a.handle(Command::Back), Flow::Quit);
    }

    #[test]
    fn win_records_score_and_advances() {
        let (_dir, mut a) = app();
        a.handle(Command::Confirm);
        let world = a.world.as_mut().unwrap();
        world.status = Status::Won;
        world.score = 777;
        a.on_events(&[], None);

        assert_eq!(a.screen, Screen::Result { rank: Some(1) });
        assert_eq!(a.board.best().map(|e| (e.name.as_str(), e.score)), Some(("TESTER", 777)));

        a.handle(Command::Confirm);
        assert_eq!(a.screen, Screen::Playing);
        assert_eq!(a.world.as_ref().map(|w| w.level), Some(1));
    }

    #[test]
    fn death_offers_retry() {
        let (_dir, mut a) = app();
        a.handle(Command::Confirm);
        a.world.as_mut().unwrap().status = Status::Dead;
        a.on_events(&[GameEvent::TimeUp], None);
        assert_eq!(a.screen, Screen::Result { rank: None });
        assert!(a.board.best().is_none());

        a.handle(Command::Confirm);
        assert_eq!(a.screen, Screen::Playing);
        assert_eq!(a.world.as_ref().map(|w| w.status), Some(Status::Playing));
        assert_eq!(a.world.as_ref().map(|w| w.level), Some(0));
    }

    #[test]
    fn quit_from_anywhere() {
        let (_dir, mut a) = app();
        assert_eq!(a.handle(Command::Quit), Flow::Quit);
        a.handle(Command::Confirm);
        assert_eq!(a.handle(Command::Quit), Flow::Quit);
    }
}

/// Keyboard input.
///
/// Drains pending crossterm events once per frame and maps each key
/// press into a `Command`. Every press (and every auto-repeat) is one
/// command; the game loop decides what a command means on each screen.
///
/// Release events are ignored, so terminals with and without keyboard
/// enhancement behave the same.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll};

use crate::domain::entity::Direction;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    /// Arrow keys / WASD. Ctrl or Shift held turns it into a dig-only command.
    Move { direction: Direction, dig_only: bool },
    Pause,
    Restart,
    Confirm,
    /// Esc: leave the current screen.
    Back,
    Quit,
    /// Terminal was resized.
    Redraw,
}

pub struct InputState {
    commands: Vec<Command>,
}

impl InputState {
    pub fn new() -> Self {
        InputState { commands: Vec::with_capacity(8) }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.commands.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => self.commands.extend(map_key(&key)),
                Ok(Event::Resize(..)) => self.commands.push(Command::Redraw),
                Ok(_) => {}
                Err(e) => {
                    log::debug!("terminal event read failed: {e}");
                    break;
                }
            }
        }
    }

    /// Commands produced this frame, in arrival order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}

/// Translate one key event. Releases and unbound keys yield `None`.
pub fn map_key(key: &KeyEvent) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);

    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C')) {
        return Some(Command::Quit);
    }

    let movement = |direction| Some(Command::Move { direction, dig_only: ctrl || shift });

    match key.code {
        KeyCode::Up => movement(Direction::Up),
        KeyCode::Down => movement(Direction::Down),
        KeyCode::Left => movement(Direction::Left),
        KeyCode::Right => movement(Direction::Right),
        KeyCode::Char(c) => {
            // Case alone never implies dig-only: Caps Lock must still walk.
            let dir = match c.to_ascii_lowercase() {
                'w' => Direction::Up,
                's' => Direction::Down,
                'a' => Direction::Left,
                'd' => Direction::Right,
                'p' => return Some(Command::Pause),
                'r' => return Some(Command::Restart),
                'q' => return Some(Command::Quit),
                ' ' => return Some(Command::Confirm),
                _ => return None,
            };
            movement(dir)
        }
        KeyCode::Enter => Some(Command::Confirm),
        KeyCode::Esc => Some(Command::Back),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Option<Command> {
        map_key(&KeyEvent::new(code, modifiers))
    }

    fn mv(direction: Direction, dig_only: bool) -> Option<Command> {
        Some(Command::Move { direction, dig_only })
    }

    #[test]
    fn arrows_and_wasd_move() {
        assert_eq!(press(KeyCode::Up, KeyModifiers::NONE), mv(Direction::Up, false));
        assert_eq!(press(KeyCode::Right, KeyModifiers::NONE), mv(Direction::Right, false));
        assert_eq!(press(KeyCode::Char('a'), KeyModifiers::NONE), mv(Direction::Left, false));
        assert_eq!(press(KeyCode::Char('s'), KeyModifiers::NONE), mv(Direction::Down, false));
    }

    #[test]
    fn modifiers_make_dig_only() {
        assert_eq!(press(KeyCode::Left, KeyModifiers::CONTROL), mv(Direction::Left, true));
        assert_eq!(press(KeyCode::Down, KeyModifiers::SHIFT), mv(Direction::Down, true));
        assert_eq!(press(KeyCode::Char('W'), KeyModifiers::SHIFT), mv(Direction::Up, true));
    }

    #[test]
    fn caps_lock_letters_still_walk() {
        assert_eq!(press(KeyCode::Char('D'), KeyModifiers::NONE), mv(Direction::Right, false));
        assert_eq!(press(KeyCode::Char('A'), KeyModifiers::NONE), mv(Direction::Left, false));
    }

    #[test]
    fn control_keys() {
        assert_eq!(press(KeyCode::Char('p'), KeyModifiers::NONE), Some(Command::Pause));
        assert_eq!(press(KeyCode::Char('R'), KeyModifiers::SHIFT), Some(Command::Restart));
        assert_eq!(press(KeyCode::Enter, KeyModifiers::NONE), Some(Command::Confirm));
        assert_eq!(press(KeyCode::Esc, KeyModifiers::NONE), Some(Command::Back));
        assert_eq!(press(KeyCode::Char('q'), KeyModifiers::NONE), Some(Command::Quit));
        assert_eq!(press(KeyCode::Char('c'), KeyModifiers::CONTROL), Some(Command::Quit));
        assert_eq!(press(KeyCode::Char('c'), KeyModifiers::NONE), None);
        assert_eq!(press(KeyCode::F(5), KeyModifiers::NONE), None);
    }

    #[test]
    fn releases_are_ignored() {
        let mut key = KeyEvent::new(KeyCode::Up, KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        assert_eq!(map_key(&key), None);
        key.kind = KeyEventKind::Repeat;
        assert_eq!(map_key(&key), mv(Direction::Up, false));
    }
}
